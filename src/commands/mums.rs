use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bio::io::fasta;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;

use crate::anchor::get_longest_sequence;
use crate::api::Mummer;
use crate::mum::find_matches;

#[derive(Args, Debug)]
pub struct MumsArgs {
    /// Reference FASTA (first record is indexed)
    #[arg(short, long)]
    pub reference: PathBuf,
    /// Query FASTA (all records are matched)
    #[arg(short, long)]
    pub query: PathBuf,
    /// Minimum match length
    #[arg(short = 'l', long, default_value_t = 20)]
    pub min_length: usize,
    /// Report only the longest co-linear chain per query
    #[arg(long, default_value_t = false)]
    pub chain: bool,
    #[arg(short = 'n', long, default_value_t = 0)]
    pub num_threads: usize,
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: MumsArgs) -> Result<()> {
    let num_threads = if args.num_threads == 0 {
        num_cpus::get()
    } else {
        args.num_threads
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .context("Failed to build thread pool")?;

    let reference = read_first_record(&args.reference)?;
    let queries = read_all_records(&args.query)?;
    info!(
        "indexed {} reference bases, matching {} queries on {} threads",
        reference.1.len(),
        queries.len(),
        num_threads
    );

    let mummer = Mummer {
        length_of_mum: args.min_length,
        ..Mummer::default()
    };
    let tree = mummer.build_tree(&reference.1)?;

    let bar = ProgressBar::new(queries.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} queries ({elapsed})")
            .expect("valid progress template"),
    );

    let reports: Result<Vec<String>> = queries
        .par_iter()
        .map(|(id, sequence)| {
            let mut matches = find_matches(&tree, sequence, args.min_length)?;
            if args.chain {
                matches = get_longest_sequence(&matches);
            }
            let mut report = String::new();
            writeln!(report, "> {id}").expect("string write");
            for m in &matches {
                // 1-based starts, mummer-style columns
                writeln!(
                    report,
                    "{:>10} {:>10} {:>10}",
                    m.first_sequence_start + 1,
                    m.second_sequence_start + 1,
                    m.length
                )
                .expect("string write");
            }
            bar.inc(1);
            Ok(report)
        })
        .collect();
    bar.finish_and_clear();

    write_reports(&reports?, args.out.as_ref())
}

pub(crate) fn read_first_record(path: &PathBuf) -> Result<(String, Vec<u8>)> {
    let reader = fasta::Reader::from_file(path)
        .with_context(|| format!("Failed to open FASTA file {}", path.display()))?;
    for record in reader.records() {
        let record = record?;
        return Ok((record.id().to_string(), record.seq().to_vec()));
    }
    bail!("no FASTA records in {}", path.display())
}

pub(crate) fn read_all_records(path: &PathBuf) -> Result<Vec<(String, Vec<u8>)>> {
    let reader = fasta::Reader::from_file(path)
        .with_context(|| format!("Failed to open FASTA file {}", path.display()))?;
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push((record.id().to_string(), record.seq().to_vec()));
    }
    if records.is_empty() {
        bail!("no FASTA records in {}", path.display());
    }
    Ok(records)
}

pub(crate) fn write_reports(reports: &[String], out: Option<&PathBuf>) -> Result<()> {
    match out {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            for report in reports {
                file.write_all(report.as_bytes())?;
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            for report in reports {
                handle.write_all(report.as_bytes())?;
            }
        }
    }
    Ok(())
}
