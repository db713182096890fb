use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;

use crate::align::NucleotideMatrix;
use crate::api::Nucmer;
use crate::commands::mums::{read_all_records, read_first_record, write_reports};

#[derive(Args, Debug)]
pub struct NucmerArgs {
    /// Reference FASTA (first record is indexed)
    #[arg(short, long)]
    pub reference: PathBuf,
    /// Query FASTA (all records are aligned)
    #[arg(short, long)]
    pub query: PathBuf,
    /// Minimum anchor length
    #[arg(short = 'l', long, default_value_t = 20)]
    pub min_length: usize,
    /// Minimum cluster score
    #[arg(short = 'c', long, default_value_t = 65)]
    pub min_cluster: usize,
    /// Maximum separation between anchors in a cluster
    #[arg(short = 'g', long, default_value_t = 1000)]
    pub max_gap: usize,
    #[arg(long, default_value_t = 1)]
    pub reward: i32,
    #[arg(long, default_value_t = -8)]
    pub penalty: i32,
    #[arg(long, default_value_t = -8)]
    pub gap_open: i32,
    #[arg(long, default_value_t = -1)]
    pub gap_extend: i32,
    /// Fill gap regions with the blocked parallel matrix fill
    #[arg(long, default_value_t = false)]
    pub blocked: bool,
    /// Print the aligned rows under each region header
    #[arg(long, default_value_t = false)]
    pub alignments: bool,
    #[arg(short = 'n', long, default_value_t = 0)]
    pub num_threads: usize,
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: NucmerArgs) -> Result<()> {
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
        "aligning {} queries against {} ({} bases) on {} threads",
        queries.len(),
        reference.0,
        reference.1.len(),
        num_threads
    );

    let nucmer = Nucmer {
        length_of_mum: args.min_length,
        minimum_score: args.min_cluster,
        maximum_separation: args.max_gap,
        similarity_matrix: NucleotideMatrix::new(args.reward, args.penalty),
        gap_open_cost: args.gap_open,
        gap_extension_cost: args.gap_extend,
        parallel: args.blocked,
        ..Nucmer::default()
    };

    let bar = ProgressBar::new(queries.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} queries ({elapsed})")
            .expect("valid progress template"),
    );

    let reports: Result<Vec<String>> = queries
        .par_iter()
        .map(|(id, sequence)| {
            let alignments = nucmer.align(&reference.1, sequence)?;
            let mut report = String::new();
            writeln!(report, "> {} vs {}", reference.0, id).expect("string write");
            for alignment in &alignments {
                for pair in &alignment.pairwise_aligned_sequences {
                    // 1-based inclusive coordinate spans per region
                    writeln!(
                        report,
                        "{} {} | {} {} | score {}",
                        pair.start_offsets[0] + 1,
                        pair.end_offsets[0],
                        pair.start_offsets[1] + 1,
                        pair.end_offsets[1],
                        pair.score
                    )
                    .expect("string write");
                    if args.alignments {
                        writeln!(report, "{}", String::from_utf8_lossy(&pair.first_sequence))
                            .expect("string write");
                        writeln!(report, "{}", String::from_utf8_lossy(&pair.second_sequence))
                            .expect("string write");
                        writeln!(report, "{}", String::from_utf8_lossy(&pair.consensus))
                            .expect("string write");
                    }
                }
            }
            bar.inc(1);
            Ok(report)
        })
        .collect();
    bar.finish_and_clear();

    write_reports(&reports?, args.out.as_ref())
}
