//! Overflow storage for the persistent suffix tree backend.
//!
//! Edges spilled past the persistence threshold are serialized as
//! `{start, end, child count, children}` records addressed by position.
//! The storage handle is a single-writer resource; the owning tree
//! serializes access.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::EdgeHandle;

/// Sentinel for "no suffix" in serialized records.
const NO_SUFFIX: u64 = u64::MAX;

/// Serialized form of a spilled edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub start: usize,
    pub end: usize,
    pub suffix_start: Option<usize>,
    pub children: Vec<EdgeHandle>,
}

impl EdgeRecord {
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Backing store contract: append a record, read it back by position.
///
/// Positions are opaque to the tree beyond identity; updates are modeled by
/// appending a superseding record and rebinding the parent's handle.
pub trait EdgeStorage {
    fn write(&mut self, record: &EdgeRecord) -> io::Result<u64>;

    fn read(&mut self, position: u64) -> io::Result<EdgeRecord>;
}

/// File-backed edge storage with little-endian fixed framing.
#[derive(Debug)]
pub struct FileEdgeStorage {
    file: File,
    end: u64,
}

impl FileEdgeStorage {
    /// Create (or truncate) the backing file. The handle lives as long as
    /// the owning tree.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file, end: 0 })
    }
}

impl EdgeStorage for FileEdgeStorage {
    fn write(&mut self, record: &EdgeRecord) -> io::Result<u64> {
        let position = self.end;
        self.file.seek(SeekFrom::Start(position))?;
        write_record(&mut self.file, record)?;
        self.end = self.file.stream_position()?;
        Ok(position)
    }

    fn read(&mut self, position: u64) -> io::Result<EdgeRecord> {
        self.file.seek(SeekFrom::Start(position))?;
        read_record(&mut self.file)
    }
}

fn write_record<W: Write>(w: &mut W, record: &EdgeRecord) -> io::Result<()> {
    w.write_u64::<LittleEndian>(record.start as u64)?;
    w.write_u64::<LittleEndian>(record.end as u64)?;
    w.write_u64::<LittleEndian>(record.suffix_start.map_or(NO_SUFFIX, |s| s as u64))?;
    w.write_u32::<LittleEndian>(record.children.len() as u32)?;
    for child in &record.children {
        match child {
            EdgeHandle::Memory(v) => {
                w.write_u8(0)?;
                w.write_u64::<LittleEndian>(*v)?;
            }
            EdgeHandle::Stored(v) => {
                w.write_u8(1)?;
                w.write_u64::<LittleEndian>(*v)?;
            }
        }
    }
    Ok(())
}

fn read_record<R: Read>(r: &mut R) -> io::Result<EdgeRecord> {
    let start = r.read_u64::<LittleEndian>()? as usize;
    let end = r.read_u64::<LittleEndian>()? as usize;
    let suffix = r.read_u64::<LittleEndian>()?;
    let child_count = r.read_u32::<LittleEndian>()? as usize;
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        let tag = r.read_u8()?;
        let value = r.read_u64::<LittleEndian>()?;
        children.push(match tag {
            0 => EdgeHandle::Memory(value),
            1 => EdgeHandle::Stored(value),
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("bad edge handle tag {other}"),
                ))
            }
        });
    }
    Ok(EdgeRecord {
        start,
        end,
        suffix_start: if suffix == NO_SUFFIX {
            None
        } else {
            Some(suffix as usize)
        },
        children,
    })
}

/// In-memory storage, mainly for tests and small spill tiers.
#[derive(Debug, Default)]
pub struct MemoryEdgeStorage {
    buffer: Vec<u8>,
}

impl MemoryEdgeStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EdgeStorage for MemoryEdgeStorage {
    fn write(&mut self, record: &EdgeRecord) -> io::Result<u64> {
        let position = self.buffer.len() as u64;
        write_record(&mut self.buffer, record)?;
        Ok(position)
    }

    fn read(&mut self, position: u64) -> io::Result<EdgeRecord> {
        let mut slice = &self.buffer[position as usize..];
        read_record(&mut slice)
    }
}
