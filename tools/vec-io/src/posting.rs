//! Posting file writer.
//!
//! A posting file holds the records of one part of a partitioned vector
//! file.  It reuses the vector file layout: the header's record count is the
//! posting's record count, the dimension is copied verbatim from the source,
//! and the payload is the raw record bytes (timestamp included) of the
//! posting's members, in source file order.  Every posting file can
//! therefore be decoded with [`vector::read`].

use crate::vector;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// The source file violates the vector file format.
    Format(vector::Error),

    /// One part ID per source record is required.
    PartIdCountMismatch { expected: usize, actual: usize },

    /// A part ID lies outside `0..part_count`.
    PartIdOutOfRange {
        record: usize,
        part_id: usize,
        part_count: usize,
    },

    Io(io::Error),
}

impl From<vector::Error> for Error {
    fn from(err: vector::Error) -> Error {
        Error::Format(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Format(_) => write!(f, "invalid source file"),
            Error::PartIdCountMismatch { expected, actual } => write!(
                f,
                "expected one part ID per record ({expected}), got {actual}",
            ),
            Error::PartIdOutOfRange {
                record,
                part_id,
                part_count,
            } => write!(
                f,
                "record {record} has part ID {part_id}, expected less than {part_count}",
            ),
            Error::Io(_) => write!(f, "read/write error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Format(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Where bucketed record bytes go.
///
/// Backed by in-memory buffers below; a sink backed by temporary files is a
/// drop-in replacement for sources too large to buffer.
pub trait PartitionSink {
    fn append(&mut self, part: usize, record: &[u8]) -> io::Result<()>;
}

impl PartitionSink for Vec<Vec<u8>> {
    fn append(&mut self, part: usize, record: &[u8]) -> io::Result<()> {
        self[part].extend_from_slice(record);
        Ok(())
    }
}

/// Outcome of bucketing a vector file by part ID.
#[derive(Clone, Debug)]
pub struct Summary {
    /// Dimension field of the source header.
    pub dimension: usize,

    /// Number of records appended for each part.  Sums to the source record
    /// count; parts can be empty.
    pub counts: Vec<usize>,
}

impl Summary {
    pub fn row_count(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Streams the records of `r` into `sink`, one bucket per part ID.
///
/// `part_ids` must hold one ID per record, in file order; within a bucket,
/// records keep their relative source order.  Part IDs are validated before
/// any record is read, so the sink stays untouched on bad input.
///
/// Wrapping `r` in a [`std::io::BufReader`] is recommended.
pub fn split<R, S>(
    mut r: R,
    part_ids: &[usize],
    part_count: usize,
    sink: &mut S,
) -> Result<Summary>
where
    R: io::Read,
    S: PartitionSink,
{
    let (row_count, dimension) = vector::read_header(&mut r)?;
    if part_ids.len() != row_count {
        return Err(Error::PartIdCountMismatch {
            expected: row_count,
            actual: part_ids.len(),
        });
    }
    if let Some((record, &part_id)) = part_ids
        .iter()
        .enumerate()
        .find(|&(_, &part_id)| part_id >= part_count)
    {
        return Err(Error::PartIdOutOfRange {
            record,
            part_id,
            part_count,
        });
    }

    let mut counts = vec![0; part_count];
    let mut record = vec![0x00; vector::record_len(dimension)];
    for &part_id in part_ids {
        r.read_exact(&mut record).map_err(vector::Error::from)?;
        sink.append(part_id, &record)?;
        counts[part_id] += 1;
    }

    Ok(Summary { dimension, counts })
}

/// Encodes one posting file: the header, then the raw record payload.
///
/// Wrapping `w` in a [`std::io::BufWriter`] is recommended.
pub fn write<W>(mut w: W, record_count: usize, dimension: usize, payload: &[u8]) -> io::Result<()>
where
    W: io::Write,
{
    vector::write_header(&mut w, record_count, dimension)?;
    w.write_all(payload)
}

/// Path of the posting file for `part`: the prefix with the part number
/// appended.  The combined file lives at part number `part_count`.
pub fn path_for(dst_prefix: &Path, part: usize) -> PathBuf {
    let mut path = dst_prefix.as_os_str().to_owned();
    path.push(part.to_string());
    PathBuf::from(path)
}

// Not `Path::with_extension`: the prefix may itself contain dots.
fn staging_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    PathBuf::from(tmp)
}

/// Buckets the records of the vector file at `src` by part ID and writes
/// `part_count + 1` posting files: `<dst_prefix>0` to
/// `<dst_prefix>{part_count - 1}`, then the combined file, which holds every
/// bucket's payload in part order, at `<dst_prefix>{part_count}`.
///
/// Files are first written to `.part` paths and renamed into place only once
/// every write has succeeded, so existing files at the destination paths are
/// either left alone or replaced by complete output.
pub fn write_files(
    src: impl AsRef<Path>,
    dst_prefix: impl AsRef<Path>,
    part_ids: &[usize],
    part_count: usize,
) -> Result<Summary> {
    let src = fs::File::open(src)?;
    let mut buckets = vec![Vec::new(); part_count];
    let summary = split(io::BufReader::new(src), part_ids, part_count, &mut buckets)?;

    let mut staged = Vec::with_capacity(part_count + 1);
    let result = (|| -> Result<()> {
        for (part, payload) in buckets.iter().enumerate() {
            let path = path_for(dst_prefix.as_ref(), part);
            let tmp = staging_path(&path);
            let mut file = io::BufWriter::new(fs::File::create(&tmp)?);
            staged.push((tmp, path));
            write(&mut file, summary.counts[part], summary.dimension, payload)?;
            file.flush()?;
        }

        let path = path_for(dst_prefix.as_ref(), part_count);
        let tmp = staging_path(&path);
        let mut file = io::BufWriter::new(fs::File::create(&tmp)?);
        staged.push((tmp, path));
        vector::write_header(&mut file, part_ids.len(), summary.dimension)?;
        for payload in &buckets {
            file.write_all(payload)?;
        }
        file.flush()?;
        Ok(())
    })();

    if let Err(err) = result {
        for (tmp, _) in staged {
            let _ = fs::remove_file(tmp);
        }
        return Err(err);
    }

    for (tmp, path) in staged {
        fs::rename(tmp, path)?;
    }

    Ok(summary)
}
