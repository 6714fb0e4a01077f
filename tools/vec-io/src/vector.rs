//! Vector file format encoder/decoder.
//!
//! See `vec-part(1)` for a specification.  In short, a little-endian header
//! of two `i32`s (record count, then dimension) followed by the records, each
//! a `f64` timestamp and `dimension` `f32` components, with no padding and no
//! per-record length prefix.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum Error {
    /// A header field is negative or otherwise nonsensical.
    BadHeader,

    /// The file ends before the declared record count is reached.
    TruncatedFile,

    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        // Running out of bytes mid-field means the header lied about the
        // record count, which callers must treat as a format violation.
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::TruncatedFile
        } else {
            Error::Io(err)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadHeader => write!(f, "bad file header"),
            Error::TruncatedFile => write!(f, "file ends before the declared record count"),
            Error::Io(_) => write!(f, "read/write error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// One timestamped vector.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub timestamp: f64,
    pub components: Vec<f32>,
}

/// A decoded vector file: the records in file order, plus the dimension
/// shared by all of them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorFile {
    pub dimension: usize,
    pub records: Vec<Record>,
}

impl VectorFile {
    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<VectorFile> {
        let file = fs::File::open(path).map_err(Error::Io)?;
        read(io::BufReader::new(file))
    }
}

/// Size in bytes of one encoded record.
pub fn record_len(dimension: usize) -> usize {
    8 + 4 * dimension
}

/// Decodes the two header fields only, leaving `r` at the first record.
pub fn read_header<R>(mut r: R) -> Result<(usize, usize)>
where
    R: io::Read,
{
    let mut field = [0x00; 4];
    r.read_exact(&mut field)?;
    let row_count = i32::from_le_bytes(field);
    r.read_exact(&mut field)?;
    let dimension = i32::from_le_bytes(field);
    if row_count < 0 || dimension < 0 {
        return Err(Error::BadHeader);
    }
    Ok((row_count as usize, dimension as usize))
}

pub(crate) fn write_header<W>(mut w: W, row_count: usize, dimension: usize) -> io::Result<()>
where
    W: io::Write,
{
    w.write_all(&i32::to_le_bytes(row_count as i32))?;
    w.write_all(&i32::to_le_bytes(dimension as i32))
}

/// Wrapping `r` in a [`std::io::BufReader`] is recommended.
pub fn read<R>(mut r: R) -> Result<VectorFile>
where
    R: io::Read,
{
    let (row_count, dimension) = read_header(&mut r)?;

    let mut records = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let mut timestamp_buf = [0x00; 8];
        r.read_exact(&mut timestamp_buf)?;
        let timestamp = f64::from_le_bytes(timestamp_buf);

        let mut component_buf = vec![0x00; 4 * dimension];
        r.read_exact(&mut component_buf)?;
        let components = component_buf
            .chunks_exact(4)
            .map(|bytes| {
                let bytes = <[u8; 4]>::try_from(bytes).unwrap();
                f32::from_le_bytes(bytes)
            })
            .collect();

        records.push(Record {
            timestamp,
            components,
        });
    }

    Ok(VectorFile {
        dimension,
        records,
    })
}

/// Wrapping `w` in a [`std::io::BufWriter`] is recommended.
///
/// Panics if a record does not have `dimension` components.
pub fn write<'a, I, W>(mut w: W, dimension: usize, records: I) -> io::Result<()>
where
    I: IntoIterator<Item = &'a Record>,
    I::IntoIter: ExactSizeIterator,
    W: io::Write,
{
    let records = records.into_iter();
    write_header(&mut w, records.len(), dimension)?;

    for record in records {
        assert_eq!(record.components.len(), dimension);
        w.write_all(&f64::to_le_bytes(record.timestamp))?;
        for component in &record.components {
            w.write_all(&f32::to_le_bytes(*component))?;
        }
    }

    Ok(())
}
