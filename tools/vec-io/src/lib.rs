//! This crate reads and writes the binary file formats understood by the
//! `vec-part` tools: vector files, which hold timestamped fixed-dimension
//! vectors, and posting files, which hold the records of one part of a
//! partitioned vector file.

pub mod posting;
pub mod vector;
