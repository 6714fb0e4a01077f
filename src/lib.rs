//! Vecpart groups fixed-dimension vectors into postings, so that a
//! vector-search system can probe a few groups of similar vectors instead of
//! the whole collection.
//!
//! Algorithms are structs that hold their settings and implement
//! [`Partition`].  The clustering itself is delegated to an existing
//! implementation (linfa's k-means); this crate only pins down the contract:
//! one part ID per input row, part IDs in `0..part_count`.

pub mod algorithms;

pub use crate::algorithms::Error;
pub use crate::algorithms::KMeans;
pub use crate::algorithms::KMeansMetadata;

/// The ID of a part.
pub type PartId = usize;

/// Map rows of an input to parts.
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use vecpart::Partition as _;
///
/// let observations = array![[0.0, 0.0], [1.0, 1.0], [50.0, 50.0], [51.0, 49.0]];
/// let mut partition = [0; 4];
///
/// vecpart::KMeans {
///     part_count: 2,
///     seed: Some(42),
///     ..vecpart::KMeans::default()
/// }
/// .partition(&mut partition, observations.view())
/// .unwrap();
///
/// assert_eq!(partition[0], partition[1]);
/// assert_eq!(partition[2], partition[3]);
/// assert_ne!(partition[0], partition[2]);
/// ```
pub trait Partition<Input> {
    /// Diagnostic data returned on success.
    type Metadata;

    /// Error details, should the algorithm fail.
    type Error;

    /// Partition the input into parts, and fill `part_ids` with the part ID
    /// of each row of the input.
    fn partition(
        &mut self,
        part_ids: &mut [PartId],
        input: Input,
    ) -> Result<Self::Metadata, Self::Error>;
}
