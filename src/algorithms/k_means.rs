use super::Error;
use crate::PartId;
use linfa::prelude::*;
use linfa::DatasetBase;
use ndarray::Array1;
use ndarray::ArrayView2;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// Diagnostic data returned by [`KMeans`].
#[derive(Clone, Debug)]
pub struct Metadata {
    /// Number of rows assigned to each part.  Parts can be empty.
    pub part_sizes: Vec<usize>,
}

fn k_means(
    part_ids: &mut [PartId],
    observations: ArrayView2<'_, f64>,
    settings: &KMeans,
) -> Result<Metadata, Error> {
    let row_count = observations.nrows();
    if part_ids.len() != row_count {
        return Err(Error::InputLenMismatch {
            expected: row_count,
            actual: part_ids.len(),
        });
    }
    if settings.part_count == 0 || settings.part_count > row_count {
        return Err(Error::InvalidPartCount {
            part_count: settings.part_count,
            row_count,
        });
    }
    if settings.part_count == 1 {
        part_ids.fill(0);
        return Ok(Metadata {
            part_sizes: vec![row_count],
        });
    }

    let seed = settings.seed.unwrap_or_else(rand::random);
    tracing::debug!(seed, "k-means rng");
    let rng = Xoshiro256Plus::seed_from_u64(seed);

    let observations = observations.to_owned();
    let dataset = DatasetBase::from(observations.clone());
    let model = linfa_clustering::KMeans::params_with_rng(settings.part_count, rng)
        .max_n_iterations(settings.max_iter)
        .tolerance(settings.tolerance)
        .fit(&dataset)?;

    let mut labels = Array1::<usize>::zeros(row_count);
    model.predict_inplace(&observations, &mut labels);

    let mut part_sizes = vec![0; settings.part_count];
    for (part_id, label) in part_ids.iter_mut().zip(&labels) {
        *part_id = *label;
        part_sizes[*label] += 1;
    }
    tracing::debug!(?part_sizes, "k-means assignment done");

    Ok(Metadata { part_sizes })
}

/// K-means clustering, through [linfa](https://docs.rs/linfa-clustering).
///
/// Rows that end up in the same cluster are given the same part ID.  Labels
/// are dense in `0..part_count` only when every cluster receives at least one
/// row; callers must not assume all parts are non-empty.
#[derive(Clone, Copy, Debug)]
pub struct KMeans {
    pub part_count: usize,

    /// Iteration limit for the assignment/update loop.
    pub max_iter: u64,

    /// Centroid movement under which the loop is considered converged.
    pub tolerance: f64,

    /// Runs with the same seed on the same input yield the same partition.
    /// When unset, a seed is drawn from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            part_count: 2,
            max_iter: 300,
            tolerance: 1e-4,
            seed: None,
        }
    }
}

impl<'a> crate::Partition<ArrayView2<'a, f64>> for KMeans {
    type Metadata = Metadata;
    type Error = Error;

    fn partition(
        &mut self,
        part_ids: &mut [PartId],
        observations: ArrayView2<'a, f64>,
    ) -> Result<Self::Metadata, Self::Error> {
        k_means(part_ids, observations, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Partition as _;
    use ndarray::Array2;

    fn blobs() -> Array2<f64> {
        // Two tight groups far apart from each other.
        ndarray::array![
            [0.0, 0.0],
            [1.0, 0.5],
            [0.5, 1.0],
            [100.0, 100.0],
            [101.0, 99.5],
            [99.5, 100.5],
        ]
    }

    #[test]
    fn separates_blobs() {
        let observations = blobs();
        let mut partition = [0; 6];
        let metadata = KMeans {
            part_count: 2,
            seed: Some(1),
            ..KMeans::default()
        }
        .partition(&mut partition, observations.view())
        .unwrap();

        assert_eq!(metadata.part_sizes.iter().sum::<usize>(), 6);
        assert!(partition.iter().all(|part_id| *part_id < 2));
        assert_eq!(partition[0], partition[1]);
        assert_eq!(partition[1], partition[2]);
        assert_eq!(partition[3], partition[4]);
        assert_eq!(partition[4], partition[5]);
        assert_ne!(partition[0], partition[3]);
    }

    #[test]
    fn seeded_runs_agree() {
        let observations = blobs();
        let mut algorithm = KMeans {
            part_count: 3,
            seed: Some(99),
            ..KMeans::default()
        };
        let mut first = [0; 6];
        let mut second = [0; 6];
        algorithm.partition(&mut first, observations.view()).unwrap();
        algorithm.partition(&mut second, observations.view()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_part() {
        let observations = blobs();
        let mut partition = [9; 6];
        let metadata = KMeans {
            part_count: 1,
            ..KMeans::default()
        }
        .partition(&mut partition, observations.view())
        .unwrap();
        assert_eq!(partition, [0; 6]);
        assert_eq!(metadata.part_sizes, [6]);
    }

    #[test]
    fn invalid_part_counts() {
        let observations = blobs();
        let mut partition = [0; 6];

        let err = KMeans {
            part_count: 0,
            ..KMeans::default()
        }
        .partition(&mut partition, observations.view())
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPartCount { .. }));

        let err = KMeans {
            part_count: 7,
            ..KMeans::default()
        }
        .partition(&mut partition, observations.view())
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPartCount { .. }));
    }

    #[test]
    fn part_ids_len_mismatch() {
        let observations = blobs();
        let mut partition = [0; 4];
        let err = KMeans::default()
            .partition(&mut partition, observations.view())
            .unwrap_err();
        assert!(matches!(err, Error::InputLenMismatch { .. }));
    }
}
