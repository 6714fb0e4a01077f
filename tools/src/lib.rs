use ndarray::Array2;
use vec_io::vector::Record;

/// How vector components are converted before clustering.
///
/// The vector files this tool consumes usually hold pre-quantized
/// embeddings, stored as `f32` out of format uniformity; `SignedByte`
/// reproduces the historical behavior of clustering them as `i8`.  The cast
/// saturates: components outside the `i8` range clamp to its bounds and NaN
/// becomes zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Narrowing {
    SignedByte,
    None,
}

impl std::str::FromStr for Narrowing {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s {
            "i8" | "int8" => Self::SignedByte,
            "none" | "f32" => Self::None,
            _ => anyhow::bail!("expected i8/none"),
        })
    }
}

impl Narrowing {
    fn apply(self, component: f32) -> f64 {
        match self {
            Narrowing::SignedByte => component as i8 as f64,
            Narrowing::None => component as f64,
        }
    }
}

/// Builds the observation matrix fed to the clustering algorithm, one row
/// per record.
///
/// Panics if a record does not have `dimension` components.
pub fn observations(records: &[Record], dimension: usize, narrowing: Narrowing) -> Array2<f64> {
    let mut observations = Array2::zeros((records.len(), dimension));
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.components.len(), dimension);
        for (j, &component) in record.components.iter().enumerate() {
            observations[[i, j]] = narrowing.apply(component);
        }
    }
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vec_io::posting;
    use vec_io::vector;

    #[test]
    fn narrowing_saturates() {
        let narrow = Narrowing::SignedByte;
        assert_eq!(narrow.apply(12.7), 12.0);
        assert_eq!(narrow.apply(-3.9), -3.0);
        assert_eq!(narrow.apply(300.0), 127.0);
        assert_eq!(narrow.apply(-300.0), -128.0);
        assert_eq!(narrow.apply(f32::NAN), 0.0);
        assert_eq!(Narrowing::None.apply(300.5), 300.5);
    }

    #[test]
    fn observation_matrix() {
        let records = [
            vector::Record {
                timestamp: 0.0,
                components: vec![1.5, 200.0],
            },
            vector::Record {
                timestamp: 1.0,
                components: vec![-2.5, -200.0],
            },
        ];
        let narrowed = observations(&records, 2, Narrowing::SignedByte);
        assert_eq!(narrowed, ndarray::array![[1.0, 127.0], [-2.0, -128.0]]);
        let raw = observations(&records, 2, Narrowing::None);
        assert_eq!(raw, ndarray::array![[1.5, 200.0], [-2.5, -200.0]]);
    }

    fn inputs() -> impl Strategy<Value = (usize, Vec<Vec<f32>>, Vec<usize>, usize)> {
        (1_usize..5, 1_usize..5).prop_flat_map(|(dimension, part_count)| {
            proptest::collection::vec(
                proptest::collection::vec(-1000.0_f32..1000.0, dimension),
                0..40,
            )
            .prop_flat_map(move |rows| {
                let row_count = rows.len();
                (
                    Just(dimension),
                    Just(rows),
                    proptest::collection::vec(0..part_count, row_count),
                    Just(part_count),
                )
            })
        })
    }

    proptest! {
        // Whatever the assignment, every record lands in exactly one bucket
        // and buckets keep the source order (timestamps carry the source
        // index, so they must increase within a bucket).
        #[test]
        fn split_preserves_counts_and_order(
            (dimension, rows, part_ids, part_count) in inputs()
        ) {
            let records: Vec<vector::Record> = rows
                .iter()
                .enumerate()
                .map(|(i, components)| vector::Record {
                    timestamp: i as f64,
                    components: components.clone(),
                })
                .collect();
            let mut encoded = Vec::new();
            vector::write(&mut encoded, dimension, &records).unwrap();

            let mut buckets = vec![Vec::new(); part_count];
            let summary =
                posting::split(encoded.as_slice(), &part_ids, part_count, &mut buckets).unwrap();

            prop_assert_eq!(summary.row_count(), records.len());
            prop_assert_eq!(summary.dimension, dimension);

            let record_len = vector::record_len(dimension);
            for (part, bucket) in buckets.iter().enumerate() {
                prop_assert_eq!(bucket.len(), summary.counts[part] * record_len);
                let timestamps: Vec<f64> = bucket
                    .chunks_exact(record_len)
                    .map(|record| f64::from_le_bytes(<[u8; 8]>::try_from(&record[..8]).unwrap()))
                    .collect();
                prop_assert!(timestamps.windows(2).all(|pair| pair[0] < pair[1]));
            }
        }
    }
}
