use faer::MatRef;

use crate::errors::*;
use crate::utils::*;

/// Read-only table of samples handed to the clustering engines
///
/// Rows are samples, columns are features. The data is copied once and
/// flattened for cache locality; nothing mutates it during a fit.
///
/// ### Fields
///
/// * `vectors_flat` - The samples, flattened row-major
/// * `dim` - Number of features per sample
/// * `n` - Number of samples
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset<T> {
    vectors_flat: Vec<T>,
    dim: usize,
    n: usize,
}

impl<T> Dataset<T>
where
    T: ClusterFloat,
{
    /// Generate a new dataset from a matrix
    ///
    /// ### Params
    ///
    /// * `data` - Samples x features
    ///
    /// ### Returns
    ///
    /// The validated dataset, or an error if the matrix is empty or holds
    /// non-finite values.
    pub fn from_mat(data: MatRef<T>) -> Result<Self> {
        let n = data.nrows();
        let dim = data.ncols();

        let mut vectors_flat = Vec::with_capacity(n * dim);
        for i in 0..n {
            vectors_flat.extend(data.row(i).iter().cloned());
        }

        Self::from_flat(vectors_flat, dim)
    }

    /// Generate a new dataset from individual rows
    ///
    /// ### Params
    ///
    /// * `rows` - One vector per sample. All need the same length.
    ///
    /// ### Returns
    ///
    /// The validated dataset
    pub fn from_rows<R>(rows: &[R]) -> Result<Self>
    where
        R: AsRef<[T]>,
    {
        let dim = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);

        let mut vectors_flat = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(ClusterError::RaggedRow {
                    row: i,
                    expected: dim,
                    found: row.len(),
                });
            }
            vectors_flat.extend_from_slice(row);
        }

        Self::from_flat(vectors_flat, dim)
    }

    /// Generate a new dataset from already flattened data
    ///
    /// ### Params
    ///
    /// * `vectors_flat` - Row-major samples (length = n * dim)
    /// * `dim` - Number of features
    ///
    /// ### Returns
    ///
    /// The validated dataset
    pub fn from_flat(vectors_flat: Vec<T>, dim: usize) -> Result<Self> {
        if dim == 0 || vectors_flat.is_empty() {
            return Err(ClusterError::EmptyDataset {
                n_samples: if dim == 0 { 0 } else { vectors_flat.len() / dim },
                n_features: dim,
            });
        }
        if vectors_flat.len() % dim != 0 {
            let n_full = vectors_flat.len() / dim;
            return Err(ClusterError::RaggedRow {
                row: n_full,
                expected: dim,
                found: vectors_flat.len() - n_full * dim,
            });
        }

        if let Some(pos) = vectors_flat.iter().position(|v| !v.is_finite()) {
            return Err(ClusterError::NonFiniteValue {
                row: pos / dim,
                col: pos % dim,
            });
        }

        let n = vectors_flat.len() / dim;

        Ok(Self {
            vectors_flat,
            dim,
            n,
        })
    }

    /// Returns the number of samples
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n
    }

    /// Returns the number of features
    #[inline]
    pub fn n_features(&self) -> usize {
        self.dim
    }

    /// Returns the flattened data
    #[inline]
    pub fn vectors_flat(&self) -> &[T] {
        &self.vectors_flat
    }

    /// Returns sample `i`
    ///
    /// ### Params
    ///
    /// * `i` - Sample index
    ///
    /// ### Returns
    ///
    /// Slice of length `n_features`
    #[inline(always)]
    pub fn row(&self, i: usize) -> &[T] {
        &self.vectors_flat[i * self.dim..(i + 1) * self.dim]
    }

    /// Gather a subset of samples
    ///
    /// ### Params
    ///
    /// * `indices` - Sample indices
    ///
    /// ### Returns
    ///
    /// One slice per index, in the given order
    pub fn gather(&self, indices: &[usize]) -> Vec<&[T]> {
        indices.iter().map(|&i| self.row(i)).collect()
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    #[test]
    fn test_from_mat() {
        let mat = Mat::from_fn(3, 2, |i, j| (i * 2 + j) as f64);
        let ds = Dataset::from_mat(mat.as_ref()).unwrap();

        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.row(0), &[0.0, 1.0]);
        assert_eq!(ds.row(2), &[4.0, 5.0]);
    }

    #[test]
    fn test_from_rows() {
        let rows = vec![vec![1.0_f32, 2.0], vec![3.0, 4.0]];
        let ds = Dataset::from_rows(&rows).unwrap();

        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.vectors_flat(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0_f64, 2.0], vec![3.0], vec![4.0, 5.0]];
        let err = Dataset::from_rows(&rows).unwrap_err();

        assert_eq!(
            err,
            ClusterError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_empty_rejected() {
        let rows: Vec<Vec<f64>> = Vec::new();
        assert!(matches!(
            Dataset::from_rows(&rows),
            Err(ClusterError::EmptyDataset { .. })
        ));

        let mat = Mat::<f64>::zeros(4, 0);
        assert!(matches!(
            Dataset::from_mat(mat.as_ref()),
            Err(ClusterError::EmptyDataset {
                n_samples: 0,
                n_features: 0
            })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let rows = vec![vec![1.0_f64, 2.0], vec![3.0, f64::NAN]];
        assert_eq!(
            Dataset::from_rows(&rows).unwrap_err(),
            ClusterError::NonFiniteValue { row: 1, col: 1 }
        );

        let rows = vec![vec![f64::INFINITY, 2.0]];
        assert_eq!(
            Dataset::from_rows(&rows).unwrap_err(),
            ClusterError::NonFiniteValue { row: 0, col: 0 }
        );
    }

    #[test]
    fn test_flat_with_remainder_rejected() {
        let err = Dataset::from_flat(vec![1.0_f64, 2.0, 3.0], 2).unwrap_err();
        assert!(matches!(err, ClusterError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn test_gather() {
        let ds = Dataset::from_flat(vec![0.0_f64, 1.0, 2.0, 3.0, 4.0, 5.0], 2).unwrap();
        let picked = ds.gather(&[2, 0]);

        assert_eq!(picked, vec![&[4.0, 5.0][..], &[0.0, 1.0][..]]);
    }
}
