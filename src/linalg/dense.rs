//! Dense square matrices and LU factorization with partial pivoting.

use super::error::{LinalgError, LinalgResult};
use super::traits::LuFactors;

/// Square matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Create an `n x n` zero matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Build a matrix from its rows.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::DimensionMismatch`] if any row length differs
    /// from the number of rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> LinalgResult<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for row in rows {
            if row.len() != n {
                return Err(LinalgError::DimensionMismatch {
                    expected: n,
                    got: row.len(),
                    context: "DenseMatrix::from_rows: row length".to_string(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { n, data })
    }

    /// Dimension of the matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Entry `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Set entry `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    /// Row-major view of the entries.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Reset every entry to zero.
    pub fn fill_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Matrix-vector product `A x`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        let n = self.n;
        (0..n)
            .map(|i| {
                self.data[i * n..(i + 1) * n]
                    .iter()
                    .zip(x)
                    .map(|(a, b)| a * b)
                    .sum()
            })
            .collect()
    }

    /// Factorize `A = P L U`.
    pub fn lu(&self) -> LinalgResult<DenseLu> {
        DenseLu::factorize(self.clone())
    }
}

/// LU factors of a dense matrix, `L` and `U` packed in place.
#[derive(Debug, Clone)]
pub struct DenseLu {
    lu: DenseMatrix,
    pivots: Vec<usize>,
    flops: usize,
}

impl DenseLu {
    /// Factorize with row partial pivoting.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::Singular`] when a column has no nonzero pivot.
    pub fn factorize(mut a: DenseMatrix) -> LinalgResult<Self> {
        let n = a.n;
        let mut pivots = vec![0; n];
        let mut flops = 0;

        for k in 0..n {
            let mut p = k;
            let mut pivot_val = a.get(k, k).abs();
            for i in (k + 1)..n {
                let v = a.get(i, k).abs();
                if v > pivot_val {
                    pivot_val = v;
                    p = i;
                }
            }
            if pivot_val == 0.0 {
                return Err(LinalgError::Singular { column: k });
            }
            pivots[k] = p;
            if p != k {
                for j in 0..n {
                    a.data.swap(k * n + j, p * n + j);
                }
            }

            let akk = a.get(k, k);
            for i in (k + 1)..n {
                let factor = a.get(i, k) / akk;
                a.set(i, k, factor);
                if factor == 0.0 {
                    continue;
                }
                for j in (k + 1)..n {
                    a.data[i * n + j] -= factor * a.data[k * n + j];
                }
                flops += n - k - 1;
            }
        }

        Ok(Self {
            lu: a,
            pivots,
            flops,
        })
    }
}

impl LuFactors for DenseLu {
    fn dim(&self) -> usize {
        self.lu.n
    }

    fn solve_in_place(&self, b: &mut [f64]) -> LinalgResult<()> {
        let n = self.lu.n;
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                got: b.len(),
                context: "DenseLu::solve: right-hand side".to_string(),
            });
        }

        for k in 0..n {
            b.swap(k, self.pivots[k]);
        }
        for i in 0..n {
            let mut sum = b[i];
            for k in 0..i {
                sum -= self.lu.get(i, k) * b[k];
            }
            b[i] = sum;
        }
        for i in (0..n).rev() {
            let mut sum = b[i];
            for k in (i + 1)..n {
                sum -= self.lu.get(i, k) * b[k];
            }
            b[i] = sum / self.lu.get(i, i);
        }
        Ok(())
    }

    fn flops(&self) -> usize {
        self.flops
    }
}

/// Solve a dense system `A x = b`.
///
/// # Example
///
/// ```
/// use numint::linalg::{DenseMatrix, solve_dense};
///
/// let a = DenseMatrix::from_rows(&[vec![3.0, 2.0], vec![1.0, 4.0]]).unwrap();
/// let x = solve_dense(&a, &[5.0, 6.0]).unwrap();
/// assert!((x[0] - 0.8).abs() < 1e-12);
/// assert!((x[1] - 1.3).abs() < 1e-12);
/// ```
pub fn solve_dense(a: &DenseMatrix, b: &[f64]) -> LinalgResult<Vec<f64>> {
    if b.len() != a.dim() {
        return Err(LinalgError::DimensionMismatch {
            expected: a.dim(),
            got: b.len(),
            context: "solve_dense: right-hand side".to_string(),
        });
    }
    a.lu()?.solve(b)
}
