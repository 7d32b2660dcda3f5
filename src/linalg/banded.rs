//! Banded matrices and banded LU factorization.
//!
//! # Storage
//!
//! An `n x n` matrix with `ml` sub-diagonals and `mu` super-diagonals is held
//! in `ml + mu + 1` rows of length `n` (LAPACK `gbsv` layout, row-major):
//!
//! ```text
//! ab[(mu + i - j) * n + j] = A[i][j]      for  -mu <= i - j <= ml
//! ```
//!
//! Row `mu` of `ab` is the main diagonal. Entries in the corners of the band
//! rows that fall outside the matrix are never read.
//!
//! # Pivoting
//!
//! The factorization pivots only among the `ml` rows below the diagonal, so
//! the factors stay banded: `L` keeps `ml` sub-diagonals and `U` widens to
//! `ml + mu` super-diagonals. This costs `O(n · ml · (ml + mu))` instead of
//! the `O(n³)` of a dense LU. Restricting the pivot search makes the solve
//! less robust than full pivoting on badly conditioned matrices; callers
//! accept that when they request banded mode.

use super::dense::DenseMatrix;
use super::error::{LinalgError, LinalgResult};
use super::traits::LuFactors;

/// Square matrix with a fixed lower/upper bandwidth.
#[derive(Debug, Clone, PartialEq)]
pub struct BandedMatrix {
    n: usize,
    ml: usize,
    mu: usize,
    data: Vec<f64>,
}

fn validate_band(n: usize, ml: usize, mu: usize, context: &str) -> LinalgResult<()> {
    if n == 0 {
        return Err(LinalgError::InvalidBandSpec {
            ml,
            mu,
            n,
            context: format!("{context}: system must have at least one row"),
        });
    }
    if ml >= n || mu >= n {
        return Err(LinalgError::InvalidBandSpec {
            ml,
            mu,
            n,
            context: format!("{context}: bandwidths must be smaller than n"),
        });
    }
    Ok(())
}

impl BandedMatrix {
    /// Create a zero banded matrix.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::InvalidBandSpec`] if `n == 0` or either
    /// bandwidth is not smaller than `n`.
    pub fn zeros(n: usize, ml: usize, mu: usize) -> LinalgResult<Self> {
        validate_band(n, ml, mu, "BandedMatrix::zeros")?;
        Ok(Self {
            n,
            ml,
            mu,
            data: vec![0.0; (ml + mu + 1) * n],
        })
    }

    /// Wrap existing band storage (see the module docs for the layout).
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::InvalidBandSpec`] if the bandwidths do not fit
    /// `n` or `ab` is not `(ml + mu + 1) * n` long.
    pub fn from_band_storage(n: usize, ml: usize, mu: usize, ab: Vec<f64>) -> LinalgResult<Self> {
        validate_band(n, ml, mu, "BandedMatrix::from_band_storage")?;
        let expected = (ml + mu + 1) * n;
        if ab.len() != expected {
            return Err(LinalgError::InvalidBandSpec {
                ml,
                mu,
                n,
                context: format!(
                    "band storage must hold {} values ({} diagonals x {}), got {}",
                    expected,
                    ml + mu + 1,
                    n,
                    ab.len()
                ),
            });
        }
        Ok(Self {
            n,
            ml,
            mu,
            data: ab,
        })
    }

    /// Copy the band of a dense matrix. Entries outside the band are dropped.
    pub fn from_dense(a: &DenseMatrix, ml: usize, mu: usize) -> LinalgResult<Self> {
        let mut m = Self::zeros(a.dim(), ml, mu)?;
        for j in 0..m.n {
            for i in m.row_range(j) {
                m.set(i, j, a.get(i, j));
            }
        }
        Ok(m)
    }

    /// Expand into a dense matrix.
    pub fn to_dense(&self) -> DenseMatrix {
        let mut d = DenseMatrix::zeros(self.n);
        for j in 0..self.n {
            for i in self.row_range(j) {
                d.set(i, j, self.get(i, j));
            }
        }
        d
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// Number of sub-diagonals.
    pub fn ml(&self) -> usize {
        self.ml
    }

    /// Number of super-diagonals.
    pub fn mu(&self) -> usize {
        self.mu
    }

    /// Raw band storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Whether `(i, j)` lies inside the band.
    pub fn in_band(&self, i: usize, j: usize) -> bool {
        i < self.n && j < self.n && i + self.mu >= j && j + self.ml >= i
    }

    /// Rows of column `j` that fall inside the band.
    pub fn row_range(&self, j: usize) -> std::ops::RangeInclusive<usize> {
        j.saturating_sub(self.mu)..=(j + self.ml).min(self.n - 1)
    }

    /// Entry `(i, j)`; zero outside the band.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if self.in_band(i, j) {
            self.data[(self.mu + i - j) * self.n + j]
        } else {
            0.0
        }
    }

    /// Set entry `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` lies outside the band.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(
            self.in_band(i, j),
            "entry ({i}, {j}) outside band (ml = {}, mu = {})",
            self.ml,
            self.mu
        );
        self.data[(self.mu + i - j) * self.n + j] = value;
    }

    /// Reset every entry to zero.
    pub fn fill_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Matrix-vector product `A x`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n];
        for j in 0..self.n {
            for i in self.row_range(j) {
                out[i] += self.get(i, j) * x[j];
            }
        }
        out
    }

    /// Factorize `A = P L U` with in-band pivoting.
    pub fn lu(&self) -> LinalgResult<BandedLu> {
        BandedLu::factorize(self)
    }
}

/// Banded LU factors.
///
/// Holds `2·ml + mu + 1` rows: the original band plus `ml` extra
/// super-diagonals for the fill-in produced by row interchanges.
#[derive(Debug, Clone)]
pub struct BandedLu {
    n: usize,
    ml: usize,
    kv: usize,
    lu: Vec<f64>,
    pivots: Vec<usize>,
    flops: usize,
}

impl BandedLu {
    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        (self.kv + i - j) * self.n + j
    }

    /// Factorize a banded matrix.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::Singular`] when no nonzero pivot exists within
    /// the band of a column.
    pub fn factorize(a: &BandedMatrix) -> LinalgResult<Self> {
        let n = a.n;
        let ml = a.ml;
        let kv = a.ml + a.mu;
        let rows = kv + ml + 1;

        let mut f = Self {
            n,
            ml,
            kv,
            lu: vec![0.0; rows * n],
            pivots: vec![0; n],
            flops: 0,
        };
        for j in 0..n {
            for i in a.row_range(j) {
                let at = f.idx(i, j);
                f.lu[at] = a.get(i, j);
            }
        }

        for k in 0..n {
            let last = (k + ml).min(n - 1);
            let mut p = k;
            let mut pivot_val = f.lu[f.idx(k, k)].abs();
            for i in (k + 1)..=last {
                let v = f.lu[f.idx(i, k)].abs();
                if v > pivot_val {
                    pivot_val = v;
                    p = i;
                }
            }
            if pivot_val == 0.0 {
                return Err(LinalgError::Singular { column: k });
            }
            f.pivots[k] = p;

            let jend = (k + kv).min(n - 1);
            if p != k {
                for j in k..=jend {
                    let (ik, ip) = (f.idx(k, j), f.idx(p, j));
                    f.lu.swap(ik, ip);
                }
            }

            let akk = f.lu[f.idx(k, k)];
            for i in (k + 1)..=last {
                let at = f.idx(i, k);
                let factor = f.lu[at] / akk;
                f.lu[at] = factor;
                if factor == 0.0 {
                    continue;
                }
                for j in (k + 1)..=jend {
                    let (ij, kj) = (f.idx(i, j), f.idx(k, j));
                    f.lu[ij] -= factor * f.lu[kj];
                }
                f.flops += jend - k;
            }
        }

        Ok(f)
    }
}

impl LuFactors for BandedLu {
    fn dim(&self) -> usize {
        self.n
    }

    fn solve_in_place(&self, b: &mut [f64]) -> LinalgResult<()> {
        let n = self.n;
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                got: b.len(),
                context: "BandedLu::solve: right-hand side".to_string(),
            });
        }

        // L y = P b, interchanges applied in factorization order
        for k in 0..n {
            let p = self.pivots[k];
            if p != k {
                b.swap(k, p);
            }
            let last = (k + self.ml).min(n - 1);
            for i in (k + 1)..=last {
                b[i] -= self.lu[self.idx(i, k)] * b[k];
            }
        }

        // U x = y
        for i in (0..n).rev() {
            let jend = (i + self.kv).min(n - 1);
            let mut sum = b[i];
            for j in (i + 1)..=jend {
                sum -= self.lu[self.idx(i, j)] * b[j];
            }
            b[i] = sum / self.lu[self.idx(i, i)];
        }
        Ok(())
    }

    fn flops(&self) -> usize {
        self.flops
    }
}

/// Solve `A x = b` for a banded `A` given in band storage.
///
/// # Arguments
///
/// * `ml` - Number of sub-diagonals
/// * `mu` - Number of super-diagonals
/// * `ab` - Band storage, `(ml + mu + 1) * n` values (see module docs)
/// * `b` - Right-hand side of length `n`
///
/// # Errors
///
/// [`LinalgError::InvalidBandSpec`] for inconsistent bandwidths or storage,
/// [`LinalgError::Singular`] for a zero pivot.
///
/// # Example
///
/// ```
/// use numint::linalg::solve_banded;
///
/// // Tridiagonal [[2,-1,0],[-1,2,-1],[0,-1,2]]
/// let ab = vec![
///     0.0, -1.0, -1.0, // super-diagonal
///     2.0, 2.0, 2.0,   // diagonal
///     -1.0, -1.0, 0.0, // sub-diagonal
/// ];
/// let x = solve_banded(1, 1, &ab, &[1.0, 0.0, 1.0]).unwrap();
/// for xi in x {
///     assert!((xi - 1.0).abs() < 1e-12);
/// }
/// ```
pub fn solve_banded(ml: usize, mu: usize, ab: &[f64], b: &[f64]) -> LinalgResult<Vec<f64>> {
    let a = BandedMatrix::from_band_storage(b.len(), ml, mu, ab.to_vec())?;
    a.lu()?.solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::dense::solve_dense;

    fn pentadiagonal(n: usize) -> BandedMatrix {
        let mut a = BandedMatrix::zeros(n, 2, 2).unwrap();
        for i in 0..n {
            a.set(i, i, 6.0 + i as f64 * 0.01);
            if i >= 1 {
                a.set(i, i - 1, -2.0);
                a.set(i - 1, i, -1.5);
            }
            if i >= 2 {
                a.set(i, i - 2, 0.5);
                a.set(i - 2, i, 0.25);
            }
        }
        a
    }

    #[test]
    fn test_storage_layout() {
        let mut a = BandedMatrix::zeros(4, 1, 2).unwrap();
        a.set(2, 1, 7.0);
        a.set(0, 2, 3.0);
        assert_eq!(a.get(2, 1), 7.0);
        assert_eq!(a.get(0, 2), 3.0);
        assert_eq!(a.get(3, 0), 0.0);
        // (mu + i - j) * n + j
        assert_eq!(a.as_slice()[(2 + 2 - 1) * 4 + 1], 7.0);
        assert_eq!(a.as_slice()[2], 3.0);
    }

    #[test]
    fn test_dense_round_trip() {
        let a = pentadiagonal(7);
        let back = BandedMatrix::from_dense(&a.to_dense(), 2, 2).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn test_matches_dense_solve() {
        let n = 40;
        let a = pentadiagonal(n);
        let b: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin() + 1.0).collect();

        let x_band = a.lu().unwrap().solve(&b).unwrap();
        let x_dense = solve_dense(&a.to_dense(), &b).unwrap();
        for (xb, xd) in x_band.iter().zip(&x_dense) {
            assert!((xb - xd).abs() < 1e-12, "{} vs {}", xb, xd);
        }
    }

    #[test]
    fn test_pivoting_within_band() {
        // Tiny diagonal forces interchanges inside the band
        let n = 6;
        let mut a = BandedMatrix::zeros(n, 1, 1).unwrap();
        for i in 0..n {
            a.set(i, i, 1e-14);
            if i + 1 < n {
                a.set(i + 1, i, 2.0);
                a.set(i, i + 1, 1.0);
            }
        }
        let x_true: Vec<f64> = (0..n).map(|i| i as f64 - 2.5).collect();
        let b = a.mul_vec(&x_true);
        let x = a.lu().unwrap().solve(&b).unwrap();
        for (xi, ti) in x.iter().zip(&x_true) {
            assert!((xi - ti).abs() < 1e-10, "{} vs {}", xi, ti);
        }
    }

    #[test]
    fn test_invalid_band_spec() {
        assert!(matches!(
            BandedMatrix::zeros(3, 3, 0),
            Err(LinalgError::InvalidBandSpec { .. })
        ));
        assert!(matches!(
            solve_banded(1, 1, &[1.0; 8], &[1.0, 2.0, 3.0]),
            Err(LinalgError::InvalidBandSpec { .. })
        ));
        assert!(matches!(
            solve_banded(0, 0, &[], &[]),
            Err(LinalgError::InvalidBandSpec { .. })
        ));
    }

    #[test]
    fn test_singular_band() {
        let a = BandedMatrix::zeros(3, 1, 1).unwrap();
        assert!(matches!(a.lu(), Err(LinalgError::Singular { column: 0 })));
    }

    #[test]
    fn test_flop_count_is_linear_in_n() {
        let small = pentadiagonal(100).lu().unwrap().flops();
        let large = pentadiagonal(200).lu().unwrap().flops();
        // Doubling n roughly doubles the work
        assert!(large < 3 * small, "{} vs {}", large, small);
    }
}
