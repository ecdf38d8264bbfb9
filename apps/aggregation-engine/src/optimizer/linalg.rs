//! Dense Matrix Helpers
//!
//! Just enough linear algebra for the risk-parity solver: a row-major
//! `f64` matrix, matrix-vector products, a safe Gauss-Jordan inverse with
//! an explicit singularity error, and sample covariance of a returns
//! matrix. Written against `std` only, like the rest of the numeric
//! helpers in this crate.

use thiserror::Error;

/// Pivots smaller than this are treated as zero during elimination.
const PIVOT_EPSILON: f64 = 1e-12;

/// Errors from the dense matrix helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinalgError {
    /// Matrix is singular (or numerically near-singular) and cannot be
    /// inverted.
    #[error("matrix is singular")]
    Singular,
    /// Operation requires a square matrix.
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },
    /// Operand shapes do not line up.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Left operand shape.
        left: usize,
        /// Right operand shape.
        right: usize,
    },
}

/// A dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// A `rows` x `cols` matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from row slices; all rows must have equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, LinalgError> {
        let cols = rows.first().map_or(0, Vec::len);
        for row in rows {
            if row.len() != cols {
                return Err(LinalgError::DimensionMismatch {
                    left: cols,
                    right: row.len(),
                });
            }
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    /// A square matrix with `values` on the diagonal.
    #[must_use]
    pub fn diagonal(values: &[f64]) -> Self {
        let n = values.len();
        let mut m = Self::zeros(n, n);
        for (i, v) in values.iter().enumerate() {
            m.set(i, i, *v);
        }
        m
    }

    /// Row count.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix is square.
    #[must_use]
    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Element at (row, col).
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Set the element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// One column as a vector.
    #[must_use]
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    /// Matrix-vector product `Av`.
    pub fn mat_vec(&self, v: &[f64]) -> Result<Vec<f64>, LinalgError> {
        if v.len() != self.cols {
            return Err(LinalgError::DimensionMismatch {
                left: self.cols,
                right: v.len(),
            });
        }
        Ok((0..self.rows)
            .map(|r| (0..self.cols).map(|c| self.get(r, c) * v[c]).sum())
            .collect())
    }

    /// Elementwise sum `A + B`.
    pub fn add(&self, other: &Self) -> Result<Self, LinalgError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(LinalgError::DimensionMismatch {
                left: self.rows * self.cols,
                right: other.rows * other.cols,
            });
        }
        let mut out = self.clone();
        for (a, b) in out.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(out)
    }

    /// Inverse via Gauss-Jordan elimination with partial pivoting.
    ///
    /// A pivot below `1e-12` in absolute value signals a singular (or
    /// numerically near-singular) matrix.
    pub fn inverse(&self) -> Result<Self, LinalgError> {
        if !self.is_square() {
            return Err(LinalgError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }

        let n = self.rows;
        let mut work = self.clone();
        let mut inv = Self::diagonal(&vec![1.0; n]);

        for col in 0..n {
            // Partial pivot: largest magnitude in this column at or below
            // the diagonal.
            let pivot_row = (col..n)
                .max_by(|&a, &b| {
                    work.get(a, col)
                        .abs()
                        .total_cmp(&work.get(b, col).abs())
                })
                .unwrap_or(col);

            let pivot = work.get(pivot_row, col);
            if pivot.abs() < PIVOT_EPSILON {
                return Err(LinalgError::Singular);
            }

            if pivot_row != col {
                for c in 0..n {
                    let (a, b) = (work.get(col, c), work.get(pivot_row, c));
                    work.set(col, c, b);
                    work.set(pivot_row, c, a);
                    let (a, b) = (inv.get(col, c), inv.get(pivot_row, c));
                    inv.set(col, c, b);
                    inv.set(pivot_row, c, a);
                }
            }

            let scale = 1.0 / work.get(col, col);
            for c in 0..n {
                work.set(col, c, work.get(col, c) * scale);
                inv.set(col, c, inv.get(col, c) * scale);
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = work.get(row, col);
                if factor == 0.0 {
                    continue;
                }
                for c in 0..n {
                    work.set(row, c, work.get(row, c) - factor * work.get(col, c));
                    inv.set(row, c, inv.get(row, c) - factor * inv.get(col, c));
                }
            }
        }

        Ok(inv)
    }
}

/// Dot product of two equal-length vectors.
pub fn vec_dot(a: &[f64], b: &[f64]) -> Result<f64, LinalgError> {
    if a.len() != b.len() {
        return Err(LinalgError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Sample covariance of a returns matrix.
///
/// Rows are observations, columns are assets; normalization is `N - 1`.
#[must_use]
pub fn covariance(returns: &Matrix) -> Matrix {
    let observations = returns.rows();
    let assets = returns.cols();
    let mut cov = Matrix::zeros(assets, assets);
    if observations < 2 {
        return cov;
    }

    let means: Vec<f64> = (0..assets)
        .map(|c| returns.column(c).iter().sum::<f64>() / observations as f64)
        .collect();

    for i in 0..assets {
        for j in i..assets {
            let mut sum = 0.0;
            for r in 0..observations {
                sum += (returns.get(r, i) - means[i]) * (returns.get(r, j) - means[j]);
            }
            let value = sum / (observations - 1) as f64;
            cov.set(i, j, value);
            cov.set(j, i, value);
        }
    }
    cov
}

// =============================================================================
// Tests
// =============================================================================
