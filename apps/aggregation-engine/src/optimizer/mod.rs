//! Risk-Parity Portfolio Optimizer
//!
//! Solves for portfolio weights that equalize each asset's contribution
//! to total portfolio risk. The unconstrained objective is
//!
//! ```text
//! f(x) = (1/2) x' S x  -  b' ln(x)
//! ```
//!
//! where `S` is the asset covariance matrix and `b` the risk budget
//! (uniform, `1/N` per asset). A damped Newton iteration drives the
//! gradient to zero, clamping each step into the configured bounds, and
//! the solution is normalized so the weights sum to one.

use thiserror::Error;
use tracing::debug;

pub mod linalg;

use linalg::{LinalgError, Matrix, covariance, vec_dot};

/// Default lower bound on any single raw weight.
pub const DEFAULT_LOWER_BOUND: f64 = 1e-5;
/// Convergence tolerance on the change in objective value.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;
/// Default cap on Newton iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Errors from the risk-parity solver.
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// No assets to optimize over.
    #[error("cannot optimize an empty universe")]
    EmptyUniverse,
    /// Supplied covariance does not match the asset count, or is not
    /// square.
    #[error("covariance shape {rows}x{cols} does not fit {assets} assets")]
    CovarianceShape {
        /// Covariance row count.
        rows: usize,
        /// Covariance column count.
        cols: usize,
        /// Expected asset count.
        assets: usize,
    },
    /// The Newton system could not be solved.
    #[error("singular Hessian at iteration {iteration}")]
    SingularHessian {
        /// Iteration at which inversion failed.
        iteration: usize,
    },
    /// Underlying matrix arithmetic failed.
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

/// Outcome of a risk-parity solve.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskParityWeights {
    /// Normalized portfolio weights, summing to one.
    pub weights: Vec<f64>,
    /// Whether the objective change fell below tolerance before the
    /// iteration cap.
    pub converged: bool,
    /// Newton iterations performed.
    pub iterations: usize,
}

/// Newton-based risk-parity weight solver.
#[derive(Debug, Clone)]
pub struct RiskParityOptimizer {
    lower: f64,
    upper: f64,
    tolerance: f64,
    max_iterations: usize,
}

impl Default for RiskParityOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_LOWER_BOUND, f64::INFINITY)
    }
}

impl RiskParityOptimizer {
    /// Bounded solver. The lower bound is floored at [`DEFAULT_LOWER_BOUND`]
    /// to keep the log-barrier finite; the upper bound is raised to the
    /// lower bound when the caller inverts them.
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        let lower = lower.max(DEFAULT_LOWER_BOUND);
        Self {
            lower,
            upper: upper.max(lower),
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Override the convergence tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Override the iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Solve for risk-parity weights.
    ///
    /// `historical_returns` has one row per observation and one column
    /// per asset; its sample covariance is used unless `covariance` is
    /// supplied. Non-convergence within the iteration cap is not an
    /// error: the best iterate is returned with `converged == false`.
    pub fn optimize(
        &self,
        historical_returns: &Matrix,
        supplied_covariance: Option<Matrix>,
    ) -> Result<RiskParityWeights, OptimizerError> {
        let assets = historical_returns.cols();
        if assets == 0 {
            return Err(OptimizerError::EmptyUniverse);
        }

        let sigma = match supplied_covariance {
            Some(cov) => {
                if !cov.is_square() || cov.rows() != assets {
                    return Err(OptimizerError::CovarianceShape {
                        rows: cov.rows(),
                        cols: cov.cols(),
                        assets,
                    });
                }
                cov
            }
            None => covariance(historical_returns),
        };

        // Uniform risk budget.
        let budget = vec![1.0 / assets as f64; assets];
        let mut x = budget.clone();

        let mut old_objective = f64::MAX;
        let mut new_objective = self.objective(&sigma, &budget, &x)?;
        let mut iterations = 0;

        while (new_objective - old_objective).abs() > self.tolerance
            && iterations < self.max_iterations
        {
            old_objective = new_objective;

            let gradient = self.gradient(&sigma, &budget, &x)?;
            let hessian = self.hessian(&sigma, &budget, &x)?;
            let inverse = hessian.inverse().map_err(|err| match err {
                LinalgError::Singular => OptimizerError::SingularHessian {
                    iteration: iterations,
                },
                other => OptimizerError::Linalg(other),
            })?;
            let step = inverse.mat_vec(&gradient)?;

            for (xi, si) in x.iter_mut().zip(&step) {
                *xi = (*xi - si).clamp(self.lower, self.upper);
            }

            new_objective = self.objective(&sigma, &budget, &x)?;
            iterations += 1;
        }

        let converged = (new_objective - old_objective).abs() <= self.tolerance;
        if !converged {
            debug!(
                iterations,
                objective = new_objective,
                "risk-parity solve hit the iteration cap"
            );
        }

        let total: f64 = x.iter().sum();
        let weights = x.iter().map(|xi| xi / total).collect();

        Ok(RiskParityWeights {
            weights,
            converged,
            iterations,
        })
    }

    /// `f(x) = (1/2) x' S x - b' ln(x)`
    fn objective(&self, sigma: &Matrix, budget: &[f64], x: &[f64]) -> Result<f64, LinalgError> {
        let sx = sigma.mat_vec(x)?;
        let quadratic = 0.5 * vec_dot(x, &sx)?;
        let barrier: f64 = budget.iter().zip(x).map(|(b, xi)| b * xi.ln()).sum();
        Ok(quadratic - barrier)
    }

    /// `g(x) = S x - b / x`
    fn gradient(&self, sigma: &Matrix, budget: &[f64], x: &[f64]) -> Result<Vec<f64>, LinalgError> {
        let sx = sigma.mat_vec(x)?;
        Ok(sx
            .iter()
            .zip(budget)
            .zip(x)
            .map(|((sxi, b), xi)| sxi - b / xi)
            .collect())
    }

    /// `H(x) = S + diag(b / x^2)`
    fn hessian(&self, sigma: &Matrix, budget: &[f64], x: &[f64]) -> Result<Matrix, LinalgError> {
        let diag: Vec<f64> = budget
            .iter()
            .zip(x)
            .map(|(b, xi)| b / (xi * xi))
            .collect();
        sigma.add(&Matrix::diagonal(&diag))
    }
}

// =============================================================================
// Tests
// =============================================================================
