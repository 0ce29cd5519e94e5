//! Filter options.
//!
//! Collects the knobs shared by the recursions. Options are plain data; [`FilterOptions::validate`]
//! is called by every recursion before the first period is processed.

use crate::error::{FilterError, Result};

/// Default cutoff for the smoother's pseudo-inverse, as numpy's `pinv`.
pub const DEFAULT_PINV_RCOND: f64 = 1e-15;
/// Default relative residual of P0 = T.P0.T' + RQR' tolerated by the Chandrasekhar filter.
pub const DEFAULT_STATIONARITY_TOLERANCE: f64 = 1e-8;

/// Options of the Kalman, Chandrasekhar and smoother recursions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOptions {
    /// Periods at the start of the series whose likelihood contribution is excluded.
    pub burn_in: usize,
    /// Eigenvalues of a forecast covariance below `pinv_rcond * max|eigenvalue|` are treated as zero.
    pub pinv_rcond: f64,
    /// Innovation covariances with a smaller reciprocal condition estimate are numerically singular.
    pub min_rcond: f64,
    /// Relative Lyapunov residual of P0 above which a non-stationary P0 is reported.
    pub stationarity_tolerance: f64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            burn_in: 0,
            pinv_rcond: DEFAULT_PINV_RCOND,
            min_rcond: f64::EPSILON,
            stationarity_tolerance: DEFAULT_STATIONARITY_TOLERANCE,
        }
    }
}

impl FilterOptions {
    pub fn new(burn_in: usize) -> Self {
        FilterOptions {
            burn_in,
            ..FilterOptions::default()
        }
    }

    pub fn with_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    pub fn with_pinv_rcond(mut self, pinv_rcond: f64) -> Self {
        self.pinv_rcond = pinv_rcond;
        self
    }

    pub fn with_min_rcond(mut self, min_rcond: f64) -> Self {
        self.min_rcond = min_rcond;
        self
    }

    pub fn with_stationarity_tolerance(mut self, tolerance: f64) -> Self {
        self.stationarity_tolerance = tolerance;
        self
    }

    /// Checks the options against a series of `nobs` periods.
    pub fn validate(&self, nobs: usize) -> Result<()> {
        if self.burn_in >= nobs {
            return Err(FilterError::Precondition(format!(
                "burn_in {} must be less than the number of observations {}",
                self.burn_in, nobs
            )));
        }
        check_tolerance(self.pinv_rcond, "pinv_rcond")?;
        check_tolerance(self.min_rcond, "min_rcond")?;
        check_tolerance(self.stationarity_tolerance, "stationarity_tolerance")?;
        Ok(())
    }
}

fn check_tolerance(value: f64, name: &str) -> Result<()> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(FilterError::Precondition(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )))
    }
}
