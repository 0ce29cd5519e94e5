//! Error types for state-space filtering.
//!
//! Shape and precondition errors are caller usage errors. Numerical errors are expected
//! during estimation: a parameter vector can produce a system whose innovation covariance
//! is singular, and the estimation driver scores such a draw as having zero probability.

use thiserror::Error;

/// Filtering error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Matrix or observation dimensions are inconsistent.
    #[error("shape error: {0}")]
    Shape(String),

    /// A matrix entry is not finite, or an observation is infinite.
    #[error("non-finite input: {0}")]
    NonFinite(String),

    /// A covariance could not be factorised or solved within tolerance.
    #[error("numerical error{}: {reason}", at_period(.period))]
    Numerical {
        /// Period of the recursion where the failure occurred, if any.
        period: Option<usize>,
        reason: String,
    },

    /// The caller violated a documented precondition.
    #[error("precondition violated: {0}")]
    Precondition(String),
}

fn at_period(period: &Option<usize>) -> String {
    match period {
        Some(t) => format!(" at period {}", t),
        None => String::new(),
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    pub(crate) fn numerical(period: usize, reason: impl Into<String>) -> Self {
        FilterError::Numerical {
            period: Some(period),
            reason: reason.into(),
        }
    }

    /// True for errors caused by ill-conditioned numbers rather than misuse.
    pub fn is_numerical(&self) -> bool {
        matches!(self, FilterError::Numerical { .. })
    }
}

/// Scoring policy for log-likelihood results.
pub trait LikelihoodExt {
    /// Maps a numerical failure to a log-likelihood of negative infinity.
    ///
    /// Shape, non-finite and precondition errors are passed through unchanged.
    fn or_neg_infinity(self) -> Result<f64>;
}

impl LikelihoodExt for Result<f64> {
    fn or_neg_infinity(self) -> Result<f64> {
        match self {
            Err(err) if err.is_numerical() => Ok(f64::NEG_INFINITY),
            other => other,
        }
    }
}
