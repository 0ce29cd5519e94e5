#![allow(non_snake_case)]

//! Likelihood filters and the smoother.
//!
//! Each recursion is a single pass over the observations that threads its own state through
//! the periods. Nothing is shared between calls.

pub mod chandrasekhar;
pub mod kalman;
pub mod smoother;

use nalgebra::{DMatrix, DVector};

use crate::error::{FilterError, Result};
use crate::linalg::{symmetrize, SpdFactor};
use crate::models::Measurement;
use crate::options::FilterOptions;

/// Factorises an innovation covariance, rejecting singular or ill-conditioned ones.
pub(crate) fn factor_innovation_covariance(F: DMatrix<f64>, options: &FilterOptions, t: usize) -> Result<SpdFactor> {
    let factor =
        SpdFactor::new(F).map_err(|reason| FilterError::numerical(t, format!("innovation covariance {}", reason)))?;
    let rcond = factor.rcond();
    if rcond < options.min_rcond {
        return Err(FilterError::numerical(
            t,
            format!("innovation covariance ill-conditioned, rcond {:e}", rcond),
        ));
    }
    Ok(factor)
}

/// Gaussian log density of the innovation v with covariance F, and F^-1 v.
pub(crate) fn log_density(F: &SpdFactor, v: &DVector<f64>) -> (f64, DVector<f64>) {
    let ln_2pi = (2. * std::f64::consts::PI).ln();
    let (quad, Fiv) = F.quadform_inv(v);
    let k = v.len() as f64;
    (-0.5 * (k * ln_2pi + F.log_determinant() + quad), Fiv)
}

/// Innovation of one period's observed coordinates.
pub(crate) struct Innovation {
    /// Factor of the innovation covariance F
    pub F: SpdFactor,
    /// F^-1 v
    pub Fiv: DVector<f64>,
    /// Log density of the observed coordinates
    pub log_likelihood: f64,
}

/// Innovation given the forecast state x and covariance X.
///
/// `v = y - (Z.x + D)`, `F = Z.X.Z' + H`
pub(crate) fn innovate(
    m: &Measurement,
    x: &DVector<f64>,
    X: &DMatrix<f64>,
    options: &FilterOptions,
    t: usize,
) -> Result<Innovation> {
    let v = &m.y - (&*m.Z * x + &*m.D);

    let mut F = m.H.clone().into_owned();
    F.quadform_tr(1., &*m.Z, X, 1.);
    symmetrize(&mut F);

    let F = factor_innovation_covariance(F, options, t)?;
    let (log_likelihood, Fiv) = log_density(&F, &v);
    if !log_likelihood.is_finite() {
        return Err(FilterError::numerical(t, "log likelihood not finite"));
    }
    Ok(Innovation { F, Fiv, log_likelihood })
}
