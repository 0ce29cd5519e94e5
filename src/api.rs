#![allow(non_snake_case)]

//! Entry points taking the system matrices directly.
//!
//! These are what an estimation driver calls once per parameter draw. Each builds and validates
//! the [`StateSpaceSystem`] and [`Observations`], then runs one recursion.

use nalgebra::{DMatrix, DVector};

use crate::error::Result;
use crate::filters::chandrasekhar::ChandrasekharFilter;
use crate::filters::kalman::KalmanFilter;
use crate::filters::smoother::{FilterSmoothResult, KalmanSmoother};
use crate::models::{Observations, StateSpaceSystem};
use crate::options::FilterOptions;

#[allow(clippy::too_many_arguments)]
fn prepare(
    observations: &DMatrix<f64>,
    TT: &DMatrix<f64>,
    RR: &DMatrix<f64>,
    QQ: &DMatrix<f64>,
    DD: &DVector<f64>,
    ZZ: &DMatrix<f64>,
    HH: &DMatrix<f64>,
    P0: &DMatrix<f64>,
) -> Result<(Observations, StateSpaceSystem)> {
    let system = StateSpaceSystem::new(
        TT.clone(),
        RR.clone(),
        QQ.clone(),
        DD.clone(),
        ZZ.clone(),
        HH.clone(),
        P0.clone(),
    )?;
    let observations = Observations::new(observations.clone())?;
    system.check_observations(&observations)?;
    Ok((observations, system))
}

/// Kalman filter log-likelihood of an nobs x ny series, NaN marking missing values.
#[allow(clippy::too_many_arguments)]
pub fn log_likelihood_kalman(
    observations: &DMatrix<f64>,
    TT: &DMatrix<f64>,
    RR: &DMatrix<f64>,
    QQ: &DMatrix<f64>,
    DD: &DVector<f64>,
    ZZ: &DMatrix<f64>,
    HH: &DMatrix<f64>,
    P0: &DMatrix<f64>,
    burn_in: usize,
) -> Result<f64> {
    let (y, system) = prepare(observations, TT, RR, QQ, DD, ZZ, HH, P0)?;
    KalmanFilter::new(FilterOptions::new(burn_in)).run(&y, &system)
}

/// Chandrasekhar recursion log-likelihood of a complete nobs x ny series.
///
/// Any NaN in `observations` is a [`FilterError::Precondition`](crate::FilterError::Precondition) error.
#[allow(clippy::too_many_arguments)]
pub fn log_likelihood_chandrasekhar(
    observations: &DMatrix<f64>,
    TT: &DMatrix<f64>,
    RR: &DMatrix<f64>,
    QQ: &DMatrix<f64>,
    DD: &DVector<f64>,
    ZZ: &DMatrix<f64>,
    HH: &DMatrix<f64>,
    P0: &DMatrix<f64>,
    burn_in: usize,
) -> Result<f64> {
    let (y, system) = prepare(observations, TT, RR, QQ, DD, ZZ, HH, P0)?;
    ChandrasekharFilter::new(FilterOptions::new(burn_in)).run(&y, &system)
}

/// Log-likelihood with forecast, filtered and smoothed state moments.
#[allow(clippy::too_many_arguments)]
pub fn filter_and_smooth(
    observations: &DMatrix<f64>,
    TT: &DMatrix<f64>,
    RR: &DMatrix<f64>,
    QQ: &DMatrix<f64>,
    DD: &DVector<f64>,
    ZZ: &DMatrix<f64>,
    HH: &DMatrix<f64>,
    P0: &DMatrix<f64>,
    burn_in: usize,
) -> Result<FilterSmoothResult> {
    let (y, system) = prepare(observations, TT, RR, QQ, DD, ZZ, HH, P0)?;
    KalmanSmoother::new(FilterOptions::new(burn_in)).run(&y, &system)
}
