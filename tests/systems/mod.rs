#![allow(non_snake_case)]
#![allow(dead_code)]

//! Systems and series shared by the integration tests.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use statespace_estimate::{Observations, StateSpaceSystem};

pub fn scalar(v: f64) -> DMatrix<f64> {
    DMatrix::from_element(1, 1, v)
}

/// Random walk observed with noise, all variances 1.
pub fn local_level() -> StateSpaceSystem {
    StateSpaceSystem::new(
        scalar(1.),
        scalar(1.),
        scalar(1.),
        DVector::from_element(1, 0.),
        scalar(1.),
        scalar(1.),
        scalar(1.),
    )
    .unwrap()
}

pub fn series(values: &[f64]) -> Observations {
    Observations::from_row_slice(values.len(), 1, values).unwrap()
}

/// Three states, two observables and two correlated shocks, started from the unconditional covariance.
pub fn var3() -> StateSpaceSystem {
    StateSpaceSystem::with_stationary_covariance(
        DMatrix::from_row_slice(3, 3, &[0.7, 0.1, 0.0, 0.0, 0.5, 0.2, 0.1, 0.0, 0.3]),
        DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 0.5, 0.5]),
        DMatrix::from_row_slice(2, 2, &[1.0, 0.2, 0.2, 0.5]),
        DVector::from_row_slice(&[0.3, -0.2]),
        DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.5, 0.0, 1.0, 0.0]),
        DMatrix::from_row_slice(2, 2, &[0.2, 0.05, 0.05, 0.1]),
    )
    .unwrap()
}

/// Six states driven by one shock and seen through one observable.
pub fn wide() -> StateSpaceSystem {
    let ns = 6;
    let mut TT = DMatrix::zeros(ns, ns);
    for i in 0..ns {
        TT[(i, i)] = 0.9 - 0.1 * i as f64;
        if i > 0 {
            TT[(i, i - 1)] = 0.1;
        }
    }
    StateSpaceSystem::with_stationary_covariance(
        TT,
        DMatrix::from_element(ns, 1, 1.),
        scalar(1.),
        DVector::from_element(1, 0.1),
        DMatrix::from_row_slice(1, ns, &[1.0, 0.5, 0.25, 0.0, 0.0, 1.0]),
        scalar(0.05),
    )
    .unwrap()
}

/// Reproducible series of uniform noise.
pub fn random_series(nobs: usize, ny: usize, seed: u64) -> Observations {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f64> = (0..nobs * ny).map(|_| rng.gen_range(-2.0..2.0)).collect();
    Observations::from_row_slice(nobs, ny, &data).unwrap()
}

/// The same series with the listed (period, coordinate) entries missing.
pub fn with_missing(observations: &Observations, missing: &[(usize, usize)]) -> Observations {
    let mut y = observations.as_matrix().clone();
    for &(t, i) in missing {
        y[(t, i)] = f64::NAN;
    }
    Observations::new(y).unwrap()
}

/// Log density of a series under the local level model computed from the joint Gaussian distribution.
///
/// y ~ N(0, S) with S[s][t] = P0 + min(s, t).Q + H.[s == t]
pub fn local_level_joint_log_density(y: &[f64], P0: f64, Q: f64, H: f64) -> f64 {
    let n = y.len();
    let S = DMatrix::from_fn(n, n, |s, t| P0 + s.min(t) as f64 * Q + if s == t { H } else { 0. });
    let chol = S.cholesky().unwrap();
    let y = DVector::from_row_slice(y);
    let quad = y.dot(&chol.solve(&y));
    let L = chol.l();
    let logdet: f64 = (0..n).map(|i| 2. * L[(i, i)].ln()).sum();
    -0.5 * (n as f64 * (2. * std::f64::consts::PI).ln() + logdet + quad)
}
