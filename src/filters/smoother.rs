#![allow(non_snake_case)]

//! Forward filter and backward Rauch-Tung-Striebel smoother.
//!
//! The forward pass is the Kalman filter of [`super::kalman`] written as separate observe and
//! predict steps, recording in every period
//! - the forecast moments, before y_t is seen
//! - the filtered moments, after y_t is seen (equal to the forecast when nothing is observed)
//!
//! The backward pass conditions on the whole series, from the last period back to the first:
//!
//! `J = X_{t|t}.TT'.pinv(X_{t+1|t})`
//!
//! `x_{t|n} = x_{t|t} + J.(x_{t+1|n} - x_{t+1|t})`
//!
//! `X_{t|n} = X_{t|t} + J.(X_{t+1|n} - X_{t+1|t}).J'`
//!
//! A pseudo-inverse is used as forecast covariances may be singular.

use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector};

use super::innovate;
use crate::error::{FilterError, Result};
use crate::linalg::{diagonal_std, pseudo_inverse_symmetric, symmetrize, symmetrized};
use crate::models::{KalmanState, Observations, StateSpaceSystem};
use crate::options::FilterOptions;

/// State means, covariances and standard deviations of every period.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMoments {
    pub means: Vec<DVector<f64>>,
    pub covs: Vec<DMatrix<f64>>,
    /// Square roots of the covariance diagonals.
    pub stds: Vec<DVector<f64>>,
}

impl StateMoments {
    fn with_capacity(nobs: usize) -> Self {
        StateMoments {
            means: Vec::with_capacity(nobs),
            covs: Vec::with_capacity(nobs),
            stds: Vec::with_capacity(nobs),
        }
    }

    fn push(&mut self, x: DVector<f64>, X: DMatrix<f64>) {
        self.stds.push(diagonal_std(&X));
        self.means.push(x);
        self.covs.push(X);
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// Output of [`KalmanSmoother::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSmoothResult {
    /// Log-likelihood excluding the burn-in periods.
    pub log_likelihood: f64,
    /// Log density of each period, zero in burn-in periods and in periods with nothing observed.
    pub log_likelihoods: DVector<f64>,
    /// State moments before observing each period.
    pub forecast: StateMoments,
    /// State moments after observing each period.
    pub filtered: StateMoments,
    /// State moments conditioned on the whole series.
    pub smoothed: StateMoments,
}

/// Kalman filter followed by a Rauch-Tung-Striebel smoother.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KalmanSmoother {
    pub options: FilterOptions,
}

impl KalmanSmoother {
    pub fn new(options: FilterOptions) -> Self {
        KalmanSmoother { options }
    }

    pub fn run(&self, observations: &Observations, system: &StateSpaceSystem) -> Result<FilterSmoothResult> {
        system.check_observations(observations)?;
        let nobs = observations.nobs();
        self.options.validate(nobs)?;
        debug!(
            "kalman smoother: nobs {} ns {} ny {} burn_in {}",
            nobs,
            system.ns(),
            system.ny(),
            self.options.burn_in
        );

        let (log_likelihoods, forecast, filtered) = self.forward(observations, system).map_err(|err| {
            warn!("kalman smoother forward pass: {}", err);
            err
        })?;
        let smoothed = self.backward(system, &forecast, &filtered).map_err(|err| {
            warn!("kalman smoother backward pass: {}", err);
            err
        })?;

        Ok(FilterSmoothResult {
            log_likelihood: log_likelihoods.sum(),
            log_likelihoods,
            forecast,
            filtered,
            smoothed,
        })
    }

    fn forward(
        &self,
        observations: &Observations,
        system: &StateSpaceSystem,
    ) -> Result<(DVector<f64>, StateMoments, StateMoments)> {
        let nobs = observations.nobs();
        let mut log_likelihoods = DVector::zeros(nobs);
        let mut forecast = StateMoments::with_capacity(nobs);
        let mut filtered = StateMoments::with_capacity(nobs);

        let mut state = KalmanState::initial(system);
        let mut observed = Vec::with_capacity(system.ny());

        for t in 0..nobs {
            let X = symmetrized(&state.X);
            forecast.push(state.x.clone(), X.clone());

            observations.observed_indices_into(t, &mut observed);
            let posterior = if observed.is_empty() {
                KalmanState { x: state.x, X }
            } else {
                let m = system.measurement(observations, t, &observed);
                let innovation = innovate(&m, &state.x, &X, &self.options, t)?;
                if t >= self.options.burn_in {
                    log_likelihoods[t] = innovation.log_likelihood;
                }
                trace!("kalman smoother: period {} log likelihood {}", t, innovation.log_likelihood);

                // Gain K = X.Z'
                let K = &X * m.Z.transpose();
                let x = &state.x + &K * &innovation.Fiv;
                // X - K.F^-1.K'
                let mut Xf = X;
                Xf.gemm(-1., &K, &innovation.F.solve(&K.transpose()), 1.);
                symmetrize(&mut Xf);
                KalmanState { x, X: Xf }
            };

            // Predict the next period
            let x = system.TT() * &posterior.x;
            let mut X = system.rqr().clone();
            X.quadform_tr(1., system.TT(), &posterior.X, 1.);
            symmetrize(&mut X);
            state = KalmanState { x, X };

            filtered.push(posterior.x, posterior.X);
        }

        Ok((log_likelihoods, forecast, filtered))
    }

    fn backward(
        &self,
        system: &StateSpaceSystem,
        forecast: &StateMoments,
        filtered: &StateMoments,
    ) -> Result<StateMoments> {
        let nobs = filtered.len();
        let TTt = system.TT().transpose();

        // The last period has no information beyond the filter
        let mut means = filtered.means.clone();
        let mut covs = filtered.covs.clone();

        for t in (0..nobs.saturating_sub(1)).rev() {
            let Xinv = pseudo_inverse_symmetric(&forecast.covs[t + 1], self.options.pinv_rcond).map_err(|reason| {
                FilterError::numerical(t + 1, format!("forecast covariance pseudo-inverse {}", reason))
            })?;
            let J = &filtered.covs[t] * &TTt * Xinv;

            let x = &filtered.means[t] + &J * (&means[t + 1] - &forecast.means[t + 1]);
            let mut X = filtered.covs[t].clone();
            X.quadform_tr(1., &J, &(&covs[t + 1] - &forecast.covs[t + 1]), 1.);
            symmetrize(&mut X);

            means[t] = x;
            covs[t] = X;
        }

        let stds = covs.iter().map(diagonal_std).collect();
        Ok(StateMoments { means, covs, stds })
    }
}
