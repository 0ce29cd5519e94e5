#![allow(non_snake_case)]

//! Kalman filter log-likelihood.
//!
//! Riccati recursion on the forecast moments `(x, X)` of the state:
//!
//! `x <- TT.x + K.F^-1.v`
//!
//! `X <- TT.X.TT' - K.F^-1.K' + RR.QQ.RR'`,  with gain `K = TT.X.Z'`
//!
//! Coordinates of a period that are NaN are dropped from the measurement equation for that period.
//! A period with nothing observed contributes nothing and only propagates the state.

use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector};

use super::innovate;
use crate::error::Result;
use crate::linalg::symmetrize;
use crate::models::{KalmanState, Observations, StateSpaceSystem};
use crate::options::FilterOptions;

/// Kalman filter evaluating the Gaussian log-likelihood of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KalmanFilter {
    pub options: FilterOptions,
}

/// Buffers reused across periods.
struct Workspace {
    observed: Vec<usize>,
    TX: DMatrix<f64>,
    X_next: DMatrix<f64>,
    x_next: DVector<f64>,
}

impl Workspace {
    fn new(ns: usize, ny: usize) -> Self {
        Workspace {
            observed: Vec::with_capacity(ny),
            TX: DMatrix::zeros(ns, ns),
            X_next: DMatrix::zeros(ns, ns),
            x_next: DVector::zeros(ns),
        }
    }
}

impl KalmanFilter {
    pub fn new(options: FilterOptions) -> Self {
        KalmanFilter { options }
    }

    /// Log-likelihood of the observations, excluding the first `burn_in` periods.
    pub fn run(&self, observations: &Observations, system: &StateSpaceSystem) -> Result<f64> {
        system.check_observations(observations)?;
        let nobs = observations.nobs();
        self.options.validate(nobs)?;
        debug!(
            "kalman filter: nobs {} ns {} ny {} burn_in {}",
            nobs,
            system.ns(),
            system.ny(),
            self.options.burn_in
        );

        let mut ws = Workspace::new(system.ns(), system.ny());
        let mut state = KalmanState::initial(system);
        let mut loglh = 0.;

        for t in 0..nobs {
            let contribution = self.step(&mut state, &mut ws, observations, system, t).map_err(|err| {
                warn!("kalman filter: {}", err);
                err
            })?;
            trace!("kalman filter: period {} log likelihood {}", t, contribution);
            if t >= self.options.burn_in {
                loglh += contribution;
            }
        }

        Ok(loglh)
    }

    /// Observes period t and predicts period t+1, returning the period's log density.
    fn step(
        &self,
        state: &mut KalmanState,
        ws: &mut Workspace,
        observations: &Observations,
        system: &StateSpaceSystem,
        t: usize,
    ) -> Result<f64> {
        let TT = system.TT();
        observations.observed_indices_into(t, &mut ws.observed);

        // X_next = TT.X.TT' + RQR
        ws.X_next.quadform_tr(1., TT, &state.X, 0.);
        ws.X_next += system.rqr();
        TT.mul_to(&state.x, &mut ws.x_next);

        let contribution = if ws.observed.is_empty() {
            0.
        } else {
            let m = system.measurement(observations, t, &ws.observed);
            let innovation = innovate(&m, &state.x, &state.X, &self.options, t)?;

            // Gain K = TT.X.Z'
            TT.mul_to(&state.X, &mut ws.TX);
            let K = &ws.TX * m.Z.transpose();

            ws.x_next.gemv(1., &K, &innovation.Fiv, 1.);
            // X_next -= K.F^-1.K'
            let FiKt = innovation.F.solve(&K.transpose());
            ws.X_next.gemm(-1., &K, &FiKt, 1.);

            innovation.log_likelihood
        };

        symmetrize(&mut ws.X_next);
        std::mem::swap(&mut state.x, &mut ws.x_next);
        std::mem::swap(&mut state.X, &mut ws.X_next);
        Ok(contribution)
    }
}
