#![allow(non_snake_case)]

//! Chandrasekhar recursions.
//!
//! For a time-invariant system the forecast covariance changes by a low rank term each period,
//! `X_{t+1} - X_t = S_t.M_t.S_t'`. Tracking the ns x ny factor S, the ny x ny factor M, the gain K and
//! the innovation covariance F replaces the ns x ns Riccati update:
//!
//! `F_{t+1} = F_t + Z.S_t.M_t.S_t'.Z'`
//!
//! `K_{t+1} = (K_t.F_t + TT.S_t.M_t.S_t'.Z').F_{t+1}^-1`
//!
//! `S_{t+1} = (TT - K_{t+1}.Z).S_t`
//!
//! `M_{t+1} = M_t + M_t.S_t'.Z'.F_t^-1.Z.S_t.M_t`
//!
//! The initial factors `S_0 = TT.P0.Z'`, `M_0 = -F_0^-1` are exact when P0 is the unconditional
//! covariance, P0 = TT.P0.TT' + RR.QQ.RR'. The recursion is defined for complete data only.
//! Observations with missing values are rejected with [`FilterError::Precondition`].

use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector};

use super::{factor_innovation_covariance, log_density};
use crate::error::{FilterError, Result};
use crate::linalg::{symmetrize, symmetrized, SpdFactor};
use crate::models::{Observations, StateSpaceSystem};
use crate::options::FilterOptions;

/// Chandrasekhar recursion evaluating the Gaussian log-likelihood of a complete series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChandrasekharFilter {
    pub options: FilterOptions,
}

/// State carried between periods.
struct ChandrasekharState {
    x: DVector<f64>,
    F: DMatrix<f64>,
    Fchol: SpdFactor,
    K: DMatrix<f64>,
    S: DMatrix<f64>,
    M: DMatrix<f64>,
}

impl ChandrasekharState {
    fn initial(system: &StateSpaceSystem, options: &FilterOptions) -> Result<Self> {
        let ZZ = system.ZZ();
        let P0 = system.P0();

        // F = Z.P0.Z' + H
        let mut F = system.HH().clone();
        F.quadform_tr(1., ZZ, P0, 1.);
        symmetrize(&mut F);
        let Fchol = factor_innovation_covariance(F.clone(), options, 0)?;

        let S = system.TT() * P0 * ZZ.transpose();
        let mut M = -Fchol.solve(&DMatrix::identity(system.ny(), system.ny()));
        symmetrize(&mut M);
        let K = Fchol.solve_right(&S);

        Ok(ChandrasekharState {
            x: DVector::zeros(system.ns()),
            F,
            Fchol,
            K,
            S,
            M,
        })
    }

    /// Factor updates from period t to t+1.
    fn advance(&mut self, system: &StateSpaceSystem, options: &FilterOptions, t: usize) -> Result<()> {
        let ZS = system.ZZ() * &self.S;
        let MSZt = &self.M * ZS.transpose();
        let TS = system.TT() * &self.S;

        let F1 = symmetrized(&(&self.F + &ZS * &MSZt));
        let F1chol = factor_innovation_covariance(F1.clone(), options, t + 1)?;

        let K1 = F1chol.solve_right(&(&self.K * &self.F + &TS * &MSZt));
        self.S = TS - &K1 * ZS;
        self.M += &MSZt * self.Fchol.solve(&MSZt.transpose());
        symmetrize(&mut self.M);

        self.K = K1;
        self.F = F1;
        self.Fchol = F1chol;
        Ok(())
    }
}

impl ChandrasekharFilter {
    pub fn new(options: FilterOptions) -> Self {
        ChandrasekharFilter { options }
    }

    /// Log-likelihood of the observations, excluding the first `burn_in` periods.
    ///
    /// Equal to [`KalmanFilter::run`](super::kalman::KalmanFilter::run) for complete data and an
    /// unconditional P0.
    pub fn run(&self, observations: &Observations, system: &StateSpaceSystem) -> Result<f64> {
        system.check_observations(observations)?;
        let nobs = observations.nobs();
        self.options.validate(nobs)?;
        let missing = observations.missing_count();
        if missing > 0 {
            return Err(FilterError::Precondition(format!(
                "Chandrasekhar recursion requires complete data, {} observations missing",
                missing
            )));
        }
        debug!(
            "chandrasekhar filter: nobs {} ns {} ny {} burn_in {}",
            nobs,
            system.ns(),
            system.ny(),
            self.options.burn_in
        );
        let residual = system.stationarity_residual();
        if residual > self.options.stationarity_tolerance {
            warn!(
                "chandrasekhar filter: P0 is not the unconditional covariance (residual {:e}), likelihood is approximate",
                residual
            );
        }

        let mut state = ChandrasekharState::initial(system, &self.options).map_err(|err| {
            warn!("chandrasekhar filter: {}", err);
            err
        })?;
        let mut loglh = 0.;

        for t in 0..nobs {
            let contribution = self.step(&mut state, observations, system, t).map_err(|err| {
                warn!("chandrasekhar filter: {}", err);
                err
            })?;
            trace!("chandrasekhar filter: period {} log likelihood {}", t, contribution);
            if t >= self.options.burn_in {
                loglh += contribution;
            }
        }

        Ok(loglh)
    }

    fn step(
        &self,
        state: &mut ChandrasekharState,
        observations: &Observations,
        system: &StateSpaceSystem,
        t: usize,
    ) -> Result<f64> {
        let v = observations.row(t) - (system.ZZ() * &state.x + system.DD());
        let (contribution, _) = log_density(&state.Fchol, &v);
        if !contribution.is_finite() {
            return Err(FilterError::numerical(t, "log likelihood not finite"));
        }

        state.x = system.TT() * &state.x + &state.K * v;

        // factors beyond the last period are never used
        if t + 1 < observations.nobs() {
            state.advance(system, &self.options, t)?;
        }
        Ok(contribution)
    }
}
