#![allow(non_snake_case)]

//! State-space models and observations.
//!
//! The linear time-invariant system
//!
//! `s_t = TT.s_{t-1} + RR.eps_t`,  `eps_t ~ N(0, QQ)`
//!
//! `y_t = ZZ.s_t + DD + u_t`,      `u_t ~ N(0, HH)`
//!
//! with initial state `s_0 ~ N(0, P0)`.
//! Both [`StateSpaceSystem`] and [`Observations`] are validated once on construction and are
//! immutable afterwards; the recursions only borrow them.

use std::borrow::Cow;

use nalgebra::{DMatrix, DVector};

use crate::error::{FilterError, Result};
use crate::linalg::{is_symmetric, solve_discrete_lyapunov, symmetrize};

/// Relative tolerance for the symmetry of QQ, HH and P0.
pub const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Linear time-invariant state-space system.
///
/// Dimensions: ns states, ny observables, neps shocks.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpaceSystem {
    TT: DMatrix<f64>,
    RR: DMatrix<f64>,
    QQ: DMatrix<f64>,
    DD: DVector<f64>,
    ZZ: DMatrix<f64>,
    HH: DMatrix<f64>,
    P0: DMatrix<f64>,
    RQR: DMatrix<f64>,
}

impl StateSpaceSystem {
    /// Creates a system and validates its dimensions, finiteness and symmetry.
    pub fn new(
        TT: DMatrix<f64>,
        RR: DMatrix<f64>,
        QQ: DMatrix<f64>,
        DD: DVector<f64>,
        ZZ: DMatrix<f64>,
        HH: DMatrix<f64>,
        P0: DMatrix<f64>,
    ) -> Result<Self> {
        let ns = TT.nrows();
        if ns == 0 || !TT.is_square() {
            return Err(shape("TT", "ns x ns with ns > 0", &TT));
        }
        let neps = RR.ncols();
        if RR.nrows() != ns {
            return Err(shape("RR", "ns x neps", &RR));
        }
        if QQ.nrows() != neps || QQ.ncols() != neps {
            return Err(shape("QQ", "neps x neps", &QQ));
        }
        let ny = ZZ.nrows();
        if ny == 0 || ZZ.ncols() != ns {
            return Err(shape("ZZ", "ny x ns with ny > 0", &ZZ));
        }
        if DD.len() != ny {
            return Err(FilterError::Shape(format!("DD must have length ny = {}, got {}", ny, DD.len())));
        }
        if HH.nrows() != ny || HH.ncols() != ny {
            return Err(shape("HH", "ny x ny", &HH));
        }
        if P0.nrows() != ns || P0.ncols() != ns {
            return Err(shape("P0", "ns x ns", &P0));
        }

        for (name, M) in [("TT", &TT), ("RR", &RR), ("QQ", &QQ), ("ZZ", &ZZ), ("HH", &HH), ("P0", &P0)].iter() {
            if M.iter().any(|v| !v.is_finite()) {
                return Err(FilterError::NonFinite(format!("{} has non-finite entries", name)));
            }
        }
        if DD.iter().any(|v| !v.is_finite()) {
            return Err(FilterError::NonFinite("DD has non-finite entries".to_string()));
        }

        for (name, M) in [("QQ", &QQ), ("HH", &HH), ("P0", &P0)].iter() {
            if !is_symmetric(M, SYMMETRY_TOLERANCE) {
                return Err(FilterError::Precondition(format!("{} must be symmetric", name)));
            }
        }

        let mut RQR = &RR * &QQ * RR.transpose();
        symmetrize(&mut RQR);

        Ok(StateSpaceSystem { TT, RR, QQ, DD, ZZ, HH, P0, RQR })
    }

    /// Creates a system whose initial covariance is the unconditional state covariance.
    ///
    /// P0 solves P0 = TT.P0.TT' + RR.QQ.RR'. TT must be stable.
    pub fn with_stationary_covariance(
        TT: DMatrix<f64>,
        RR: DMatrix<f64>,
        QQ: DMatrix<f64>,
        DD: DVector<f64>,
        ZZ: DMatrix<f64>,
        HH: DMatrix<f64>,
    ) -> Result<Self> {
        let ns = TT.nrows();
        let mut system = StateSpaceSystem::new(TT, RR, QQ, DD, ZZ, HH, DMatrix::zeros(ns, ns))?;
        system.P0 = solve_discrete_lyapunov(&system.TT, &system.RQR).map_err(|reason| FilterError::Numerical {
            period: None,
            reason: reason.to_string(),
        })?;
        Ok(system)
    }

    /// Number of states.
    pub fn ns(&self) -> usize {
        self.TT.nrows()
    }

    /// Number of observables.
    pub fn ny(&self) -> usize {
        self.ZZ.nrows()
    }

    /// Number of shocks.
    pub fn neps(&self) -> usize {
        self.RR.ncols()
    }

    pub fn TT(&self) -> &DMatrix<f64> {
        &self.TT
    }

    pub fn RR(&self) -> &DMatrix<f64> {
        &self.RR
    }

    pub fn QQ(&self) -> &DMatrix<f64> {
        &self.QQ
    }

    pub fn DD(&self) -> &DVector<f64> {
        &self.DD
    }

    pub fn ZZ(&self) -> &DMatrix<f64> {
        &self.ZZ
    }

    pub fn HH(&self) -> &DMatrix<f64> {
        &self.HH
    }

    pub fn P0(&self) -> &DMatrix<f64> {
        &self.P0
    }

    /// State noise covariance RR.QQ.RR' (symmetric).
    pub fn rqr(&self) -> &DMatrix<f64> {
        &self.RQR
    }

    /// Largest element of |TT.P0.TT' + RQR - P0| relative to the largest element of P0 (at least 1).
    pub fn stationarity_residual(&self) -> f64 {
        let residual = &self.TT * &self.P0 * self.TT.transpose() + &self.RQR - &self.P0;
        residual.amax() / self.P0.amax().max(1.)
    }

    /// Checks the observations have ny columns.
    pub fn check_observations(&self, observations: &Observations) -> Result<()> {
        if observations.ny() != self.ny() {
            return Err(FilterError::Shape(format!(
                "observations have {} columns, the system has ny = {}",
                observations.ny(),
                self.ny()
            )));
        }
        Ok(())
    }

    /// The measurement equation restricted to the observed coordinates of period t.
    ///
    /// Borrows ZZ, DD and HH unchanged when every coordinate is observed.
    pub fn measurement(&self, observations: &Observations, t: usize, observed: &[usize]) -> Measurement<'_> {
        let row = observations.y.row(t);
        if observed.len() == self.ny() {
            return Measurement {
                y: row.transpose(),
                Z: Cow::Borrowed(&self.ZZ),
                D: Cow::Borrowed(&self.DD),
                H: Cow::Borrowed(&self.HH),
            };
        }

        let k = observed.len();
        let ns = self.ns();
        let y = DVector::from_fn(k, |i, _| row[observed[i]]);
        let Z = DMatrix::from_fn(k, ns, |i, j| self.ZZ[(observed[i], j)]);
        let D = DVector::from_fn(k, |i, _| self.DD[observed[i]]);
        let H = DMatrix::from_fn(k, k, |i, j| self.HH[(observed[i], observed[j])]);
        Measurement {
            y,
            Z: Cow::Owned(Z),
            D: Cow::Owned(D),
            H: Cow::Owned(H),
        }
    }
}

fn shape(name: &str, expected: &str, M: &DMatrix<f64>) -> FilterError {
    FilterError::Shape(format!(
        "{} must be {}, got {} x {}",
        name,
        expected,
        M.nrows(),
        M.ncols()
    ))
}

/// Kalman State.
///
/// Linear representation as a state vector and the state covariance (symmetric positive semi-definite) matrix.
#[derive(Debug, PartialEq, Clone)]
pub struct KalmanState {
    /// State vector
    pub x: DVector<f64>,
    /// State covariance matrix (symmetric positive semi-definite)
    pub X: DMatrix<f64>,
}

impl KalmanState {
    /// The forecast of the first period, zero mean and covariance P0.
    pub fn initial(system: &StateSpaceSystem) -> KalmanState {
        KalmanState {
            x: DVector::zeros(system.ns()),
            X: system.P0.clone(),
        }
    }
}

/// Observed part of the measurement equation in one period.
pub struct Measurement<'a> {
    /// Observed values
    pub y: DVector<f64>,
    /// Observation loading rows
    pub Z: Cow<'a, DMatrix<f64>>,
    /// Observation offset
    pub D: Cow<'a, DVector<f64>>,
    /// Measurement error covariance
    pub H: Cow<'a, DMatrix<f64>>,
}

/// Observations of a multivariate series, nobs x ny.
///
/// A NaN entry marks a coordinate not observed in that period.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    y: DMatrix<f64>,
}

impl Observations {
    /// Wraps an nobs x ny matrix. Infinite entries are rejected, NaN means missing.
    pub fn new(y: DMatrix<f64>) -> Result<Self> {
        if y.nrows() == 0 || y.ncols() == 0 {
            return Err(FilterError::Shape(format!(
                "observations must be non-empty, got {} x {}",
                y.nrows(),
                y.ncols()
            )));
        }
        // column major storage
        if let Some(k) = y.iter().position(|v| v.is_infinite()) {
            return Err(FilterError::NonFinite(format!(
                "y[{}][{}] must be finite or NaN (NaN means missing)",
                k % y.nrows(),
                k / y.nrows()
            )));
        }
        Ok(Observations { y })
    }

    /// Observations from row major data, one row per period.
    pub fn from_row_slice(nobs: usize, ny: usize, data: &[f64]) -> Result<Self> {
        if data.len() != nobs * ny {
            return Err(FilterError::Shape(format!(
                "{} values cannot fill {} x {} observations",
                data.len(),
                nobs,
                ny
            )));
        }
        Observations::new(DMatrix::from_row_slice(nobs, ny, data))
    }

    /// Number of periods.
    pub fn nobs(&self) -> usize {
        self.y.nrows()
    }

    /// Number of observables.
    pub fn ny(&self) -> usize {
        self.y.ncols()
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.y
    }

    /// Values of period t, NaN where missing.
    pub fn row(&self, t: usize) -> DVector<f64> {
        self.y.row(t).transpose()
    }

    /// Indices of the coordinates observed in period t, written into `observed`.
    pub fn observed_indices_into(&self, t: usize, observed: &mut Vec<usize>) {
        observed.clear();
        observed.extend(
            self.y
                .row(t)
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_nan())
                .map(|(i, _)| i),
        );
    }

    /// Indices of the coordinates observed in period t.
    pub fn observed_indices(&self, t: usize) -> Vec<usize> {
        let mut observed = Vec::with_capacity(self.ny());
        self.observed_indices_into(t, &mut observed);
        observed
    }

    pub fn observed_count(&self, t: usize) -> usize {
        self.y.row(t).iter().filter(|v| !v.is_nan()).count()
    }

    /// Number of missing entries in the whole series.
    pub fn missing_count(&self) -> usize {
        self.y.iter().filter(|v| v.is_nan()).count()
    }

    /// True when no entry is missing.
    pub fn is_complete(&self) -> bool {
        self.missing_count() == 0
    }
}
