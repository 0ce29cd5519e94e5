#![allow(non_snake_case)]

//! Discrete Lyapunov equation.
//!
//! P = T.P.T' + Q is solved as the linear system (I - T⊗T) vec(P) = vec(Q) for small systems.
//! vec() stacks columns, which is the storage order of nalgebra matrices. The Kronecker system has
//! n² unknowns, so from [`KRONECKER_MAX_STATES`] states on the doubling iteration
//!
//! `P <- P + A.P.A'`,  `A <- A.A`
//!
//! is used instead. It sums the series P = Σ T^j.Q.T^j' in log2 of the number of terms.

use nalgebra::{DMatrix, DVector};

use super::symmetric::{is_positive_semidefinite, symmetrize};

/// Largest state dimension solved through the Kronecker product.
pub const KRONECKER_MAX_STATES: usize = 12;
/// Relative size of negative eigenvalues accepted in a solution as rounding.
pub const PSD_TOLERANCE: f64 = 1e-10;

const DOUBLING_MAX_ITERATIONS: usize = 100;

/// Solves P = T.P.T' + Q for the unconditional covariance P of a stable system.
///
/// Fails when T has an eigenvalue on the unit circle or the solution is not positive semi-definite
/// (T explosive).
pub fn solve_discrete_lyapunov(T: &DMatrix<f64>, Q: &DMatrix<f64>) -> Result<DMatrix<f64>, &'static str> {
    let mut P = if T.nrows() <= KRONECKER_MAX_STATES {
        solve_kronecker(T, Q)?
    } else {
        solve_doubling(T, Q)?
    };

    if P.iter().any(|v| !v.is_finite()) {
        return Err("Lyapunov solution not finite");
    }
    symmetrize(&mut P);
    if !is_positive_semidefinite(&P, PSD_TOLERANCE)? {
        return Err("Lyapunov solution not PSD, T is explosive");
    }
    Ok(P)
}

fn solve_kronecker(T: &DMatrix<f64>, Q: &DMatrix<f64>) -> Result<DMatrix<f64>, &'static str> {
    let n = T.nrows();
    let n2 = n * n;

    let lhs = DMatrix::<f64>::identity(n2, n2) - T.kronecker(T);
    let q = DVector::from_column_slice(Q.as_slice());
    let p = lhs.lu().solve(&q).ok_or("I - T⊗T singular, T has a unit root")?;
    Ok(DMatrix::from_column_slice(n, n, p.as_slice()))
}

fn solve_doubling(T: &DMatrix<f64>, Q: &DMatrix<f64>) -> Result<DMatrix<f64>, &'static str> {
    let n = T.nrows();
    let mut P = Q.clone();
    let mut A = T.clone();
    let mut APAt = DMatrix::zeros(n, n);

    for _ in 0..DOUBLING_MAX_ITERATIONS {
        APAt.quadform_tr(1., &A, &P, 0.);
        P += &APAt;
        if P.iter().any(|v| !v.is_finite()) {
            return Err("Lyapunov iteration diverged, T is explosive");
        }
        if APAt.amax() <= f64::EPSILON * P.amax() {
            return Ok(P);
        }
        A = &A * &A;
    }
    Err("Lyapunov iteration did not converge, T has a unit root")
}
