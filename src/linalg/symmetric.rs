#![allow(non_snake_case)]

//! Symmetric matrix helpers.
//!
//! Every covariance update in the filters is followed by [`symmetrize`], which restores exact
//! symmetry lost to rounding in the products.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// In place M = (M + M') / 2.
pub fn symmetrize(M: &mut DMatrix<f64>) {
    let n = M.nrows();
    for j in 0..n {
        for i in j + 1..n {
            let v = 0.5 * (M[(i, j)] + M[(j, i)]);
            M[(i, j)] = v;
            M[(j, i)] = v;
        }
    }
}

pub fn symmetrized(M: &DMatrix<f64>) -> DMatrix<f64> {
    let mut S = M.clone();
    symmetrize(&mut S);
    S
}

/// Largest absolute difference between M and M'.
pub fn asymmetry(M: &DMatrix<f64>) -> f64 {
    let n = M.nrows();
    let mut max = 0.;
    for j in 0..n {
        for i in j + 1..n {
            let d = (M[(i, j)] - M[(j, i)]).abs();
            if d > max {
                max = d;
            }
        }
    }
    max
}

/// Checks symmetry relative to the largest element of M.
pub fn is_symmetric(M: &DMatrix<f64>, tolerance: f64) -> bool {
    let scale = M.amax().max(1.);
    M.is_square() && asymmetry(M) <= tolerance * scale
}

/// Checks a symmetric matrix is positive semi-definite.
///
/// Eigenvalues down to `-tolerance * max|eigenvalue|` are accepted as rounding of zero. A Cholesky
/// factorisation would reject singular covariances, which are valid here.
pub fn is_positive_semidefinite(M: &DMatrix<f64>, tolerance: f64) -> Result<bool, &'static str> {
    if M.iter().any(|v| !v.is_finite()) {
        return Err("matrix not finite");
    }
    if M.nrows() == 0 {
        return Ok(true);
    }
    let eigen = SymmetricEigen::try_new(symmetrized(M), f64::EPSILON, 0).ok_or("eigendecomposition failed")?;
    let max_abs = eigen.eigenvalues.amax();
    let min = eigen.eigenvalues.iter().cloned().fold(f64::INFINITY, f64::min);
    Ok(min >= -tolerance * max_abs)
}

/// Standard deviations from the diagonal of a covariance.
///
/// Small negative variances from rounding are clamped to zero.
pub fn diagonal_std(X: &DMatrix<f64>) -> DVector<f64> {
    X.diagonal().map(|v| v.max(0.).sqrt())
}

/// Moore-Penrose inverse of a symmetric matrix through its eigendecomposition.
///
/// Eigenvalues with magnitude not exceeding `rcond` times the largest magnitude are treated as zero.
pub fn pseudo_inverse_symmetric(M: &DMatrix<f64>, rcond: f64) -> Result<DMatrix<f64>, &'static str> {
    let n = M.nrows();
    if M.iter().any(|v| !v.is_finite()) {
        return Err("matrix not finite");
    }
    if n == 0 {
        return Ok(DMatrix::zeros(0, 0));
    }

    let eigen = SymmetricEigen::try_new(symmetrized(M), f64::EPSILON, 0).ok_or("eigendecomposition failed")?;
    let max_abs = eigen.eigenvalues.amax();
    let cutoff = rcond * max_abs;

    let mut Minv = DMatrix::zeros(n, n);
    for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
        if lambda.abs() > cutoff {
            let v = eigen.eigenvectors.column(k);
            Minv.ger(1. / lambda, &v, &v, 1.);
        }
    }
    symmetrize(&mut Minv);
    Ok(Minv)
}
