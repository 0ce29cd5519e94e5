#![allow(non_snake_case)]

//! Cholesky factorisation of symmetric positive definite covariances.
//!
//! LL' factor of an innovation covariance. Solves, the log determinant and the reciprocal
//! condition estimate are all taken from the same factor, so a likelihood term never mixes
//! two different decompositions of one matrix.

use nalgebra::{Cholesky, DMatrix, DVector, Dynamic};

use super::rcond;

/// Factor LL' of a symmetric positive definite matrix.
pub struct SpdFactor {
    chol: Cholesky<f64, Dynamic>,
}

impl SpdFactor {
    /// Factorise M. Only the lower triangle of M is used.
    pub fn new(M: DMatrix<f64>) -> Result<SpdFactor, &'static str> {
        if M.iter().any(|v| !v.is_finite()) {
            return Err("matrix not finite");
        }
        let chol = M.cholesky().ok_or("matrix not PD")?;
        Ok(SpdFactor { chol })
    }

    pub fn dim(&self) -> usize {
        self.chol.l_dirty().nrows()
    }

    /// Estimate the reciprocal condition number for inversion of the original matrix.
    ///
    /// The rcond of the original matrix is the square of the rcond of diagonal(L).
    pub fn rcond(&self) -> f64 {
        let rcond = rcond::rcond_symmetric(self.chol.l_dirty());
        // Square to get rcond of original matrix, take care to propogate rcond's sign!
        if rcond < 0. {
            -(rcond * rcond)
        } else {
            rcond * rcond
        }
    }

    /// ln|M| = 2 sum(ln(diag(L)))
    pub fn log_determinant(&self) -> f64 {
        let L = self.chol.l_dirty();
        (0..self.dim()).map(|i| 2. * L[(i, i)].ln()).sum()
    }

    /// Solves M x = b.
    pub fn solve_vector(&self, b: &DVector<f64>) -> DVector<f64> {
        self.chol.solve(b)
    }

    /// Solves M X = B.
    pub fn solve(&self, B: &DMatrix<f64>) -> DMatrix<f64> {
        self.chol.solve(B)
    }

    /// Solves X M = B, for symmetric M this is (M^-1 B')'.
    pub fn solve_right(&self, B: &DMatrix<f64>) -> DMatrix<f64> {
        self.chol.solve(&B.transpose()).transpose()
    }

    /// b' M^-1 b, and M^-1 b
    pub fn quadform_inv(&self, b: &DVector<f64>) -> (f64, DVector<f64>) {
        let Mib = self.solve_vector(b);
        (b.dot(&Mib), Mib)
    }
}
