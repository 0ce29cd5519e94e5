//! Reciprocal condition numbers of diagonal (or factor diagonal) matrices.
//!
//! The condition number uses the max element of d as the norm of the matrix and the min
//! element as the norm of its inverse, so rcond = min/max.
//!
//! Conventions:
//!  0 for a semi-definite or empty matrix, and when min and max are both infinite
//!  <0 for a negative matrix (some element < 0) or with any NaN element
//!  <= 1 otherwise

use nalgebra::{DMatrix, DVector};

/// Reciprocal condition number of the diagonal matrix whose diagonal is `dv`.
pub fn rcond_vec(dv: &DVector<f64>) -> f64 {
    if dv.nrows() == 0 {
        return 0.;
    }
    let mut mind = dv[0];
    let mut maxd = mind;

    for &d in dv.iter() {
        if d.is_nan() {
            return -1.;
        }
        mind = mind.min(d);
        maxd = maxd.max(d);
    }

    rcond_min_max(mind, maxd)
}

/// Reciprocal condition number estimated from the diagonal of a symmetric matrix or of its factor.
pub fn rcond_symmetric(sm: &DMatrix<f64>) -> f64 {
    rcond_vec(&sm.diagonal())
}

fn rcond_min_max(mind: f64, maxd: f64) -> f64 {
    if mind < 0. {
        // matrix is negative
        mind // mind < 0 but does not represent a rcond
    } else {
        debug_assert!(mind <= maxd);

        let rcond = mind / maxd;
        if rcond.is_nan() {
            // singular due to (mind == maxd) == (zero or infinity)
            0.
        } else {
            rcond
        }
    }
}
