//! Dense linear algebra used by the filters.
//!
//! All factorisations and inverses go through this module; the recursions never form an
//! explicit inverse where a solve suffices.

pub mod cholesky;
pub mod lyapunov;
pub mod rcond;
pub mod symmetric;

pub use cholesky::SpdFactor;
pub use lyapunov::solve_discrete_lyapunov;
pub use symmetric::{
    diagonal_std, is_positive_semidefinite, is_symmetric, pseudo_inverse_symmetric, symmetrize, symmetrized,
};
