//! Statespace+Estimate likelihood evaluation for linear Gaussian state-space models.
//! Copyright (c) 2020 Michael Stevens
//!
//! A linear time-invariant state-space model describes an unobserved state evolving with
//! `s_t = TT.s_{t-1} + RR.eps_t` and noisy observations of it `y_t = ZZ.s_t + DD + u_t`.
//! Estimating such a model evaluates the Gaussian likelihood of the observed series once for every
//! candidate parameter vector, so the filters here are written as single, allocation-light passes.
//!
//! Three recursions are provided:
//! - [`KalmanFilter`]: the Riccati recursion. Observations may be missing (NaN) coordinate by coordinate.
//! - [`ChandrasekharFilter`]: the same likelihood from low-rank updates of the innovation covariance.
//!   Cheaper when the state dimension exceeds the number of observables. Complete data only.
//! - [`KalmanSmoother`]: the Kalman filter recording forecast and filtered moments, then a
//!   Rauch-Tung-Striebel backward pass for the smoothed moments.
//!
//! Numerical failures (a singular innovation covariance for example) are reported as
//! [`FilterError::Numerical`] so that an estimation driver can score the draw as
//! impossible, see [`LikelihoodExt::or_neg_infinity`].
//!
//! # Licensing
//!
//! All source code files are copyright with the license conditions as given here. The copyright notice is that of the MIT license.
//!  This in no way restricts any commercial use you may wish to make using our source code.
//!  As long as you respect the copyright and license conditions, Michael Stevens is happy to for you to use it in any way you wish.
//!
//! Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction,
//! including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software,
//! and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
//!
//! The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//! FITNESS FOR A PARTICULAR PURPOSE AND NON INFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY,
//! WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

pub mod api;
pub mod error;
pub mod filters;
pub mod linalg;
pub mod models;
pub mod options;

pub use api::{filter_and_smooth, log_likelihood_chandrasekhar, log_likelihood_kalman};
pub use error::{FilterError, LikelihoodExt, Result};
pub use filters::chandrasekhar::ChandrasekharFilter;
pub use filters::kalman::KalmanFilter;
pub use filters::smoother::{FilterSmoothResult, KalmanSmoother, StateMoments};
pub use models::{KalmanState, Observations, StateSpaceSystem};
pub use options::FilterOptions;
