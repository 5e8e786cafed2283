//! `glmnet` fits generalized linear models regularized by an elastic-net penalty along a whole
//! path of decreasing penalty strengths.
//!
//! For every lambda of the path the penalized problem
//! ```ignore
//! deviance(y, X b + a) / (2 * sum(w)) + lambda * sum_j vp_j * ((1 - alpha) / 2 * b_j^2 + alpha * |b_j|)
//! ```
//! is solved subject to box constraints on the coefficients. The crate is organised in layers:
//!
//!  * [`solver`]: path solvers fitting a complete path in one call and returning it in compact
//!    form, with error codes for solver failures
//!  * [`path`]: the orchestrator assembling the solver arguments, expanding the compact result
//!    into a dense [`CoefPath`] and interpolating paths onto arbitrary lambda grids
//!  * [`irls`]: the iteratively reweighted least squares driver used for non-Gaussian families,
//!    with step halving whenever a Newton step leaves the admissible region
//!
//! Gaussian (single and multi-response), binomial and Poisson families are supported. Designs
//! may be dense `ndarray` matrices or compressed-column `sprs` matrices.
//!
//! ## Example
//!
//! ```
//! use glmnet::prelude::*;
//! use ndarray::{array, Array2, Axis};
//!
//! let x: Array2<f64> = array![[1.0, 0.2], [0.4, 1.1], [-0.3, 0.8], [1.7, -0.5], [0.0, 0.3], [-1.2, -0.9]];
//! let y = array![2.1, 1.0, -0.2, 3.6, 0.1, -2.3];
//!
//! let model = FastNet::gaussian()
//!     .alpha(0.5)
//!     .lambda_values(vec![1.0, 0.1, 0.01])
//!     .fit(&GlmData::single(&x, y))?;
//!
//! assert_eq!(model.lambda_max(), Some(1.0));
//! // the first variable carries most of the signal
//! let coefs = model.coef_path().univariate_coefs()?;
//! assert!(coefs[[2, 0]].abs() > coefs[[2, 1]].abs());
//! # Ok::<(), GlmnetError>(())
//! ```
//!
//! Logging goes through the `log` facade, no logger is installed by this crate. With the
//! `progress` feature a terminal progress bar can be passed to
//! [`fit_with_progress`](FastNetValidParams::fit_with_progress).

pub mod dataset;
pub mod design;
pub mod error;
pub mod family;
mod float;
pub mod irls;
pub mod link;
mod param_guard;
pub mod path;
pub mod prelude;
pub mod progress;
pub mod regularizer;
pub mod solver;
pub mod state;
pub mod traits;

pub use dataset::GlmData;
pub use design::Design;
pub use error::{GlmnetError, Result};
pub use float::Float;
pub use param_guard::ParamGuard;
pub use path::{
    CoefPath, FastNet, FastNetControl, FastNetParams, FastNetValidParams, InterpolationGrid,
    Limits, PathSummary, PredictionType,
};
