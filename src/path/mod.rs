//! Regularization paths
//!
//! [`FastNetParams`] collects the options of a path fit, validates them and hands the assembled
//! problem to a [`PathSolver`](crate::solver::PathSolver) in a single call. The compact solver
//! result is expanded into a dense [`CoefPath`] and wrapped in a fitted [`FastNet`].
//!
//! ## Example
//!
//! ```
//! use glmnet::prelude::*;
//! use ndarray::array;
//!
//! let x = array![[0.5, 1.0], [1.5, -0.5], [-1.0, 0.0], [2.0, 1.0], [0.0, -1.5]];
//! let y = array![1.2, 2.9, -2.1, 4.4, -0.3];
//!
//! let model = FastNet::gaussian()
//!     .alpha(0.5)
//!     .nlambda(20)
//!     .fit(&GlmData::single(&x, y))?;
//!
//! // predictions for every lambda of the path
//! let design = Design::from(&x);
//! let predicted = model.predict(&design, None, PredictionType::Response)?;
//! assert_eq!(predicted.shape(), &[5, 20, 1]);
//! # Ok::<(), GlmnetError>(())
//! ```

mod algorithm;
mod coef_path;
mod hyperparams;

use ndarray::{s, Array1, Array3, ArrayBase, Axis, Data, Ix2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::design::Design;
use crate::error::{GlmnetError, Result};
use crate::family::{Binomial, Poisson};
use crate::link::Link;
use crate::solver::{ElnetSolver, GlmPathSolver, MultiElnetSolver, SolverNote};
use crate::traits::Predict;
use crate::Float;

pub use coef_path::{CoefPath, InterpolationGrid};
pub use hyperparams::{FastNetControl, FastNetParams, FastNetValidParams, Limits};

/// Gaussian path with a single response
pub type GaussNetParams<F> = FastNetParams<F, ElnetSolver>;
/// Gaussian path with several responses sharing their active variables
pub type MultiGaussNetParams<F> = FastNetParams<F, MultiElnetSolver>;
/// Logistic regression path
pub type LogNetParams<F> = FastNetParams<F, GlmPathSolver<Binomial>>;
/// Poisson regression path
pub type FishNetParams<F> = FastNetParams<F, GlmPathSolver<Poisson>>;

/// Scale of predictions
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictionType {
    /// Linear predictor
    Link,
    /// Fitted mean, the inverse link of the linear predictor
    Response,
}

/// Per-lambda statistics of a fitted path
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct PathSummary<F> {
    pub lambda: Array1<F>,
    /// Number of non-zero coefficients, zero at the first lambda
    pub degrees_of_freedom: Array1<usize>,
    pub fraction_deviance_explained: Array1<F>,
}

/// A fitted regularization path
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FastNet<F> {
    coef_path: CoefPath<F>,
    summary: PathSummary<F>,
    lambda_max: Option<F>,
    nlambda: usize,
    null_deviance: F,
    n_passes: usize,
    solver_note: Option<SolverNote>,
    link: Link,
}

impl<F: Float> FastNet<F> {
    /// Hyper-parameters of a Gaussian path
    pub fn gaussian() -> GaussNetParams<F> {
        FastNetParams::new(ElnetSolver)
    }

    /// Hyper-parameters of a multi-response Gaussian path
    pub fn multi_gaussian() -> MultiGaussNetParams<F> {
        FastNetParams::new(MultiElnetSolver)
    }

    /// Hyper-parameters of a logistic regression path
    pub fn binomial() -> LogNetParams<F> {
        FastNetParams::new(GlmPathSolver::new(Binomial::default()))
    }

    /// Hyper-parameters of a Poisson regression path
    pub fn poisson() -> FishNetParams<F> {
        FastNetParams::new(GlmPathSolver::new(Poisson::default()))
    }

    /// Hyper-parameters for a custom path solver
    pub fn params<S>(solver: S) -> FastNetParams<F, S> {
        FastNetParams::new(solver)
    }

    pub fn coef_path(&self) -> &CoefPath<F> {
        &self.coef_path
    }

    pub fn summary(&self) -> &PathSummary<F> {
        &self.summary
    }

    /// Largest lambda of the path, extrapolated if the sequence was generated
    pub fn lambda_max(&self) -> Option<F> {
        self.lambda_max
    }

    /// Number of requested lambdas, at least the number of fitted ones
    pub fn nlambda(&self) -> usize {
        self.nlambda
    }

    pub fn null_deviance(&self) -> F {
        self.null_deviance
    }

    /// Number of passes over the data the solver needed
    ///
    /// Gaussian solvers count coordinate descent sweeps, the GLM solver counts outer IRLS
    /// iterations summed over the path.
    pub fn n_passes(&self) -> usize {
        self.n_passes
    }

    /// Non-fatal condition reported by the solver, the path ends before the failing lambda
    pub fn solver_note(&self) -> Option<&SolverNote> {
        self.solver_note.as_ref()
    }

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn interpolate_coefs(&self, grid: &InterpolationGrid<F>) -> Result<CoefPath<F>> {
        self.coef_path.interpolate(grid)
    }

    /// Predict every observation of `x` along the path
    ///
    /// Returns an array of shape `(nobs, nlambda, nresp)`. Without a grid all requested lambdas
    /// are covered and lambdas the solver did not reach repeat the last fitted one. With a grid
    /// the path is interpolated first.
    pub fn predict(
        &self,
        x: &Design<F>,
        grid: Option<&InterpolationGrid<F>>,
        kind: PredictionType,
    ) -> Result<Array3<F>> {
        let interpolated;
        let (path, nout) = match grid {
            Some(grid) => {
                interpolated = self.coef_path.interpolate(grid)?;
                (&interpolated, grid.len())
            }
            None => (&self.coef_path, self.nlambda.max(self.coef_path.nlambda())),
        };
        if x.nvars() != path.nvars() {
            return Err(GlmnetError::ShapeMismatch {
                what: "design columns",
                expected: path.nvars(),
                actual: x.nvars(),
            });
        }
        let nfits = path.nlambda();
        if nfits == 0 {
            return Err(GlmnetError::EmptyLambdaSequence);
        }

        let mut out = Array3::zeros((x.nobs(), nout, path.nresponses()));
        for m in 0..nfits.min(nout) {
            let mut eta = x.dot_matrix(path.coefs().index_axis(Axis(0), m));
            eta += &path.intercepts().row(m);
            if kind == PredictionType::Response {
                for mut col in eta.columns_mut() {
                    let mu = self.link.inverse(&col);
                    col.assign(&mu);
                }
            }
            out.index_axis_mut(Axis(1), m).assign(&eta);
        }
        if nout > nfits {
            let last = out.index_axis(Axis(1), nfits - 1).to_owned();
            for mut slab in out.slice_mut(s![.., nfits.., ..]).axis_iter_mut(Axis(1)) {
                slab.assign(&last);
            }
        }
        Ok(out)
    }
}

/// Predictions on the response scale for every requested lambda
impl<'a, F: Float, D: Data<Elem = F>> Predict<&'a ArrayBase<D, Ix2>, Result<Array3<F>>>
    for FastNet<F>
{
    fn predict(&self, x: &'a ArrayBase<D, Ix2>) -> Result<Array3<F>> {
        FastNet::predict(self, &Design::from(x), None, PredictionType::Response)
    }
}
