//! Path solvers
//!
//! A path solver fits a whole regularization path in one call. Its interface mirrors the classic
//! glmnet routines: arguments are passed in a flat [`SolverArgs`] record, coefficients come back
//! compacted to the variables which became active along the path, and failures are reported
//! through an integer error code rather than an early return.
//!
//! Three solvers are provided:
//!  * [`ElnetSolver`] for a single Gaussian response
//!  * [`MultiElnetSolver`] for several Gaussian responses sharing a sparsity pattern
//!  * [`GlmPathSolver`] for binomial and Poisson families, driven by IRLS

pub(crate) mod coordinate;
mod elnet;
mod glm;
mod multi;

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::design::Design;
use crate::error::{GlmnetError, Result};
use crate::link::Link;
use crate::path::FastNetControl;
use crate::progress::PathProgress;
use crate::Float;

pub use elnet::ElnetSolver;
pub use glm::GlmPathSolver;
pub use multi::MultiElnetSolver;

/// Arguments of a path solver call
#[derive(Clone, Debug)]
pub struct SolverArgs<'d, 'a, F> {
    /// Elastic-net mixing parameter
    pub parm: F,
    /// Number of variables
    pub ni: usize,
    /// Number of observations
    pub no: usize,
    pub x: &'d Design<'a, F>,
    /// Responses, one column per response
    pub y: ArrayView2<'d, F>,
    pub offset: Option<ArrayView2<'d, F>>,
    pub w: ArrayView1<'d, F>,
    /// Excluded variables as `[count, indices...]` with 1-based indices, `[0]` if none
    pub jd: Vec<usize>,
    /// Penalty factors
    pub vp: Array1<F>,
    /// Lower (row 0) and upper (row 1) coefficient limits
    pub cl: Array2<F>,
    /// Maximal number of variables in the model
    pub ne: usize,
    /// Maximal number of variables ever active, the storage width of `ca`
    pub nx: usize,
    pub nlam: usize,
    /// Ratio of smallest to largest generated lambda, `>= 1` selects `ulam`
    pub flmin: F,
    /// User supplied lambdas in decreasing order
    pub ulam: Array1<F>,
    /// Convergence threshold of coordinate descent
    pub thr: F,
    /// Standardize variables
    pub isd: bool,
    /// Fit an intercept
    pub intr: bool,
    /// Budget of coordinate descent sweeps across the whole path
    pub maxit: usize,
    pub control: FastNetControl,
}

impl<'d, 'a, F: Float> SolverArgs<'d, 'a, F> {
    /// 0-based indices of excluded variables
    pub fn excluded(&self) -> Vec<usize> {
        match self.jd.split_first() {
            Some((&count, rest)) if count > 0 => rest.iter().take(count).map(|j| j - 1).collect(),
            _ => Vec::new(),
        }
    }

    /// Number of responses
    pub fn nr(&self) -> usize {
        self.y.ncols()
    }

    /// Responses minus offsets
    pub(crate) fn offset_response(&self) -> Array2<F> {
        match self.offset {
            Some(offset) => &self.y - &offset,
            None => self.y.to_owned(),
        }
    }

    /// Penalty factors clipped at zero and rescaled to sum to the number of variables
    ///
    /// Returns `None` if no usable variable carries a positive penalty factor.
    pub(crate) fn normalized_penalty_factors(&self, ju: &[bool]) -> Option<Array1<F>> {
        let vp = self.vp.mapv(|v| v.max(F::zero()));
        if !vp.iter().zip(ju).any(|(v, &u)| u && *v > F::zero()) {
            return None;
        }
        let total = vp.sum();
        Some(vp * F::cast(self.ni) / total)
    }

    /// Lambda of the `m`-th path point on the working scale
    ///
    /// The first generated lambda is the `big` sentinel, the following ones decrease
    /// geometrically from `lambda_max` to `flmin * lambda_max`.
    pub(crate) fn lambda(&self, m: usize, lambda_max: F, scale: F) -> F {
        if self.flmin >= F::one() {
            return self.ulam[m] / scale;
        }
        if m == 0 {
            return F::cast(self.control.big);
        }
        let alf = self.flmin.powf(F::one() / F::cast(self.nlam.max(2) - 1));
        lambda_max * alf.powi(m as i32)
    }

    /// Whether the path should stop early after the `m`-th lambda
    pub(crate) fn stop_early(&self, m: usize, n_nonzero: usize, rsq: F, rsq_prev: F) -> bool {
        if m + 1 < self.control.mnlam.min(self.nlam) || self.flmin >= F::one() {
            return false;
        }
        n_nonzero > self.ne
            || rsq - rsq_prev < F::cast(self.control.fdev) * rsq
            || rsq > F::cast(self.control.devmax)
    }
}

/// Compact path returned by a path solver
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct SolverOutput<F> {
    /// Number of lambdas actually fitted
    pub lmu: usize,
    /// Intercepts, `(nr, nlam)`
    pub a0: Array2<F>,
    /// Compact coefficients, `(nx, nr, nlam)`, row `l` belongs to variable `ia[l]`
    pub ca: Array3<F>,
    /// 1-based variable index of each compact row in order of entry, 0 if unused
    pub ia: Array1<usize>,
    /// Number of compact rows in use per lambda
    pub nin: Array1<usize>,
    pub nulldev: F,
    /// Fraction of null deviance explained per lambda
    pub dev: Array1<F>,
    /// Lambda values
    pub alm: Array1<F>,
    /// Number of passes over the data, coordinate descent sweeps or IRLS iterations
    pub nlp: usize,
    pub jerr: i32,
}

impl<F: Float> SolverOutput<F> {
    pub fn new(nx: usize, nr: usize, nlam: usize) -> Self {
        SolverOutput {
            lmu: 0,
            a0: Array2::zeros((nr, nlam)),
            ca: Array3::zeros((nx, nr, nlam)),
            ia: Array1::zeros(nx),
            nin: Array1::zeros(nlam),
            nulldev: F::zero(),
            dev: Array1::zeros(nlam),
            alm: Array1::zeros(nlam),
            nlp: 0,
            jerr: 0,
        }
    }

    /// An output carrying only an error code
    pub fn failed(nx: usize, nr: usize, nlam: usize, jerr: i32) -> Self {
        SolverOutput {
            jerr,
            ..Self::new(nx, nr, nlam)
        }
    }

    pub(crate) fn record_entry_order(&mut self, order: &[usize]) {
        for (l, &j) in order.iter().enumerate().take(self.ia.len()) {
            self.ia[l] = j + 1;
        }
    }
}

/// Numerical engine fitting a regularization path in one blocking call
pub trait PathSolver<F: Float> {
    /// Fit the path described by `args`, ticking `progress` once per lambda
    ///
    /// Solver failures are reported through `jerr`. Errors are reserved for conditions which
    /// make every part of the path meaningless.
    fn solve(
        &self,
        args: &SolverArgs<F>,
        progress: &mut dyn PathProgress,
    ) -> Result<SolverOutput<F>>;

    /// Link of the fitted linear predictor
    fn link(&self) -> Link;

    fn validate_response(&self, y: ArrayView2<F>) -> Result<()>;

    /// Whether the solver fits several responses at once
    fn multi_response(&self) -> bool {
        false
    }
}

/// Non-fatal condition reported by a path solver
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverNote {
    pub code: i32,
    /// 1-based index of the lambda at which the solver stopped
    pub lambda_index: usize,
    pub msg: String,
}

/// Classification of a solver error code
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolverStatus {
    Ok,
    NonFatal(SolverNote),
}

/// Interpret the error code of a path solver
///
/// Positive codes are fatal. Negative codes leave the path up to the failing lambda usable: `-k`
/// reports a convergence failure at the `k`-th lambda, `-10000 - k` that the number of active
/// variables exceeded its cap at the `k`-th lambda.
pub fn classify_error(jerr: i32, maxit: usize) -> Result<SolverStatus> {
    if jerr == 0 {
        return Ok(SolverStatus::Ok);
    }
    if jerr > 0 {
        let msg = match jerr {
            7777 => "All used predictors have zero variance".to_string(),
            10000 => "All penalty factors are <= 0".to_string(),
            n if n < 7777 => "Memory allocation error; contact package maintainer".to_string(),
            _ => "Unknown error".to_string(),
        };
        return Err(GlmnetError::SolverFatal {
            code: jerr,
            msg: format!("Error code {}: {}", jerr, msg),
        });
    }

    let (lambda_index, msg) = if jerr <= -10000 {
        let k = (-jerr - 10000) as usize;
        (
            k,
            format!(
                "Maximal number of active variables exceeded at {}-th lambda value; solutions for larger lambdas returned",
                k
            ),
        )
    } else {
        let k = (-jerr) as usize;
        (
            k,
            format!(
                "Convergence for {}-th lambda value not reached after maxit={} iterations; solutions for larger lambdas returned",
                k, maxit
            ),
        )
    };
    Ok(SolverStatus::NonFatal(SolverNote {
        code: jerr,
        lambda_index,
        msg: format!("Error code {}: {}", jerr, msg),
    }))
}
