use ndarray::Array1;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use super::coef_path::InterpolationGrid;
use crate::error::{GlmnetError, Result};
use crate::param_guard::ParamGuard;
use crate::Float;

/// Tuning knobs of the path solvers
///
/// The defaults follow `glmnet.control`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FastNetControl {
    /// Minimum relative gain in deviance explained to continue the path
    pub fdev: f64,
    /// Floor of the ratio between smallest and largest generated lambda
    pub eps: f64,
    /// Stand-in for an infinite value, also the sentinel of the first generated lambda
    pub big: f64,
    /// Minimum number of path points before the path may stop early
    pub mnlam: usize,
    /// Fraction of deviance explained at which the path stops
    pub devmax: f64,
    /// Smallest fitted probability used for binomial working weights
    pub pmin: f64,
    /// Largest admissible linear predictor of the Poisson family
    pub exmx: f64,
    /// Outer IRLS iterations per lambda
    pub mxit: usize,
    /// Relative objective change at which IRLS has converged
    pub epsnr: f64,
    /// Step halvings per feasibility check
    pub mxitnr: usize,
    /// Coordinate descent sweeps
    pub maxit: usize,
    /// Convergence threshold of coordinate descent
    pub thresh: f64,
}

impl Default for FastNetControl {
    fn default() -> Self {
        FastNetControl {
            fdev: 1e-5,
            eps: 1e-6,
            big: 9.9e35,
            mnlam: 5,
            devmax: 0.999,
            pmin: 1e-9,
            exmx: 250.,
            mxit: 100,
            epsnr: 1e-6,
            mxitnr: 25,
            maxit: 100_000,
            thresh: 1e-7,
        }
    }
}

impl FastNetControl {
    fn check(&self) -> Result<()> {
        let positive = [
            ("eps", self.eps),
            ("big", self.big),
            ("devmax", self.devmax),
            ("epsnr", self.epsnr),
            ("thresh", self.thresh),
        ];
        for (name, value) in positive.iter() {
            if !(*value > 0.) {
                return Err(GlmnetError::InvalidControl(format!(
                    "{} should be positive, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..0.5).contains(&self.pmin) {
            return Err(GlmnetError::InvalidControl(format!(
                "pmin should be in [0, 0.5), got {}",
                self.pmin
            )));
        }
        if self.fdev < 0. {
            return Err(GlmnetError::InvalidControl(format!(
                "fdev should be non-negative, got {}",
                self.fdev
            )));
        }
        let budgets = [
            ("mxit", self.mxit),
            ("mxitnr", self.mxitnr),
            ("maxit", self.maxit),
        ];
        for (name, value) in budgets.iter() {
            if *value == 0 {
                return Err(GlmnetError::InvalidControl(format!(
                    "{} should be positive",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Coefficient limits, shared by all variables or given per variable
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub enum Limits<F> {
    Scalar(F),
    PerVariable(Array1<F>),
}

impl<F: Float> Limits<F> {
    /// Limits for `nvars` variables
    pub fn broadcast(&self, nvars: usize) -> Result<Array1<F>> {
        match self {
            Limits::Scalar(v) => Ok(Array1::from_elem(nvars, *v)),
            Limits::PerVariable(v) if v.len() == nvars => Ok(v.clone()),
            Limits::PerVariable(v) => Err(GlmnetError::ShapeMismatch {
                what: "coefficient limits",
                expected: nvars,
                actual: v.len(),
            }),
        }
    }

    fn values(&self) -> Vec<F> {
        match self {
            Limits::Scalar(v) => vec![*v],
            Limits::PerVariable(v) => v.to_vec(),
        }
    }
}

impl<F> From<F> for Limits<F> {
    fn from(value: F) -> Self {
        Limits::Scalar(value)
    }
}

impl<F> From<Array1<F>> for Limits<F> {
    fn from(values: Array1<F>) -> Self {
        Limits::PerVariable(values)
    }
}

/// A verified hyper-parameter set ready for fitting a regularization path
///
/// See [`FastNetParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FastNetValidParams<F, S> {
    alpha: F,
    lambda_values: Option<Array1<F>>,
    lambda_min_ratio: Option<F>,
    nlambda: usize,
    df_max: Option<usize>,
    lower_limits: Limits<F>,
    upper_limits: Limits<F>,
    penalty_factor: Option<Array1<F>>,
    exclude: Vec<usize>,
    standardize: bool,
    fit_intercept: bool,
    interpolation_grid: Option<InterpolationGrid<F>>,
    control: FastNetControl,
    solver: S,
}

impl<F: Float, S> FastNetValidParams<F, S> {
    pub fn alpha(&self) -> F {
        self.alpha
    }

    pub fn lambda_values(&self) -> Option<&Array1<F>> {
        self.lambda_values.as_ref()
    }

    pub fn lambda_min_ratio(&self) -> Option<F> {
        self.lambda_min_ratio
    }

    pub fn nlambda(&self) -> usize {
        self.nlambda
    }

    pub fn df_max(&self) -> Option<usize> {
        self.df_max
    }

    pub fn lower_limits(&self) -> &Limits<F> {
        &self.lower_limits
    }

    pub fn upper_limits(&self) -> &Limits<F> {
        &self.upper_limits
    }

    pub fn penalty_factor(&self) -> Option<&Array1<F>> {
        self.penalty_factor.as_ref()
    }

    pub fn exclude(&self) -> &[usize] {
        &self.exclude
    }

    pub fn standardize(&self) -> bool {
        self.standardize
    }

    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    pub fn interpolation_grid(&self) -> Option<&InterpolationGrid<F>> {
        self.interpolation_grid.as_ref()
    }

    pub fn control(&self) -> &FastNetControl {
        &self.control
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }
}

/// A hyper-parameter set for an elastic-net regularization path
///
/// For every lambda of a decreasing sequence the penalized problem
/// ```ignore
/// deviance(y, X b + a) / (2 * sum(w))
///     + lambda * sum_j vp_j * ((1 - alpha) / 2 * b_j^2 + alpha * |b_j|)
/// ```
/// is solved subject to `lower_limits <= b <= upper_limits`. The family of the deviance is
/// determined by the path solver `S`.
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [alpha](Self::alpha) | `1.0` | Mixing of L1 and L2 penalty | `[0, 1]` |
/// | [lambda_values](Self::lambda_values) | `None` | Explicit lambda sequence | `[0, inf)` |
/// | [lambda_min_ratio](Self::lambda_min_ratio) | `1e-2` if `nobs < nvars`, else `1e-4` | Smallest generated lambda relative to the largest | `(0, 1)` |
/// | [nlambda](Self::nlambda) | `100` | Number of generated lambdas | `[1, inf)` |
/// | [df_max](Self::df_max) | `nvars + 1` | Maximal number of variables in the model | `[0, inf)` |
/// | [lower_limits](Self::lower_limits) | `-inf` | Lower coefficient limits | `(-inf, 0]` |
/// | [upper_limits](Self::upper_limits) | `inf` | Upper coefficient limits | `[0, inf)` |
/// | [penalty_factor](Self::penalty_factor) | ones | Relative penalty per variable | `[0, inf)` |
/// | [exclude](Self::exclude) | none | Variables held at zero | `[0, nvars)` |
/// | [standardize](Self::standardize) | `true` | Standardize variables before fitting | `false`, `true` |
/// | [fit_intercept](Self::fit_intercept) | `true` | Fit an unpenalized intercept | `false`, `true` |
///
/// # Errors
///
/// Returns [`InvalidAlpha`](GlmnetError::InvalidAlpha) if alpha is outside of `[0, 1]`.
///
/// Returns [`NegativeLambda`](GlmnetError::NegativeLambda) if an explicit lambda is negative and
/// [`EmptyLambdaSequence`](GlmnetError::EmptyLambdaSequence) if no lambda is requested.
///
/// Returns [`InvalidLowerLimit`](GlmnetError::InvalidLowerLimit) or
/// [`InvalidUpperLimit`](GlmnetError::InvalidUpperLimit) if a limit excludes zero.
///
/// # Example
///
/// ```rust
/// use glmnet::prelude::*;
/// use ndarray::array;
///
/// let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]];
/// let y = array![1.0, 0.5, 1.4, 2.6];
/// let data = GlmData::single(&x, y);
///
/// let params = FastNet::gaussian().alpha(0.5).lambda_values(vec![0.5, 0.1, 0.01]);
/// let model = params.fit(&data)?;
/// assert_eq!(model.coef_path().lambda_values().len(), 3);
/// # Ok::<(), GlmnetError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FastNetParams<F, S>(FastNetValidParams<F, S>);

impl<F: Float, S: Default> Default for FastNetParams<F, S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<F: Float, S> FastNetParams<F, S> {
    /// Default hyper-parameters for the given path solver
    pub fn new(solver: S) -> Self {
        FastNetParams(FastNetValidParams {
            alpha: F::one(),
            lambda_values: None,
            lambda_min_ratio: None,
            nlambda: 100,
            df_max: None,
            lower_limits: Limits::Scalar(F::neg_infinity()),
            upper_limits: Limits::Scalar(F::infinity()),
            penalty_factor: None,
            exclude: Vec::new(),
            standardize: true,
            fit_intercept: true,
            interpolation_grid: None,
            control: FastNetControl::default(),
            solver,
        })
    }

    /// Set the elastic-net mixing parameter, `1` is the lasso and `0` ridge regression
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Fit exactly these lambdas instead of generating a sequence
    ///
    /// The values are sorted in decreasing order and override `nlambda`.
    pub fn lambda_values(mut self, lambda_values: impl Into<Array1<F>>) -> Self {
        self.0.lambda_values = Some(lambda_values.into());
        self
    }

    pub fn lambda_min_ratio(mut self, ratio: F) -> Self {
        self.0.lambda_min_ratio = Some(ratio);
        self
    }

    pub fn nlambda(mut self, nlambda: usize) -> Self {
        self.0.nlambda = nlambda;
        self
    }

    pub fn df_max(mut self, df_max: usize) -> Self {
        self.0.df_max = Some(df_max);
        self
    }

    pub fn lower_limits(mut self, limits: impl Into<Limits<F>>) -> Self {
        self.0.lower_limits = limits.into();
        self
    }

    pub fn upper_limits(mut self, limits: impl Into<Limits<F>>) -> Self {
        self.0.upper_limits = limits.into();
        self
    }

    pub fn penalty_factor(mut self, penalty_factor: Array1<F>) -> Self {
        self.0.penalty_factor = Some(penalty_factor);
        self
    }

    /// Hold these variables at zero along the whole path
    pub fn exclude(mut self, exclude: Vec<usize>) -> Self {
        self.0.exclude = exclude;
        self
    }

    pub fn standardize(mut self, standardize: bool) -> Self {
        self.0.standardize = standardize;
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.fit_intercept = fit_intercept;
        self
    }

    /// Report the coefficient path interpolated onto this grid
    pub fn interpolation_grid(mut self, grid: InterpolationGrid<F>) -> Self {
        self.0.interpolation_grid = Some(grid);
        self
    }

    pub fn control(mut self, control: FastNetControl) -> Self {
        self.0.control = control;
        self
    }
}

impl<F: Float, S> ParamGuard for FastNetParams<F, S> {
    type Checked = FastNetValidParams<F, S>;
    type Error = GlmnetError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let p = &self.0;
        if !(F::zero()..=F::one()).contains(&p.alpha) {
            return Err(GlmnetError::InvalidAlpha(p.alpha.to_f32().unwrap_or(f32::NAN)));
        }
        if let Some(lambdas) = &p.lambda_values {
            if lambdas.is_empty() {
                return Err(GlmnetError::EmptyLambdaSequence);
            }
            if let Some(l) = lambdas.iter().find(|l| !(**l >= F::zero())) {
                return Err(GlmnetError::NegativeLambda(l.to_f32().unwrap_or(f32::NAN)));
            }
        } else if p.nlambda == 0 {
            return Err(GlmnetError::EmptyLambdaSequence);
        }
        if let Some(ratio) = p.lambda_min_ratio {
            if !(ratio > F::zero() && ratio < F::one()) {
                return Err(GlmnetError::InvalidLambdaMinRatio(
                    ratio.to_f32().unwrap_or(f32::NAN),
                ));
            }
        }
        for (index, value) in p.lower_limits.values().into_iter().enumerate() {
            if !(value <= F::zero()) {
                return Err(GlmnetError::InvalidLowerLimit {
                    index,
                    value: value.to_f32().unwrap_or(f32::NAN),
                });
            }
        }
        for (index, value) in p.upper_limits.values().into_iter().enumerate() {
            if !(value >= F::zero()) {
                return Err(GlmnetError::InvalidUpperLimit {
                    index,
                    value: value.to_f32().unwrap_or(f32::NAN),
                });
            }
        }
        if let Some(vp) = &p.penalty_factor {
            if let Some((index, value)) = vp.iter().enumerate().find(|(_, v)| !(**v >= F::zero()))
            {
                return Err(GlmnetError::InvalidPenaltyFactor {
                    index,
                    value: value.to_f32().unwrap_or(f32::NAN),
                });
            }
        }
        p.control.check()?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
