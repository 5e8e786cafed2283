//! Fitted coefficient paths

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{GlmnetError, Result};
use crate::Float;

/// Target points of an interpolation query
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub enum InterpolationGrid<F> {
    /// Absolute lambda values
    Lambda(Array1<F>),
    /// Fractions of the largest fitted lambda
    Fraction(Array1<F>),
}

impl<F: Float> InterpolationGrid<F> {
    /// Absolute lambda values of the grid for a path starting at `lambda_max`
    pub fn lambdas(&self, lambda_max: F) -> Array1<F> {
        match self {
            InterpolationGrid::Lambda(values) => values.clone(),
            InterpolationGrid::Fraction(values) => values.mapv(|f| f * lambda_max),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            InterpolationGrid::Lambda(values) | InterpolationGrid::Fraction(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Coefficients and intercepts along a regularization path
///
/// Coefficients are indexed by `(lambda, variable, response)`, intercepts by
/// `(lambda, response)`. Single response paths carry a response axis of length one.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct CoefPath<F> {
    coefs: Array3<F>,
    intercepts: Array2<F>,
    lambda_values: Array1<F>,
    fracdev: Array1<F>,
    feature_names: Vec<String>,
}

impl<F: Float> CoefPath<F> {
    pub(crate) fn new(
        coefs: Array3<F>,
        intercepts: Array2<F>,
        lambda_values: Array1<F>,
        fracdev: Array1<F>,
        feature_names: Vec<String>,
    ) -> Self {
        CoefPath {
            coefs,
            intercepts,
            lambda_values,
            fracdev,
            feature_names,
        }
    }

    pub fn coefs(&self) -> ArrayView3<F> {
        self.coefs.view()
    }

    /// Coefficients of a single response path, `(lambda, variable)`
    pub fn univariate_coefs(&self) -> Result<ArrayView2<F>> {
        if self.nresponses() != 1 {
            return Err(GlmnetError::MultipleTargets);
        }
        Ok(self.coefs.index_axis(Axis(2), 0))
    }

    pub fn intercepts(&self) -> ArrayView2<F> {
        self.intercepts.view()
    }

    /// Intercepts of a single response path
    pub fn univariate_intercepts(&self) -> Result<ArrayView1<F>> {
        if self.nresponses() != 1 {
            return Err(GlmnetError::MultipleTargets);
        }
        Ok(self.intercepts.column(0))
    }

    pub fn lambda_values(&self) -> ArrayView1<F> {
        self.lambda_values.view()
    }

    /// Fraction of the null deviance explained at each lambda
    pub fn fracdev(&self) -> ArrayView1<F> {
        self.fracdev.view()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn nlambda(&self) -> usize {
        self.lambda_values.len()
    }

    pub fn nvars(&self) -> usize {
        self.coefs.len_of(Axis(1))
    }

    pub fn nresponses(&self) -> usize {
        self.coefs.len_of(Axis(2))
    }

    /// Interpolate the path onto `grid`
    ///
    /// Between two fitted lambdas the coefficients, intercepts and deviance fractions are
    /// linear in `log(lambda)`. Targets outside of the fitted range take the values of the
    /// closest end of the path. Negative or non-finite targets are rejected.
    pub fn interpolate(&self, grid: &InterpolationGrid<F>) -> Result<CoefPath<F>> {
        let n = self.nlambda();
        if n == 0 {
            return Err(GlmnetError::EmptyLambdaSequence);
        }
        let targets = grid.lambdas(self.lambda_values[0]);
        if let Some(l) = targets.iter().find(|l| !(l.is_finite() && **l >= F::zero())) {
            return Err(GlmnetError::NegativeLambda(l.to_f32().unwrap_or(f32::NAN)));
        }
        let (nvars, nresp) = (self.nvars(), self.nresponses());

        let mut coefs = Array3::zeros((targets.len(), nvars, nresp));
        let mut intercepts = Array2::zeros((targets.len(), nresp));
        let mut fracdev = Array1::zeros(targets.len());
        for (t, &target) in targets.iter().enumerate() {
            let (lo, hi, w) = self.bracket(target);
            let mut c = coefs.index_axis_mut(Axis(0), t);
            c.scaled_add(F::one() - w, &self.coefs.index_axis(Axis(0), lo));
            c.scaled_add(w, &self.coefs.index_axis(Axis(0), hi));
            let mut a = intercepts.row_mut(t);
            a.scaled_add(F::one() - w, &self.intercepts.row(lo));
            a.scaled_add(w, &self.intercepts.row(hi));
            fracdev[t] = (F::one() - w) * self.fracdev[lo] + w * self.fracdev[hi];
        }

        Ok(CoefPath {
            coefs,
            intercepts,
            lambda_values: targets,
            fracdev,
            feature_names: self.feature_names.clone(),
        })
    }

    /// Fitted neighbours of `target` and the weight of the smaller one
    fn bracket(&self, target: F) -> (usize, usize, F) {
        let lambdas = &self.lambda_values;
        let last = lambdas.len() - 1;
        if target >= lambdas[0] {
            return (0, 0, F::zero());
        }
        if target <= lambdas[last] {
            return (last, last, F::zero());
        }
        // lambdas[k - 1] > target >= lambdas[k]
        let k = lambdas
            .iter()
            .position(|&l| l <= target)
            .unwrap_or(last);
        if lambdas[k] == target {
            return (k, k, F::zero());
        }
        let (upper, lower) = (lambdas[k - 1], lambdas[k]);
        let w = if lower > F::zero() {
            (upper.ln() - target.ln()) / (upper.ln() - lower.ln())
        } else {
            (upper - target) / (upper - lower)
        };
        (k - 1, k, w)
    }
}
