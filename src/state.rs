//! Fit state shared by the IRLS driver, the families and the regularizers

use ndarray::{Array1, ArrayView1};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::design::Design;
use crate::family::GlmFamily;
use crate::Float;

/// Objective evaluated on a fit state, usually a penalized deviance
pub trait Objective<F> {
    fn objective(&self, state: &ModelState<F>) -> F;
}

/// State of a single penalized GLM fit at a fixed penalty
///
/// The state is a plain value: snapshots are clones and a half step produces a new value. Every
/// mutation of the coefficients or the intercept has to be followed by [`update`](Self::update),
/// which recomputes the derived fields so that `objective_value` never goes stale.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct ModelState<F> {
    pub coefficients: Array1<F>,
    pub intercept: F,
    pub linear_predictor: Array1<F>,
    pub fitted_mean: Array1<F>,
    pub objective_value: F,
}

impl<F: Float> ModelState<F> {
    /// Create a state with the given coefficients and intercept
    ///
    /// The derived fields are zeroed and the objective is infinite until `update` is called.
    pub fn new(coefficients: Array1<F>, intercept: F, nobs: usize) -> Self {
        ModelState {
            coefficients,
            intercept,
            linear_predictor: Array1::zeros(nobs),
            fitted_mean: Array1::zeros(nobs),
            objective_value: F::infinity(),
        }
    }

    /// A state with all coefficients zero and the intercept at the link of the given mean
    pub fn null<Fam: GlmFamily<F>>(family: &Fam, nvars: usize, nobs: usize, mean: F) -> Self {
        Self::new(Array1::zeros(nvars), family.link().link_scalar(mean), nobs)
    }

    /// Recompute linear predictor, fitted mean and objective value from the coefficients
    pub fn update<Fam: GlmFamily<F>>(
        &mut self,
        design: &Design<F>,
        family: &Fam,
        offset: Option<ArrayView1<F>>,
        objective: &dyn Objective<F>,
    ) {
        let mut eta = design.dot(self.coefficients.view());
        eta += self.intercept;
        if let Some(offset) = offset {
            eta += &offset;
        }
        self.fitted_mean = family.link().inverse(&eta);
        self.linear_predictor = eta;
        self.objective_value = objective.objective(self);
    }

    /// Number of non-zero coefficients
    pub fn n_active(&self) -> usize {
        self.coefficients.iter().filter(|c| **c != F::zero()).count()
    }
}
