//! Distribution families consumed by the IRLS driver
//!
//! A family turns the current fit into the working response and working weights of the next
//! weighted least squares problem, knows its deviance and reports whether a fit state lies in its
//! admissible domain.

use ndarray::{Array1, ArrayView1, Zip};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{GlmnetError, Result};
use crate::link::Link;
use crate::path::FastNetControl;
use crate::state::ModelState;
use crate::Float;

/// Distribution family of a generalized linear model
pub trait GlmFamily<F: Float>: Clone {
    /// Short name used in error messages
    fn name(&self) -> &'static str;

    fn link(&self) -> Link;

    /// Whether a single weighted least squares solve fits the model exactly
    fn is_gaussian(&self) -> bool {
        false
    }

    /// Variance function `V(mu)`
    fn variance(&self, mu: F) -> F;

    /// Deviance contribution of a single observation with unit weight
    fn unit_deviance(&self, y: F, mu: F) -> F;

    /// Weighted deviance `sum_i w_i d(y_i, mu_i)`
    fn deviance(&self, y: ArrayView1<F>, mu: ArrayView1<F>, w: ArrayView1<F>) -> F {
        Zip::from(&y)
            .and(&mu)
            .and(&w)
            .fold(F::zero(), |acc, &y, &mu, &w| {
                acc + w * self.unit_deviance(y, mu)
            })
    }

    /// Whether the fitted state lies inside the admissible domain of the family
    fn is_valid(&self, state: &ModelState<F>) -> bool;

    /// Working response and working weights of the IRLS pseudo-data transform
    ///
    /// The working response excludes the offset, it is regressed on the design with an
    /// intercept.
    fn working_response_and_weights(
        &self,
        state: &ModelState<F>,
        y: ArrayView1<F>,
        offset: Option<ArrayView1<F>>,
        w: ArrayView1<F>,
    ) -> (Array1<F>, Array1<F>) {
        let mu_eta = self.link().inverse_derivative(&state.linear_predictor);
        let mut z = state.linear_predictor.clone();
        if let Some(offset) = offset {
            z -= &offset;
        }
        Zip::from(&mut z)
            .and(&y)
            .and(&state.fitted_mean)
            .and(&mu_eta)
            .for_each(|z, &y, &mu, &d| *z += (y - mu) / d);

        let mut working_weights = w.to_owned();
        Zip::from(&mut working_weights)
            .and(&state.fitted_mean)
            .and(&mu_eta)
            .for_each(|ww, &mu, &d| *ww *= d * d / self.variance(mu));

        (z, working_weights)
    }

    /// Mean used to initialise the intercept of the null model
    fn initial_mean(&self, y: ArrayView1<F>, w: ArrayView1<F>) -> F {
        y.dot(&w) / w.sum()
    }

    fn validate_response(&self, y: ArrayView1<F>) -> Result<()>;

    /// Adopt the numerical safeguards of a solver control block
    fn tuned(&self, _control: &FastNetControl) -> Self {
        self.clone()
    }
}

// y * log(y / mu) with the convention 0 * log(0) = 0
fn ylogy<F: Float>(y: F, mu: F) -> F {
    if y == F::zero() {
        F::zero()
    } else {
        y * (y / mu).ln()
    }
}

/// Normal distribution with identity link
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gaussian;

impl<F: Float> GlmFamily<F> for Gaussian {
    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn link(&self) -> Link {
        Link::Identity
    }

    fn is_gaussian(&self) -> bool {
        true
    }

    fn variance(&self, _mu: F) -> F {
        F::one()
    }

    fn unit_deviance(&self, y: F, mu: F) -> F {
        (y - mu) * (y - mu)
    }

    fn is_valid(&self, state: &ModelState<F>) -> bool {
        state.fitted_mean.iter().all(|mu| mu.is_finite())
    }

    fn validate_response(&self, y: ArrayView1<F>) -> Result<()> {
        if y.iter().all(|y| y.is_finite()) {
            Ok(())
        } else {
            Err(GlmnetError::InvalidResponse("gaussian"))
        }
    }
}

/// Bernoulli distribution of proportions with logit link
///
/// Fitted probabilities must lie strictly inside `(0, 1)`. Working weights are computed from
/// probabilities clamped to `[pmin, 1 - pmin]`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Binomial {
    pub pmin: f64,
}

impl Default for Binomial {
    fn default() -> Self {
        Binomial { pmin: 1e-9 }
    }
}

impl Binomial {
    fn clamp<F: Float>(&self, mu: F) -> F {
        let pmin = F::cast(self.pmin);
        mu.max(pmin).min(F::one() - pmin)
    }
}

impl<F: Float> GlmFamily<F> for Binomial {
    fn name(&self) -> &'static str {
        "binomial"
    }

    fn link(&self) -> Link {
        Link::Logit
    }

    fn variance(&self, mu: F) -> F {
        mu * (F::one() - mu)
    }

    fn unit_deviance(&self, y: F, mu: F) -> F {
        F::cast(2.) * (ylogy(y, mu) + ylogy(F::one() - y, F::one() - mu))
    }

    fn is_valid(&self, state: &ModelState<F>) -> bool {
        state
            .fitted_mean
            .iter()
            .all(|&mu| mu > F::zero() && mu < F::one())
    }

    fn working_response_and_weights(
        &self,
        state: &ModelState<F>,
        y: ArrayView1<F>,
        offset: Option<ArrayView1<F>>,
        w: ArrayView1<F>,
    ) -> (Array1<F>, Array1<F>) {
        let v = state
            .fitted_mean
            .mapv(|mu| <Self as GlmFamily<F>>::variance(self, self.clamp(mu)));
        let mut z = state.linear_predictor.clone();
        if let Some(offset) = offset {
            z -= &offset;
        }
        Zip::from(&mut z)
            .and(&y)
            .and(&state.fitted_mean)
            .and(&v)
            .for_each(|z, &y, &mu, &v| *z += (y - mu) / v);

        (z, &w * &v)
    }

    fn initial_mean(&self, y: ArrayView1<F>, w: ArrayView1<F>) -> F {
        self.clamp(y.dot(&w) / w.sum())
    }

    fn validate_response(&self, y: ArrayView1<F>) -> Result<()> {
        if y.iter().all(|&y| y >= F::zero() && y <= F::one()) {
            Ok(())
        } else {
            Err(GlmnetError::InvalidResponse("binomial"))
        }
    }

    fn tuned(&self, control: &FastNetControl) -> Self {
        Binomial {
            pmin: control.pmin,
        }
    }
}

/// Poisson distribution of counts with log link
///
/// The linear predictor must not exceed `exmx`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Poisson {
    pub exmx: f64,
}

impl Default for Poisson {
    fn default() -> Self {
        Poisson { exmx: 250. }
    }
}

impl<F: Float> GlmFamily<F> for Poisson {
    fn name(&self) -> &'static str {
        "poisson"
    }

    fn link(&self) -> Link {
        Link::Log
    }

    fn variance(&self, mu: F) -> F {
        mu
    }

    fn unit_deviance(&self, y: F, mu: F) -> F {
        F::cast(2.) * (ylogy(y, mu) - (y - mu))
    }

    fn is_valid(&self, state: &ModelState<F>) -> bool {
        let exmx = F::cast(self.exmx);
        state.linear_predictor.iter().all(|&eta| eta <= exmx)
            && state
                .fitted_mean
                .iter()
                .all(|&mu| mu > F::zero() && mu.is_finite())
    }

    fn initial_mean(&self, y: ArrayView1<F>, w: ArrayView1<F>) -> F {
        (y.dot(&w) / w.sum()).max(F::cast(1e-9))
    }

    fn validate_response(&self, y: ArrayView1<F>) -> Result<()> {
        if y.iter().all(|&y| y >= F::zero() && y.is_finite()) {
            Ok(())
        } else {
            Err(GlmnetError::InvalidResponse("poisson"))
        }
    }

    fn tuned(&self, control: &FastNetControl) -> Self {
        Poisson {
            exmx: control.exmx,
        }
    }
}
