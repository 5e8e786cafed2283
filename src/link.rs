//! Link functions used by the GLM families

use ndarray::{Array1, ArrayBase, Data, Ix1};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::Float;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Link functions used by GLM
pub enum Link {
    /// The identity link function `g(x)=x`
    Identity,
    /// The log link function `g(x)=log(x)`
    Log,
    /// The logit link function `g(x)=logit(x)`
    Logit,
}

impl Link {
    /// Compute the link function `g(mu)`
    ///
    /// The link function links the mean `mu=E[y]` to the so called
    /// linear predictor, `g(mu)=linear predictor`
    pub fn link<F: Float, D: Data<Elem = F>>(&self, mu: &ArrayBase<D, Ix1>) -> Array1<F> {
        match self {
            Self::Identity => mu.mapv(IdentityLink::link),
            Self::Log => mu.mapv(LogLink::link),
            Self::Logit => mu.mapv(LogitLink::link),
        }
    }

    /// Computes the inverse link function `h(eta)`
    ///
    /// Gives the inverse relationship between the linear predictor and the mean
    /// `mu=E[y]`, i.e. `h(linear predictor)=mu`
    pub fn inverse<F: Float, D: Data<Elem = F>>(&self, eta: &ArrayBase<D, Ix1>) -> Array1<F> {
        match self {
            Self::Identity => eta.mapv(IdentityLink::inverse),
            Self::Log => eta.mapv(LogLink::inverse),
            Self::Logit => eta.mapv(LogitLink::inverse),
        }
    }

    /// Computes the derivative of the inverse link function `h'(eta)`
    pub fn inverse_derivative<F: Float, D: Data<Elem = F>>(
        &self,
        eta: &ArrayBase<D, Ix1>,
    ) -> Array1<F> {
        match self {
            Self::Identity => eta.mapv(IdentityLink::inverse_derivative),
            Self::Log => eta.mapv(LogLink::inverse_derivative),
            Self::Logit => eta.mapv(LogitLink::inverse_derivative),
        }
    }

    /// Scalar version of [`inverse`](Self::inverse)
    pub fn inverse_scalar<F: Float>(&self, eta: F) -> F {
        match self {
            Self::Identity => IdentityLink::inverse(eta),
            Self::Log => LogLink::inverse(eta),
            Self::Logit => LogitLink::inverse(eta),
        }
    }

    /// Scalar version of [`link`](Self::link)
    pub fn link_scalar<F: Float>(&self, mu: F) -> F {
        match self {
            Self::Identity => IdentityLink::link(mu),
            Self::Log => LogLink::link(mu),
            Self::Logit => LogitLink::link(mu),
        }
    }
}

trait LinkFn {
    fn link<F: Float>(mu: F) -> F;
    fn inverse<F: Float>(eta: F) -> F;
    fn inverse_derivative<F: Float>(eta: F) -> F;
}

struct IdentityLink;

impl LinkFn for IdentityLink {
    fn link<F: Float>(mu: F) -> F {
        mu
    }

    fn inverse<F: Float>(eta: F) -> F {
        eta
    }

    fn inverse_derivative<F: Float>(_eta: F) -> F {
        F::one()
    }
}

struct LogLink;

impl LinkFn for LogLink {
    fn link<F: Float>(mu: F) -> F {
        mu.ln()
    }

    fn inverse<F: Float>(eta: F) -> F {
        eta.exp()
    }

    fn inverse_derivative<F: Float>(eta: F) -> F {
        eta.exp()
    }
}

struct LogitLink;

impl LinkFn for LogitLink {
    fn link<F: Float>(mu: F) -> F {
        (mu / (F::one() - mu)).ln()
    }

    fn inverse<F: Float>(eta: F) -> F {
        // expit(eta)
        F::one() / (F::one() + (-eta).exp())
    }

    fn inverse_derivative<F: Float>(eta: F) -> F {
        // expit(eta) * (1 - expit(eta))
        let p = Self::inverse(eta);
        p * (F::one() - p)
    }
}
