//! glmnet prelude.
//!
//! This module contains the most used types, type aliases, traits and
//! functions that you can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{GlmnetError, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;

#[doc(no_inline)]
pub use crate::{Design, Float, GlmData};

#[doc(no_inline)]
pub use crate::family::{Binomial, Gaussian, GlmFamily, Poisson};

#[doc(no_inline)]
pub use crate::path::{
    CoefPath, FastNet, FastNetControl, FastNetParams, InterpolationGrid, Limits, PredictionType,
};
