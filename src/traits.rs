//! Provide traits for different classes of algorithms
//!

/// Fittable algorithms
///
/// A fittable algorithm takes a dataset and creates a concept of some kind about it. For example
/// a regularization path fitter takes a design with responses and produces the coefficient path.
///
/// The error type of the fitting process is part of the trait signature, so that checked and
/// unchecked hyperparameters can forward their validation errors through the same channel.
pub trait Fit<D, E: std::error::Error> {
    type Object;

    fn fit(&self, data: &D) -> Result<Self::Object, E>;
}

/// Predict with model
///
/// Maps records to predictions, for a fitted path one prediction per observation, lambda and
/// response.
pub trait Predict<R, T> {
    fn predict(&self, x: R) -> T;
}
