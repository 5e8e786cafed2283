//! Pre-extracted inputs of a path fit
//!
//! `GlmData` bundles a design with its response matrix and the optional per-observation
//! weights and offsets. Shapes are only checked when the data is fitted.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::design::Design;
use crate::Float;

/// Design, responses and observation metadata
///
/// # Fields
///
/// * `design`: dense or sparse matrix with dimensionality (nobs, nvars)
/// * `response`: matrix with dimensionality (nobs, nresp), a single column for univariate families
/// * `weights`: optional observation weights with dimensionality (nobs), ones if missing
/// * `offset`: optional offsets of the linear predictor with dimensionality (nobs, nresp)
/// * `feature_names`: optional variable names with dimensionality (nvars)
#[derive(Clone, Debug)]
pub struct GlmData<'a, F> {
    design: Design<'a, F>,
    response: Array2<F>,
    weights: Option<Array1<F>>,
    offset: Option<Array2<F>>,
    feature_names: Vec<String>,
}

impl<'a, F: Float> GlmData<'a, F> {
    pub fn new(design: impl Into<Design<'a, F>>, response: Array2<F>) -> Self {
        GlmData {
            design: design.into(),
            response,
            weights: None,
            offset: None,
            feature_names: Vec::new(),
        }
    }

    /// Data with a single response column
    pub fn single(design: impl Into<Design<'a, F>>, response: Array1<F>) -> Self {
        Self::new(design, response.insert_axis(Axis(1)))
    }

    pub fn with_weights(mut self, weights: Array1<F>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Offsets, one column per response
    pub fn with_offset(mut self, offset: Array2<F>) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> Self {
        self.feature_names = names.into_iter().map(|n| n.into()).collect();
        self
    }

    pub fn design(&self) -> &Design<'a, F> {
        &self.design
    }

    pub fn response(&self) -> ArrayView2<F> {
        self.response.view()
    }

    pub fn nresponses(&self) -> usize {
        self.response.ncols()
    }

    /// Observation weights, ones if none were given
    pub fn weights(&self) -> Array1<F> {
        match &self.weights {
            Some(w) => w.clone(),
            None => Array1::ones(self.design.nobs()),
        }
    }

    pub fn offset(&self) -> Option<ArrayView2<F>> {
        self.offset.as_ref().map(|o| o.view())
    }

    /// Names of the variables, `X0`, `X1`, .. if none were given
    pub fn feature_names(&self) -> Vec<String> {
        if self.feature_names.is_empty() {
            (0..self.design.nvars()).map(|i| format!("X{}", i)).collect()
        } else {
            self.feature_names.clone()
        }
    }

    pub(crate) fn given_weights(&self) -> Option<ArrayView1<F>> {
        self.weights.as_ref().map(|w| w.view())
    }

    pub(crate) fn given_feature_names(&self) -> &[String] {
        &self.feature_names
    }
}
