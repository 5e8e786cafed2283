//! Penalized Newton steps for the IRLS driver
//!
//! A regularizer solves the penalized weighted least squares problem posed by one IRLS
//! iteration and produces half steps for backtracking.

use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::design::Design;
use crate::error::{GlmnetError, Result};
use crate::family::GlmFamily;
use crate::solver::coordinate::{ActiveSet, CoordinateDescent, Outcome, Standardization};
use crate::state::{ModelState, Objective};
use crate::Float;

/// Solver of the weighted least squares sub-problem of an IRLS iteration
pub trait Regularizer<F: Float> {
    /// Take one penalized Newton step from `state` on working response `z` with weights `w`
    ///
    /// Only coefficients and intercept of the returned state are meaningful, the caller has to
    /// [`update`](ModelState::update) it.
    fn newton_step(
        &self,
        design: &Design<F>,
        z: ArrayView1<F>,
        w: ArrayView1<F>,
        state: &ModelState<F>,
    ) -> Result<ModelState<F>>;

    /// Midpoint between `state` and `old_state`
    fn half_step(&self, state: &ModelState<F>, old_state: &ModelState<F>) -> ModelState<F> {
        let two = F::cast(2.);
        let mut half = state.clone();
        half.coefficients = (&state.coefficients + &old_state.coefficients) / two;
        half.intercept = (state.intercept + old_state.intercept) / two;
        half
    }
}

/// Elastic-net penalty `lambda * sum_j vp_j ((1 - alpha) / 2 (s_j b_j)^2 + alpha |s_j b_j|)`
///
/// `s_j` are fixed penalty scales, the standard deviations of the variables when the path is
/// standardized and ones otherwise. Coefficients are boxed by the lower and upper limits and
/// excluded variables are held at zero.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct ElasticNetPenalty<F> {
    pub lambda: F,
    pub alpha: F,
    pub penalty_factor: Array1<F>,
    pub scales: Array1<F>,
    pub lower_limits: Array1<F>,
    pub upper_limits: Array1<F>,
    pub excluded: Vec<usize>,
}

impl<F: Float> ElasticNetPenalty<F> {
    /// Unbounded penalty with unit penalty factors and scales
    pub fn new(nvars: usize, lambda: F, alpha: F) -> Self {
        ElasticNetPenalty {
            lambda,
            alpha,
            penalty_factor: Array1::ones(nvars),
            scales: Array1::ones(nvars),
            lower_limits: Array1::from_elem(nvars, F::neg_infinity()),
            upper_limits: Array1::from_elem(nvars, F::infinity()),
            excluded: Vec::new(),
        }
    }

    pub fn value(&self, coefficients: ArrayView1<F>) -> F {
        let half = F::cast(0.5);
        let mut l1 = F::zero();
        let mut l2 = F::zero();
        Zip::from(&coefficients)
            .and(&self.penalty_factor)
            .and(&self.scales)
            .for_each(|&b, &vp, &s| {
                let b = b * s;
                l1 += vp * b.abs();
                l2 += vp * b * b;
            });
        self.lambda * (self.alpha * l1 + (F::one() - self.alpha) * half * l2)
    }
}

/// Penalized deviance `deviance / (2 sum_i w_i) + penalty`
pub struct PenalizedObjective<'a, F, Fam> {
    pub family: &'a Fam,
    pub y: ArrayView1<'a, F>,
    pub weights: ArrayView1<'a, F>,
    pub penalty: &'a ElasticNetPenalty<F>,
}

impl<'a, F: Float, Fam: GlmFamily<F>> Objective<F> for PenalizedObjective<'a, F, Fam> {
    fn objective(&self, state: &ModelState<F>) -> F {
        let dev = self
            .family
            .deviance(self.y, state.fitted_mean.view(), self.weights);
        dev / (F::cast(2.) * self.weights.sum()) + self.penalty.value(state.coefficients.view())
    }
}

/// Elastic-net regularizer solving each Newton step by coordinate descent, warm-started from the
/// current coefficients
///
/// The quadratic model of [`PenalizedObjective`] weighs squared working residuals by
/// `1 / (2 sum_i w_i)` with the observation weights `w`. Unless told otherwise by
/// [`weight_total`](Self::weight_total), the observation weights are assumed to be the working
/// weights, which holds for the Gaussian family.
#[derive(Clone, Debug)]
pub struct ElasticNetRegularizer<F> {
    penalty: ElasticNetPenalty<F>,
    fit_intercept: bool,
    thresh: F,
    maxit: usize,
    weight_total: Option<F>,
}

impl<F: Float> ElasticNetRegularizer<F> {
    pub fn new(penalty: ElasticNetPenalty<F>) -> Self {
        ElasticNetRegularizer {
            penalty,
            fit_intercept: true,
            thresh: F::cast(1e-7),
            maxit: 100_000,
            weight_total: None,
        }
    }

    /// Sum of the observation weights the objective is normalised by
    pub fn weight_total(mut self, total: F) -> Self {
        self.weight_total = Some(total);
        self
    }

    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn thresh(mut self, thresh: F) -> Self {
        self.thresh = thresh;
        self
    }

    pub fn maxit(mut self, maxit: usize) -> Self {
        self.maxit = maxit;
        self
    }
}

impl<F: Float> Regularizer<F> for ElasticNetRegularizer<F> {
    fn newton_step(
        &self,
        design: &Design<F>,
        z: ArrayView1<F>,
        w: ArrayView1<F>,
        state: &ModelState<F>,
    ) -> Result<ModelState<F>> {
        let penalty = &self.penalty;
        let std = Standardization::with_scales(
            design,
            w,
            self.fit_intercept,
            penalty.scales.view(),
            &penalty.excluded,
        );

        let zm = if self.fit_intercept {
            std.w.dot(&z)
        } else {
            F::zero()
        };
        let centred = z.mapv(|v| v - zm);
        let null_dev = std.w.dot(&centred.mapv(|v| v * v));

        let mut b = (&state.coefficients * &std.xs).insert_axis(Axis(1));
        for (j, usable) in std.ju.iter().enumerate() {
            if !usable {
                b[[j, 0]] = F::zero();
            }
        }
        let mut r = std.residuals(design, centred.insert_axis(Axis(1)).view(), &b);

        let mut cl = Array2::zeros((2, design.nvars()));
        cl.row_mut(0).assign(&penalty.lower_limits);
        cl.row_mut(1).assign(&penalty.upper_limits);
        let cl = std.scaled_bounds(cl.view(), F::one());

        let cd = CoordinateDescent {
            design,
            std: &std,
            alpha: penalty.alpha,
            vp: penalty.penalty_factor.view(),
            cl: cl.view(),
            thr: if null_dev > F::zero() {
                self.thresh * null_dev
            } else {
                self.thresh
            },
            maxit: self.maxit,
            max_active: design.nvars(),
        };
        // working weights were normalised to unit sum above
        let lambda = match self.weight_total {
            Some(total) => penalty.lambda * total / w.sum(),
            None => penalty.lambda,
        };
        let mut passes = 0;
        let mut active = ActiveSet::new(design.nvars());
        if cd.solve(lambda, &mut b, &mut r, &mut active, &mut passes)
            == Outcome::MaxIterations
        {
            return Err(GlmnetError::MaxIterations(self.maxit));
        }

        let coefficients = &b.column(0) / &std.xs;
        let intercept = if self.fit_intercept {
            zm - coefficients.dot(&std.xm)
        } else {
            F::zero()
        };

        let mut next = state.clone();
        next.coefficients = coefficients;
        next.intercept = intercept;
        Ok(next)
    }
}
