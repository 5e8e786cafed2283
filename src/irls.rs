//! Iteratively reweighted least squares driver
//!
//! Each outer iteration linearises the GLM around the current fit (see
//! [`GlmFamily::working_response_and_weights`]) and lets a [`Regularizer`] take a penalized
//! Newton step. A step is only accepted after passing three feasibility checks, each of which
//! shrinks the step towards the previous iterate by repeated halving until it passes.

use std::fmt;

use log::{debug, info, trace};
use ndarray::{Array1, ArrayView1};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::design::Design;
use crate::error::{GlmnetError, Result};
use crate::family::GlmFamily;
use crate::regularizer::Regularizer;
use crate::state::{ModelState, Objective};
use crate::Float;

/// Slack allowed in the decrease check
const DECREASE_TOLERANCE: f64 = 1e-7;

/// Iteration budgets and tolerances of the IRLS driver
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct IrlsControl {
    /// Maximal number of outer Newton iterations
    pub max_outer_iterations: usize,
    /// Maximal number of step halvings per feasibility check
    pub mxitnr: usize,
    /// Relative objective change below which the fit has converged
    pub epsnr: f64,
    /// Objective values at or above this are treated as divergence
    pub big: f64,
}

impl Default for IrlsControl {
    fn default() -> Self {
        IrlsControl {
            max_outer_iterations: 25,
            mxitnr: 25,
            epsnr: 1e-6,
            big: 9.9e35,
        }
    }
}

/// Checks applied to every Newton step, in this order
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeasibilityCheck {
    /// Objective is finite and below `big`
    FiniteObjective,
    /// State lies inside the admissible domain of the family
    ValidState,
    /// Objective did not increase
    DecreasedObjective,
}

impl FeasibilityCheck {
    /// Whether a correction by this check marks the step as truncated at a boundary
    fn marks_boundary(self) -> bool {
        !matches!(self, FeasibilityCheck::DecreasedObjective)
    }
}

impl fmt::Display for FeasibilityCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeasibilityCheck::FiniteObjective => write!(f, "finite objective"),
            FeasibilityCheck::ValidState => write!(f, "valid state"),
            FeasibilityCheck::DecreasedObjective => write!(f, "decreased objective"),
        }
    }
}

/// Observations a fit is performed on
#[derive(Clone, Debug)]
pub struct IrlsData<'d, 'a, F> {
    pub design: &'d Design<'a, F>,
    pub y: ArrayView1<'d, F>,
    pub offset: Option<ArrayView1<'d, F>>,
    pub weights: ArrayView1<'d, F>,
}

/// Accepted quasi-Newton step
#[derive(Clone, Debug)]
pub struct QuasiNewtonStep<F> {
    pub state: ModelState<F>,
    /// The step was truncated by the finite or validity check
    pub boundary: bool,
    /// The step was shrunk at least once
    pub halved: bool,
    /// Working weights the step was computed with
    pub working_weights: Array1<F>,
}

/// Outcome of the IRLS driver
#[derive(Clone, Debug)]
pub struct IrlsFit<F> {
    pub converged: bool,
    /// The last step was truncated at a boundary
    pub boundary: bool,
    pub state: ModelState<F>,
    pub working_weights: Array1<F>,
    pub n_iter: usize,
}

/// Take one Newton step from `state` and shrink it until it is a feasible descent step
///
/// Fails with [`GlmnetError::UnrecoverableStep`] if any check still fails after
/// `control.mxitnr` halvings.
pub fn quasi_newton_step<F, R, Fam>(
    regularizer: &R,
    family: &Fam,
    data: &IrlsData<F>,
    state: ModelState<F>,
    objective: &dyn Objective<F>,
    control: &IrlsControl,
) -> Result<QuasiNewtonStep<F>>
where
    F: Float,
    R: Regularizer<F>,
    Fam: GlmFamily<F>,
{
    let old_state = state;
    let (z, working_weights) =
        family.working_response_and_weights(&old_state, data.y, data.offset, data.weights);

    let mut state =
        regularizer.newton_step(data.design, z.view(), working_weights.view(), &old_state)?;
    state.update(data.design, family, data.offset, objective);

    let big = F::cast(control.big);
    let slack = F::cast(DECREASE_TOLERANCE);
    let mut boundary = false;
    let mut halved = false;

    for check in [
        FeasibilityCheck::FiniteObjective,
        FeasibilityCheck::ValidState,
        FeasibilityCheck::DecreasedObjective,
    ] {
        let passes = |state: &ModelState<F>| match check {
            FeasibilityCheck::FiniteObjective => {
                state.objective_value.is_finite() && state.objective_value < big
            }
            FeasibilityCheck::ValidState => family.is_valid(state),
            FeasibilityCheck::DecreasedObjective => {
                state.objective_value <= old_state.objective_value + slack
            }
        };
        if passes(&state) {
            continue;
        }

        debug!("{} check failed, halving step", check);
        boundary |= check.marks_boundary();
        halved = true;

        let mut halvings = 0;
        while !passes(&state) {
            if halvings >= control.mxitnr {
                return Err(GlmnetError::UnrecoverableStep {
                    check,
                    retries: control.mxitnr,
                });
            }
            halvings += 1;
            state = regularizer.half_step(&state, &old_state);
            state.update(data.design, family, data.offset, objective);
        }
        debug!("{} check passed after {} halvings", check, halvings);
    }

    debug!(
        "old objective {}, new objective {}",
        old_state.objective_value, state.objective_value
    );

    Ok(QuasiNewtonStep {
        state,
        boundary,
        halved,
        working_weights,
    })
}

/// Fit a penalized GLM at a fixed penalty by iteratively reweighted least squares
///
/// The initial state has to be [`update`](ModelState::update)d. Convergence is declared when the
/// relative objective change `|f - f_old| / (0.1 + |f|)` drops below `control.epsnr`, or after the
/// first step for Gaussian families, whose single weighted least squares step is exact. Running
/// out of outer iterations is not an error, the returned fit is flagged as not converged.
pub fn irls<F, R, Fam>(
    regularizer: &R,
    family: &Fam,
    data: &IrlsData<F>,
    state: ModelState<F>,
    objective: &dyn Objective<F>,
    control: &IrlsControl,
) -> Result<IrlsFit<F>>
where
    F: Float,
    R: Regularizer<F>,
    Fam: GlmFamily<F>,
{
    if control.max_outer_iterations == 0 {
        return Err(GlmnetError::InvalidControl(
            "max_outer_iterations must be positive".into(),
        ));
    }

    info!("starting IRLS, objective {}", state.objective_value);
    let epsnr = F::cast(control.epsnr);
    let mut state = state;
    let mut converged = false;
    let mut boundary = false;
    let mut working_weights = Array1::zeros(0);
    let mut n_iter = 0;

    while n_iter < control.max_outer_iterations {
        n_iter += 1;
        let previous = state.objective_value;
        let step = quasi_newton_step(regularizer, family, data, state, objective, control)?;
        state = step.state;
        boundary = step.boundary;
        working_weights = step.working_weights;

        let current = state.objective_value;
        trace!("iteration {}, objective {}", n_iter, current);

        if (current - previous).abs() / (F::cast(0.1) + current.abs()) < epsnr
            || family.is_gaussian()
        {
            converged = true;
            break;
        }
    }

    info!("IRLS terminated after {} iterations", n_iter);

    Ok(IrlsFit {
        converged,
        boundary,
        state,
        working_weights,
        n_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Binomial, Gaussian};
    use crate::link::Link;
    use crate::regularizer::{ElasticNetPenalty, ElasticNetRegularizer, PenalizedObjective};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array2};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::{StandardNormal, Uniform};
    use ndarray_rand::RandomExt;
    use rand_isaac::Isaac64Rng;

    /// Gaussian family whose admissible domain is `|coef| <= 1.5`
    #[derive(Clone)]
    struct BoundedGaussian;

    impl GlmFamily<f64> for BoundedGaussian {
        fn name(&self) -> &'static str {
            "bounded"
        }

        fn link(&self) -> Link {
            Link::Identity
        }

        fn variance(&self, _mu: f64) -> f64 {
            1.
        }

        fn unit_deviance(&self, y: f64, mu: f64) -> f64 {
            (y - mu) * (y - mu)
        }

        fn is_valid(&self, state: &ModelState<f64>) -> bool {
            state.coefficients.iter().all(|c| c.abs() <= 1.5)
        }

        fn validate_response(&self, _y: ArrayView1<f64>) -> Result<()> {
            Ok(())
        }
    }

    /// Gaussian family that rejects every state
    #[derive(Clone)]
    struct Nowhere;

    impl GlmFamily<f64> for Nowhere {
        fn name(&self) -> &'static str {
            "nowhere"
        }

        fn link(&self) -> Link {
            Link::Identity
        }

        fn variance(&self, _mu: f64) -> f64 {
            1.
        }

        fn unit_deviance(&self, y: f64, mu: f64) -> f64 {
            (y - mu) * (y - mu)
        }

        fn is_valid(&self, _state: &ModelState<f64>) -> bool {
            false
        }

        fn validate_response(&self, _y: ArrayView1<f64>) -> Result<()> {
            Ok(())
        }
    }

    /// Regularizer stepping three times as far as the exact solution
    struct Overshoot(ElasticNetRegularizer<f64>);

    impl Regularizer<f64> for Overshoot {
        fn newton_step(
            &self,
            design: &Design<f64>,
            z: ArrayView1<f64>,
            w: ArrayView1<f64>,
            state: &ModelState<f64>,
        ) -> Result<ModelState<f64>> {
            let mut next = self.0.newton_step(design, z, w, state)?;
            next.coefficients *= 3.;
            Ok(next)
        }
    }

    fn line() -> (Array2<f64>, Array1<f64>, Array1<f64>) {
        let x = array![[1.], [2.], [3.], [4.]];
        let y = array![4., 8., 12., 16.];
        (x, y, Array1::ones(4))
    }

    fn unpenalized(nvars: usize) -> (ElasticNetPenalty<f64>, ElasticNetRegularizer<f64>) {
        let penalty = ElasticNetPenalty::new(nvars, 0., 1.);
        let reg = ElasticNetRegularizer::new(penalty.clone())
            .with_intercept(false)
            .thresh(1e-16);
        (penalty, reg)
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<IrlsControl>();
        has_autotraits::<FeasibilityCheck>();
        has_autotraits::<IrlsFit<f64>>();
        has_autotraits::<QuasiNewtonStep<f64>>();
    }

    #[test]
    fn gaussian_converges_in_one_iteration() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let x = Array::<f64, _>::random_using((40, 4), StandardNormal, &mut rng);
        let y = x.dot(&array![1., -2., 0., 0.5]) + 0.3;
        let w = Array::<f64, _>::random_using(40, Uniform::new(0.5, 2.), &mut rng);
        let offset = Array::<f64, _>::random_using(40, Uniform::new(-1., 1.), &mut rng);
        let design = Design::from(&x);
        let data = IrlsData {
            design: &design,
            y: y.view(),
            offset: Some(offset.view()),
            weights: w.view(),
        };

        let penalty = ElasticNetPenalty::new(4, 0.05, 0.5);
        let reg = ElasticNetRegularizer::new(penalty.clone());
        let objective = PenalizedObjective {
            family: &Gaussian,
            y: y.view(),
            weights: w.view(),
            penalty: &penalty,
        };

        let mut start = ModelState::new(array![5., 5., -5., 3.], 2., 40);
        start.update(&design, &Gaussian, data.offset, &objective);

        let fit = irls(&reg, &Gaussian, &data, start, &objective, &IrlsControl::default()).unwrap();
        assert!(fit.converged);
        assert_eq!(fit.n_iter, 1);
        assert_abs_diff_eq!(fit.working_weights, w);
    }

    #[test]
    fn invalid_step_is_halved_into_the_domain() {
        let (x, y, w) = line();
        let design = Design::from(&x);
        let data = IrlsData {
            design: &design,
            y: y.view(),
            offset: None,
            weights: w.view(),
        };
        let (penalty, reg) = unpenalized(1);
        let objective = PenalizedObjective {
            family: &BoundedGaussian,
            y: y.view(),
            weights: w.view(),
            penalty: &penalty,
        };
        let mut start = ModelState::new(array![0.], 0., 4);
        start.update(&design, &BoundedGaussian, None, &objective);

        let step = quasi_newton_step(
            &reg,
            &BoundedGaussian,
            &data,
            start,
            &objective,
            &IrlsControl::default(),
        )
        .unwrap();
        assert!(step.halved);
        assert!(step.boundary);
        // 4 -> 2 -> 1
        assert_abs_diff_eq!(step.state.coefficients[0], 1., epsilon = 1e-6);
    }

    #[test]
    fn overshooting_step_is_halved_without_boundary() {
        let (x, y, w) = line();
        let design = Design::from(&x);
        let data = IrlsData {
            design: &design,
            y: y.view(),
            offset: None,
            weights: w.view(),
        };
        let (penalty, reg) = unpenalized(1);
        let objective = PenalizedObjective {
            family: &Gaussian,
            y: y.view(),
            weights: w.view(),
            penalty: &penalty,
        };
        let mut start = ModelState::new(array![0.], 0., 4);
        start.update(&design, &Gaussian, None, &objective);
        let old_objective = start.objective_value;

        let step = quasi_newton_step(
            &Overshoot(reg),
            &Gaussian,
            &data,
            start,
            &objective,
            &IrlsControl::default(),
        )
        .unwrap();
        assert!(step.halved);
        assert!(!step.boundary);
        assert_abs_diff_eq!(step.state.coefficients[0], 6., epsilon = 1e-6);
        assert!(step.state.objective_value < old_objective);
    }

    #[test]
    fn unrecoverable_step_aborts() {
        let (x, y, w) = line();
        let design = Design::from(&x);
        let data = IrlsData {
            design: &design,
            y: y.view(),
            offset: None,
            weights: w.view(),
        };
        let (penalty, reg) = unpenalized(1);
        let objective = PenalizedObjective {
            family: &Nowhere,
            y: y.view(),
            weights: w.view(),
            penalty: &penalty,
        };
        let mut start = ModelState::new(array![0.], 0., 4);
        start.update(&design, &Nowhere, None, &objective);

        let control = IrlsControl {
            mxitnr: 5,
            ..IrlsControl::default()
        };
        let err = irls(&reg, &Nowhere, &data, start, &objective, &control).unwrap_err();
        assert!(matches!(
            err,
            GlmnetError::UnrecoverableStep {
                check: FeasibilityCheck::ValidState,
                retries: 5
            }
        ));
    }

    #[test]
    fn zero_iteration_budget_is_rejected() {
        let (x, y, w) = line();
        let design = Design::from(&x);
        let data = IrlsData {
            design: &design,
            y: y.view(),
            offset: None,
            weights: w.view(),
        };
        let (penalty, reg) = unpenalized(1);
        let objective = PenalizedObjective {
            family: &Gaussian,
            y: y.view(),
            weights: w.view(),
            penalty: &penalty,
        };
        let control = IrlsControl {
            max_outer_iterations: 0,
            ..IrlsControl::default()
        };
        let start = ModelState::new(array![0.], 0., 4);
        assert!(irls(&reg, &Gaussian, &data, start, &objective, &control).is_err());
    }

    fn logistic_data() -> (Array2<f64>, Array1<f64>) {
        let mut rng = Isaac64Rng::seed_from_u64(7);
        let x = Array::<f64, _>::random_using((200, 3), StandardNormal, &mut rng);
        let eta = x.dot(&array![1.5, -1., 0.]);
        let u = Array::<f64, _>::random_using(200, Uniform::new(0., 1.), &mut rng);
        let y = Array1::from_iter(
            eta.iter()
                .zip(u.iter())
                .map(|(&e, &u)| if u < 1. / (1. + (-e).exp()) { 1. } else { 0. }),
        );
        (x, y)
    }

    #[test]
    fn logistic_fit_converges() {
        let (x, y) = logistic_data();
        let w = Array1::<f64>::ones(200);
        let design = Design::from(&x);
        let data = IrlsData {
            design: &design,
            y: y.view(),
            offset: None,
            weights: w.view(),
        };

        let family = Binomial::default();
        let penalty = ElasticNetPenalty::new(3, 0.01, 1.);
        let reg = ElasticNetRegularizer::new(penalty.clone()).weight_total(200.);
        let objective = PenalizedObjective {
            family: &family,
            y: y.view(),
            weights: w.view(),
            penalty: &penalty,
        };
        let mean = family.initial_mean(y.view(), w.view());
        let mut start = ModelState::null(&family, 3, 200, mean);
        start.update(&design, &family, None, &objective);
        let null_objective = start.objective_value;

        let fit = irls(&reg, &family, &data, start, &objective, &IrlsControl::default()).unwrap();
        assert!(fit.converged);
        assert!(fit.n_iter > 1);
        assert!(fit.state.objective_value < null_objective);
        assert!(fit.state.coefficients[0] > 0.5);
        assert!(fit.state.coefficients[1] < -0.3);
    }

    #[test]
    fn exhausted_iterations_are_not_an_error() {
        let (x, y) = logistic_data();
        let w = Array1::<f64>::ones(200);
        let design = Design::from(&x);
        let data = IrlsData {
            design: &design,
            y: y.view(),
            offset: None,
            weights: w.view(),
        };

        let family = Binomial::default();
        let penalty = ElasticNetPenalty::new(3, 0.01, 1.);
        let reg = ElasticNetRegularizer::new(penalty.clone()).weight_total(200.);
        let objective = PenalizedObjective {
            family: &family,
            y: y.view(),
            weights: w.view(),
            penalty: &penalty,
        };
        let mean = family.initial_mean(y.view(), w.view());
        let mut start = ModelState::null(&family, 3, 200, mean);
        start.update(&design, &family, None, &objective);
        let null_objective = start.objective_value;

        let control = IrlsControl {
            max_outer_iterations: 1,
            epsnr: 1e-15,
            ..IrlsControl::default()
        };
        let fit = irls(&reg, &family, &data, start, &objective, &control);
        assert!(fit.is_ok());
        let fit = fit.unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.n_iter, 1);
        assert!(fit.state.objective_value < null_objective);
    }
}
