//! Regularization paths of non-Gaussian GLMs
//!
//! Each lambda is fitted by the IRLS driver with an elastic-net regularizer, starting from the
//! solution at the previous lambda.

use log::{debug, warn};
use ndarray::{Array1, ArrayView2};

use super::coordinate::Standardization;
use super::{PathSolver, SolverArgs, SolverOutput};
use crate::error::{GlmnetError, Result};
use crate::family::GlmFamily;
use crate::irls::{irls, IrlsControl, IrlsData};
use crate::link::Link;
use crate::progress::PathProgress;
use crate::regularizer::{ElasticNetPenalty, ElasticNetRegularizer, PenalizedObjective};
use crate::state::ModelState;
use crate::Float;

/// Path solver for a single response of any [`GlmFamily`]
///
/// Deviance fractions are relative to the intercept-only model.
#[derive(Clone, Debug, Default)]
pub struct GlmPathSolver<Fam> {
    family: Fam,
}

impl<Fam> GlmPathSolver<Fam> {
    pub fn new(family: Fam) -> Self {
        GlmPathSolver { family }
    }

    pub fn family(&self) -> &Fam {
        &self.family
    }
}

impl<F: Float, Fam: GlmFamily<F>> PathSolver<F> for GlmPathSolver<Fam> {
    fn solve(
        &self,
        args: &SolverArgs<F>,
        progress: &mut dyn PathProgress,
    ) -> Result<SolverOutput<F>> {
        let family = self.family.tuned(&args.control);
        let (ni, nx, nlam) = (args.ni, args.nx, args.nlam);
        let excluded = args.excluded();

        let std = Standardization::new(args.x, args.w, args.intr, args.isd, &excluded);
        if !std.ju.iter().any(|&u| u) {
            return Ok(SolverOutput::failed(nx, 1, nlam, 7777));
        }
        let vp = match args.normalized_penalty_factors(&std.ju) {
            Some(vp) => vp,
            None => return Ok(SolverOutput::failed(nx, 1, nlam, 10000)),
        };

        let y = args.y.column(0);
        let offset = args.offset.as_ref().map(|o| o.column(0));
        let data = IrlsData {
            design: args.x,
            y: y.view(),
            offset,
            weights: args.w.view(),
        };
        let control = IrlsControl {
            max_outer_iterations: args.control.mxit,
            mxitnr: args.control.mxitnr,
            epsnr: args.control.epsnr,
            big: args.control.big,
        };

        let mut penalty = ElasticNetPenalty {
            lambda: F::zero(),
            alpha: args.parm,
            penalty_factor: vp,
            scales: std.xs.clone(),
            lower_limits: args.cl.row(0).to_owned(),
            upper_limits: args.cl.row(1).to_owned(),
            excluded: (0..ni).filter(|&j| !std.ju[j]).collect(),
        };

        // intercept-only model
        let mean = family.initial_mean(y, args.w);
        let mut state = if args.intr {
            ModelState::null(&family, ni, args.no, mean)
        } else {
            ModelState::new(Array1::zeros(ni), F::zero(), args.no)
        };
        if args.intr {
            let mut null_penalty = penalty.clone();
            null_penalty.excluded = (0..ni).collect();
            let regularizer = self.regularizer(null_penalty.clone(), args);
            let objective = PenalizedObjective {
                family: &family,
                y: y.view(),
                weights: args.w.view(),
                penalty: &null_penalty,
            };
            state.update(args.x, &family, offset, &objective);
            state = irls(&regularizer, &family, &data, state, &objective, &control)?.state;
        }
        let nulldev = family.deviance(y, state.fitted_mean.view(), args.w);

        let residual = Array1::from_iter(y.iter().zip(state.fitted_mean.iter()).map(|(&y, &mu)| y - mu));
        let alpha = args.parm.max(F::cast(1e-3));
        let lambda_max = (0..ni)
            .filter(|&j| std.ju[j] && penalty.penalty_factor[j] > F::zero())
            .map(|j| {
                std.gradient(args.x, j, residual.view()).abs() / (alpha * penalty.penalty_factor[j])
            })
            .fold(F::zero(), F::max);
        debug!(
            "{} path: {} observations, {} variables, lambda_max {}",
            family.name(),
            args.no,
            ni,
            lambda_max
        );

        let mut out = SolverOutput::new(nx, 1, nlam);
        out.nulldev = nulldev;
        let mut order: Vec<usize> = Vec::new();
        let mut dev_prev = F::zero();

        progress.start(nlam);
        for m in 0..nlam {
            let lambda = args.lambda(m, lambda_max, F::one());
            let sentinel = m == 0 && args.flmin < F::one();
            if !sentinel {
                penalty.lambda = lambda;
                let regularizer = self.regularizer(penalty.clone(), args);
                let objective = PenalizedObjective {
                    family: &family,
                    y: y.view(),
                    weights: args.w.view(),
                    penalty: &penalty,
                };
                state.update(args.x, &family, offset, &objective);
                match irls(&regularizer, &family, &data, state.clone(), &objective, &control) {
                    Ok(fit) => {
                        if !fit.converged {
                            warn!(
                                "IRLS did not converge at lambda {} after {} iterations",
                                m + 1,
                                fit.n_iter
                            );
                        }
                        out.nlp += fit.n_iter;
                        state = fit.state;
                    }
                    Err(GlmnetError::MaxIterations(_)) => {
                        out.jerr = -(m as i32 + 1);
                        break;
                    }
                    Err(err) => return Err(err),
                }
            }

            for (j, c) in state.coefficients.iter().enumerate() {
                if *c != F::zero() && !order.contains(&j) {
                    order.push(j);
                }
            }
            if order.len() > nx {
                out.jerr = -10000 - (m as i32 + 1);
                break;
            }

            for (l, &j) in order.iter().enumerate() {
                out.ca[[l, 0, m]] = state.coefficients[j];
            }
            out.a0[[0, m]] = state.intercept;
            out.nin[m] = order.len();
            let dev = family.deviance(y, state.fitted_mean.view(), args.w);
            let frac = if nulldev > F::zero() {
                F::one() - dev / nulldev
            } else {
                F::zero()
            };
            out.dev[m] = frac;
            out.alm[m] = lambda;
            out.lmu = m + 1;
            progress.advance(1);

            if args.stop_early(m, state.n_active(), frac, dev_prev) {
                debug!("{} path stopped early after {} lambdas", family.name(), m + 1);
                break;
            }
            dev_prev = frac;
        }
        progress.finish();

        order.truncate(nx);
        out.record_entry_order(&order);
        Ok(out)
    }

    fn link(&self) -> Link {
        self.family.link()
    }

    fn validate_response(&self, y: ArrayView2<F>) -> Result<()> {
        if y.ncols() != 1 {
            return Err(GlmnetError::MultipleTargets);
        }
        self.family.validate_response(y.column(0))
    }
}

impl<Fam> GlmPathSolver<Fam> {
    fn regularizer<F: Float>(
        &self,
        penalty: ElasticNetPenalty<F>,
        args: &SolverArgs<F>,
    ) -> ElasticNetRegularizer<F> {
        ElasticNetRegularizer::new(penalty)
            .with_intercept(args.intr)
            .thresh(args.thr)
            .maxit(args.maxit)
            .weight_total(args.w.sum())
    }
}
