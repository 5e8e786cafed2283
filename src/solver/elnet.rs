//! Gaussian elastic-net paths by coordinate descent

use log::debug;
use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::coordinate::{ActiveSet, CoordinateDescent, Outcome, Standardization};
use super::{PathSolver, SolverArgs, SolverOutput};
use crate::error::{GlmnetError, Result};
use crate::link::Link;
use crate::progress::PathProgress;
use crate::Float;

/// Path solver for a single Gaussian response
///
/// Minimises `1/(2 sum w) sum_i w_i (y_i - a - x_i b)^2 + lambda * penalty(b)` for each lambda,
/// warm-starting from the previous solution. Variables are standardized internally if requested
/// and coefficients are returned on the original scale.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElnetSolver;

impl<F: Float> PathSolver<F> for ElnetSolver {
    fn solve(
        &self,
        args: &SolverArgs<F>,
        progress: &mut dyn PathProgress,
    ) -> Result<SolverOutput<F>> {
        Ok(gaussian_path(args, progress))
    }

    fn link(&self) -> Link {
        Link::Identity
    }

    fn validate_response(&self, y: ArrayView2<F>) -> Result<()> {
        if y.ncols() != 1 {
            return Err(GlmnetError::MultipleTargets);
        }
        if y.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(GlmnetError::InvalidResponse("gaussian"))
        }
    }
}

/// Coordinate descent path shared by the single and multi-response Gaussian solvers
///
/// All responses are centred and divided by a common scale, so that the penalty of the group
/// update treats them alike.
pub(crate) fn gaussian_path<F: Float>(
    args: &SolverArgs<F>,
    progress: &mut dyn PathProgress,
) -> SolverOutput<F> {
    let (ni, nr, nx, nlam) = (args.ni, args.nr(), args.nx, args.nlam);
    let excluded = args.excluded();

    let std = Standardization::new(args.x, args.w, args.intr, args.isd, &excluded);
    if !std.ju.iter().any(|&u| u) {
        return SolverOutput::failed(nx, nr, nlam, 7777);
    }
    let vp = match args.normalized_penalty_factors(&std.ju) {
        Some(vp) => vp,
        None => return SolverOutput::failed(nx, nr, nlam, 10000),
    };

    let mut y = args.offset_response();
    let ym = if args.intr {
        y.t().dot(&std.w)
    } else {
        Array1::zeros(nr)
    };
    y -= &ym;
    let null_ss = y.map(|v| *v * *v).t().dot(&std.w).sum();
    let ys = if null_ss > F::zero() {
        null_ss.sqrt()
    } else {
        F::one()
    };
    y /= ys;
    let ss0 = null_ss / (ys * ys);

    let cl = std.scaled_bounds(args.cl.view(), ys);
    let cd = CoordinateDescent {
        design: args.x,
        std: &std,
        alpha: args.parm,
        vp: vp.view(),
        cl: cl.view(),
        thr: args.thr,
        maxit: args.maxit,
        max_active: nx,
    };

    let mut out = SolverOutput::new(nx, nr, nlam);
    out.nulldev = null_ss * args.w.sum();

    let mut b = Array2::zeros((ni, nr));
    let mut r = y;
    let mut active = ActiveSet::new(ni);
    let lambda_max = cd.max_penalty(&r);
    debug!(
        "gaussian path: {} observations, {} variables, {} responses, lambda_max {}",
        args.no,
        ni,
        nr,
        lambda_max * ys
    );

    let mut passes = 0;
    let mut rsq_prev = F::zero();
    progress.start(nlam);
    for m in 0..nlam {
        let lambda = args.lambda(m, lambda_max, ys);
        match cd.solve(lambda, &mut b, &mut r, &mut active, &mut passes) {
            Outcome::Converged => {}
            Outcome::MaxIterations => {
                out.jerr = -(m as i32 + 1);
                break;
            }
            Outcome::TooManyActive => {
                out.jerr = -10000 - (m as i32 + 1);
                break;
            }
        }

        let order = active.order();
        for (l, &j) in order.iter().enumerate() {
            for k in 0..nr {
                out.ca[[l, k, m]] = b[[j, k]] * ys / std.xs[j];
            }
        }
        for k in 0..nr {
            out.a0[[k, m]] = if args.intr {
                ym[k]
                    - order
                        .iter()
                        .enumerate()
                        .map(|(l, &j)| out.ca[[l, k, m]] * std.xm[j])
                        .sum::<F>()
            } else {
                F::zero()
            };
        }
        out.nin[m] = order.len();

        let rss = r.map(|v| *v * *v).t().dot(&std.w).sum();
        let rsq = if ss0 > F::zero() {
            F::one() - rss / ss0
        } else {
            F::zero()
        };
        out.dev[m] = rsq;
        // user lambdas and the sentinel are reported as given
        out.alm[m] = if args.flmin >= F::one() {
            args.ulam[m]
        } else if m == 0 {
            lambda
        } else {
            lambda * ys
        };
        out.lmu = m + 1;
        progress.advance(1);

        let n_nonzero = b
            .axis_iter(Axis(0))
            .filter(|row| row.iter().any(|v| *v != F::zero()))
            .count();
        if args.stop_early(m, n_nonzero, rsq, rsq_prev) {
            debug!("gaussian path stopped early after {} lambdas", m + 1);
            break;
        }
        rsq_prev = rsq;
    }
    progress.finish();

    out.record_entry_order(active.order());
    out.nlp = passes;
    out
}
