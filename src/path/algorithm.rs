use log::{debug, warn};
use ndarray::{s, Array1, Array2, Array3, Axis};

use super::coef_path::CoefPath;
use super::hyperparams::FastNetValidParams;
use super::{FastNet, PathSummary};
use crate::dataset::GlmData;
use crate::error::{GlmnetError, Result};
use crate::progress::{NoProgress, PathProgress};
use crate::solver::{classify_error, PathSolver, SolverArgs, SolverOutput, SolverStatus};
use crate::traits::Fit;
use crate::Float;

impl<'a, F: Float, S: PathSolver<F>> Fit<GlmData<'a, F>, GlmnetError>
    for FastNetValidParams<F, S>
{
    type Object = FastNet<F>;

    /// Fit the regularization path of `data`
    ///
    /// The design must have shape `(nobs, nvars)` and the response `(nobs, nresp)`, with a
    /// single response column unless the solver fits several responses at once.
    fn fit(&self, data: &GlmData<'a, F>) -> Result<FastNet<F>> {
        self.fit_with_progress(data, &mut NoProgress)
    }
}

impl<F: Float, S: PathSolver<F>> FastNetValidParams<F, S> {
    /// Fit the regularization path, ticking `progress` once per fitted lambda
    pub fn fit_with_progress(
        &self,
        data: &GlmData<F>,
        progress: &mut dyn PathProgress,
    ) -> Result<FastNet<F>> {
        let x = data.design();
        let (nobs, nvars) = (x.nobs(), x.nvars());
        let y = data.response();
        check_len("response rows", nobs, y.nrows())?;
        if !self.solver().multi_response() && y.ncols() != 1 {
            return Err(GlmnetError::MultipleTargets);
        }
        self.solver().validate_response(y)?;
        let nr = y.ncols();

        if let Some(w) = data.given_weights() {
            check_len("weights", nobs, w.len())?;
        }
        let weights = data.weights();
        if let Some(offset) = data.offset() {
            check_len("offset rows", nobs, offset.nrows())?;
            check_len("offset columns", nr, offset.ncols())?;
        }
        if !data.given_feature_names().is_empty() {
            check_len("feature names", nvars, data.given_feature_names().len())?;
        }

        let df_max = self.df_max().unwrap_or(nvars + 1);
        let lower = self.lower_limits().broadcast(nvars)?;
        let upper = self.upper_limits().broadcast(nvars)?;
        let mut cl = Array2::zeros((2, nvars));
        cl.row_mut(0).assign(&lower);
        cl.row_mut(1).assign(&upper);

        let jd = exclusion_list(self.exclude(), nvars)?;
        let vp = match self.penalty_factor() {
            Some(vp) => {
                check_len("penalty factors", nvars, vp.len())?;
                vp.clone()
            }
            None => Array1::ones(nvars),
        };

        let mut control = self.control().clone();
        let (flmin, ulam, nlam) = match self.lambda_values() {
            Some(values) => {
                let mut ulam = values.to_vec();
                ulam.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
                (F::one(), Array1::from(ulam), values.len())
            }
            None => {
                let default_ratio = if nobs < nvars { 1e-2 } else { 1e-4 };
                let ratio = self
                    .lambda_min_ratio()
                    .unwrap_or_else(|| F::cast(default_ratio))
                    .max(F::cast(control.eps));
                (ratio, Array1::zeros(1), self.nlambda())
            }
        };
        if lower.iter().chain(upper.iter()).any(|l| *l == F::zero()) {
            control.fdev = 0.;
        }
        let nx = (2 * df_max + 20).min(nvars);

        debug!(
            "solver call: {} observations, {} variables, {} responses, nlam {}, flmin {}, nx {}, {} excluded",
            nobs,
            nvars,
            nr,
            nlam,
            flmin,
            nx,
            jd[0]
        );
        let args = SolverArgs {
            parm: self.alpha(),
            ni: nvars,
            no: nobs,
            x,
            y,
            offset: data.offset(),
            w: weights.view(),
            jd,
            vp,
            cl,
            ne: df_max,
            nx,
            nlam,
            flmin,
            ulam,
            thr: F::cast(control.thresh),
            isd: self.standardize(),
            intr: self.fit_intercept(),
            maxit: control.maxit,
            control,
        };
        let out = self.solver().solve(&args, progress)?;

        let solver_note = match classify_error(out.jerr, args.maxit)? {
            SolverStatus::Ok => None,
            SolverStatus::NonFatal(note) => {
                warn!("{}", note.msg);
                Some(note)
            }
        };
        if out.lmu == 0 {
            warn!("an empty model has been returned; probably a convergence issue");
        }

        let (coefs, intercepts) = expand_coefficients(&out, nvars);
        let nfits = out.lmu;
        let mut lambda = out.alm.slice(s![..nfits]).to_owned();
        if nfits > 2 && self.lambda_values().is_none() {
            lambda[0] = lambda[1] * lambda[1] / lambda[2];
        }
        let degrees_of_freedom = degrees_of_freedom(&coefs);
        let fracdev = out.dev.slice(s![..nfits]).to_owned();

        let mut coef_path = CoefPath::new(
            coefs,
            intercepts,
            lambda.clone(),
            fracdev.clone(),
            data.feature_names(),
        );
        if let Some(grid) = self.interpolation_grid() {
            if nfits > 0 {
                coef_path = coef_path.interpolate(grid)?;
            }
        }

        Ok(FastNet {
            lambda_max: lambda.get(0).copied(),
            coef_path,
            summary: PathSummary {
                lambda,
                degrees_of_freedom,
                fraction_deviance_explained: fracdev,
            },
            nlambda: nlam,
            null_deviance: out.nulldev,
            n_passes: out.nlp,
            solver_note,
            link: self.solver().link(),
        })
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(GlmnetError::ShapeMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Excluded variables as `[count, 1-based indices...]`, `[0]` if there are none
fn exclusion_list(exclude: &[usize], nvars: usize) -> Result<Vec<usize>> {
    if let Some(&index) = exclude.iter().find(|&&j| j >= nvars) {
        return Err(GlmnetError::ExcludedOutOfRange { index, nvars });
    }
    let mut excluded = exclude.to_vec();
    excluded.sort_unstable();
    excluded.dedup();

    let mut jd = Vec::with_capacity(excluded.len() + 1);
    jd.push(excluded.len());
    jd.extend(excluded.iter().map(|j| j + 1));
    Ok(jd)
}

/// Scatter the compact solver coefficients into `(lambda, variable, response)` form
///
/// Intercepts are returned as `(lambda, response)`.
fn expand_coefficients<F: Float>(out: &SolverOutput<F>, nvars: usize) -> (Array3<F>, Array2<F>) {
    let nfits = out.lmu;
    let nr = out.a0.nrows();
    let ninmax = out.nin.iter().take(nfits).copied().max().unwrap_or(0);

    let mut coefs = Array3::zeros((nfits, nvars, nr));
    for m in 0..nfits {
        for l in 0..ninmax {
            let j = match out.ia[l] {
                0 => continue,
                j => j - 1,
            };
            for k in 0..nr {
                coefs[[m, j, k]] = out.ca[[l, k, m]];
            }
        }
    }
    let intercepts = out.a0.slice(s![.., ..nfits]).t().to_owned();
    (coefs, intercepts)
}

/// Number of variables with a non-zero coefficient for any response, zero at the first lambda
fn degrees_of_freedom<F: Float>(coefs: &Array3<F>) -> Array1<usize> {
    let mut df: Array1<usize> = coefs
        .outer_iter()
        .map(|c| {
            c.axis_iter(Axis(0))
                .filter(|row| row.iter().map(|v| *v * *v).sum::<F>() > F::zero())
                .count()
        })
        .collect();
    if let Some(first) = df.get_mut(0) {
        *first = 0;
    }
    df
}
