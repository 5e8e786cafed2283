//! Weighted, box-constrained coordinate descent on centred and scaled variables
//!
//! Variables are visited through `x~_j = (x_j - xm_j) / xs_j`, so a sparse design is never
//! centred explicitly. Responses are stored column-wise, a single response is the one-column case
//! of the group update.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

use crate::design::Design;
use crate::Float;

/// Weighted centring and scaling of the design columns
#[derive(Clone, Debug)]
pub(crate) struct Standardization<F> {
    /// Observation weights normalised to unit sum
    pub w: Array1<F>,
    pub xm: Array1<F>,
    pub xs: Array1<F>,
    /// Weighted second moment of the transformed columns
    pub xv: Array1<F>,
    /// Variables that take part in the fit
    pub ju: Vec<bool>,
}

impl<F: Float> Standardization<F> {
    /// Centre columns when fitting an intercept and scale them to unit variance if `standardize`
    pub fn new(
        design: &Design<F>,
        weights: ArrayView1<F>,
        intercept: bool,
        standardize: bool,
        excluded: &[usize],
    ) -> Self {
        Self::build(design, weights, intercept, excluded, |var| {
            if standardize {
                var.sqrt()
            } else {
                F::one()
            }
        })
    }

    /// Centre columns when fitting an intercept and divide them by fixed scales
    pub fn with_scales(
        design: &Design<F>,
        weights: ArrayView1<F>,
        intercept: bool,
        scales: ArrayView1<F>,
        excluded: &[usize],
    ) -> Self {
        let mut j = 0;
        Self::build(design, weights, intercept, excluded, |_| {
            let s = scales[j];
            j += 1;
            s
        })
    }

    fn build(
        design: &Design<F>,
        weights: ArrayView1<F>,
        intercept: bool,
        excluded: &[usize],
        mut scale: impl FnMut(F) -> F,
    ) -> Self {
        let nvars = design.nvars();
        let w = &weights / weights.sum();
        let mut xm = Array1::zeros(nvars);
        let mut xs = Array1::ones(nvars);
        let mut xv = Array1::zeros(nvars);
        let mut ju = vec![true; nvars];
        for &j in excluded {
            ju[j] = false;
        }

        let tol = F::cast(16.) * F::epsilon();
        for j in 0..nvars {
            let (m1, m2) = design.column_moments(j, w.view());
            let center = if intercept { m1 } else { F::zero() };
            let var = m2 - center * center;
            let s = scale(var);
            if var <= tol * m2 || s <= F::zero() {
                ju[j] = false;
                continue;
            }
            xm[j] = center;
            xs[j] = s;
            xv[j] = var / (s * s);
        }

        Standardization { w, xm, xs, xv, ju }
    }

    /// `sum_i w_i x~_ij r_i`
    pub fn gradient(&self, design: &Design<F>, j: usize, r: ArrayView1<F>) -> F {
        let mut g = design.column_weighted_dot(j, self.w.view(), r);
        if self.xm[j] != F::zero() {
            g -= self.xm[j] * self.w.dot(&r);
        }
        g / self.xs[j]
    }

    /// `r -= d * x~_j` for every response column
    pub fn downdate(&self, design: &Design<F>, j: usize, d: ArrayView1<F>, r: &mut Array2<F>) {
        let (xm, xs) = (self.xm[j], self.xs[j]);
        for (mut col, &dk) in r.axis_iter_mut(Axis(1)).zip(d.iter()) {
            if dk == F::zero() {
                continue;
            }
            design.column_axpy(j, -dk / xs, col.view_mut());
            if xm != F::zero() {
                col += dk * xm / xs;
            }
        }
    }

    /// Residuals `y - sum_j x~_j b_j` of centred responses
    pub fn residuals(&self, design: &Design<F>, y: ArrayView2<F>, b: &Array2<F>) -> Array2<F> {
        let mut r = y.to_owned();
        for j in 0..b.nrows() {
            if b.row(j).iter().any(|v| *v != F::zero()) {
                self.downdate(design, j, b.row(j), &mut r);
            }
        }
        r
    }

    /// Bounds of the original coefficients mapped onto the transformed scale
    pub fn scaled_bounds(&self, cl: ArrayView2<F>, ys: F) -> Array2<F> {
        let mut out = cl.to_owned();
        for mut row in out.axis_iter_mut(Axis(0)) {
            Zip::from(&mut row)
                .and(&self.xs)
                .for_each(|c, &s| *c = *c * s / ys);
        }
        out
    }
}

/// Variables in the order they first became non-zero
#[derive(Clone, Debug)]
pub(crate) struct ActiveSet {
    order: Vec<usize>,
    member: Vec<bool>,
}

impl ActiveSet {
    pub fn new(nvars: usize) -> Self {
        ActiveSet {
            order: Vec::new(),
            member: vec![false; nvars],
        }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, j: usize) -> bool {
        self.member[j]
    }

    fn insert(&mut self, j: usize) {
        if !self.member[j] {
            self.member[j] = true;
            self.order.push(j);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Converged,
    MaxIterations,
    TooManyActive,
}

/// Elastic-net coordinate descent at a fixed penalty
///
/// Minimises `1/2 sum_i w_i ||r_i||^2 + lambda sum_j vp_j ((1 - alpha) / 2 ||b_j||^2 + alpha ||b_j||)`
/// where `b_j` is the row of coefficients of variable `j` across responses.
pub(crate) struct CoordinateDescent<'d, 'a, F> {
    pub design: &'d Design<'a, F>,
    pub std: &'d Standardization<F>,
    pub alpha: F,
    pub vp: ArrayView1<'d, F>,
    /// Lower (row 0) and upper (row 1) bounds on the transformed scale
    pub cl: ArrayView2<'d, F>,
    pub thr: F,
    pub maxit: usize,
    pub max_active: usize,
}

impl<'d, 'a, F: Float> CoordinateDescent<'d, 'a, F> {
    /// Smallest penalty at which every variable stays at zero, given the null residuals
    pub fn max_penalty(&self, r: &Array2<F>) -> F {
        let alpha = self.alpha.max(F::cast(1e-3));
        (0..self.vp.len())
            .filter(|&j| self.std.ju[j] && self.vp[j] > F::zero())
            .map(|j| self.gradient_norm(j, r) / (alpha * self.vp[j]))
            .fold(F::zero(), F::max)
    }

    fn gradient_norm(&self, j: usize, r: &Array2<F>) -> F {
        r.axis_iter(Axis(1))
            .map(|col| {
                let g = self.std.gradient(self.design, j, col);
                g * g
            })
            .sum::<F>()
            .sqrt()
    }

    /// Update variable `j`, returns the weighted squared change
    fn update(&self, j: usize, lambda: F, b: &mut Array2<F>, r: &mut Array2<F>) -> F {
        let xv = self.std.xv[j];
        let mut u = Array1::from_iter(
            r.axis_iter(Axis(1))
                .map(|col| self.std.gradient(self.design, j, col)),
        );
        u.scaled_add(xv, &b.row(j));

        let l1 = lambda * self.alpha * self.vp[j];
        let l2 = lambda * (F::one() - self.alpha) * self.vp[j];
        let norm = u.dot(&u).sqrt();
        let shrink = if norm > l1 {
            (F::one() - l1 / norm) / (xv + l2)
        } else {
            F::zero()
        };
        let (lo, hi) = (self.cl[[0, j]], self.cl[[1, j]]);
        let new = u.mapv(|v| (v * shrink).max(lo).min(hi));

        let d = &new - &b.row(j);
        if d.iter().all(|v| *v == F::zero()) {
            return F::zero();
        }
        b.row_mut(j).assign(&new);
        self.std.downdate(self.design, j, d.view(), r);
        xv * d.dot(&d)
    }

    /// Run sweeps until the largest weighted change drops below `thr`
    ///
    /// Every sweep over all variables is followed by sweeps over the active set until it has
    /// converged. `passes` counts sweeps across calls so that a budget can span a whole path.
    pub fn solve(
        &self,
        lambda: F,
        b: &mut Array2<F>,
        r: &mut Array2<F>,
        active: &mut ActiveSet,
        passes: &mut usize,
    ) -> Outcome {
        loop {
            let mut dlx = F::zero();
            for j in 0..b.nrows() {
                if !self.std.ju[j] {
                    continue;
                }
                let change = self.update(j, lambda, b, r);
                if change == F::zero() {
                    continue;
                }
                if !active.contains(j) {
                    if active.len() >= self.max_active {
                        return Outcome::TooManyActive;
                    }
                    active.insert(j);
                }
                dlx = dlx.max(change);
            }
            *passes += 1;
            if *passes > self.maxit {
                return Outcome::MaxIterations;
            }
            if dlx < self.thr {
                return Outcome::Converged;
            }

            loop {
                let mut dlx = F::zero();
                for &j in active.order() {
                    dlx = dlx.max(self.update(j, lambda, b, r));
                }
                *passes += 1;
                if *passes > self.maxit {
                    return Outcome::MaxIterations;
                }
                if dlx < self.thr {
                    break;
                }
            }
        }
    }
}
