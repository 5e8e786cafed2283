//! Dense or sparse design matrices
//!
//! The path solvers and the IRLS regularizer only touch the design through column-wise
//! operations, so a compressed-column sparse matrix can be used in place of a dense array
//! without ever being densified.

use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Data, Ix2};
use sprs::CsMatView;

use crate::error::{GlmnetError, Result};
use crate::Float;

/// Allows a design to have either a dense or a sparse inner matrix in a way that is transparent
/// to the solvers
#[derive(Clone, Debug)]
pub enum Design<'a, F> {
    Dense(ArrayView2<'a, F>),
    Sparse(CsMatView<'a, F>),
}

impl<'a, F: Float> Design<'a, F> {
    /// Wrap a compressed-column sparse matrix
    ///
    /// Row-compressed matrices are rejected, their columns can not be visited cheaply.
    pub fn sparse(x: CsMatView<'a, F>) -> Result<Self> {
        if !x.is_csc() {
            return Err(GlmnetError::NotCompressedColumn);
        }
        Ok(Design::Sparse(x))
    }

    pub fn nobs(&self) -> usize {
        match self {
            Design::Dense(x) => x.nrows(),
            Design::Sparse(x) => x.rows(),
        }
    }

    pub fn nvars(&self) -> usize {
        match self {
            Design::Dense(x) => x.ncols(),
            Design::Sparse(x) => x.cols(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Design::Sparse(_))
    }

    /// `sum_i w_i * x_ij * v_i`
    pub fn column_weighted_dot(&self, j: usize, w: ArrayView1<F>, v: ArrayView1<F>) -> F {
        match self {
            Design::Dense(x) => x
                .column(j)
                .iter()
                .zip(w.iter().zip(v.iter()))
                .map(|(&xi, (&wi, &vi))| xi * wi * vi)
                .sum(),
            Design::Sparse(x) => x
                .outer_view(j)
                .map(|col| col.iter().map(|(i, &val)| val * w[i] * v[i]).sum())
                .unwrap_or_else(F::zero),
        }
    }

    /// Weighted first and second moments `(sum_i w_i x_ij, sum_i w_i x_ij^2)` of column `j`
    pub fn column_moments(&self, j: usize, w: ArrayView1<F>) -> (F, F) {
        let fold = |(s1, s2): (F, F), (val, wi): (F, F)| (s1 + wi * val, s2 + wi * val * val);
        match self {
            Design::Dense(x) => x
                .column(j)
                .iter()
                .zip(w.iter())
                .map(|(&val, &wi)| (val, wi))
                .fold((F::zero(), F::zero()), fold),
            Design::Sparse(x) => x
                .outer_view(j)
                .map(|col| {
                    col.iter()
                        .map(|(i, &val)| (val, w[i]))
                        .fold((F::zero(), F::zero()), fold)
                })
                .unwrap_or((F::zero(), F::zero())),
        }
    }

    /// `r += a * x_j`
    pub fn column_axpy(&self, j: usize, a: F, mut r: ArrayViewMut1<F>) {
        match self {
            Design::Dense(x) => r.scaled_add(a, &x.column(j)),
            Design::Sparse(x) => {
                if let Some(col) = x.outer_view(j) {
                    for (i, &val) in col.iter() {
                        r[i] += a * val;
                    }
                }
            }
        }
    }

    /// Linear combination `X * beta`
    pub fn dot(&self, beta: ArrayView1<F>) -> Array1<F> {
        match self {
            Design::Dense(x) => x.dot(&beta),
            Design::Sparse(_) => {
                let mut eta = Array1::zeros(self.nobs());
                for (j, &b) in beta.iter().enumerate() {
                    if b != F::zero() {
                        self.column_axpy(j, b, eta.view_mut());
                    }
                }
                eta
            }
        }
    }

    /// Linear combinations `X * B` for a `(nvars, k)` coefficient matrix
    pub fn dot_matrix(&self, coefs: ArrayView2<F>) -> Array2<F> {
        match self {
            Design::Dense(x) => x.dot(&coefs),
            Design::Sparse(_) => {
                let mut out = Array2::zeros((self.nobs(), coefs.ncols()));
                for (k, col) in coefs.axis_iter(Axis(1)).enumerate() {
                    out.column_mut(k).assign(&self.dot(col));
                }
                out
            }
        }
    }
}

impl<'a, F: Float> From<ArrayView2<'a, F>> for Design<'a, F> {
    fn from(x: ArrayView2<'a, F>) -> Self {
        Design::Dense(x)
    }
}

impl<'a, F: Float, D: Data<Elem = F>> From<&'a ArrayBase<D, Ix2>> for Design<'a, F> {
    fn from(x: &'a ArrayBase<D, Ix2>) -> Self {
        Design::Dense(x.view())
    }
}
