//! Multi-response Gaussian paths

use ndarray::ArrayView2;

use super::elnet::gaussian_path;
use super::{PathSolver, SolverArgs, SolverOutput};
use crate::error::{GlmnetError, Result};
use crate::link::Link;
use crate::progress::PathProgress;
use crate::Float;

/// Path solver for several Gaussian responses
///
/// The L1 part of the penalty acts on the Euclidean norm of each variable's coefficients across
/// responses, so a variable enters or leaves the model for all responses at once. Coefficient
/// limits are applied to each response separately.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultiElnetSolver;

impl<F: Float> PathSolver<F> for MultiElnetSolver {
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
        if y.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(GlmnetError::InvalidResponse("multi-response gaussian"))
        }
    }

    fn multi_response(&self) -> bool {
        true
    }
}
