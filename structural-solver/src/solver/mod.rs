//! Equation solvers for the reduced system
//!
//! Every solver works on reduced (free-DOF) indices. Failures are reported as
//! [`SolverError`] and mapped back to node/component names by the analysis
//! layer, which owns the DOF numbering.

pub mod direct;
pub mod eigen;
pub mod iterative;

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

pub use direct::{DirectOptions, Factorization, MatrixStorage, Reordering};
pub use eigen::{subspace_iteration, EigenOptions, EigenSolution};
pub use iterative::{IterativeMethod, IterativeOptions, Preconditioner};

/// Failure of a numerical kernel, in reduced-system indices
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Zero or near-zero pivot at this reduced index
    Singular { index: usize },
    /// Iteration cap reached before the tolerance was met
    NotConverged {
        method: &'static str,
        residual: f64,
        iterations: usize,
    },
}

/// Diagnostics of a successful solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolveInfo {
    pub solver_name: &'static str,
    /// Iterations used (1 for direct solvers)
    pub iterations: usize,
    /// Final relative residual ||b - Ax|| / ||b||
    pub residual: f64,
}

/// Solve K x = f for a reduced symmetric system
pub trait LinearSolver: Send + Sync {
    fn solve(&self, k: &CsrMatrix<f64>, f: &DVector<f64>) -> Result<(DVector<f64>, SolveInfo), SolverError>;
}

/// Relative residual ||b - Ax|| / ||b|| (absolute when b = 0)
pub fn relative_residual(k: &CsrMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> f64 {
    let r = b - crate::math::sparse::csr_matvec(k, x);
    let b_norm = b.norm();
    if b_norm > 0.0 {
        r.norm() / b_norm
    } else {
        r.norm()
    }
}
