//! Direct factorization of the reduced stiffness matrix
//!
//! Symmetric positive definite systems are factorized by Cholesky, either on
//! a dense copy or on skyline (profile) storage after an optional Reverse
//! Cuthill-McKee renumbering. A clearly negative pivot means the system is
//! indefinite, in which case the solver falls back to a pivoted LU.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Dyn, LU};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use super::{relative_residual, LinearSolver, SolveInfo, SolverError};
use crate::math::sparse::{
    apply_permutation, check_pivot, csr_to_dense, permute_symmetric, reverse_cuthill_mckee,
    unapply_permutation, PivotFailure, SkylineCholesky,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MatrixStorage {
    Dense,
    #[default]
    Skyline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Reordering {
    None,
    #[default]
    ReverseCuthillMcKee,
}

/// Tuning of the direct solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectOptions {
    pub storage: MatrixStorage,
    /// Renumbering applied before a skyline factorization
    pub reordering: Reordering,
    /// Pivots smaller than this fraction of the original diagonal are singular
    pub pivot_threshold: f64,
}

impl Default for DirectOptions {
    fn default() -> Self {
        Self {
            storage: MatrixStorage::Skyline,
            reordering: Reordering::ReverseCuthillMcKee,
            pivot_threshold: 1e-9,
        }
    }
}

impl DirectOptions {
    pub fn dense() -> Self {
        Self {
            storage: MatrixStorage::Dense,
            reordering: Reordering::None,
            ..Default::default()
        }
    }
}

/// Dense lower-triangular Cholesky factor
#[derive(Debug, Clone)]
pub struct DenseCholesky {
    l: DMatrix<f64>,
}

impl DenseCholesky {
    pub fn factorize(a: &DMatrix<f64>, threshold: f64) -> Result<Self, PivotFailure> {
        let n = a.nrows();
        let mut l = DMatrix::zeros(n, n);
        for j in 0..n {
            let sum: f64 = (0..j).map(|k| l[(j, k)] * l[(j, k)]).sum();
            let pivot = check_pivot(a[(j, j)] - sum, a[(j, j)], threshold, j)?;
            let ljj = pivot.sqrt();
            l[(j, j)] = ljj;
            for i in (j + 1)..n {
                let sum: f64 = (0..j).map(|k| l[(i, k)] * l[(j, k)]).sum();
                l[(i, j)] = (a[(i, j)] - sum) / ljj;
            }
        }
        Ok(Self { l })
    }

    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let n = self.l.nrows();
        let mut x = b.clone();
        for i in 0..n {
            let sum: f64 = (0..i).map(|k| self.l[(i, k)] * x[k]).sum();
            x[i] = (x[i] - sum) / self.l[(i, i)];
        }
        for i in (0..n).rev() {
            let sum: f64 = ((i + 1)..n).map(|k| self.l[(k, i)] * x[k]).sum();
            x[i] = (x[i] - sum) / self.l[(i, i)];
        }
        x
    }
}

/// A reusable factorization of the reduced system
#[derive(Debug, Clone)]
pub enum Factorization {
    Dense(DenseCholesky),
    Skyline {
        factor: SkylineCholesky,
        /// `perm[new] = old`, when renumbered
        perm: Option<Vec<usize>>,
    },
    Lu(LU<f64, Dyn, Dyn>),
}

impl Factorization {
    pub fn factorize(k: &CsrMatrix<f64>, options: &DirectOptions) -> Result<Self, SolverError> {
        let attempt = match options.storage {
            MatrixStorage::Dense => {
                DenseCholesky::factorize(&csr_to_dense(k), options.pivot_threshold).map(Self::Dense)
            }
            MatrixStorage::Skyline => match options.reordering {
                Reordering::None => SkylineCholesky::factorize(k, options.pivot_threshold)
                    .map(|factor| Self::Skyline { factor, perm: None }),
                Reordering::ReverseCuthillMcKee => {
                    let perm = reverse_cuthill_mckee(k);
                    let permuted = permute_symmetric(k, &perm);
                    match SkylineCholesky::factorize(&permuted, options.pivot_threshold) {
                        Ok(factor) => {
                            debug!("Skyline profile after RCM: {} entries", factor.profile());
                            Ok(Self::Skyline {
                                factor,
                                perm: Some(perm),
                            })
                        }
                        // Report failures in the caller's numbering
                        Err(PivotFailure::Zero(i)) => Err(PivotFailure::Zero(perm[i])),
                        Err(PivotFailure::Negative(i)) => Err(PivotFailure::Negative(perm[i])),
                    }
                }
            },
        };

        match attempt {
            Ok(factorization) => Ok(factorization),
            Err(PivotFailure::Zero(index)) => Err(SolverError::Singular { index }),
            Err(PivotFailure::Negative(index)) => {
                warn!(
                    "Negative pivot at reduced DOF {} - system is indefinite, falling back to LU",
                    index
                );
                Self::factorize_lu(k, options.pivot_threshold)
            }
        }
    }

    fn factorize_lu(k: &CsrMatrix<f64>, threshold: f64) -> Result<Self, SolverError> {
        let dense = csr_to_dense(k);
        let scale = dense.diagonal().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let lu = dense.lu();
        let u = lu.u();
        for i in 0..u.nrows() {
            if u[(i, i)].abs() <= threshold * scale.max(f64::MIN_POSITIVE) {
                return Err(SolverError::Singular { index: i });
            }
        }
        Ok(Self::Lu(lu))
    }

    pub fn solve(&self, b: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        match self {
            Self::Dense(factor) => Ok(factor.solve(b)),
            Self::Skyline { factor, perm: None } => Ok(factor.solve(b)),
            Self::Skyline {
                factor,
                perm: Some(perm),
            } => Ok(unapply_permutation(
                &factor.solve(&apply_permutation(b, perm)),
                perm,
            )),
            Self::Lu(lu) => lu.solve(b).ok_or(SolverError::Singular { index: 0 }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dense(_) => "dense Cholesky",
            Self::Skyline { .. } => "skyline Cholesky",
            Self::Lu(_) => "dense LU",
        }
    }
}

impl LinearSolver for DirectOptions {
    fn solve(&self, k: &CsrMatrix<f64>, f: &DVector<f64>) -> Result<(DVector<f64>, SolveInfo), SolverError> {
        let factorization = Factorization::factorize(k, self)?;
        let x = factorization.solve(f)?;
        let residual = relative_residual(k, &x, f);
        Ok((
            x,
            SolveInfo {
                solver_name: factorization.name(),
                iterations: 1,
                residual,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::sparse::SparseMatrixBuilder;

    fn spring_chain(n: usize, grounded: bool) -> CsrMatrix<f64> {
        // n springs in series, optionally grounded at the first DOF
        let mut b = SparseMatrixBuilder::new(n);
        for i in 0..n {
            let stiffness = 100.0 * (i + 1) as f64;
            if i + 1 < n {
                b.add(i, i, stiffness);
                b.add(i + 1, i + 1, stiffness);
                b.add(i, i + 1, -stiffness);
                b.add(i + 1, i, -stiffness);
            }
        }
        if grounded {
            b.add(0, 0, 1000.0);
        }
        b.to_csr()
    }

    #[test]
    fn test_all_storages_agree() {
        let k = spring_chain(12, true);
        let f = DVector::from_fn(12, |i, _| if i == 11 { 5.0 } else { 0.0 });

        let mut solutions = Vec::new();
        for options in [
            DirectOptions::dense(),
            DirectOptions {
                reordering: Reordering::None,
                ..Default::default()
            },
            DirectOptions::default(),
        ] {
            let (x, info) = options.solve(&k, &f).unwrap();
            assert!(info.residual < 1e-12);
            solutions.push(x);
        }
        for x in &solutions[1..] {
            assert!((x - &solutions[0]).norm() < 1e-10);
        }
    }

    #[test]
    fn test_floating_chain_is_singular() {
        let k = spring_chain(5, false);
        let f = DVector::from_element(5, 1.0);
        for options in [DirectOptions::dense(), DirectOptions::default()] {
            let err = options.solve(&k, &f).unwrap_err();
            assert!(matches!(err, SolverError::Singular { .. }));
        }
    }

    #[test]
    fn test_indefinite_falls_back_to_lu() {
        let mut b = SparseMatrixBuilder::new(2);
        b.add(0, 0, 1.0);
        b.add(0, 1, 2.0);
        b.add(1, 0, 2.0);
        b.add(1, 1, 1.0);
        let k = b.to_csr();
        let f = DVector::from_vec(vec![3.0, 3.0]);
        let (x, info) = DirectOptions::dense().solve(&k, &f).unwrap();
        assert_eq!(info.solver_name, "dense LU");
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }
}
