//! Generalized symmetric eigenproblem K φ = λ M φ
//!
//! Shift-invert subspace iteration (Bathe): a block of trial vectors is
//! repeatedly multiplied by (K - σM)⁻¹ M, M-orthonormalised, and projected
//! onto K (Rayleigh-Ritz) until the lowest Ritz values settle.

use log::debug;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use super::direct::{DirectOptions, Factorization};
use super::SolverError;
use crate::math::sparse::{csr_diagonal, csr_matvec};

/// Settings of the eigen solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenOptions {
    /// Number of modes wanted
    pub num_modes: usize,
    /// Spectral shift σ; modes near σ converge first
    pub shift: f64,
    /// Relative change of the wanted eigenvalues between iterations
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Subspace size, default max(2p, p + 8)
    pub block_size: Option<usize>,
}

impl Default for EigenOptions {
    fn default() -> Self {
        Self {
            num_modes: 12,
            shift: 0.0,
            tolerance: 1e-8,
            max_iterations: 100,
            block_size: None,
        }
    }
}

/// Lowest eigenpairs, sorted ascending, with M-orthonormal vectors
#[derive(Debug, Clone)]
pub struct EigenSolution {
    pub eigenvalues: Vec<f64>,
    /// One column per eigenvalue
    pub vectors: DMatrix<f64>,
    pub iterations: usize,
}

fn shifted(k: &CsrMatrix<f64>, m: &CsrMatrix<f64>, shift: f64) -> CsrMatrix<f64> {
    if shift == 0.0 {
        return k.clone();
    }
    let mut coo = CooMatrix::new(k.nrows(), k.ncols());
    for (r, c, &v) in k.triplet_iter() {
        coo.push(r, c, v);
    }
    for (r, c, &v) in m.triplet_iter() {
        coo.push(r, c, -shift * v);
    }
    CsrMatrix::from(&coo)
}

/// Deterministic trial block: diag(M), then unit vectors at the DOFs with
/// the smallest K_ii / M_ii
fn starting_block(k: &CsrMatrix<f64>, m: &CsrMatrix<f64>, q: usize) -> DMatrix<f64> {
    let n = k.nrows();
    let kd = csr_diagonal(k);
    let md = csr_diagonal(m);

    let mut x = DMatrix::zeros(n, q);
    if md.iter().any(|v| *v > 0.0) {
        x.set_column(0, &md);
    } else {
        x.set_column(0, &DVector::from_element(n, 1.0));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let ratio = |i: usize| if md[i] > 0.0 { kd[i] / md[i] } else { f64::INFINITY };
    order.sort_by(|&a, &b| ratio(a).total_cmp(&ratio(b)).then(a.cmp(&b)));
    for (col, &dof) in order.iter().take(q.saturating_sub(1)).enumerate() {
        x[(dof, col + 1)] = 1.0;
    }
    x
}

fn mat_block(a: &CsrMatrix<f64>, x: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = DMatrix::zeros(x.nrows(), x.ncols());
    for j in 0..x.ncols() {
        out.set_column(j, &csr_matvec(a, &x.column(j).into_owned()));
    }
    out
}

/// Modified Gram-Schmidt in the M inner product; dependent columns are dropped
fn m_orthonormalize(m: &CsrMatrix<f64>, x: &DMatrix<f64>) -> DMatrix<f64> {
    let mut kept: Vec<DVector<f64>> = Vec::with_capacity(x.ncols());
    let mut kept_m: Vec<DVector<f64>> = Vec::with_capacity(x.ncols());

    for j in 0..x.ncols() {
        let mut v = x.column(j).into_owned();
        let mv = csr_matvec(m, &v);
        let original = v.dot(&mv).max(0.0).sqrt();
        if original <= 0.0 {
            continue;
        }
        // Two passes keep the block orthogonal to working precision
        for _ in 0..2 {
            for (u, mu) in kept.iter().zip(kept_m.iter()) {
                let c = mu.dot(&v);
                v.axpy(-c, u, 1.0);
            }
        }
        let mv = csr_matvec(m, &v);
        let norm = v.dot(&mv).max(0.0).sqrt();
        if norm <= 1e-10 * original {
            continue;
        }
        kept.push(v / norm);
        kept_m.push(mv / norm);
    }

    if kept.is_empty() {
        return DMatrix::zeros(x.nrows(), 0);
    }
    DMatrix::from_columns(&kept)
}

/// Lowest `num_modes` eigenpairs of K φ = λ M φ on reduced (free) DOFs
pub fn subspace_iteration(
    k: &CsrMatrix<f64>,
    m: &CsrMatrix<f64>,
    options: &EigenOptions,
    direct: &DirectOptions,
) -> Result<EigenSolution, SolverError> {
    let n = k.nrows();
    let p = options.num_modes.min(n);
    if p == 0 {
        return Ok(EigenSolution {
            eigenvalues: vec![],
            vectors: DMatrix::zeros(n, 0),
            iterations: 0,
        });
    }
    let q = options
        .block_size
        .unwrap_or_else(|| (2 * p).max(p + 8))
        .max(p)
        .min(n);

    let factor = Factorization::factorize(&shifted(k, m, options.shift), direct)?;

    let mut x = m_orthonormalize(m, &starting_block(k, m, q));
    let mut previous: Vec<f64> = Vec::new();
    let mut change = f64::INFINITY;

    for iter in 1..=options.max_iterations {
        // Inverse iteration step on the whole block
        let y = mat_block(m, &x);
        let mut xbar = DMatrix::zeros(n, y.ncols());
        for j in 0..y.ncols() {
            xbar.set_column(j, &factor.solve(&y.column(j).into_owned())?);
        }
        let xbar = m_orthonormalize(m, &xbar);
        if xbar.ncols() == 0 {
            return Err(SolverError::Singular { index: 0 });
        }

        // Rayleigh-Ritz on the M-orthonormal basis
        let kx = mat_block(k, &xbar);
        let kr = xbar.transpose() * kx;
        let kr = (&kr + kr.transpose()) * 0.5;
        let eig = SymmetricEigen::new(kr);

        let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| {
            let da = (eig.eigenvalues[a] - options.shift).abs();
            let db = (eig.eigenvalues[b] - options.shift).abs();
            da.total_cmp(&db).then(a.cmp(&b))
        });
        let q_sorted = DMatrix::from_columns(
            &order.iter().map(|&i| eig.eigenvectors.column(i).into_owned()).collect::<Vec<_>>(),
        );
        x = &xbar * q_sorted;
        let values: Vec<f64> = order.iter().map(|&i| eig.eigenvalues[i]).collect();

        let wanted = p.min(values.len());
        if previous.len() >= wanted {
            change = (0..wanted)
                .map(|i| (values[i] - previous[i]).abs() / values[i].abs().max(f64::MIN_POSITIVE))
                .fold(0.0, f64::max);
            if change < options.tolerance {
                debug!("Subspace iteration converged in {} iterations", iter);
                let mut pairs: Vec<(f64, DVector<f64>)> = (0..wanted)
                    .map(|i| (values[i], x.column(i).into_owned()))
                    .collect();
                pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
                let vectors = DMatrix::from_columns(&pairs.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>());
                return Ok(EigenSolution {
                    eigenvalues: pairs.into_iter().map(|(l, _)| l).collect(),
                    vectors,
                    iterations: iter,
                });
            }
        }
        previous = values;
    }

    Err(SolverError::NotConverged {
        method: "subspace iteration",
        residual: change,
        iterations: options.max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::sparse::SparseMatrixBuilder;
    use approx::assert_relative_eq;

    /// Fixed-free chain of unit masses and unit springs
    fn chain(n: usize) -> (CsrMatrix<f64>, CsrMatrix<f64>) {
        let mut k = SparseMatrixBuilder::new(n);
        let mut m = SparseMatrixBuilder::new(n);
        for i in 0..n {
            k.add(i, i, if i + 1 < n { 2.0 } else { 1.0 });
            if i + 1 < n {
                k.add(i, i + 1, -1.0);
                k.add(i + 1, i, -1.0);
            }
            m.add(i, i, 1.0);
        }
        (k.to_csr(), m.to_csr())
    }

    #[test]
    fn test_chain_eigenvalues_match_closed_form() {
        let n = 20;
        let (k, m) = chain(n);
        let options = EigenOptions {
            num_modes: 4,
            tolerance: 1e-12,
            max_iterations: 200,
            ..Default::default()
        };
        let sol = subspace_iteration(&k, &m, &options, &DirectOptions::default()).unwrap();
        assert_eq!(sol.eigenvalues.len(), 4);

        for (i, &lambda) in sol.eigenvalues.iter().enumerate() {
            // Fixed-free chain: λ = 4 sin²((2i+1)π / (2(2n+1)))
            let angle = (2 * i + 1) as f64 * std::f64::consts::PI / (2.0 * (2 * n + 1) as f64);
            let exact = 4.0 * angle.sin().powi(2);
            assert_relative_eq!(lambda, exact, max_relative = 1e-8);
        }
        for w in sol.eigenvalues.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn test_vectors_are_mass_normalized() {
        let (k, m) = chain(10);
        let options = EigenOptions {
            num_modes: 3,
            ..Default::default()
        };
        let sol = subspace_iteration(&k, &m, &options, &DirectOptions::dense()).unwrap();
        for j in 0..3 {
            let phi = sol.vectors.column(j).into_owned();
            assert_relative_eq!(phi.dot(&csr_matvec(&m, &phi)), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_more_modes_than_dofs_is_capped() {
        let (k, m) = chain(3);
        let options = EigenOptions {
            num_modes: 10,
            ..Default::default()
        };
        let sol = subspace_iteration(&k, &m, &options, &DirectOptions::dense()).unwrap();
        assert_eq!(sol.eigenvalues.len(), 3);
    }
}
