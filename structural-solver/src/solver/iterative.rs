//! Krylov solvers over CSR storage
//!
//! All methods stop on the relative residual ||b - Ax|| / ||b||. GMRES and
//! BiCGStab are right-preconditioned so that the monitored residual is the
//! true one; PCG and MINRES use the preconditioner symmetrically.

use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};

use super::{relative_residual, LinearSolver, SolveInfo, SolverError};
use crate::math::sparse::{csr_diagonal, csr_matvec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IterativeMethod {
    #[default]
    Pcg,
    Gmres,
    BiCgStab,
    Minres,
}

impl IterativeMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pcg => "PCG",
            Self::Gmres => "GMRES",
            Self::BiCgStab => "BiCGStab",
            Self::Minres => "MINRES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preconditioner {
    None,
    #[default]
    Jacobi,
    Ssor,
}

/// Tuning of the iterative solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterativeOptions {
    pub method: IterativeMethod,
    pub preconditioner: Preconditioner,
    /// Relative residual tolerance
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Krylov subspace size between GMRES restarts
    pub restart: usize,
    /// Relaxation factor of the SSOR preconditioner, in (0, 2)
    pub ssor_omega: f64,
}

impl Default for IterativeOptions {
    fn default() -> Self {
        Self {
            method: IterativeMethod::Pcg,
            preconditioner: Preconditioner::Jacobi,
            tolerance: 1e-10,
            max_iterations: 10_000,
            restart: 50,
            ssor_omega: 1.2,
        }
    }
}

impl IterativeOptions {
    pub fn new(method: IterativeMethod, preconditioner: Preconditioner) -> Self {
        Self {
            method,
            preconditioner,
            ..Default::default()
        }
    }
}

/// Applies z = M⁻¹ r
enum Precond<'a> {
    Identity,
    Jacobi(DVector<f64>),
    Ssor {
        a: &'a CsrMatrix<f64>,
        diag: DVector<f64>,
        omega: f64,
    },
}

impl<'a> Precond<'a> {
    fn build(a: &'a CsrMatrix<f64>, options: &IterativeOptions) -> Self {
        let safe_diag = || csr_diagonal(a).map(|d| if d.abs() > 1e-300 { d } else { 1.0 });
        match options.preconditioner {
            Preconditioner::None => Self::Identity,
            Preconditioner::Jacobi => Self::Jacobi(safe_diag()),
            Preconditioner::Ssor => Self::Ssor {
                a,
                diag: safe_diag(),
                omega: options.ssor_omega.clamp(0.05, 1.95),
            },
        }
    }

    fn apply(&self, r: &DVector<f64>) -> DVector<f64> {
        match self {
            Self::Identity => r.clone(),
            Self::Jacobi(diag) => r.component_div(diag),
            Self::Ssor { a, diag, omega } => {
                let n = r.len();
                let offsets = a.row_offsets();
                let cols = a.col_indices();
                let vals = a.values();

                // (D/w + L) y = r
                let mut y = DVector::zeros(n);
                for i in 0..n {
                    let mut sum = r[i];
                    for idx in offsets[i]..offsets[i + 1] {
                        if cols[idx] < i {
                            sum -= vals[idx] * y[cols[idx]];
                        }
                    }
                    y[i] = sum * omega / diag[i];
                }

                // (D/w + U) z = (D/w) y
                let mut z = DVector::zeros(n);
                for i in (0..n).rev() {
                    let mut sum = diag[i] / omega * y[i];
                    for idx in offsets[i]..offsets[i + 1] {
                        if cols[idx] > i {
                            sum -= vals[idx] * z[cols[idx]];
                        }
                    }
                    z[i] = sum * omega / diag[i];
                }

                z * ((2.0 - omega) / omega)
            }
        }
    }
}

fn not_converged(method: IterativeMethod, residual: f64, iterations: usize) -> SolverError {
    SolverError::NotConverged {
        method: method.name(),
        residual,
        iterations,
    }
}

fn pcg(
    a: &CsrMatrix<f64>,
    b: &DVector<f64>,
    m: &Precond,
    options: &IterativeOptions,
) -> Result<(DVector<f64>, usize), SolverError> {
    let b_norm = b.norm();
    let mut x = DVector::zeros(b.len());
    let mut r = b.clone();
    let mut z = m.apply(&r);
    let mut p = z.clone();
    let mut r_dot_z = r.dot(&z);

    for iter in 1..=options.max_iterations {
        let ap = csr_matvec(a, &p);
        let p_dot_ap = p.dot(&ap);
        if p_dot_ap.abs() < f64::MIN_POSITIVE {
            return Err(not_converged(IterativeMethod::Pcg, r.norm() / b_norm, iter));
        }
        let alpha = r_dot_z / p_dot_ap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        if r.norm() / b_norm < options.tolerance {
            return Ok((x, iter));
        }

        z = m.apply(&r);
        let r_dot_z_new = r.dot(&z);
        let beta = r_dot_z_new / r_dot_z;
        r_dot_z = r_dot_z_new;
        p = &z + beta * &p;
    }

    Err(not_converged(
        IterativeMethod::Pcg,
        r.norm() / b_norm,
        options.max_iterations,
    ))
}

fn gmres(
    a: &CsrMatrix<f64>,
    b: &DVector<f64>,
    m: &Precond,
    options: &IterativeOptions,
) -> Result<(DVector<f64>, usize), SolverError> {
    let n = b.len();
    let b_norm = b.norm();
    let restart = options.restart.clamp(1, n.max(1));
    let mut x = DVector::zeros(n);
    let mut total = 0;

    let mut r = b.clone();
    let mut beta = r.norm();

    while total < options.max_iterations {
        let mut v: Vec<DVector<f64>> = Vec::with_capacity(restart + 1);
        let mut z: Vec<DVector<f64>> = Vec::with_capacity(restart);
        let mut h = DMatrix::zeros(restart + 1, restart);
        let mut cs = vec![0.0; restart];
        let mut sn = vec![0.0; restart];
        let mut g = DVector::zeros(restart + 1);
        g[0] = beta;
        v.push(&r / beta);

        let mut k = 0;
        for j in 0..restart {
            z.push(m.apply(&v[j]));
            let mut w = csr_matvec(a, &z[j]);
            for i in 0..=j {
                h[(i, j)] = w.dot(&v[i]);
                w.axpy(-h[(i, j)], &v[i], 1.0);
            }
            let h_next = w.norm();
            h[(j + 1, j)] = h_next;

            for i in 0..j {
                let t = cs[i] * h[(i, j)] + sn[i] * h[(i + 1, j)];
                h[(i + 1, j)] = -sn[i] * h[(i, j)] + cs[i] * h[(i + 1, j)];
                h[(i, j)] = t;
            }
            let denom = h[(j, j)].hypot(h[(j + 1, j)]);
            if denom < f64::MIN_POSITIVE {
                break;
            }
            cs[j] = h[(j, j)] / denom;
            sn[j] = h[(j + 1, j)] / denom;
            h[(j, j)] = denom;
            h[(j + 1, j)] = 0.0;
            g[j + 1] = -sn[j] * g[j];
            g[j] *= cs[j];

            total += 1;
            k = j + 1;
            if g[j + 1].abs() / b_norm < options.tolerance
                || total >= options.max_iterations
                || h_next <= 1e-14 * beta
            {
                break;
            }
            v.push(w / h_next);
        }

        // Back substitution on the triangular Hessenberg block
        let mut y = DVector::zeros(k);
        for i in (0..k).rev() {
            let mut sum = g[i];
            for l in (i + 1)..k {
                sum -= h[(i, l)] * y[l];
            }
            y[i] = sum / h[(i, i)];
        }
        for i in 0..k {
            x.axpy(y[i], &z[i], 1.0);
        }

        r = b - csr_matvec(a, &x);
        beta = r.norm();
        if beta / b_norm < options.tolerance {
            return Ok((x, total));
        }
        if k == 0 {
            break;
        }
    }

    Err(not_converged(IterativeMethod::Gmres, beta / b_norm, total))
}

fn bicgstab(
    a: &CsrMatrix<f64>,
    b: &DVector<f64>,
    m: &Precond,
    options: &IterativeOptions,
) -> Result<(DVector<f64>, usize), SolverError> {
    let n = b.len();
    let b_norm = b.norm();
    let mut x = DVector::zeros(n);
    let mut r = b.clone();
    let r_hat = r.clone();
    let mut rho = 1.0;
    let mut alpha = 1.0;
    let mut omega = 1.0;
    let mut v = DVector::zeros(n);
    let mut p = DVector::zeros(n);

    for iter in 1..=options.max_iterations {
        let rho_new = r_hat.dot(&r);
        if rho_new.abs() < f64::MIN_POSITIVE {
            return Err(not_converged(IterativeMethod::BiCgStab, r.norm() / b_norm, iter));
        }
        let beta = (rho_new / rho) * (alpha / omega);
        p = &r + beta * (&p - omega * &v);

        let p_hat = m.apply(&p);
        v = csr_matvec(a, &p_hat);
        alpha = rho_new / r_hat.dot(&v);
        let s = &r - alpha * &v;

        if s.norm() / b_norm < options.tolerance {
            x.axpy(alpha, &p_hat, 1.0);
            return Ok((x, iter));
        }

        let s_hat = m.apply(&s);
        let t = csr_matvec(a, &s_hat);
        let t_dot_t = t.dot(&t);
        omega = if t_dot_t > 0.0 { t.dot(&s) / t_dot_t } else { 0.0 };

        x.axpy(alpha, &p_hat, 1.0);
        x.axpy(omega, &s_hat, 1.0);
        r = s - omega * t;

        if r.norm() / b_norm < options.tolerance {
            return Ok((x, iter));
        }
        if omega == 0.0 {
            return Err(not_converged(IterativeMethod::BiCgStab, r.norm() / b_norm, iter));
        }
        rho = rho_new;
    }

    Err(not_converged(
        IterativeMethod::BiCgStab,
        r.norm() / b_norm,
        options.max_iterations,
    ))
}

/// Preconditioned MINRES (Paige-Saunders) for symmetric, possibly indefinite systems
fn minres(
    a: &CsrMatrix<f64>,
    b: &DVector<f64>,
    m: &Precond,
    options: &IterativeOptions,
) -> Result<(DVector<f64>, usize), SolverError> {
    let n = b.len();
    let mut x = DVector::zeros(n);

    let mut r1 = b.clone();
    let mut y = m.apply(&r1);
    let beta1 = r1.dot(&y).max(0.0).sqrt();
    if beta1 == 0.0 {
        return Ok((x, 0));
    }

    let mut r2 = r1.clone();
    let mut old_beta = 0.0;
    let mut beta = beta1;
    let mut dbar = 0.0;
    let mut epsilon = 0.0;
    let mut phibar = beta1;
    let mut cs = -1.0;
    let mut sn = 0.0;
    let mut w = DVector::zeros(n);
    let mut w2 = DVector::zeros(n);

    for iter in 1..=options.max_iterations {
        let v = &y / beta;
        y = csr_matvec(a, &v);
        if iter >= 2 {
            y.axpy(-beta / old_beta, &r1, 1.0);
        }
        let alpha = v.dot(&y);
        y.axpy(-alpha / beta, &r2, 1.0);
        r1 = std::mem::replace(&mut r2, y.clone());
        y = m.apply(&r2);
        old_beta = beta;
        beta = r2.dot(&y).max(0.0).sqrt();

        let old_epsilon = epsilon;
        let delta = cs * dbar + sn * alpha;
        let gbar = sn * dbar - cs * alpha;
        epsilon = sn * beta;
        dbar = -cs * beta;

        let gamma = gbar.hypot(beta).max(f64::EPSILON);
        cs = gbar / gamma;
        sn = beta / gamma;
        let phi = cs * phibar;
        phibar *= sn;

        let w1 = std::mem::replace(&mut w2, w.clone());
        w = (&v - old_epsilon * &w1 - delta * &w2) / gamma;
        x.axpy(phi, &w, 1.0);

        if phibar / beta1 < options.tolerance || beta == 0.0 {
            return Ok((x, iter));
        }
    }

    Err(not_converged(
        IterativeMethod::Minres,
        relative_residual(a, &x, b),
        options.max_iterations,
    ))
}

impl LinearSolver for IterativeOptions {
    fn solve(&self, k: &CsrMatrix<f64>, f: &DVector<f64>) -> Result<(DVector<f64>, SolveInfo), SolverError> {
        if f.norm() == 0.0 {
            return Ok((
                DVector::zeros(f.len()),
                SolveInfo {
                    solver_name: self.method.name(),
                    iterations: 0,
                    residual: 0.0,
                },
            ));
        }

        let m = Precond::build(k, self);
        let (x, iterations) = match self.method {
            IterativeMethod::Pcg => pcg(k, f, &m, self)?,
            IterativeMethod::Gmres => gmres(k, f, &m, self)?,
            IterativeMethod::BiCgStab => bicgstab(k, f, &m, self)?,
            IterativeMethod::Minres => minres(k, f, &m, self)?,
        };

        let residual = relative_residual(k, &x, f);
        debug!(
            "{} converged in {} iterations (relative residual {:.3e})",
            self.method.name(),
            iterations,
            residual
        );
        Ok((
            x,
            SolveInfo {
                solver_name: self.method.name(),
                iterations,
                residual,
            },
        ))
    }
}
