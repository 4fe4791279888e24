//! Static solution of single load cases
//!
//! The full stiffness is partitioned onto the free DOFs (the assembled matrix
//! is left untouched, so reactions can be recovered from it afterwards). For
//! linear runs one factorization serves every load case; P-Delta runs
//! re-assemble and re-solve each case until the displacements settle.

use std::collections::VecDeque;

use log::{debug, info, warn};
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use super::assembly::{assemble_loads, assemble_stiffness};
use super::config::{AnalysisConfig, PDeltaOptions, SolverConfig};
use super::dof::DofMap;
use super::element::Element;
use crate::error::{AnalysisError, AnalysisResult};
use crate::math::sparse::{csr_diagonal, csr_submatrix};
use crate::model::StructuralModel;
use crate::solver::{Factorization, IterativeOptions, LinearSolver, SolverError};

/// Translate a reduced-index solver failure into node/component terms
pub fn map_solver_error(err: SolverError, dofs: &DofMap) -> AnalysisError {
    match err {
        SolverError::Singular { index } => {
            let (dof, node, component) = dofs.describe_free(index);
            AnalysisError::SingularMatrix {
                dof,
                node,
                component,
                case: None,
            }
        }
        SolverError::NotConverged {
            method,
            residual,
            iterations,
        } => AnalysisError::Convergence {
            method: method.to_string(),
            residual,
            iterations,
            case: None,
        },
    }
}

/// First free DOF (reduced index) on a node with no stiffness path to a support
///
/// Nodes are connected wherever the assembled stiffness couples their DOFs.
/// Every node reached from a node with a restrained DOF is anchored; the
/// rest form free-floating sub-structures.
fn floating_dof(k: &CsrMatrix<f64>, dofs: &DofMap) -> Option<usize> {
    let nodes = dofs.total() / 6;
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); nodes];
    for (row, lane) in k.row_iter().enumerate() {
        for (&col, &value) in lane.col_indices().iter().zip(lane.values()) {
            let (a, b) = (row / 6, col / 6);
            if a != b && value != 0.0 {
                neighbours[a].push(b);
            }
        }
    }

    let mut anchored = vec![false; nodes];
    let mut queue = VecDeque::new();
    for &dof in dofs.restrained() {
        let node = dof / 6;
        if !anchored[node] {
            anchored[node] = true;
            queue.push_back(node);
        }
    }
    while let Some(node) = queue.pop_front() {
        for &next in &neighbours[node] {
            if !anchored[next] {
                anchored[next] = true;
                queue.push_back(next);
            }
        }
    }

    dofs.free().iter().position(|&dof| !anchored[dof / 6])
}

/// Free-DOF system prepared for repeated right-hand sides
#[derive(Debug)]
pub enum ReducedSystem {
    /// Every DOF is restrained
    Empty,
    Factored(Factorization),
    Iterative {
        k: CsrMatrix<f64>,
        options: IterativeOptions,
    },
}

impl ReducedSystem {
    pub fn prepare(k: &CsrMatrix<f64>, dofs: &DofMap, solver: &SolverConfig) -> AnalysisResult<Self> {
        if dofs.num_free() == 0 {
            return Ok(Self::Empty);
        }
        let k_ff = csr_submatrix(k, dofs.reduced_map(), dofs.num_free());

        match solver {
            SolverConfig::Direct(options) => {
                let factorization = Factorization::factorize(&k_ff, options).map_err(|e| map_solver_error(e, dofs))?;
                debug!("Reduced system of {} DOFs factorized ({})", dofs.num_free(), factorization.name());
                Ok(Self::Factored(factorization))
            }
            SolverConfig::Iterative(options) => {
                // Krylov methods do not detect a mechanism; check the connectivity
                // and the diagonal instead
                if let Some(index) = floating_dof(k, dofs) {
                    return Err(map_solver_error(SolverError::Singular { index }, dofs));
                }
                let diagonal = csr_diagonal(&k_ff);
                let scale = diagonal.amax();
                if let Some(index) = diagonal.iter().position(|d| d.abs() <= 1e-12 * scale.max(f64::MIN_POSITIVE)) {
                    return Err(map_solver_error(SolverError::Singular { index }, dofs));
                }
                Ok(Self::Iterative {
                    k: k_ff,
                    options: *options,
                })
            }
        }
    }

    /// Solve for the free displacements
    pub fn solve(&self, f: &DVector<f64>, dofs: &DofMap) -> AnalysisResult<DVector<f64>> {
        match self {
            Self::Empty => Ok(DVector::zeros(0)),
            Self::Factored(factorization) => factorization.solve(f).map_err(|e| map_solver_error(e, dofs)),
            Self::Iterative { k, options } => {
                let (x, info) = options.solve(k, f).map_err(|e| map_solver_error(e, dofs))?;
                debug!(
                    "{}: {} iterations, relative residual {:.3e}",
                    info.solver_name, info.iterations, info.residual
                );
                Ok(x)
            }
        }
    }
}

/// Converged state of one load case
#[derive(Debug, Clone)]
pub struct CaseSolution {
    pub case: String,
    /// Displacements at every global DOF (zero where restrained)
    pub displacements: DVector<f64>,
    /// Stiffness the displacements satisfy
    pub stiffness: CsrMatrix<f64>,
    /// Applied load vector, including equivalent element loads
    pub loads: DVector<f64>,
    /// Per-element axial forces used in the stiffness (P-Delta only)
    pub axial: Option<Vec<f64>>,
    /// P-Delta iterations, 1 for a linear solve
    pub iterations: usize,
}

/// Solve one case against an already prepared system
pub fn solve_linear_case(
    model: &StructuralModel,
    elements: &[Element],
    dofs: &DofMap,
    stiffness: &CsrMatrix<f64>,
    system: &ReducedSystem,
    case: &str,
) -> AnalysisResult<CaseSolution> {
    let loads = assemble_loads(model, elements, dofs, case, None)?;
    let reduced = system.solve(&dofs.gather(&loads), dofs).map_err(|e| e.in_case(case))?;
    let displacements = dofs.scatter(&reduced);
    Ok(CaseSolution {
        case: case.to_string(),
        displacements,
        stiffness: stiffness.clone(),
        loads,
        axial: None,
        iterations: 1,
    })
}

/// Iterate one case with geometric stiffness from the previous axial forces
pub fn solve_p_delta_case(
    model: &StructuralModel,
    elements: &[Element],
    dofs: &DofMap,
    config: &AnalysisConfig,
    case: &str,
) -> AnalysisResult<CaseSolution> {
    let PDeltaOptions {
        max_iterations,
        tolerance,
    } = config.p_delta;
    let scale = model
        .load_case(case)
        .map(|c| c.scale_factor)
        .ok_or_else(|| AnalysisError::LoadCaseNotFound(case.to_string()))?;

    let mut axial = vec![0.0; elements.len()];
    let mut previous: Option<DVector<f64>> = None;
    let mut change = f64::INFINITY;

    for iteration in 1..=max_iterations.max(1) {
        let stiffness = assemble_stiffness(elements, dofs, Some(&axial));
        let loads = assemble_loads(model, elements, dofs, case, Some(&axial))?;
        let reduced = ReducedSystem::prepare(&stiffness, dofs, &config.solver)
            .and_then(|system| system.solve(&dofs.gather(&loads), dofs))
            .map_err(|e| e.in_case(case))?;
        let displacements = dofs.scatter(&reduced);

        if let Some(prev) = &previous {
            let size = displacements.amax();
            change = if size > 0.0 {
                (&displacements - prev).amax() / size
            } else {
                0.0
            };
            debug!("P-Delta '{}' iteration {}: relative change {:.3e}", case, iteration, change);
            if change < tolerance {
                info!("P-Delta '{}' converged in {} iterations", case, iteration);
                return Ok(CaseSolution {
                    case: case.to_string(),
                    displacements,
                    stiffness,
                    loads,
                    axial: Some(axial),
                    iterations: iteration,
                });
            }
        }

        let next: Vec<f64> = elements
            .iter()
            .zip(axial.iter())
            .map(|(element, &p)| element.axial_force(&element.gather(&displacements), case, scale, p))
            .collect();
        axial = next;
        previous = Some(displacements);
    }

    warn!("P-Delta '{}' stopped after {} iterations", case, max_iterations);
    Err(AnalysisError::Convergence {
        method: "P-Delta".to_string(),
        residual: change,
        iterations: max_iterations,
        case: Some(case.to_string()),
    })
}
