//! Natural frequencies and mode shapes
//!
//! Mode shapes are mass-normalised (φᵀ M φ = 1). Participation is reported as
//! the effective mass ratio of each mode for unit ground motion along, and
//! rotation about, the global axes.

use std::f64::consts::PI;

use log::{info, warn};
use nalgebra::DVector;

use super::assembly::{assemble_mass, assemble_stiffness};
use super::config::{AnalysisConfig, SolverConfig};
use super::dof::DofMap;
use super::element::Element;
use super::statics::map_solver_error;
use crate::error::AnalysisResult;
use crate::math::sparse::{csr_matvec, csr_submatrix};
use crate::model::StructuralModel;
use crate::results::{ModalResults, ModeResult, NodeDisplacement};
use crate::solver::{subspace_iteration, DirectOptions};

/// Rigid-body influence vector of global component `component` on the free DOFs
fn influence_vector(dofs: &DofMap, component: usize) -> DVector<f64> {
    DVector::from_iterator(
        dofs.num_free(),
        dofs.free().iter().map(|&dof| if dof % 6 == component { 1.0 } else { 0.0 }),
    )
}

pub fn run_modal(
    model: &StructuralModel,
    elements: &[Element],
    dofs: &DofMap,
    config: &AnalysisConfig,
) -> AnalysisResult<ModalResults> {
    let options = &config.modal;
    let n = dofs.num_free();
    if n == 0 || options.num_modes == 0 {
        return Ok(ModalResults::default());
    }

    let k = csr_submatrix(&assemble_stiffness(elements, dofs, None), dofs.reduced_map(), n);
    let m = csr_submatrix(&assemble_mass(elements, dofs, options.mass)?, dofs.reduced_map(), n);
    let direct = match &config.solver {
        SolverConfig::Direct(direct) => *direct,
        SolverConfig::Iterative(_) => DirectOptions::default(),
    };

    let solution = subspace_iteration(&k, &m, &options.eigen_options(), &direct).map_err(|e| map_solver_error(e, dofs))?;
    info!(
        "Eigen solution: {} modes in {} subspace iterations",
        solution.eigenvalues.len(),
        solution.iterations
    );

    let influences: Vec<DVector<f64>> = (0..6).map(|c| influence_vector(dofs, c)).collect();
    let total_mass: Vec<f64> = influences.iter().map(|r| r.dot(&csr_matvec(&m, r))).collect();

    let mut modes = Vec::with_capacity(solution.eigenvalues.len());
    let mut cumulative = [0.0; 6];
    for (i, &eigenvalue) in solution.eigenvalues.iter().enumerate() {
        let angular_frequency = eigenvalue.max(0.0).sqrt();
        let frequency = angular_frequency / (2.0 * PI);
        if options.frequency_cutoff.is_some_and(|cutoff| frequency > cutoff) {
            break;
        }

        let phi = solution.vectors.column(i).into_owned();
        let m_phi = csr_matvec(&m, &phi);
        let mut participation = [0.0; 6];
        for c in 0..6 {
            if total_mass[c] > 0.0 {
                let gamma = influences[c].dot(&m_phi);
                participation[c] = gamma * gamma / total_mass[c];
                cumulative[c] += participation[c];
            }
        }

        let full = dofs.scatter(&phi);
        let shape = (0..model.nodes.len())
            .map(|node| NodeDisplacement::from_array(std::array::from_fn(|c| full[6 * node + c])))
            .collect();

        modes.push(ModeResult {
            mode: i + 1,
            eigenvalue,
            angular_frequency,
            frequency,
            period: if frequency > 0.0 { 1.0 / frequency } else { 0.0 },
            participation,
            shape,
        });
    }

    let target = options.mass_participation_target;
    let target_met = (0..3).all(|c| total_mass[c] <= 0.0 || cumulative[c] >= target);
    if !target_met {
        warn!(
            "Cumulative mass participation [{:.3}, {:.3}, {:.3}] below target {:.2} - request more modes",
            cumulative[0], cumulative[1], cumulative[2], target
        );
    }

    Ok(ModalResults {
        modes,
        cumulative_participation: cumulative,
        target_met,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Beam, Material, Node, Restraint, Section};
    use approx::assert_relative_eq;

    #[test]
    fn test_cantilever_first_frequency() {
        // Ten elements approximate the Euler-Bernoulli cantilever well
        let mut model = StructuralModel::new("P");
        model.materials.push(Material::steel("S"));
        model.sections.push(Section::rectangular("R", "S", 0.1, 0.2));
        let l = 5.0;
        for i in 0..=10 {
            let node = Node::new(&format!("N{}", i), l * i as f64 / 10.0, 0.0, 0.0);
            model.nodes.push(if i == 0 { node.with_restraint(Restraint::fixed()) } else { node });
        }
        for i in 0..10 {
            model
                .beams
                .push(Beam::new(&format!("B{}", i), &format!("N{}", i), &format!("N{}", i + 1), "R"));
        }

        let config = AnalysisConfig::modal(4);
        let dofs = DofMap::new(&model);
        let elements = Element::build_all(&model, &dofs, &config).unwrap();
        let results = run_modal(&model, &elements, &dofs, &config).unwrap();

        // Weak axis (local z, I = 0.2 * 0.1^3 / 12) governs the first mode
        let ei = 200e9 * 0.2 * 0.1_f64.powi(3) / 12.0;
        let mass_per_length = 7850.0 * 0.02;
        let expected = 1.875_104_f64.powi(2) / (2.0 * PI * l * l) * (ei / mass_per_length).sqrt();
        assert_eq!(results.modes.len(), 4);
        assert_relative_eq!(results.modes[0].frequency, expected, max_relative = 1e-3);
        assert!(results.modes[0].participation[2] > 0.55);
        assert!(results.modes.windows(2).all(|w| w[0].frequency <= w[1].frequency));
        assert_relative_eq!(results.modes[0].period * results.modes[0].frequency, 1.0, max_relative = 1e-12);
    }
}
