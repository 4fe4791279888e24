use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::DVector;
use structural_solver::analysis::assembly::assemble_mass;
use structural_solver::analysis::{DofMap, Element};
use structural_solver::math::sparse::csr_to_dense;
use structural_solver::prelude::*;
use structural_solver::results::ModeResult;

/// Single-storey frame on four fixed columns with a slab
fn frame_with_slab() -> StructuralModel {
    let mut model = StructuralModel::new("modal-frame");
    model.add_material(Material::steel("Steel")).unwrap();
    model.add_material(Material::concrete("C30", 30e6)).unwrap();
    model
        .add_section(Section::box_section("SHS200", "Steel", 0.2, 0.2, 0.01))
        .unwrap();
    model
        .add_section(Section::wide_flange("W310", "Steel", 0.31, 0.165, 0.01, 0.006))
        .unwrap();
    model.add_load_case(LoadCase::dead()).unwrap();

    for (id, x, z) in [("1", 0.0, 0.0), ("2", 6.0, 0.0), ("3", 6.0, 4.0), ("4", 0.0, 4.0)] {
        model
            .add_node(Node::new(&format!("B{}", id), x, 0.0, z).with_restraint(Restraint::fixed()))
            .unwrap();
        model.add_node(Node::new(&format!("T{}", id), x, 3.5, z)).unwrap();
        model
            .add_beam(Beam::new(&format!("C{}", id), &format!("B{}", id), &format!("T{}", id), "SHS200"))
            .unwrap();
    }
    for (id, start, end) in [("G1", "T1", "T2"), ("G2", "T2", "T3"), ("G3", "T3", "T4"), ("G4", "T4", "T1")] {
        model.add_beam(Beam::new(id, start, end, "W310")).unwrap();
    }
    model
        .add_plate(Plate::new("S1", &["T1", "T4", "T3", "T2"], "C30", 0.15))
        .unwrap();
    model
        .add_plate_load("S1", PlateLoad::pressure(-5_000.0, "Dead"))
        .unwrap();
    model
}

fn mode_vector(mode: &ModeResult) -> DVector<f64> {
    DVector::from_iterator(
        6 * mode.shape.len(),
        mode.shape.iter().flat_map(|d| d.as_array()),
    )
}

#[test]
fn modes_are_mass_normalised_and_ordered() {
    let model = frame_with_slab();
    let config = AnalysisConfig::modal(6);
    let run = run(&model, &config);
    assert_eq!(run.status, RunStatus::Completed, "{:?}", run.error);

    // Static cases are analysed alongside the modes
    assert!(run.result("Dead").is_some());

    let modal = run.modal.unwrap();
    assert_eq!(modal.modes.len(), 6);
    assert!(modal.modes.iter().all(|m| m.frequency >= 0.0));
    assert!(modal.modes.windows(2).all(|w| w[0].frequency <= w[1].frequency));

    let dofs = DofMap::new(&model);
    let elements = Element::build_all(&model, &dofs, &config).unwrap();
    let m = csr_to_dense(&assemble_mass(&elements, &dofs, MassFormulation::Consistent).unwrap());

    let vectors: Vec<DVector<f64>> = modal.modes.iter().map(mode_vector).collect();
    for (i, phi_i) in vectors.iter().enumerate() {
        for (j, phi_j) in vectors.iter().enumerate() {
            let product = phi_i.dot(&(&m * phi_j));
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_relative_eq!(product, expected, epsilon = 1e-6);
        }
    }

    for mode in &modal.modes {
        assert_relative_eq!(mode.angular_frequency, 2.0 * PI * mode.frequency, max_relative = 1e-12);
        assert_relative_eq!(mode.angular_frequency.powi(2), mode.eigenvalue, max_relative = 1e-9);
        assert!(mode.participation.iter().all(|p| (0.0..=1.0 + 1e-9).contains(p)));

        // Supports do not move in any mode
        let base = model.node_index("B1").unwrap();
        assert_eq!(mode.shape[base].as_array(), [0.0; 6]);
    }

    for c in 0..3 {
        let sum: f64 = modal.modes.iter().map(|m| m.participation[c]).sum();
        assert_relative_eq!(sum, modal.cumulative_participation[c], max_relative = 1e-12);
    }
}

#[test]
fn frequency_cutoff_drops_higher_modes() {
    let model = frame_with_slab();
    let all = run(&model, &AnalysisConfig::modal(6)).modal.unwrap();
    let cutoff = 0.5 * (all.modes[1].frequency + all.modes[2].frequency);

    let mut config = AnalysisConfig::modal(6);
    config.modal.frequency_cutoff = Some(cutoff);
    let limited = run(&model, &config).modal.unwrap();

    assert_eq!(limited.modes.len(), 2);
    assert_relative_eq!(limited.modes[0].frequency, all.modes[0].frequency, max_relative = 1e-8);
}

#[test]
fn lumped_mass_gives_comparable_fundamental_frequency() {
    let model = frame_with_slab();
    let consistent = run(&model, &AnalysisConfig::modal(3)).modal.unwrap();

    let mut config = AnalysisConfig::modal(3);
    config.modal.mass = MassFormulation::Lumped;
    let run = run(&model, &config);
    assert_eq!(run.status, RunStatus::Completed, "{:?}", run.error);
    let lumped = run.modal.unwrap();

    let ratio = lumped.modes[0].frequency / consistent.modes[0].frequency;
    assert!((0.8..1.25).contains(&ratio), "lumped/consistent ratio {}", ratio);
}

#[test]
fn modal_run_with_too_few_modes_reports_target_missed() {
    let model = frame_with_slab();
    let modal = run(&model, &AnalysisConfig::modal(1)).modal.unwrap();

    // One mode cannot carry 90% of the mass in every translational direction
    assert_eq!(modal.modes.len(), 1);
    assert!(!modal.target_met);
}
