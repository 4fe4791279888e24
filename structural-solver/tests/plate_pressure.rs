use approx::assert_relative_eq;
use structural_solver::prelude::*;

fn env_usize(name: &str, default_val: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default_val)
}

/// Structured grid of plates in the XY plane at Z = 0.
///
/// Node naming: N_{i}_{j}, with i along X, j along Y. Plate node order is
/// CCW (bl, br, tr, tl), so local z is global +Z.
fn plate_grid(lx: f64, ly: f64, nx: usize, ny: usize, t: f64) -> StructuralModel {
    let mut model = StructuralModel::new("plate-grid");

    // Structural steel, E = 200,000 MPa
    model
        .add_material(Material::isotropic("Steel", 200_000.0e6, 0.3, 7850.0))
        .unwrap();
    model.add_load_case(LoadCase::dead()).unwrap();

    for j in 0..=ny {
        let y = ly * (j as f64) / (ny as f64);
        for i in 0..=nx {
            let x = lx * (i as f64) / (nx as f64);
            model.add_node(Node::new(&format!("N_{i}_{j}"), x, y, 0.0)).unwrap();
        }
    }

    for j in 0..ny {
        for i in 0..nx {
            let n_bl = format!("N_{i}_{j}");
            let n_br = format!("N_{}_{}", i + 1, j);
            let n_tr = format!("N_{}_{}", i + 1, j + 1);
            let n_tl = format!("N_{}_{}", i, j + 1);
            let corners = [n_bl.as_str(), n_br.as_str(), n_tr.as_str(), n_tl.as_str()];
            model
                .add_plate(Plate::new(&format!("P_{i}_{j}"), &corners, "Steel", t))
                .unwrap();
        }
    }
    model
}

fn restrain(model: &mut StructuralModel, node: &str, restraint: Restraint) {
    let index = model.node_index(node).unwrap();
    model.nodes[index].restraint = restraint;
}

fn pressure_everywhere(model: &mut StructuralModel, p: f64, case: &str) {
    let ids: Vec<String> = model.plates.iter().map(|p| p.id.clone()).collect();
    for id in ids {
        model.add_plate_load(&id, PlateLoad::pressure(p, case)).unwrap();
    }
}

/// 2 m x 1 m, 10 mm steel plate pinned at its four corners under 1 kPa
fn pinned_corners_plate(nx: usize, ny: usize) -> StructuralModel {
    let mut model = plate_grid(2.0, 1.0, nx, ny, 0.01);
    for corner in ["N_0_0".to_string(), format!("N_{nx}_0"), format!("N_{nx}_{ny}"), format!("N_0_{ny}")] {
        restrain(&mut model, &corner, Restraint::pinned());
    }
    pressure_everywhere(&mut model, -1000.0, "Dead");
    model
}

#[test]
fn pinned_corners_plate_sanity() {
    // Mesh density is controllable; ny must stay even for a centre node.
    let nx = env_usize("PLATE_MESH_NX", 10);
    let ny = env_usize("PLATE_MESH_NY", 6);

    let model = pinned_corners_plate(nx, ny);
    let run = run(&model, &AnalysisConfig::static_analysis());
    assert_eq!(run.status, RunStatus::Completed, "{:?}", run.error);
    let result = run.result("Dead").unwrap();

    let mut max_vm = -f64::INFINITY;
    let mut max_plate = String::new();
    for plate in &result.plates {
        for value in &plate.values {
            assert!(value.von_mises.is_finite(), "von Mises should be finite");
            if value.von_mises > max_vm {
                max_vm = value.von_mises;
                max_plate = plate.plate.clone();
            }
        }
    }
    assert!(max_vm > 0.0, "von Mises should be > 0 for loaded plate");

    // Deflection peaks at the centre of a corner-supported plate
    let mut max_defl_z = 0.0_f64;
    let mut max_defl_node = String::new();
    for node in &result.nodes {
        if node.displacement.dz.abs() > max_defl_z.abs() {
            max_defl_z = node.displacement.dz;
            max_defl_node = node.node.clone();
        }
    }
    assert!(max_defl_z < 0.0);
    assert_eq!(max_defl_node, format!("N_{}_{}", nx / 2, ny / 2));

    // Each corner carries a quarter of the 2 kN total
    let corners = ["N_0_0".to_string(), format!("N_{nx}_0"), format!("N_{nx}_{ny}"), format!("N_0_{ny}")];
    for corner in &corners {
        let reaction = result.node(corner).unwrap().reaction.unwrap();
        assert_relative_eq!(reaction.fz, 500.0, max_relative = 1e-6);
    }
    assert_relative_eq!(result.total_reaction_forces()[2], 2000.0, max_relative = 1e-9);

    // Run with: cargo test pinned_corners_plate_sanity -- --nocapture
    eprintln!("Pinned-corners plate");
    eprintln!("  mesh: nx={nx}, ny={ny} (elements={})", nx * ny);
    eprintln!("  max von Mises: {:.6} MPa @ {max_plate}", max_vm / 1e6);
    eprintln!("  max Z deflection: {:.6} mm @ {max_defl_node}", max_defl_z * 1000.0);
}

#[test]
fn simply_supported_square_plate_matches_navier() {
    let n = 12;
    let (a, t, q) = (1.0, 0.01, 1000.0);
    let mut model = plate_grid(a, a, n, n, t);

    // Soft simple support on every edge, in-plane motion held at two corners
    for k in 0..=n {
        for node in [format!("N_{k}_0"), format!("N_{k}_{n}"), format!("N_0_{k}"), format!("N_{n}_{k}")] {
            restrain(&mut model, &node, Restraint::with_restraints(false, false, true, false, false, false));
        }
    }
    restrain(&mut model, "N_0_0", Restraint::pinned());
    restrain(
        &mut model,
        &format!("N_{n}_0"),
        Restraint::with_restraints(false, true, true, false, false, false),
    );
    pressure_everywhere(&mut model, -q, "Dead");

    let run = run(&model, &AnalysisConfig::static_analysis());
    assert_eq!(run.status, RunStatus::Completed, "{:?}", run.error);
    let result = run.result("Dead").unwrap();

    let d = 200e9 * t.powi(3) / (12.0 * (1.0 - 0.3_f64.powi(2)));
    let centre = format!("N_{}_{}", n / 2, n / 2);
    let w = result.node(&centre).unwrap().displacement.dz;
    assert_relative_eq!(w, -0.004_062 * q * a.powi(4) / d, max_relative = 0.03);

    let plate = result.plate(&format!("P_{}_{}", n / 2, n / 2)).unwrap();
    assert_eq!(plate.nodes[0], centre);
    assert_relative_eq!(plate.values[0].moments.mx.abs(), 0.0479 * q * a * a, max_relative = 0.1);
    assert_relative_eq!(plate.values[0].moments.mx, plate.values[0].moments.my, max_relative = 1e-6);

    assert_relative_eq!(result.total_reaction_forces()[2], q * a * a, max_relative = 1e-9);
}

#[test]
fn hydrostatic_pressure_balances_reactions() {
    let (nx, ny) = (8, 4);
    let mut model = pinned_corners_plate(nx, ny);
    model.add_load_case(LoadCase::new("Hydro", LoadCategory::Other)).unwrap();

    // p = -1000 (1 + y), linear over each plate
    let plates: Vec<(String, Vec<String>)> = model.plates.iter().map(|p| (p.id.clone(), p.nodes.clone())).collect();
    for (id, nodes) in plates {
        let pressures = nodes
            .iter()
            .map(|n| -1000.0 * (1.0 + model.node(n).unwrap().y))
            .collect();
        model.add_plate_load(&id, PlateLoad::varying(pressures, "Hydro")).unwrap();
    }

    let run = run(&model, &AnalysisConfig::static_analysis().with_load_cases(&["Hydro"]));
    assert_eq!(run.status, RunStatus::Completed, "{:?}", run.error);
    let result = run.result("Hydro").unwrap();

    // 1000 * (2 * 1 + 2 * 0.5) over the 2 m x 1 m plate
    assert_relative_eq!(result.total_reaction_forces()[2], 3000.0, max_relative = 1e-9);

    // The deeper (y = 1) edge carries more
    let low = result.node("N_0_0").unwrap().reaction.unwrap().fz;
    let high = result.node(&format!("N_0_{ny}")).unwrap().reaction.unwrap().fz;
    assert!(high > low);
}

#[test]
fn triangular_plates_carry_pressure() {
    let mut model = StructuralModel::new("triangles");
    model
        .add_material(Material::isotropic("Steel", 200e9, 0.3, 7850.0))
        .unwrap();
    model.add_load_case(LoadCase::dead()).unwrap();
    for (id, x, y) in [("A", 0.0, 0.0), ("B", 1.0, 0.0), ("C", 1.0, 1.0), ("D", 0.0, 1.0)] {
        model
            .add_node(Node::new(id, x, y, 0.0).with_restraint(Restraint::pinned()))
            .unwrap();
    }
    model.add_node(Node::new("E", 0.5, 0.5, 0.0)).unwrap();
    for (id, a, b) in [("T1", "A", "B"), ("T2", "B", "C"), ("T3", "C", "D"), ("T4", "D", "A")] {
        model.add_plate(Plate::new(id, &[a, b, "E"], "Steel", 0.02)).unwrap();
        model.add_plate_load(id, PlateLoad::pressure(-2_000.0, "Dead")).unwrap();
    }

    let run = run(&model, &AnalysisConfig::static_analysis());
    assert_eq!(run.status, RunStatus::Completed, "{:?}", run.error);
    let result = run.result("Dead").unwrap();

    assert_relative_eq!(result.total_reaction_forces()[2], 2_000.0, max_relative = 1e-9);
    assert!(result.node("E").unwrap().displacement.dz < 0.0);

    let t1 = result.plate("T1").unwrap();
    assert_eq!(t1.values.len(), 3);
    assert!(t1.values.iter().all(|v| v.von_mises.is_finite()));
}

#[test]
#[ignore]
fn pinned_corners_plate_report_csv() {
    // Emits a CSV table you can paste into a spreadsheet.
    // Run with:
    //   cargo test pinned_corners_plate_report_csv -- --ignored --nocapture
    let nx = env_usize("PLATE_MESH_NX", 10);
    let ny = env_usize("PLATE_MESH_NY", 6);

    let model = pinned_corners_plate(nx, ny);
    let run = run(&model, &AnalysisConfig::static_analysis());
    let result = run.result("Dead").unwrap();

    println!("plate,node,von_mises_mpa,top_sx_mpa,top_sy_mpa,top_txy_mpa,mx,my,mxy");
    for plate in &result.plates {
        for (node, v) in plate.nodes.iter().zip(&plate.values) {
            println!(
                "{},{node},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
                plate.plate,
                v.von_mises / 1e6,
                v.top.sx / 1e6,
                v.top.sy / 1e6,
                v.top.txy / 1e6,
                v.moments.mx,
                v.moments.my,
                v.moments.mxy
            );
        }
    }
}
