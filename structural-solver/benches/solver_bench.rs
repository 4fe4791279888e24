//! Benchmarks for the structural solver

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use structural_solver::analysis::assembly::assemble_stiffness;
use structural_solver::analysis::{DofMap, Element};
use structural_solver::prelude::*;

fn create_cantilever_model() -> StructuralModel {
    let mut model = StructuralModel::new("cantilever");

    model.add_material(Material::steel("Steel")).unwrap();
    model.add_section(Section::rectangular("Section", "Steel", 0.3, 0.5)).unwrap();
    model.add_load_case(LoadCase::new("Case 1", LoadCategory::Other)).unwrap();

    model
        .add_node(Node::new("N1", 0.0, 0.0, 0.0).with_restraint(Restraint::fixed()))
        .unwrap();
    model.add_node(Node::new("N2", 10.0, 0.0, 0.0)).unwrap();

    model.add_beam(Beam::new("M1", "N1", "N2", "Section")).unwrap();
    model.add_node_load("N2", NodeLoad::fy(-10000.0, "Case 1")).unwrap();

    model
}

fn create_multi_story_frame(stories: usize, bays: usize) -> StructuralModel {
    let mut model = StructuralModel::new("frame");

    model.add_material(Material::steel("Steel")).unwrap();
    model.add_section(Section::rectangular("Column", "Steel", 0.4, 0.4)).unwrap();
    model.add_section(Section::rectangular("Beam", "Steel", 0.3, 0.6)).unwrap();
    model.add_load_case(LoadCase::dead()).unwrap();
    model.add_load_case(LoadCase::wind()).unwrap();

    let story_height = 3.5;
    let bay_width = 6.0;

    // Create nodes, fixed at the base
    for story in 0..=stories {
        for bay in 0..=bays {
            let name = format!("N{}_{}", story, bay);
            let node = Node::new(&name, bay as f64 * bay_width, story as f64 * story_height, 0.0);
            let node = if story == 0 { node.with_restraint(Restraint::fixed()) } else { node };
            model.add_node(node).unwrap();
        }
    }

    // Create columns
    for story in 0..stories {
        for bay in 0..=bays {
            let name = format!("Col{}_{}", story, bay);
            let i_node = format!("N{}_{}", story, bay);
            let j_node = format!("N{}_{}", story + 1, bay);
            model.add_beam(Beam::new(&name, &i_node, &j_node, "Column")).unwrap();
        }
    }

    // Create beams
    for story in 1..=stories {
        for bay in 0..bays {
            let name = format!("Beam{}_{}", story, bay);
            let i_node = format!("N{}_{}", story, bay);
            let j_node = format!("N{}_{}", story, bay + 1);
            model.add_beam(Beam::new(&name, &i_node, &j_node, "Beam")).unwrap();
            model
                .add_beam_load(&name, BeamLoad::uniform(-20000.0, LoadDirection::FY, "Dead"))
                .unwrap();
        }
    }

    // Add loads
    for story in 1..=stories {
        for bay in 0..=bays {
            let name = format!("N{}_{}", story, bay);
            model.add_node_load(&name, NodeLoad::fy(-50000.0, "Dead")).unwrap();
        }
        let edge = format!("N{}_0", story);
        model.add_node_load(&edge, NodeLoad::fx(10000.0, "Wind")).unwrap();
    }

    model
        .add_load_combination(
            LoadCombination::new("1.2D+1.0W", CombinationCategory::Ultimate)
                .with_case("Dead", 1.2)
                .with_case("Wind", 1.0),
        )
        .unwrap();

    model
}

/// Square slab of n x n plates on four corner columns
fn create_slab(n: usize) -> StructuralModel {
    let mut model = StructuralModel::new("slab");

    model.add_material(Material::concrete("C30", 30e6)).unwrap();
    model.add_load_case(LoadCase::dead()).unwrap();

    let size = 8.0;
    for j in 0..=n {
        for i in 0..=n {
            let corner = (i == 0 || i == n) && (j == 0 || j == n);
            let node = Node::new(
                &format!("N_{i}_{j}"),
                size * i as f64 / n as f64,
                size * j as f64 / n as f64,
                0.0,
            );
            let node = if corner { node.with_restraint(Restraint::fixed()) } else { node };
            model.add_node(node).unwrap();
        }
    }
    for j in 0..n {
        for i in 0..n {
            let id = format!("P_{i}_{j}");
            let bl = format!("N_{i}_{j}");
            let br = format!("N_{}_{}", i + 1, j);
            let tr = format!("N_{}_{}", i + 1, j + 1);
            let tl = format!("N_{}_{}", i, j + 1);
            model
                .add_plate(Plate::new(&id, &[bl.as_str(), br.as_str(), tr.as_str(), tl.as_str()], "C30", 0.25))
                .unwrap();
            model.add_plate_load(&id, PlateLoad::pressure(-5000.0, "Dead")).unwrap();
        }
    }

    model
}

fn analyze(model: &StructuralModel, config: &AnalysisConfig) -> AnalysisRun {
    let run = run(model, config);
    assert_eq!(run.status, RunStatus::Completed);
    run
}

fn benchmark_cantilever(c: &mut Criterion) {
    let model = create_cantilever_model();
    c.bench_function("cantilever_linear", |b| {
        b.iter(|| black_box(analyze(&model, &AnalysisConfig::static_analysis())))
    });
}

fn benchmark_small_frame(c: &mut Criterion) {
    let model = create_multi_story_frame(3, 2);
    c.bench_function("frame_3story_2bay_linear", |b| {
        b.iter(|| black_box(analyze(&model, &AnalysisConfig::static_analysis())))
    });
}

fn benchmark_solvers(c: &mut Criterion) {
    let model = create_multi_story_frame(10, 5);
    let solvers = [
        ("skyline", SolverConfig::Direct(DirectOptions::default())),
        ("dense", SolverConfig::Direct(DirectOptions::dense())),
        (
            "pcg_jacobi",
            SolverConfig::Iterative(IterativeOptions::new(IterativeMethod::Pcg, Preconditioner::Jacobi)),
        ),
        (
            "pcg_ssor",
            SolverConfig::Iterative(IterativeOptions::new(IterativeMethod::Pcg, Preconditioner::Ssor)),
        ),
        (
            "gmres",
            SolverConfig::Iterative(IterativeOptions::new(IterativeMethod::Gmres, Preconditioner::Jacobi)),
        ),
    ];

    let mut group = c.benchmark_group("frame_10story_5bay_linear");
    for (name, solver) in solvers {
        let config = AnalysisConfig::static_analysis().with_solver(solver);
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| black_box(analyze(&model, config)))
        });
    }
    group.finish();
}

fn benchmark_assembly(c: &mut Criterion) {
    let model = create_multi_story_frame(10, 5);
    let dofs = DofMap::new(&model);
    let elements = Element::build_all(&model, &dofs, &AnalysisConfig::static_analysis()).unwrap();
    c.bench_function("frame_10story_5bay_assembly", |b| {
        b.iter(|| black_box(assemble_stiffness(&elements, &dofs, None)))
    });
}

fn benchmark_pdelta(c: &mut Criterion) {
    let model = create_multi_story_frame(5, 3);
    let config = AnalysisConfig::static_analysis().with_p_delta();
    c.bench_function("frame_5story_3bay_pdelta", |b| {
        b.iter(|| black_box(analyze(&model, &config)))
    });
}

fn benchmark_modal(c: &mut Criterion) {
    let model = create_multi_story_frame(5, 3);
    let config = AnalysisConfig::modal(6);
    c.bench_function("frame_5story_3bay_modal", |b| {
        b.iter(|| black_box(analyze(&model, &config)))
    });
}

fn benchmark_slab(c: &mut Criterion) {
    let model = create_slab(12);
    c.bench_function("slab_12x12_linear", |b| {
        b.iter(|| black_box(analyze(&model, &AnalysisConfig::static_analysis())))
    });
}

criterion_group!(
    benches,
    benchmark_cantilever,
    benchmark_small_frame,
    benchmark_solvers,
    benchmark_assembly,
    benchmark_pdelta,
    benchmark_modal,
    benchmark_slab,
);

criterion_main!(benches);
