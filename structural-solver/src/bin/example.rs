//! Structural Solver Example - Portal frames carrying a concrete slab

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use structural_solver::prelude::*;

fn build_model() -> Result<StructuralModel> {
    let mut model = StructuralModel::new("portal-slab");

    model.add_material(Material::steel("Steel"))?;
    model.add_material(Material::concrete("C30", 30e6))?;
    model.add_section(Section::wide_flange("W310", "Steel", 0.305, 0.165, 0.0097, 0.0060))?;

    model.add_load_case(LoadCase::dead())?;
    model.add_load_case(LoadCase::live())?;
    model.add_load_case(LoadCase::wind())?;

    // Two portal frames 5 m apart, slab on top
    //
    //     N3 -------- N4        N7 -------- N8
    //     |          |          |          |
    //     N1        N2          N5        N6
    //
    let height = 4.0;
    let span = 6.0;
    let bay = 5.0;
    for (id, x, y, z) in [
        ("N1", 0.0, 0.0, 0.0),
        ("N2", span, 0.0, 0.0),
        ("N3", 0.0, height, 0.0),
        ("N4", span, height, 0.0),
        ("N5", 0.0, 0.0, bay),
        ("N6", span, 0.0, bay),
        ("N7", 0.0, height, bay),
        ("N8", span, height, bay),
    ] {
        let node = Node::new(id, x, y, z);
        let node = if y == 0.0 { node.with_restraint(Restraint::fixed()) } else { node };
        model.add_node(node)?;
    }

    for (id, start, end) in [
        ("C1", "N1", "N3"),
        ("C2", "N2", "N4"),
        ("C3", "N5", "N7"),
        ("C4", "N6", "N8"),
        ("G1", "N3", "N4"),
        ("G2", "N7", "N8"),
        ("G3", "N3", "N7"),
        ("G4", "N4", "N8"),
    ] {
        model.add_beam(Beam::new(id, start, end, "W310"))?;
    }

    // Node order N3, N7, N8, N4 puts the slab's local z along global +Y
    model.add_plate(Plate::new("S1", &["N3", "N7", "N8", "N4"], "C30", 0.2))?;
    model.add_plate_load("S1", PlateLoad::pressure(-4_800.0, "Dead"))?;
    model.add_plate_load("S1", PlateLoad::pressure(-3_000.0, "Live"))?;
    model.add_beam_load("G1", BeamLoad::uniform(-2_000.0, LoadDirection::FY, "Dead"))?;
    model.add_node_load("N3", NodeLoad::fx(12_000.0, "Wind"))?;
    model.add_node_load("N7", NodeLoad::fx(12_000.0, "Wind"))?;

    model.add_load_combination(
        LoadCombination::new("1.2D+1.6L", CombinationCategory::Ultimate)
            .with_case("Dead", 1.2)
            .with_case("Live", 1.6),
    )?;
    model.add_load_combination(
        LoadCombination::new("1.2D+1.0W+1.0L", CombinationCategory::Ultimate)
            .with_case("Dead", 1.2)
            .with_case("Wind", 1.0)
            .with_case("Live", 1.0),
    )?;

    Ok(model)
}

fn print_result(result: &LoadResult) {
    println!("=== Results for {} ===\n", result.name);

    println!("Node Displacements:");
    for node in ["N3", "N4", "N7", "N8"] {
        if let Some(r) = result.node(node) {
            let d = &r.displacement;
            println!(
                "  {}: DX={:.4}mm, DY={:.4}mm, DZ={:.4}mm",
                node,
                d.dx * 1000.0,
                d.dy * 1000.0,
                d.dz * 1000.0
            );
        }
    }

    println!("\nSupport Reactions:");
    for node in &result.nodes {
        if let Some(rxn) = &node.reaction {
            println!(
                "  {}: FX={:.2}kN, FY={:.2}kN, MZ={:.2}kN·m",
                node.node,
                rxn.fx / 1000.0,
                rxn.fy / 1000.0,
                rxn.mz / 1000.0
            );
        }
    }

    println!("\nMember Forces:");
    for beam in &result.beams {
        let mmax = beam
            .stations
            .iter()
            .map(|s| s.forces.moment_z.abs())
            .fold(0.0_f64, f64::max);
        if let Some(start) = beam.start() {
            println!(
                "  {}: P={:.2}kN, Mmax={:.2}kN·m",
                beam.beam,
                start.forces.axial / 1000.0,
                mmax / 1000.0
            );
        }
    }

    if let Some(slab) = result.plate("S1") {
        let peak = slab.values.iter().map(|v| v.von_mises).fold(0.0_f64, f64::max);
        println!("\nSlab: max von Mises {:.3}MPa", peak / 1e6);
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    println!("=== Structural Solver Example: Portal Frames with Slab ===\n");
    let model = build_model().context("building the example model")?;

    let (sink, mut events) = ChannelSink::channel();
    let handle = submit(&model, &AnalysisConfig::static_analysis(), Arc::new(sink));
    info!("Submitted run {}", handle.id());

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("[{:?}] {:5.1}%", event.status, event.progress);
        }
    });

    let static_run = handle.wait().await;
    printer.await.context("progress printer")?;

    if let Some(err) = &static_run.error {
        bail!("analysis failed ({:?}): {}", err.kind, err.message);
    }
    println!();
    for result in static_run.load_cases.iter().chain(static_run.combinations.iter()) {
        print_result(result);
    }

    if let Some(summary) = &static_run.summary {
        println!("Summary:");
        if let Some(e) = &summary.max_displacement {
            println!("  Max displacement: {:.4}mm at {} ({})", e.value * 1000.0, e.id, e.source);
        }
        if let Some(e) = &summary.max_reaction {
            println!("  Max reaction: {:.2}kN at {} ({})", e.value / 1000.0, e.id, e.source);
        }
        if let Some(e) = &summary.max_stress {
            println!("  Max stress: {:.2}MPa in {} ({})", e.value / 1e6, e.id, e.source);
        }
        println!();
    }

    // Second order comparison
    println!("=== P-Delta Analysis Comparison ===\n");
    let config = AnalysisConfig::static_analysis()
        .with_load_cases(&["Wind"])
        .with_combinations(&["1.2D+1.0W+1.0L"])
        .with_p_delta();
    let p_delta = run_with(&model, &config, &|_: &ProgressEvent| {}, &CancellationToken::new());
    let sway = |r: &AnalysisRun| {
        r.result("1.2D+1.0W+1.0L")
            .and_then(|res| res.node("N3"))
            .map(|n| n.displacement.dx)
    };
    match (sway(&static_run), sway(&p_delta)) {
        (Some(first), Some(second)) => println!(
            "Lateral displacement at N3: {:.4}mm linear, {:.4}mm P-Delta\n",
            first * 1000.0,
            second * 1000.0
        ),
        _ => bail!("P-Delta run failed: {:?}", p_delta.error),
    }

    println!("=== Modal Analysis ===\n");
    let modal_run = run(&model, &AnalysisConfig::modal(6).with_combinations(&["1.2D+1.6L"]));
    let modal = modal_run.modal.context("modal results missing")?;
    for mode in &modal.modes {
        println!(
            "  Mode {}: f={:.3}Hz T={:.4}s  participation X={:.2} Y={:.2} Z={:.2}",
            mode.mode,
            mode.frequency,
            mode.period,
            mode.participation[0],
            mode.participation[1],
            mode.participation[2]
        );
    }
    if !modal.target_met {
        println!("  (mass participation target not reached with {} modes)", modal.modes.len());
    }

    println!("\n=== Analysis Complete ===");
    Ok(())
}
