//! Pre-flight model validation
//!
//! Collects every violation instead of stopping at the first one, so a
//! single report tells the user everything that blocks the analysis.

use std::collections::HashSet;

use log::{debug, warn};

use super::config::{AnalysisConfig, WarpingPolicy};
use crate::error::{AnalysisError, AnalysisResult, ValidationReport};
use crate::loads::PlateLoad;
use crate::math::plate::plate_geometry;
use crate::model::StructuralModel;

fn check_unique<'a>(report: &mut ValidationReport, kind: &str, ids: impl Iterator<Item = &'a str>) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            report.push(Some(id), format!("duplicate {} id", kind));
        }
    }
}

/// Check referential and physical consistency of `model`
pub fn validate_model(model: &StructuralModel, config: &AnalysisConfig) -> AnalysisResult<()> {
    let mut report = ValidationReport::default();

    if model.nodes.is_empty() {
        report.push(None, "model has no nodes");
    }
    if model.beams.is_empty() && model.plates.is_empty() {
        report.push(None, "model has no beams or plates");
    }
    if model.materials.is_empty() {
        report.push(None, "model has no materials");
    }
    if !model.beams.is_empty() && model.sections.is_empty() {
        report.push(None, "model has beams but no sections");
    }

    check_unique(&mut report, "node", model.nodes.iter().map(|n| n.id.as_str()));
    check_unique(&mut report, "material", model.materials.iter().map(|m| m.id.as_str()));
    check_unique(&mut report, "section", model.sections.iter().map(|s| s.id.as_str()));
    check_unique(&mut report, "beam", model.beams.iter().map(|b| b.id.as_str()));
    check_unique(&mut report, "plate", model.plates.iter().map(|p| p.id.as_str()));
    check_unique(&mut report, "load case", model.load_cases.iter().map(|c| c.id.as_str()));
    check_unique(
        &mut report,
        "load combination",
        model.load_combinations.iter().map(|c| c.id.as_str()),
    );

    for material in &model.materials {
        if material.e <= 0.0 {
            report.push(Some(&material.id), "elastic modulus must be positive");
        }
        if material.nu <= -1.0 || material.nu >= 0.5 {
            report.push(Some(&material.id), "Poisson ratio must lie in (-1, 0.5)");
        }
    }

    for section in &model.sections {
        if model.material(&section.material).is_none() {
            report.push(Some(&section.id), format!("material '{}' not found", section.material));
        }
        if section.a <= 0.0 || section.iy <= 0.0 || section.iz <= 0.0 || section.j <= 0.0 {
            report.push(
                Some(&section.id),
                "area, moments of inertia and torsion constant must be positive",
            );
        }
    }

    let case_exists = |case: &str| model.load_case(case).is_some();

    for node in &model.nodes {
        for load in &node.loads {
            if !case_exists(&load.case) {
                report.push(Some(&node.id), format!("load references unknown load case '{}'", load.case));
            }
            if !load.is_finite() {
                report.push(Some(&node.id), "load has non-finite components");
            }
        }
    }

    for beam in &model.beams {
        let start = model.node(&beam.start_node);
        let end = model.node(&beam.end_node);
        if start.is_none() {
            report.push(Some(&beam.id), format!("start node '{}' not found", beam.start_node));
        }
        if end.is_none() {
            report.push(Some(&beam.id), format!("end node '{}' not found", beam.end_node));
        }
        if beam.start_node == beam.end_node {
            report.push(Some(&beam.id), "start and end node are the same");
        } else if let (Some(s), Some(e)) = (start, end) {
            let mut a = s.coords();
            let mut b = e.coords();
            for i in 0..3 {
                a[i] += beam.offset_start[i];
                b[i] += beam.offset_end[i];
            }
            let length = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2) + (b[2] - a[2]).powi(2)).sqrt();
            if length < 1e-10 {
                report.push(Some(&beam.id), "beam has zero length");
            }
        }
        match model.section(&beam.section) {
            None => report.push(Some(&beam.id), format!("section '{}' not found", beam.section)),
            Some(section) if model.material(&section.material).is_none() => report.push(
                Some(&beam.id),
                format!("material '{}' of section '{}' not found", section.material, section.id),
            ),
            Some(_) => {}
        }
        for load in &beam.loads {
            if !case_exists(load.case()) {
                report.push(Some(&beam.id), format!("load references unknown load case '{}'", load.case()));
            }
        }
    }

    for plate in &model.plates {
        if plate.nodes.len() < 3 {
            report.push(Some(&plate.id), "plate needs at least 3 nodes");
        }
        let mut coords = Vec::with_capacity(plate.nodes.len());
        for id in &plate.nodes {
            match model.node(id) {
                Some(node) => coords.push(node.coords()),
                None => report.push(Some(&plate.id), format!("node '{}' not found", id)),
            }
        }
        if model.material(&plate.material).is_none() {
            report.push(Some(&plate.id), format!("material '{}' not found", plate.material));
        }
        if plate.thickness <= 0.0 {
            report.push(Some(&plate.id), "thickness must be positive");
        }
        for load in &plate.loads {
            if !case_exists(load.case()) {
                report.push(Some(&plate.id), format!("load references unknown load case '{}'", load.case()));
            }
            if let PlateLoad::VaryingPressure(varying) = load {
                if varying.pressures.len() != plate.nodes.len() {
                    report.push(
                        Some(&plate.id),
                        format!(
                            "{} pressures given for {} nodes",
                            varying.pressures.len(),
                            plate.nodes.len()
                        ),
                    );
                }
            }
        }

        let mut seen = HashSet::new();
        for id in &plate.nodes {
            if !seen.insert(id.as_str()) {
                report.push(Some(&plate.id), format!("node '{}' is used more than once", id));
            }
        }

        if coords.len() == plate.nodes.len() && (3..=4).contains(&coords.len()) {
            match plate_geometry(&coords, plate.rotation) {
                Err(AnalysisError::InvalidInput(reason)) => report.push(Some(&plate.id), reason),
                Err(err) => report.push(Some(&plate.id), err.to_string()),
                Ok(geom) => {
                    if let WarpingPolicy::Reject { tolerance } = config.warping {
                        if geom.warping > tolerance {
                            report.push(
                                Some(&plate.id),
                                format!("warping ratio {:.3e} exceeds tolerance {:.3e}", geom.warping, tolerance),
                            );
                        }
                    }
                }
            }
        }
    }

    for combination in &model.load_combinations {
        if combination.factors.is_empty() {
            report.push(Some(&combination.id), "combination has no load cases");
        }
        for (case, _) in &combination.factors {
            if !case_exists(case) {
                report.push(Some(&combination.id), format!("load case '{}' not found", case));
            }
        }
    }

    if !model.nodes.iter().any(|n| n.restraint.is_supported()) {
        report.push(None, "no degree of freedom is restrained - the structure is a free body");
    }
    if !model.has_loads() {
        report.push(None, "no loads are applied to nodes, beams or plates");
    }

    if report.is_empty() {
        debug!(
            "Model '{}' validated: {} nodes, {} beams, {} plates",
            model.project_id,
            model.nodes.len(),
            model.beams.len(),
            model.plates.len()
        );
        Ok(())
    } else {
        warn!("Model validation failed: {}", report);
        Err(AnalysisError::ModelValidation(report))
    }
}
