//! Envelope of extreme values over every analysed case and combination

use super::dof::DofMap;
use crate::model::StructuralModel;
use crate::results::{AnalysisSummary, ElementKind, Extreme, LoadResult};

/// Keep `candidate` only when strictly larger, so ties stay with the first seen
fn track(slot: &mut Option<Extreme>, value: f64, id: &str, element: Option<ElementKind>, source: &str) {
    if slot.as_ref().map_or(true, |e| value > e.value) {
        *slot = Some(Extreme {
            value,
            id: id.to_string(),
            element,
            source: source.to_string(),
        });
    }
}

/// Summarize `results`, visited in the given order
pub fn summarize<'a>(
    model: &StructuralModel,
    dofs: &DofMap,
    results: impl IntoIterator<Item = &'a LoadResult>,
) -> AnalysisSummary {
    let mut summary = AnalysisSummary {
        num_nodes: model.nodes.len(),
        num_beams: model.beams.len(),
        num_plates: model.plates.len(),
        total_dofs: dofs.total(),
        free_dofs: dofs.num_free(),
        ..Default::default()
    };

    for result in results {
        let source = result.name.as_str();
        for node in &result.nodes {
            track(
                &mut summary.max_displacement,
                node.displacement.translation_magnitude(),
                &node.node,
                None,
                source,
            );
            if let Some(reaction) = &node.reaction {
                track(
                    &mut summary.max_reaction,
                    reaction.force_magnitude(),
                    &node.node,
                    None,
                    source,
                );
            }
        }
        for beam in &result.beams {
            if let Some(station) = beam.max_von_mises() {
                track(
                    &mut summary.max_stress,
                    station.stress.von_mises,
                    &beam.beam,
                    Some(ElementKind::Beam),
                    source,
                );
            }
        }
        for plate in &result.plates {
            for value in &plate.values {
                track(
                    &mut summary.max_stress,
                    value.von_mises,
                    &plate.plate,
                    Some(ElementKind::Plate),
                    source,
                );
            }
        }
    }

    summary
}
