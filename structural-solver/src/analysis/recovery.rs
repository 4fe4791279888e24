//! Result recovery for a solved load case

use nalgebra::DVector;

use super::dof::DofMap;
use super::element::{Element, ElementResult};
use super::statics::CaseSolution;
use crate::error::{AnalysisError, AnalysisResult};
use crate::math::sparse::csr_matvec;
use crate::model::StructuralModel;
use crate::results::{LoadResult, NodeDisplacement, NodeResult, Reactions, ResultSource};

fn six(v: &DVector<f64>, dofs: [usize; 6]) -> [f64; 6] {
    std::array::from_fn(|c| v[dofs[c]])
}

/// Displacements, reactions and element results of one load case
///
/// Reactions are K d - F at the restrained DOFs, so they include the share
/// of element loads carried directly into the supports.
pub fn recover_case(
    model: &StructuralModel,
    elements: &[Element],
    dofs: &DofMap,
    solution: &CaseSolution,
    stations: usize,
) -> AnalysisResult<LoadResult> {
    let case = solution.case.as_str();
    let scale = model
        .load_case(case)
        .map(|c| c.scale_factor)
        .ok_or_else(|| AnalysisError::LoadCaseNotFound(case.to_string()))?;
    let d = &solution.displacements;
    let residual = csr_matvec(&solution.stiffness, d) - &solution.loads;

    let mut nodes = Vec::with_capacity(model.nodes.len());
    for node in &model.nodes {
        let node_dofs = dofs
            .node_dofs(&node.id)
            .ok_or_else(|| AnalysisError::NodeNotFound(node.id.clone()))?;
        let reaction = node.restraint.is_supported().then(|| {
            let r = six(&residual, node_dofs);
            let fixed = node.restraint.as_array();
            Reactions::from_array(std::array::from_fn(|c| if fixed[c] { r[c] } else { 0.0 }))
        });
        nodes.push(NodeResult {
            node: node.id.clone(),
            displacement: NodeDisplacement::from_array(six(d, node_dofs)),
            reaction,
        });
    }

    let mut beams = Vec::with_capacity(model.beams.len());
    let mut plates = Vec::with_capacity(model.plates.len());
    for (i, element) in elements.iter().enumerate() {
        let axial = solution.axial.as_ref().and_then(|a| a.get(i).copied()).unwrap_or(0.0);
        match element.recover(&element.gather(d), case, scale, axial, stations)? {
            ElementResult::Beam(beam) => beams.push(beam),
            ElementResult::Plate(plate) => plates.push(plate),
        }
    }

    Ok(LoadResult {
        name: case.to_string(),
        source: ResultSource::LoadCase,
        nodes,
        beams,
        plates,
    })
}
