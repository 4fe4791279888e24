//! Global matrix and load vector assembly

use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use super::config::MassFormulation;
use super::dof::DofMap;
use super::element::Element;
use crate::error::{AnalysisError, AnalysisResult};
use crate::math::sparse::SparseMatrixBuilder;
use crate::model::StructuralModel;

/// Axial force of element `i`, zero when no P-Delta state is given
fn axial_of(axial: Option<&[f64]>, i: usize) -> f64 {
    axial.and_then(|a| a.get(i).copied()).unwrap_or(0.0)
}

/// Global stiffness over all DOFs
///
/// `axial` holds one axial force per element (P-Delta); plates ignore it.
pub fn assemble_stiffness(elements: &[Element], dofs: &DofMap, axial: Option<&[f64]>) -> CsrMatrix<f64> {
    let mut builder = SparseMatrixBuilder::new(dofs.total());
    for (i, element) in elements.iter().enumerate() {
        builder.add_element(element.dofs(), &element.global_stiffness(axial_of(axial, i)));
    }
    debug!(
        "Assembled stiffness: {} DOFs, {} non-zeros from {} elements",
        dofs.total(),
        builder.nnz(),
        elements.len()
    );
    builder.to_csr()
}

/// Global mass over all DOFs
pub fn assemble_mass(
    elements: &[Element],
    dofs: &DofMap,
    formulation: MassFormulation,
) -> AnalysisResult<CsrMatrix<f64>> {
    let mut builder = SparseMatrixBuilder::new(dofs.total());
    for element in elements {
        builder.add_element(element.dofs(), &element.global_mass(formulation)?);
    }
    Ok(builder.to_csr())
}

/// Global load vector of one load case: nodal loads plus the equivalent nodal
/// loads of element loads, all multiplied by the case scale factor
pub fn assemble_loads(
    model: &StructuralModel,
    elements: &[Element],
    dofs: &DofMap,
    case: &str,
    axial: Option<&[f64]>,
) -> AnalysisResult<DVector<f64>> {
    let scale = model
        .load_case(case)
        .map(|c| c.scale_factor)
        .ok_or_else(|| AnalysisError::LoadCaseNotFound(case.to_string()))?;

    let mut f = DVector::zeros(dofs.total());

    for node in &model.nodes {
        let node_dofs = dofs
            .node_dofs(&node.id)
            .ok_or_else(|| AnalysisError::NodeNotFound(node.id.clone()))?;
        for load in node.loads.iter().filter(|l| l.case == case) {
            for (dof, value) in node_dofs.iter().zip(load.as_array()) {
                f[*dof] += value * scale;
            }
        }
    }

    for (i, element) in elements.iter().enumerate() {
        let fe = element.equivalent_loads(case, scale, axial_of(axial, i))?;
        for (local, &dof) in element.dofs().iter().enumerate() {
            f[dof] += fe[local];
        }
    }

    Ok(f)
}
