//! Analysis pipeline
//!
//! Validation → DOF numbering → per load case {assembly → reduction → solve →
//! recovery} → combinations → summary, orchestrated by [`run`].

pub mod assembly;
pub mod combination;
pub mod config;
pub mod dof;
pub mod element;
pub mod modal;
pub mod recovery;
pub mod run;
pub mod statics;
pub mod summary;
pub mod validate;

pub use config::{
    AnalysisConfig, AnalysisType, MassFormulation, ModalOptions, PDeltaOptions, Precision, SolverConfig,
    StructuralEffects, WarpingPolicy,
};
pub use dof::DofMap;
pub use element::{BeamElement, Element, ElementResult, PlateElement};
pub use run::{
    run, run_with, AnalysisRun, CancellationToken, NullSink, ProgressEvent, ProgressSink, RunError, RunStatus,
};
#[cfg(feature = "runtime")]
pub use run::{submit, ChannelSink, RunHandle};
pub use validate::validate_model;

use crate::error::{AnalysisError, AnalysisResult};
use crate::model::StructuralModel;
use crate::results::LoadResult;

/// Solve and recover a single load case without pre-flight validation
///
/// Skipping validation exposes the numerical checks directly; a structure
/// without any restraint, for instance, surfaces as a singular matrix.
pub fn analyze_load_case(model: &StructuralModel, config: &AnalysisConfig, case: &str) -> AnalysisResult<LoadResult> {
    if model.load_case(case).is_none() {
        return Err(AnalysisError::Reference(format!("load case '{}' does not exist", case)));
    }
    let dofs = DofMap::new(model);
    let elements = Element::build_all(model, &dofs, config)?;
    let solution = if config.effects.p_delta {
        statics::solve_p_delta_case(model, &elements, &dofs, config, case)?
    } else {
        let stiffness = assembly::assemble_stiffness(&elements, &dofs, None);
        let system = statics::ReducedSystem::prepare(&stiffness, &dofs, &config.solver)?;
        statics::solve_linear_case(model, &elements, &dofs, &stiffness, &system, case)?
    };
    recovery::recover_case(model, &elements, &dofs, &solution, config.stations)
}
