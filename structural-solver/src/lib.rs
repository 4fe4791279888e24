//! Structural Solver - linear static and modal analysis of 3D frames and plates
//!
//! The analysis core behind a structural design application:
//! - Frame elements (Euler-Bernoulli / Timoshenko beams with releases and rigid offsets)
//! - Shell elements (MITC4 quadrilaterals, collapsed triangles)
//! - Linear static analysis with optional P-Delta iteration
//! - Load combinations by superposition of raw components
//! - Modal analysis (shift-invert subspace iteration)
//! - Direct (dense / skyline Cholesky) and iterative (PCG, GMRES, BiCGStab, MINRES) solvers
//!
//! ## Example
//! ```rust
//! use structural_solver::prelude::*;
//!
//! let mut model = StructuralModel::new("demo");
//! model.add_material(Material::steel("Steel")).unwrap();
//! model.add_section(Section::rectangular("R200x400", "Steel", 0.2, 0.4)).unwrap();
//! model.add_node(Node::new("N1", 0.0, 0.0, 0.0).with_restraint(Restraint::fixed())).unwrap();
//! model.add_node(Node::new("N2", 5.0, 0.0, 0.0)).unwrap();
//! model.add_beam(Beam::new("B1", "N1", "N2", "R200x400")).unwrap();
//! model.add_load_case(LoadCase::dead()).unwrap();
//! model.add_node_load("N2", NodeLoad::fy(-10_000.0, "Dead")).unwrap();
//!
//! let run = run(&model, &AnalysisConfig::static_analysis());
//! assert_eq!(run.status, RunStatus::Completed);
//!
//! let tip = run.result("Dead").unwrap().node("N2").unwrap();
//! assert!(tip.displacement.dy < 0.0);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;
pub mod solver;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        analyze_load_case, run, run_with, AnalysisConfig, AnalysisRun, AnalysisType, CancellationToken,
        MassFormulation, NullSink, Precision, ProgressEvent, ProgressSink, RunStatus, SolverConfig, WarpingPolicy,
    };
    #[cfg(feature = "runtime")]
    pub use crate::analysis::{submit, ChannelSink, RunHandle};
    pub use crate::elements::{Beam, BeamReleases, Material, Node, Plate, Restraint, Section};
    pub use crate::error::{AnalysisError, AnalysisResult, ErrorKind};
    pub use crate::loads::{
        BeamLoad, CombinationCategory, LoadCase, LoadCategory, LoadCombination, LoadDirection, NodeLoad,
        PlateLoad,
    };
    pub use crate::model::StructuralModel;
    pub use crate::results::{
        AnalysisSummary, BeamResult, LoadResult, ModalResults, NodeDisplacement, PlateResult, Reactions,
    };
    pub use crate::solver::{DirectOptions, IterativeMethod, IterativeOptions, Preconditioner};
}
