//! Analysis configuration

use serde::{Deserialize, Serialize};

use crate::solver::{DirectOptions, EigenOptions, IterativeOptions};

/// Type of structural analysis to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalysisType {
    /// Linear static analysis of the selected load cases and combinations
    #[default]
    Static,
    /// Natural frequencies and mode shapes, plus the selected static cases
    Modal,
    Buckling,
    Nonlinear,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    Double,
    Single,
}

/// Solver family for the reduced linear system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SolverConfig {
    Direct(DirectOptions),
    Iterative(IterativeOptions),
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::Direct(DirectOptions::default())
    }
}

/// Optional structural effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralEffects {
    /// Second-order effect of axial force on lateral stiffness
    pub p_delta: bool,
    /// Timoshenko shear flexibility of beams
    pub shear_deformation: bool,
    /// Geometrically nonlinear analysis (not available)
    pub large_displacement: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PDeltaOptions {
    pub max_iterations: usize,
    /// Convergence on max|Δd| / max|d| between iterations
    pub tolerance: f64,
}

impl Default for PDeltaOptions {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MassFormulation {
    #[default]
    Consistent,
    Lumped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalOptions {
    pub num_modes: usize,
    /// Modes above this frequency (Hz) are discarded
    pub frequency_cutoff: Option<f64>,
    /// Cumulative mass participation sought in each translational direction
    pub mass_participation_target: f64,
    pub mass: MassFormulation,
    /// Spectral shift (rad²/s²)
    pub shift: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub block_size: Option<usize>,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            num_modes: 12,
            frequency_cutoff: None,
            mass_participation_target: 0.9,
            mass: MassFormulation::Consistent,
            shift: 0.0,
            tolerance: 1e-8,
            max_iterations: 100,
            block_size: None,
        }
    }
}

impl ModalOptions {
    pub fn eigen_options(&self) -> EigenOptions {
        EigenOptions {
            num_modes: self.num_modes,
            shift: self.shift,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            block_size: self.block_size,
        }
    }
}

/// What to do with warped quadrilateral plates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum WarpingPolicy {
    /// Project the nodes onto the mean plane
    #[default]
    Tolerate,
    /// Fail validation when the warping ratio exceeds `tolerance`
    Reject { tolerance: f64 },
}

/// Options for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub analysis_type: AnalysisType,
    pub solver: SolverConfig,
    pub precision: Precision,
    pub effects: StructuralEffects,
    pub p_delta: PDeltaOptions,
    pub modal: ModalOptions,
    /// Number of result stations per beam, including both ends
    pub stations: usize,
    pub warping: WarpingPolicy,
    /// Load cases to analyse (empty = all)
    pub load_cases: Vec<String>,
    /// Load combinations to analyse (empty = all)
    pub load_combinations: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analysis_type: AnalysisType::Static,
            solver: SolverConfig::default(),
            precision: Precision::Double,
            effects: StructuralEffects::default(),
            p_delta: PDeltaOptions::default(),
            modal: ModalOptions::default(),
            stations: 11,
            warping: WarpingPolicy::Tolerate,
            load_cases: Vec::new(),
            load_combinations: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Linear static analysis of every load case and combination
    pub fn static_analysis() -> Self {
        Self::default()
    }

    /// Modal analysis for `num_modes` modes
    pub fn modal(num_modes: usize) -> Self {
        Self {
            analysis_type: AnalysisType::Modal,
            modal: ModalOptions {
                num_modes,
                ..Default::default()
            },
            ..Self::default()
        }
    }

    pub fn with_load_cases(mut self, cases: &[&str]) -> Self {
        self.load_cases = cases.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_combinations(mut self, combinations: &[&str]) -> Self {
        self.load_combinations = combinations.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_p_delta(mut self) -> Self {
        self.effects.p_delta = true;
        self
    }

    pub fn with_shear_deformation(mut self) -> Self {
        self.effects.shear_deformation = true;
        self
    }

    pub fn with_stations(mut self, stations: usize) -> Self {
        self.stations = stations;
        self
    }

    pub fn with_warping(mut self, warping: WarpingPolicy) -> Self {
        self.warping = warping;
        self
    }

    pub fn from_json(json: &str) -> crate::error::AnalysisResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
