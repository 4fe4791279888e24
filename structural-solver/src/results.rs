//! Result types for structural analysis

use serde::{Deserialize, Serialize};

/// Displacement results at a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplacement {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl NodeDisplacement {
    /// Create from array [DX, DY, DZ, RX, RY, RZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
            rx: arr[3],
            ry: arr[4],
            rz: arr[5],
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Euclidean norm of the three translations
    pub fn translation_magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }

    pub fn rotation_magnitude(&self) -> f64 {
        (self.rx.powi(2) + self.ry.powi(2) + self.rz.powi(2)).sqrt()
    }
}

/// Reaction forces at a supported node
///
/// Components at unrestrained DOFs are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
}

impl Reactions {
    /// Create from array [FX, FY, FZ, MX, MY, MZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            fx: arr[0],
            fy: arr[1],
            fz: arr[2],
            mx: arr[3],
            my: arr[4],
            mz: arr[5],
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    pub fn force_magnitude(&self) -> f64 {
        (self.fx.powi(2) + self.fy.powi(2) + self.fz.powi(2)).sqrt()
    }

    pub fn moment_magnitude(&self) -> f64 {
        (self.mx.powi(2) + self.my.powi(2) + self.mz.powi(2)).sqrt()
    }
}

/// Displacement and, for supported nodes, reaction of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub node: String,
    pub displacement: NodeDisplacement,
    /// Present only when the node has at least one restrained DOF
    pub reaction: Option<Reactions>,
}

/// Internal forces at a beam station, in local axes
///
/// Sign convention: tension positive; moments and shears are the actions of
/// the part of the beam beyond the station on the part before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StationForces {
    pub axial: f64,
    pub shear_y: f64,
    pub shear_z: f64,
    pub torsion: f64,
    pub moment_y: f64,
    pub moment_z: f64,
}

/// Stress components at a beam station
///
/// Component stresses are signed force/section-property ratios; `von_mises`
/// combines their worst-fibre magnitudes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StationStress {
    pub axial: f64,
    pub bending_y: f64,
    pub bending_z: f64,
    pub shear_y: f64,
    pub shear_z: f64,
    pub torsion: f64,
    pub von_mises: f64,
}

impl StationStress {
    /// Build from raw components and derive the equivalent stress
    pub fn from_components(
        axial: f64,
        bending_y: f64,
        bending_z: f64,
        shear_y: f64,
        shear_z: f64,
        torsion: f64,
    ) -> Self {
        let mut stress = Self {
            axial,
            bending_y,
            bending_z,
            shear_y,
            shear_z,
            torsion,
            von_mises: 0.0,
        };
        stress.update_von_mises();
        stress
    }

    /// Recompute the equivalent stress from the raw components
    pub fn update_von_mises(&mut self) {
        let normal = self.axial.abs() + self.bending_y.abs() + self.bending_z.abs();
        let shear = self.shear_y.abs() + self.shear_z.abs() + self.torsion.abs();
        self.von_mises = (normal.powi(2) + 3.0 * shear.powi(2)).sqrt();
    }
}

/// Forces, stresses and local displacements at one beam station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamStation {
    /// Distance from the start of the beam (between offset ends)
    pub position: f64,
    pub forces: StationForces,
    pub stress: StationStress,
    /// Local displacements [u, v, w]
    pub displacement: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamResult {
    pub beam: String,
    /// Equally spaced stations including both ends
    pub stations: Vec<BeamStation>,
}

impl BeamResult {
    pub fn start(&self) -> Option<&BeamStation> {
        self.stations.first()
    }

    pub fn end(&self) -> Option<&BeamStation> {
        self.stations.last()
    }

    /// Station with the largest equivalent stress
    pub fn max_von_mises(&self) -> Option<&BeamStation> {
        self.stations
            .iter()
            .fold(None, |best: Option<&BeamStation>, s| match best {
                Some(b) if b.stress.von_mises >= s.stress.von_mises => Some(b),
                _ => Some(s),
            })
    }
}

/// Plane stress state at a plate surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateStress {
    pub sx: f64,
    pub sy: f64,
    pub txy: f64,
    /// Maximum principal stress
    pub s1: f64,
    /// Minimum principal stress
    pub s2: f64,
    /// Angle from local x to the s1 direction, in degrees
    pub angle: f64,
    pub von_mises: f64,
}

impl PlateStress {
    pub fn from_components(sx: f64, sy: f64, txy: f64) -> Self {
        let von_mises = (sx.powi(2) - sx * sy + sy.powi(2) + 3.0 * txy.powi(2)).sqrt();

        let s_avg = (sx + sy) / 2.0;
        let r = ((sx - sy).powi(2) / 4.0 + txy.powi(2)).sqrt();
        let angle = 0.5 * (2.0 * txy).atan2(sx - sy);

        Self {
            sx,
            sy,
            txy,
            s1: s_avg + r,
            s2: s_avg - r,
            angle: angle.to_degrees(),
            von_mises,
        }
    }
}

/// Membrane and transverse shear forces per unit length
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateForces {
    pub nx: f64,
    pub ny: f64,
    pub nxy: f64,
    pub qx: f64,
    pub qy: f64,
}

/// Bending and twisting moments per unit length
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateMoments {
    pub mx: f64,
    pub my: f64,
    pub mxy: f64,
}

/// Plate results at one of its nodes, in the plate's local axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateNodeResult {
    pub forces: PlateForces,
    pub moments: PlateMoments,
    /// Stress at the +z surface
    pub top: PlateStress,
    /// Stress at the -z surface
    pub bottom: PlateStress,
    /// Governing equivalent stress of the two surfaces
    pub von_mises: f64,
}

impl PlateNodeResult {
    /// Derive surface stresses from the resultants of a plate of thickness `t`
    pub fn from_resultants(forces: PlateForces, moments: PlateMoments, t: f64) -> Self {
        let membrane = |n: f64| n / t;
        let bending = |m: f64| 6.0 * m / (t * t);
        let top = PlateStress::from_components(
            membrane(forces.nx) + bending(moments.mx),
            membrane(forces.ny) + bending(moments.my),
            membrane(forces.nxy) + bending(moments.mxy),
        );
        let bottom = PlateStress::from_components(
            membrane(forces.nx) - bending(moments.mx),
            membrane(forces.ny) - bending(moments.my),
            membrane(forces.nxy) - bending(moments.mxy),
        );
        Self {
            forces,
            moments,
            top,
            bottom,
            von_mises: top.von_mises.max(bottom.von_mises),
        }
    }

    /// Recompute principal and equivalent stresses from the raw surface components
    pub fn update_derived(&mut self) {
        self.top = PlateStress::from_components(self.top.sx, self.top.sy, self.top.txy);
        self.bottom = PlateStress::from_components(self.bottom.sx, self.bottom.sy, self.bottom.txy);
        self.von_mises = self.top.von_mises.max(self.bottom.von_mises);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateResult {
    pub plate: String,
    /// Node ids in plate order
    pub nodes: Vec<String>,
    /// One entry per plate node
    pub values: Vec<PlateNodeResult>,
}

/// What a result set was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultSource {
    LoadCase,
    Combination,
}

/// Complete result set of one load case or combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub name: String,
    pub source: ResultSource,
    pub nodes: Vec<NodeResult>,
    pub beams: Vec<BeamResult>,
    pub plates: Vec<PlateResult>,
}

impl LoadResult {
    pub fn node(&self, id: &str) -> Option<&NodeResult> {
        self.nodes.iter().find(|n| n.node == id)
    }

    pub fn beam(&self, id: &str) -> Option<&BeamResult> {
        self.beams.iter().find(|b| b.beam == id)
    }

    pub fn plate(&self, id: &str) -> Option<&PlateResult> {
        self.plates.iter().find(|p| p.plate == id)
    }

    /// Sum of all reaction forces [FX, FY, FZ]
    pub fn total_reaction_forces(&self) -> [f64; 3] {
        let mut total = [0.0; 3];
        for r in self.nodes.iter().filter_map(|n| n.reaction.as_ref()) {
            total[0] += r.fx;
            total[1] += r.fy;
            total[2] += r.fz;
        }
        total
    }
}

/// One natural mode of vibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeResult {
    /// 1-based mode number, ascending frequency
    pub mode: usize,
    /// ω²
    pub eigenvalue: f64,
    /// ω in rad/s
    pub angular_frequency: f64,
    /// Hz
    pub frequency: f64,
    /// Seconds; infinite for a zero frequency
    pub period: f64,
    /// Effective mass ratios in [DX, DY, DZ, RX, RY, RZ]
    pub participation: [f64; 6],
    /// Mass-normalised shape at every node, in node order
    pub shape: Vec<NodeDisplacement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalResults {
    pub modes: Vec<ModeResult>,
    /// Sum of the participation ratios over all returned modes
    pub cumulative_participation: [f64; 6],
    /// Whether every translational direction with mass reached the target
    pub target_met: bool,
}

/// Element family a stress extreme was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Beam,
    Plate,
}

/// A governing value with its location and source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extreme {
    pub value: f64,
    /// Node id, or element id for stresses
    pub id: String,
    pub element: Option<ElementKind>,
    /// Load case or combination name
    pub source: String,
}

/// Governing extremes over every computed result set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub max_displacement: Option<Extreme>,
    pub max_reaction: Option<Extreme>,
    pub max_stress: Option<Extreme>,
    pub num_nodes: usize,
    pub num_beams: usize,
    pub num_plates: usize,
    pub total_dofs: usize,
    pub free_dofs: usize,
}
