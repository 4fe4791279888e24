//! Element loads on beams

use serde::{Deserialize, Serialize};

/// Direction of a beam load
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoadDirection {
    /// Force in the beam's local x direction (axial)
    Fx,
    /// Force in the beam's local y direction
    Fy,
    /// Force in the beam's local z direction
    Fz,
    /// Force in global X direction
    FX,
    /// Force in global Y direction
    FY,
    /// Force in global Z direction
    FZ,
}

impl LoadDirection {
    /// Check if this is a local coordinate direction
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Fx | Self::Fy | Self::Fz)
    }

    /// Axis index 0..3 in its own frame (local or global)
    pub fn axis(&self) -> usize {
        match self {
            Self::Fx | Self::FX => 0,
            Self::Fy | Self::FY => 1,
            Self::Fz | Self::FZ => 2,
        }
    }
}

/// A concentrated force on a beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    /// Load case
    pub case: String,
    /// Load magnitude
    pub magnitude: f64,
    /// Distance from the start of the flexible length
    pub position: f64,
    /// Load direction
    pub direction: LoadDirection,
}

/// A linearly varying line load on a beam, possibly over part of its length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributedLoad {
    /// Load case
    pub case: String,
    /// Intensity at `x1`
    pub w1: f64,
    /// Intensity at `x2`
    pub w2: f64,
    /// Start position (distance from the start of the flexible length)
    #[serde(default)]
    pub x1: f64,
    /// End position; `None` runs to the end of the beam
    #[serde(default)]
    pub x2: Option<f64>,
    /// Load direction
    pub direction: LoadDirection,
}

/// Temperature change of a beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalLoad {
    /// Load case
    pub case: String,
    /// Uniform temperature change
    #[serde(default)]
    pub delta_t: f64,
    /// Temperature gradient along local y (difference per unit depth, +y face hotter)
    #[serde(default)]
    pub gradient_y: f64,
    /// Temperature gradient along local z (difference per unit width, +z face hotter)
    #[serde(default)]
    pub gradient_z: f64,
}

/// Any load carried by a beam element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BeamLoad {
    Point(PointLoad),
    Distributed(DistributedLoad),
    Thermal(ThermalLoad),
}

impl BeamLoad {
    /// Point load at `position`
    pub fn point(magnitude: f64, position: f64, direction: LoadDirection, case: &str) -> Self {
        Self::Point(PointLoad {
            case: case.to_string(),
            magnitude,
            position,
            direction,
        })
    }

    /// Uniform load over the full length
    pub fn uniform(w: f64, direction: LoadDirection, case: &str) -> Self {
        Self::linear(w, w, 0.0, None, direction, case)
    }

    /// Linearly varying load from `x1` to `x2` (end of beam when `None`)
    pub fn linear(
        w1: f64,
        w2: f64,
        x1: f64,
        x2: Option<f64>,
        direction: LoadDirection,
        case: &str,
    ) -> Self {
        Self::Distributed(DistributedLoad {
            case: case.to_string(),
            w1,
            w2,
            x1,
            x2,
            direction,
        })
    }

    /// Temperature change with optional gradients across the section
    pub fn thermal(delta_t: f64, gradient_y: f64, gradient_z: f64, case: &str) -> Self {
        Self::Thermal(ThermalLoad {
            case: case.to_string(),
            delta_t,
            gradient_y,
            gradient_z,
        })
    }

    /// Load case this load belongs to
    pub fn case(&self) -> &str {
        match self {
            Self::Point(l) => &l.case,
            Self::Distributed(l) => &l.case,
            Self::Thermal(l) => &l.case,
        }
    }

    /// Copy of the load with every magnitude multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            Self::Point(l) => Self::Point(PointLoad {
                magnitude: l.magnitude * factor,
                ..l.clone()
            }),
            Self::Distributed(l) => Self::Distributed(DistributedLoad {
                w1: l.w1 * factor,
                w2: l.w2 * factor,
                ..l.clone()
            }),
            Self::Thermal(l) => Self::Thermal(ThermalLoad {
                delta_t: l.delta_t * factor,
                gradient_y: l.gradient_y * factor,
                gradient_z: l.gradient_z * factor,
                ..l.clone()
            }),
        }
    }
}
