//! Plate/shell loads

use serde::{Deserialize, Serialize};

/// Uniform normal pressure (positive along the plate's local +z)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureLoad {
    pub case: String,
    pub pressure: f64,
}

/// Normal pressure given per plate node and interpolated with the shape functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaryingPressureLoad {
    pub case: String,
    /// One value per plate node, in plate node order
    pub pressures: Vec<f64>,
}

/// Temperature change of a plate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateThermalLoad {
    pub case: String,
    /// Uniform temperature change of the mid-surface
    #[serde(default)]
    pub delta_t: f64,
    /// Through-thickness gradient (difference per unit thickness, +z face hotter)
    #[serde(default)]
    pub gradient: f64,
}

/// Any load carried by a plate element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlateLoad {
    Pressure(PressureLoad),
    VaryingPressure(VaryingPressureLoad),
    Thermal(PlateThermalLoad),
}

impl PlateLoad {
    /// Uniform pressure
    pub fn pressure(pressure: f64, case: &str) -> Self {
        Self::Pressure(PressureLoad {
            case: case.to_string(),
            pressure,
        })
    }

    /// Pressure varying between the plate nodes
    pub fn varying(pressures: Vec<f64>, case: &str) -> Self {
        Self::VaryingPressure(VaryingPressureLoad {
            case: case.to_string(),
            pressures,
        })
    }

    /// Temperature change with optional through-thickness gradient
    pub fn thermal(delta_t: f64, gradient: f64, case: &str) -> Self {
        Self::Thermal(PlateThermalLoad {
            case: case.to_string(),
            delta_t,
            gradient,
        })
    }

    /// Load case this load belongs to
    pub fn case(&self) -> &str {
        match self {
            Self::Pressure(l) => &l.case,
            Self::VaryingPressure(l) => &l.case,
            Self::Thermal(l) => &l.case,
        }
    }

    /// Copy of the load with every magnitude multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            Self::Pressure(l) => Self::Pressure(PressureLoad {
                pressure: l.pressure * factor,
                ..l.clone()
            }),
            Self::VaryingPressure(l) => Self::VaryingPressure(VaryingPressureLoad {
                pressures: l.pressures.iter().map(|p| p * factor).collect(),
                ..l.clone()
            }),
            Self::Thermal(l) => Self::Thermal(PlateThermalLoad {
                delta_t: l.delta_t * factor,
                gradient: l.gradient * factor,
                ..l.clone()
            }),
        }
    }
}
