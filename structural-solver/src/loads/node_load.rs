//! Concentrated nodal actions

use serde::{Deserialize, Serialize};

/// Concentrated force and moment at a node, global axes (N, N·m)
///
/// Missing components deserialize as zero, so `{"case": "Wind", "fx": 4e3}`
/// is a complete load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    pub case: String,
    #[serde(default)]
    pub fx: f64,
    #[serde(default)]
    pub fy: f64,
    #[serde(default)]
    pub fz: f64,
    #[serde(default)]
    pub mx: f64,
    #[serde(default)]
    pub my: f64,
    #[serde(default)]
    pub mz: f64,
}

impl NodeLoad {
    pub fn new(fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64, case: &str) -> Self {
        Self::from_components([fx, fy, fz, mx, my, mz], case)
    }

    /// Build from [FX, FY, FZ, MX, MY, MZ]
    pub fn from_components(c: [f64; 6], case: &str) -> Self {
        Self {
            case: case.to_string(),
            fx: c[0],
            fy: c[1],
            fz: c[2],
            mx: c[3],
            my: c[4],
            mz: c[5],
        }
    }

    pub fn force(fx: f64, fy: f64, fz: f64, case: &str) -> Self {
        Self::new(fx, fy, fz, 0.0, 0.0, 0.0, case)
    }

    pub fn moment(mx: f64, my: f64, mz: f64, case: &str) -> Self {
        Self::new(0.0, 0.0, 0.0, mx, my, mz, case)
    }

    pub fn fx(value: f64, case: &str) -> Self {
        Self::force(value, 0.0, 0.0, case)
    }

    pub fn fy(value: f64, case: &str) -> Self {
        Self::force(0.0, value, 0.0, case)
    }

    pub fn fz(value: f64, case: &str) -> Self {
        Self::force(0.0, 0.0, value, case)
    }

    /// [FX, FY, FZ, MX, MY, MZ]
    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    /// Add this load's components into a per-node accumulator
    pub fn accumulate(&self, total: &mut [f64; 6]) {
        for (t, v) in total.iter_mut().zip(self.as_array()) {
            *t += v;
        }
    }

    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }
}
