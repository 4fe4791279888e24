//! Node element - a point in 3D space carrying restraints and nodal loads

use serde::{Deserialize, Serialize};

use super::Restraint;
use crate::loads::NodeLoad;

/// A 3D node in the structural model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: String,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    /// Restraint flags [DX, DY, DZ, RX, RY, RZ]
    #[serde(default)]
    pub restraint: Restraint,
    /// Point loads tagged by load case
    #[serde(default)]
    pub loads: Vec<NodeLoad>,
}

impl Node {
    /// Create a new unrestrained node at the given coordinates
    pub fn new(id: &str, x: f64, y: f64, z: f64) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            z,
            restraint: Restraint::free(),
            loads: Vec::new(),
        }
    }

    /// Set the restraint conditions
    pub fn with_restraint(mut self, restraint: Restraint) -> Self {
        self.restraint = restraint;
        self
    }

    /// Attach a nodal load
    pub fn with_load(mut self, load: NodeLoad) -> Self {
        self.loads.push(load);
        self
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Sum of the loads tagged with `case`, as [FX, FY, FZ, MX, MY, MZ]
    pub fn load_for_case(&self, case: &str) -> [f64; 6] {
        let mut total = [0.0; 6];
        for load in self.loads.iter().filter(|l| l.case == case) {
            load.accumulate(&mut total);
        }
        total
    }
}
