//! Plate element - flat shell with membrane and bending action

use serde::{Deserialize, Serialize};

use crate::loads::PlateLoad;

/// A 3- or 4-node plate element with 6 DOFs per node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    /// Unique identifier
    pub id: String,
    /// Node references, ordered around the perimeter
    pub nodes: Vec<String>,
    /// Material reference
    pub material: String,
    /// Thickness
    pub thickness: f64,
    /// Rotation of the local x axis about the plate normal (radians)
    #[serde(default)]
    pub rotation: f64,
    /// Element loads tagged by load case
    #[serde(default)]
    pub loads: Vec<PlateLoad>,
}

impl Plate {
    /// Create a new plate from its perimeter nodes
    pub fn new(id: &str, nodes: &[&str], material: &str, thickness: f64) -> Self {
        Self {
            id: id.to_string(),
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            material: material.to_string(),
            thickness,
            rotation: 0.0,
            loads: Vec::new(),
        }
    }

    /// Set the local axis rotation
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Attach an element load
    pub fn with_load(mut self, load: PlateLoad) -> Self {
        self.loads.push(load);
        self
    }

    /// Loads tagged with `case`
    pub fn loads_for_case<'a>(&'a self, case: &'a str) -> impl Iterator<Item = &'a PlateLoad> + 'a {
        self.loads.iter().filter(move |l| l.case() == case)
    }
}
