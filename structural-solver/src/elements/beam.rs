//! Beam element - 3D frame element (beam/column)

use serde::{Deserialize, Serialize};

use crate::loads::BeamLoad;

/// End releases for a beam. A released DOF transmits no force across the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamReleases {
    /// Start releases [DX, DY, DZ, RX, RY, RZ] in local axes
    pub start: [bool; 6],
    /// End releases [DX, DY, DZ, RX, RY, RZ] in local axes
    pub end: [bool; 6],
}

impl BeamReleases {
    /// No end releases
    pub fn none() -> Self {
        Self::default()
    }

    /// Moment releases at the start
    pub fn pin_start() -> Self {
        Self {
            start: [false, false, false, false, true, true],
            end: [false; 6],
        }
    }

    /// Moment releases at the end
    pub fn pin_end() -> Self {
        Self {
            start: [false; 6],
            end: [false, false, false, false, true, true],
        }
    }

    /// Moment releases at both ends
    pub fn pin_both() -> Self {
        Self {
            start: [false, false, false, false, true, true],
            end: [false, false, false, false, true, true],
        }
    }

    /// Combined releases as a 12-element array
    pub fn as_array(&self) -> [bool; 12] {
        let mut arr = [false; 12];
        arr[0..6].copy_from_slice(&self.start);
        arr[6..12].copy_from_slice(&self.end);
        arr
    }

    pub fn any(&self) -> bool {
        self.as_array().iter().any(|&r| r)
    }
}

/// A 3D beam element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    /// Unique identifier
    pub id: String,
    /// Start node reference
    pub start_node: String,
    /// End node reference
    pub end_node: String,
    /// Section reference
    pub section: String,
    /// Rotation about the longitudinal axis (radians)
    #[serde(default)]
    pub rotation: f64,
    /// End releases
    #[serde(default)]
    pub releases: BeamReleases,
    /// Rigid offset from the start node to the start of the flexible length (global axes)
    #[serde(default)]
    pub offset_start: [f64; 3],
    /// Rigid offset from the end node to the end of the flexible length (global axes)
    #[serde(default)]
    pub offset_end: [f64; 3],
    /// Element loads tagged by load case
    #[serde(default)]
    pub loads: Vec<BeamLoad>,
}

impl Beam {
    /// Create a new beam
    pub fn new(id: &str, start_node: &str, end_node: &str, section: &str) -> Self {
        Self {
            id: id.to_string(),
            start_node: start_node.to_string(),
            end_node: end_node.to_string(),
            section: section.to_string(),
            rotation: 0.0,
            releases: BeamReleases::none(),
            offset_start: [0.0; 3],
            offset_end: [0.0; 3],
            loads: Vec::new(),
        }
    }

    /// Set rotation about the longitudinal axis
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set end releases
    pub fn with_releases(mut self, releases: BeamReleases) -> Self {
        self.releases = releases;
        self
    }

    /// Set rigid end offsets
    pub fn with_offsets(mut self, offset_start: [f64; 3], offset_end: [f64; 3]) -> Self {
        self.offset_start = offset_start;
        self.offset_end = offset_end;
        self
    }

    /// Attach an element load
    pub fn with_load(mut self, load: BeamLoad) -> Self {
        self.loads.push(load);
        self
    }

    pub fn has_offsets(&self) -> bool {
        self.offset_start.iter().chain(self.offset_end.iter()).any(|v| v.abs() > 0.0)
    }

    /// Loads tagged with `case`
    pub fn loads_for_case<'a>(&'a self, case: &'a str) -> impl Iterator<Item = &'a BeamLoad> + 'a {
        self.loads.iter().filter(move |l| l.case() == case)
    }
}
