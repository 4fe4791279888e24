//! Load cases

use serde::{Deserialize, Serialize};

/// Category tag of a load case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadCategory {
    Dead,
    Live,
    Wind,
    Snow,
    Seismic,
    Temperature,
    #[default]
    Other,
}

/// A load case groups related loads under a common identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCase {
    /// Unique identifier
    pub id: String,
    /// Category tag
    #[serde(default)]
    pub category: LoadCategory,
    /// Factor applied to every load tagged with this case
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Description of the load case
    #[serde(default)]
    pub description: Option<String>,
}

fn default_scale_factor() -> f64 {
    1.0
}

impl LoadCase {
    /// Create a new load case
    pub fn new(id: &str, category: LoadCategory) -> Self {
        Self {
            id: id.to_string(),
            category,
            scale_factor: 1.0,
            description: None,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Set the load scale factor
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn dead() -> Self {
        Self::new("Dead", LoadCategory::Dead)
            .with_description("Dead loads (self-weight and permanent loads)")
    }

    pub fn live() -> Self {
        Self::new("Live", LoadCategory::Live).with_description("Live loads (occupancy, furniture, etc.)")
    }

    pub fn wind() -> Self {
        Self::new("Wind", LoadCategory::Wind).with_description("Wind loads")
    }

    pub fn seismic() -> Self {
        Self::new("Seismic", LoadCategory::Seismic).with_description("Seismic/earthquake loads")
    }

    pub fn snow() -> Self {
        Self::new("Snow", LoadCategory::Snow).with_description("Snow loads")
    }

    pub fn temperature() -> Self {
        Self::new("Temperature", LoadCategory::Temperature).with_description("Thermal loads")
    }
}
