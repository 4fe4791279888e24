//! Load combinations

use serde::{Deserialize, Serialize};

/// Category tag of a load combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombinationCategory {
    /// Strength (LRFD) combination
    Ultimate,
    /// Service (ASD) combination
    Serviceability,
    #[default]
    Other,
}

/// A load combination defines how load cases are superposed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCombination {
    /// Unique identifier
    pub id: String,
    /// Category tag
    #[serde(default)]
    pub category: CombinationCategory,
    /// Ordered (load case, factor) pairs
    pub factors: Vec<(String, f64)>,
    /// Description of the combination
    #[serde(default)]
    pub description: Option<String>,
}

impl LoadCombination {
    /// Create a new empty load combination
    pub fn new(id: &str, category: CombinationCategory) -> Self {
        Self {
            id: id.to_string(),
            category,
            factors: Vec::new(),
            description: None,
        }
    }

    /// Add a load case with a factor. A repeated case replaces its earlier factor.
    pub fn with_case(mut self, case: &str, factor: f64) -> Self {
        match self.factors.iter_mut().find(|(c, _)| c == case) {
            Some(entry) => entry.1 = factor,
            None => self.factors.push((case.to_string(), factor)),
        }
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Get the factor for a load case (0.0 when not part of the combination)
    pub fn factor(&self, case: &str) -> f64 {
        self.factors
            .iter()
            .find(|(c, _)| c == case)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Check if this combination references a specific load case
    pub fn includes(&self, case: &str) -> bool {
        self.factors.iter().any(|(c, _)| c == case)
    }

    pub fn lrfd_dead_only() -> Self {
        Self::new("1.4D", CombinationCategory::Ultimate).with_case("Dead", 1.4)
    }

    pub fn lrfd_dead_live() -> Self {
        Self::new("1.2D + 1.6L", CombinationCategory::Ultimate)
            .with_case("Dead", 1.2)
            .with_case("Live", 1.6)
    }

    pub fn lrfd_dead_live_wind() -> Self {
        Self::new("1.2D + L + W", CombinationCategory::Ultimate)
            .with_case("Dead", 1.2)
            .with_case("Live", 1.0)
            .with_case("Wind", 1.0)
    }

    pub fn asd_dead_live() -> Self {
        Self::new("D + L", CombinationCategory::Serviceability)
            .with_case("Dead", 1.0)
            .with_case("Live", 1.0)
    }

    pub fn asd_dead_live_wind() -> Self {
        Self::new("D + 0.75L + 0.75W", CombinationCategory::Serviceability)
            .with_case("Dead", 1.0)
            .with_case("Live", 0.75)
            .with_case("Wind", 0.75)
    }
}
