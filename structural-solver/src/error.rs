//! Error types for the analysis core

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failure, stored on a failed run record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ModelValidation,
    SingularMatrix,
    Convergence,
    UnsupportedFeature,
    Reference,
    Cancelled,
    ModelEdit,
    Internal,
}

/// A single violation found by the model validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Id of the offending entity, if the violation is tied to one
    pub entity: Option<String>,
    /// Human readable description
    pub message: String,
}

impl Violation {
    pub fn new(entity: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            entity: entity.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entity {
            Some(entity) => write!(f, "{}: {}", entity, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Every violation found during pre-flight validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn push(&mut self, entity: Option<&str>, message: impl Into<String>) {
        self.violations.push(Violation::new(entity, message));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Main error type for analysis and model operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Model validation failed with {count} violation(s): {0}", count = .0.len())]
    ModelValidation(ValidationReport),

    #[error(
        "Singular stiffness matrix at DOF {dof} (node '{node}', {component}){} - structure is unstable",
        case_suffix(.case)
    )]
    SingularMatrix {
        dof: usize,
        node: String,
        component: &'static str,
        /// Load case being solved when the failure surfaced
        case: Option<String>,
    },

    #[error(
        "{method} did not converge after {iterations} iterations (residual {residual:.3e}){}",
        case_suffix(.case)
    )]
    Convergence {
        method: String,
        residual: f64,
        iterations: usize,
        case: Option<String>,
    },

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Reference error: {0}")]
    Reference(String),

    #[error("Analysis run was cancelled")]
    Cancelled,

    #[error("Duplicate id '{0}' already exists")]
    DuplicateId(String),

    #[error("Node '{0}' not found in model")]
    NodeNotFound(String),

    #[error("Node '{0}' is referenced by element '{1}' and cannot be removed")]
    NodeInUse(String, String),

    #[error("Material '{0}' not found in model")]
    MaterialNotFound(String),

    #[error("Section '{0}' not found in model")]
    SectionNotFound(String),

    #[error("Beam '{0}' not found in model")]
    BeamNotFound(String),

    #[error("Plate '{0}' not found in model")]
    PlateNotFound(String),

    #[error("Load case '{0}' not found in model")]
    LoadCaseNotFound(String),

    #[error("Load case '{0}' is referenced by load combination '{1}'")]
    LoadCaseInUse(String, String),

    #[error("Load combination '{0}' not found in model")]
    LoadCombinationNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn case_suffix(case: &Option<String>) -> String {
    case.as_ref().map(|c| format!(" in load case '{}'", c)).unwrap_or_default()
}

impl AnalysisError {
    /// Attribute a numeric failure to the load case being processed
    pub fn in_case(self, name: &str) -> Self {
        match self {
            Self::SingularMatrix {
                dof,
                node,
                component,
                case: None,
            } => Self::SingularMatrix {
                dof,
                node,
                component,
                case: Some(name.to_string()),
            },
            Self::Convergence {
                method,
                residual,
                iterations,
                case: None,
            } => Self::Convergence {
                method,
                residual,
                iterations,
                case: Some(name.to_string()),
            },
            other => other,
        }
    }

    /// Classification stored on a failed run record
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelValidation(_) => ErrorKind::ModelValidation,
            Self::SingularMatrix { .. } => ErrorKind::SingularMatrix,
            Self::Convergence { .. } => ErrorKind::Convergence,
            Self::UnsupportedFeature(_) => ErrorKind::UnsupportedFeature,
            Self::Reference(_) => ErrorKind::Reference,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DuplicateId(_)
            | Self::NodeNotFound(_)
            | Self::NodeInUse(..)
            | Self::MaterialNotFound(_)
            | Self::SectionNotFound(_)
            | Self::BeamNotFound(_)
            | Self::PlateNotFound(_)
            | Self::LoadCaseNotFound(_)
            | Self::LoadCaseInUse(..)
            | Self::LoadCombinationNotFound(_)
            | Self::InvalidInput(_) => ErrorKind::ModelEdit,
            Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_violation() {
        let mut report = ValidationReport::default();
        report.push(None, "model has no nodes");
        report.push(Some("B1"), "section 'S9' not found");

        let err = AnalysisError::ModelValidation(report);
        let msg = err.to_string();
        assert!(msg.contains("2 violation"));
        assert!(msg.contains("model has no nodes"));
        assert!(msg.contains("B1: section 'S9' not found"));
        assert_eq!(err.kind(), ErrorKind::ModelValidation);
    }

    #[test]
    fn test_singular_message_names_node() {
        let err = AnalysisError::SingularMatrix {
            dof: 14,
            node: "N3".to_string(),
            component: "DZ",
            case: None,
        };
        assert!(err.to_string().contains("N3"));
        assert_eq!(err.kind(), ErrorKind::SingularMatrix);
    }

    #[test]
    fn test_numeric_errors_name_their_load_case() {
        let err = AnalysisError::Convergence {
            method: "PCG".to_string(),
            residual: 1e-3,
            iterations: 500,
            case: None,
        }
        .in_case("Wind");
        assert!(err.to_string().ends_with("in load case 'Wind'"), "{}", err);

        // The first attribution sticks
        let err = err.in_case("Dead");
        assert!(err.to_string().contains("'Wind'"));

        let other = AnalysisError::Cancelled.in_case("Dead");
        assert!(!other.to_string().contains("Dead"));
    }
}
