//! Material properties

use serde::{Deserialize, Serialize};

/// Linear elastic isotropic material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Unique identifier
    pub id: String,
    /// Modulus of elasticity (Young's modulus) in Pa
    pub e: f64,
    /// Shear modulus in Pa. Derived from `e` and `nu` when absent.
    #[serde(default)]
    pub g: Option<f64>,
    /// Poisson's ratio
    pub nu: f64,
    /// Density in kg/m³
    #[serde(default)]
    pub rho: f64,
    /// Coefficient of thermal expansion in 1/°C
    #[serde(default)]
    pub alpha: f64,
    /// Yield strength (optional) in Pa
    #[serde(default)]
    pub fy: Option<f64>,
    /// Ultimate strength (optional) in Pa
    #[serde(default)]
    pub fu: Option<f64>,
}

impl Material {
    /// Create a new material with an explicit shear modulus
    pub fn new(id: &str, e: f64, g: f64, nu: f64, rho: f64) -> Self {
        Self {
            id: id.to_string(),
            e,
            g: Some(g),
            nu,
            rho,
            alpha: 0.0,
            fy: None,
            fu: None,
        }
    }

    /// Create a new isotropic material from E and nu.
    /// G is derived as E / (2 * (1 + nu)).
    pub fn isotropic(id: &str, e: f64, nu: f64, rho: f64) -> Self {
        Self {
            id: id.to_string(),
            e,
            g: None,
            nu,
            rho,
            alpha: 0.0,
            fy: None,
            fu: None,
        }
    }

    /// Set the thermal expansion coefficient
    pub fn with_thermal_expansion(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set yield and ultimate strengths
    pub fn with_strength(mut self, fy: f64, fu: f64) -> Self {
        self.fy = Some(fy);
        self.fu = Some(fu);
        self
    }

    /// Effective shear modulus
    pub fn shear_modulus(&self) -> f64 {
        self.g.unwrap_or_else(|| self.e / (2.0 * (1.0 + self.nu)))
    }

    /// Structural steel (A36)
    pub fn steel(id: &str) -> Self {
        Self::new(id, 200e9, 77e9, 0.3, 7850.0)
            .with_thermal_expansion(12e-6)
            .with_strength(250e6, 400e6)
    }

    /// Normal-weight concrete with compressive strength `fc` in Pa.
    /// E follows the ACI estimate 4700·sqrt(f'c) in MPa.
    pub fn concrete(id: &str, fc: f64) -> Self {
        let fc_mpa = fc / 1e6;
        let e = 4700.0 * fc_mpa.sqrt() * 1e6;
        Self::isotropic(id, e, 0.2, 2400.0).with_thermal_expansion(10e-6)
    }

    /// Aluminum (6061-T6)
    pub fn aluminum(id: &str) -> Self {
        Self::new(id, 68.9e9, 26e9, 0.33, 2700.0)
            .with_thermal_expansion(23.6e-6)
            .with_strength(276e6, 310e6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shear_modulus_is_derived_when_absent() {
        let mat = Material::isotropic("M", 200e9, 0.3, 7850.0);
        let expected_g = 200e9 / (2.0 * 1.3);
        assert!((mat.shear_modulus() - expected_g).abs() < 1.0);
    }

    #[test]
    fn test_explicit_shear_modulus_wins() {
        let steel = Material::steel("S");
        assert_eq!(steel.shear_modulus(), 77e9);
        assert!(steel.fy.is_some());
    }

    #[test]
    fn test_concrete_modulus() {
        let c = Material::concrete("C30", 30e6);
        assert!((c.e - 4700.0 * 30f64.sqrt() * 1e6).abs() < 1.0);
    }
}
