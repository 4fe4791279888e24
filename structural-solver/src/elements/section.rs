//! Section properties for beam elements
//!
//! Local axis convention: `depth` is measured along local y and `width` along
//! local z, so loads in local y bend the section about its z axis (`iz`).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Cross-section properties for beam elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Unique identifier
    pub id: String,
    /// Material reference
    pub material: String,
    /// Cross-sectional area in m²
    pub a: f64,
    /// Moment of inertia about local y-axis in m⁴
    pub iy: f64,
    /// Moment of inertia about local z-axis in m⁴
    pub iz: f64,
    /// Torsional constant in m⁴
    pub j: f64,
    /// Elastic section modulus about y-axis in m³
    #[serde(default)]
    pub sy: Option<f64>,
    /// Elastic section modulus about z-axis in m³
    #[serde(default)]
    pub sz: Option<f64>,
    /// Shear area for forces along local y in m²
    #[serde(default)]
    pub asy: Option<f64>,
    /// Shear area for forces along local z in m²
    #[serde(default)]
    pub asz: Option<f64>,
    /// Torsional section modulus (torque / max shear stress) in m³
    #[serde(default)]
    pub wt: Option<f64>,
}

impl Section {
    /// Create a new section with basic properties only
    pub fn new(id: &str, material: &str, a: f64, iy: f64, iz: f64, j: f64) -> Self {
        Self {
            id: id.to_string(),
            material: material.to_string(),
            a,
            iy,
            iz,
            j,
            sy: None,
            sz: None,
            asy: None,
            asz: None,
            wt: None,
        }
    }

    /// Set elastic section moduli
    pub fn with_moduli(mut self, sy: f64, sz: f64) -> Self {
        self.sy = Some(sy);
        self.sz = Some(sz);
        self
    }

    /// Set shear areas
    pub fn with_shear_areas(mut self, asy: f64, asz: f64) -> Self {
        self.asy = Some(asy);
        self.asz = Some(asz);
        self
    }

    /// Solid rectangle, `width` along local z and `depth` along local y
    pub fn rectangular(id: &str, material: &str, width: f64, depth: f64) -> Self {
        let a = width * depth;
        let iz = width * depth.powi(3) / 12.0;
        let iy = depth * width.powi(3) / 12.0;

        let (long, short) = if width > depth { (width, depth) } else { (depth, width) };
        let j = long * short.powi(3) / 3.0 * (1.0 - 0.63 * short / long);

        Self {
            sy: Some(depth * width.powi(2) / 6.0),
            sz: Some(width * depth.powi(2) / 6.0),
            asy: Some(5.0 / 6.0 * a),
            asz: Some(5.0 / 6.0 * a),
            wt: Some(j / short),
            ..Self::new(id, material, a, iy, iz, j)
        }
    }

    /// Solid circle
    pub fn circular(id: &str, material: &str, diameter: f64) -> Self {
        let r = diameter / 2.0;
        let a = PI * r.powi(2);
        let i = PI * r.powi(4) / 4.0;
        let j = PI * r.powi(4) / 2.0;
        let s = i / r;

        Self {
            sy: Some(s),
            sz: Some(s),
            asy: Some(0.9 * a),
            asz: Some(0.9 * a),
            wt: Some(j / r),
            ..Self::new(id, material, a, i, i, j)
        }
    }

    /// Hollow circular (pipe) section
    pub fn pipe(id: &str, material: &str, outer_diameter: f64, wall_thickness: f64) -> Self {
        let r_o = outer_diameter / 2.0;
        let r_i = r_o - wall_thickness;

        let a = PI * (r_o.powi(2) - r_i.powi(2));
        let i = PI * (r_o.powi(4) - r_i.powi(4)) / 4.0;
        let j = PI * (r_o.powi(4) - r_i.powi(4)) / 2.0;

        Self {
            sy: Some(i / r_o),
            sz: Some(i / r_o),
            asy: Some(a / 2.0),
            asz: Some(a / 2.0),
            wt: Some(j / r_o),
            ..Self::new(id, material, a, i, i, j)
        }
    }

    /// Wide flange (I-beam) with the web along local y
    ///
    /// # Arguments
    /// * `depth` - Total depth of section
    /// * `flange_width` - Width of flange
    /// * `flange_thickness` - Thickness of flange
    /// * `web_thickness` - Thickness of web
    pub fn wide_flange(
        id: &str,
        material: &str,
        depth: f64,
        flange_width: f64,
        flange_thickness: f64,
        web_thickness: f64,
    ) -> Self {
        let bf = flange_width;
        let tf = flange_thickness;
        let tw = web_thickness;
        let d = depth;
        let hw = d - 2.0 * tf;

        let a = 2.0 * bf * tf + hw * tw;
        let iz = (bf * d.powi(3) - (bf - tw) * hw.powi(3)) / 12.0;
        let iy = (2.0 * tf * bf.powi(3) + hw * tw.powi(3)) / 12.0;
        let j = (2.0 * bf * tf.powi(3) + hw * tw.powi(3)) / 3.0;

        Self {
            sy: Some(iy / (bf / 2.0)),
            sz: Some(iz / (d / 2.0)),
            asy: Some(d * tw),
            asz: Some(5.0 / 6.0 * 2.0 * bf * tf),
            wt: Some(j / tf.max(tw)),
            ..Self::new(id, material, a, iy, iz, j)
        }
    }

    /// Rectangular hollow section with uniform wall
    pub fn box_section(id: &str, material: &str, width: f64, depth: f64, wall_thickness: f64) -> Self {
        let t = wall_thickness;
        let b = width;
        let d = depth;
        let bi = b - 2.0 * t;
        let di = d - 2.0 * t;

        let a = b * d - bi * di;
        let iz = (b * d.powi(3) - bi * di.powi(3)) / 12.0;
        let iy = (d * b.powi(3) - di * bi.powi(3)) / 12.0;

        // Bredt: closed thin-walled section
        let am = (b - t) * (d - t);
        let s = 2.0 * (b + d) - 4.0 * t;
        let j = 4.0 * am.powi(2) * t / s;

        Self {
            sy: Some(iy / (b / 2.0)),
            sz: Some(iz / (d / 2.0)),
            asy: Some(2.0 * d * t),
            asz: Some(2.0 * b * t),
            wt: Some(2.0 * am * t),
            ..Self::new(id, material, a, iy, iz, j)
        }
    }

    /// Radius of gyration about y-axis
    pub fn ry(&self) -> f64 {
        (self.iy / self.a).sqrt()
    }

    /// Radius of gyration about z-axis
    pub fn rz(&self) -> f64 {
        (self.iz / self.a).sqrt()
    }

    /// Polar moment of inertia
    pub fn ip(&self) -> f64 {
        self.iy + self.iz
    }

    /// Shear area along y, falling back to the gross area
    pub fn shear_area_y(&self) -> f64 {
        self.asy.unwrap_or(self.a)
    }

    /// Shear area along z, falling back to the gross area
    pub fn shear_area_z(&self) -> f64 {
        self.asz.unwrap_or(self.a)
    }
}
