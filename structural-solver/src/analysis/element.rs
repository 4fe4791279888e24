//! Element dispatch
//!
//! Every element kind offers the same capabilities to the assembler and the
//! recoverer: global stiffness and mass, equivalent nodal loads for a load
//! case, and recovery of its own results from nodal displacements.

use log::warn;
use nalgebra::{DMatrix, DVector};

use super::config::{AnalysisConfig, MassFormulation};
use super::dof::DofMap;
use crate::elements::{Beam, Plate, Section};
use crate::error::{AnalysisError, AnalysisResult};
use crate::loads::{BeamLoad, PlateLoad};
use crate::math::plate::{
    fold_matrix, fold_vector, plate_consistent_mass, plate_corner_resultants, plate_geometry,
    plate_local_stiffness, plate_lumped_mass, plate_pressure_load, plate_thermal_load,
    plate_transformation_matrix, thermal_strains, unfold_vector, PlateGeometry, PlateProperties,
    PlateResultants, Vec24,
};
use crate::math::{
    beam_consistent_mass, beam_geometric_stiffness, beam_local_stiffness, beam_lumped_mass,
    beam_rotation_matrix, beam_transformation_matrix, condense_fer, condense_releases,
    fer_linear_load, fer_point_load, fer_thermal, fixed_fixed_axial_influence,
    fixed_fixed_influence, shear_hermite, recover_released, rigid_offset_matrix, BeamProperties, Mat12,
    Mat3, Vec12, Vec3, GAUSS_3,
};
use crate::model::StructuralModel;
use crate::results::{
    BeamResult, BeamStation, PlateForces, PlateMoments, PlateNodeResult, PlateResult, StationForces,
    StationStress,
};

/// Integrate `f` over [a, b] with 3-point Gauss
fn integrate(a: f64, b: f64, f: impl Fn(f64) -> f64) -> f64 {
    if b <= a {
        return 0.0;
    }
    let half = (b - a) / 2.0;
    GAUSS_3
        .iter()
        .map(|&(g, w)| w * f(a + (g + 1.0) * half))
        .sum::<f64>()
        * half
}

/// A load acting along the span, in local components
#[derive(Debug, Clone, Copy)]
enum SpanLoad {
    Point { a: f64, p: [f64; 3] },
    Line { x1: f64, x2: f64, w1: [f64; 3], w2: [f64; 3] },
}

impl SpanLoad {
    fn intensity(x1: f64, x2: f64, w1: f64, w2: f64, s: f64) -> f64 {
        w1 + (w2 - w1) * (s - x1) / (x2 - x1)
    }
}

/// Frame element prepared for one run
#[derive(Debug, Clone)]
pub struct BeamElement {
    pub id: String,
    pub dofs: [usize; 12],
    pub props: BeamProperties,
    pub section: Section,
    pub alpha: f64,
    /// Flexible length between the offset ends
    pub length: f64,
    pub rotation: Mat3,
    /// Node DOFs (global) to local end DOFs: rotation after rigid offsets
    pub transform: Mat12,
    pub k_elastic: Mat12,
    pub releases: [bool; 12],
    pub loads: Vec<BeamLoad>,
}

impl BeamElement {
    fn new(model: &StructuralModel, beam: &Beam, dofs: &DofMap, config: &AnalysisConfig) -> AnalysisResult<Self> {
        let start = model
            .node(&beam.start_node)
            .ok_or_else(|| AnalysisError::NodeNotFound(beam.start_node.clone()))?;
        let end = model
            .node(&beam.end_node)
            .ok_or_else(|| AnalysisError::NodeNotFound(beam.end_node.clone()))?;
        let section = model
            .section(&beam.section)
            .ok_or_else(|| AnalysisError::SectionNotFound(beam.section.clone()))?;
        let material = model
            .material(&section.material)
            .ok_or_else(|| AnalysisError::MaterialNotFound(section.material.clone()))?;

        let mut p_start = start.coords();
        let mut p_end = end.coords();
        for i in 0..3 {
            p_start[i] += beam.offset_start[i];
            p_end[i] += beam.offset_end[i];
        }
        let rotation = beam_rotation_matrix(&p_start, &p_end, beam.rotation)?;
        let length = Vec3::new(p_end[0] - p_start[0], p_end[1] - p_start[1], p_end[2] - p_start[2]).norm();

        let mut transform = beam_transformation_matrix(&rotation);
        if beam.has_offsets() {
            transform *= rigid_offset_matrix(&beam.offset_start, &beam.offset_end);
        }

        let props = BeamProperties {
            e: material.e,
            g: material.shear_modulus(),
            a: section.a,
            iy: section.iy,
            iz: section.iz,
            j: section.j,
            shear_areas: config
                .effects
                .shear_deformation
                .then(|| (section.shear_area_y(), section.shear_area_z())),
            rho: material.rho,
        };

        if section.sy.is_none() || section.sz.is_none() || section.wt.is_none() {
            warn!(
                "Section '{}' of beam '{}' lacks section moduli - bending/torsion stresses reported as 0",
                section.id, beam.id
            );
        }

        let a = dofs
            .node_dofs(&beam.start_node)
            .ok_or_else(|| AnalysisError::NodeNotFound(beam.start_node.clone()))?;
        let b = dofs
            .node_dofs(&beam.end_node)
            .ok_or_else(|| AnalysisError::NodeNotFound(beam.end_node.clone()))?;
        let element_dofs: [usize; 12] = std::array::from_fn(|i| if i < 6 { a[i] } else { b[i - 6] });

        Ok(Self {
            id: beam.id.clone(),
            dofs: element_dofs,
            k_elastic: beam_local_stiffness(&props, length),
            props,
            section: section.clone(),
            alpha: material.alpha,
            length,
            rotation,
            transform,
            releases: beam.releases.as_array(),
            loads: beam.loads.clone(),
        })
    }

    /// Local stiffness before condensation; `axial` is the P-Delta axial force
    pub fn local_stiffness(&self, axial: f64) -> Mat12 {
        if axial == 0.0 {
            self.k_elastic
        } else {
            self.k_elastic
                + beam_geometric_stiffness(axial, self.props.a, self.props.iy, self.props.iz, self.length)
        }
    }

    fn local_components(&self, magnitude: f64, direction: crate::loads::LoadDirection) -> [f64; 3] {
        let axis = direction.axis();
        if direction.is_local() {
            let mut c = [0.0; 3];
            c[axis] = magnitude;
            c
        } else {
            let mut g = Vec3::zeros();
            g[axis] = magnitude;
            let l = self.rotation * g;
            [l[0], l[1], l[2]]
        }
    }

    fn span_loads(&self, case: &str, scale: f64) -> Vec<SpanLoad> {
        let l = self.length;
        self.loads
            .iter()
            .filter(|load| load.case() == case)
            .filter_map(|load| match load {
                BeamLoad::Point(p) => Some(SpanLoad::Point {
                    a: p.position.clamp(0.0, l),
                    p: self.local_components(p.magnitude * scale, p.direction),
                }),
                BeamLoad::Distributed(d) => {
                    let x1 = d.x1.clamp(0.0, l);
                    let x2 = d.x2.unwrap_or(l).clamp(0.0, l);
                    (x2 > x1).then(|| SpanLoad::Line {
                        x1,
                        x2,
                        w1: self.local_components(d.w1 * scale, d.direction),
                        w2: self.local_components(d.w2 * scale, d.direction),
                    })
                }
                BeamLoad::Thermal(_) => None,
            })
            .collect()
    }

    /// Fixed-end forces of the case loads, local axes, before condensation
    pub fn fixed_end_forces(&self, case: &str, scale: f64) -> Vec12 {
        let l = self.length;
        let mut fer = Vec12::zeros();
        for span in self.span_loads(case, scale) {
            match span {
                SpanLoad::Point { a, p } => {
                    for (axis, &value) in p.iter().enumerate() {
                        if value != 0.0 {
                            fer += fer_point_load(value, a, l, axis);
                        }
                    }
                }
                SpanLoad::Line { x1, x2, w1, w2 } => {
                    for axis in 0..3 {
                        if w1[axis] != 0.0 || w2[axis] != 0.0 {
                            fer += fer_linear_load(w1[axis], w2[axis], x1, x2, l, axis);
                        }
                    }
                }
            }
        }
        for load in self.loads.iter().filter(|load| load.case() == case) {
            if let BeamLoad::Thermal(t) = load {
                fer += fer_thermal(
                    &self.props,
                    self.alpha,
                    t.delta_t * scale,
                    t.gradient_y * scale,
                    t.gradient_z * scale,
                );
            }
        }
        fer
    }

    /// Local end forces (forces the nodes exert on the member)
    pub fn end_forces(&self, d_elem: &DVector<f64>, case: &str, scale: f64, axial: f64) -> Vec12 {
        let k = self.local_stiffness(axial);
        let d_local = self.transform * Vec12::from_iterator(d_elem.iter().copied());
        let fer = condense_fer(&self.fixed_end_forces(case, scale), &k, &self.releases);
        condense_releases(&k, &self.releases) * d_local + fer
    }

    fn station(
        &self,
        x: f64,
        f: &Vec12,
        d: &Vec12,
        spans: &[SpanLoad],
    ) -> BeamStation {
        let l = self.length;

        // Left free body: loads on [0, x] and their moment arms about x
        let mut sum = [0.0; 3];
        let mut arm = [0.0; 3];
        // Particular (fixed-fixed) displacements of the span loads
        let mut particular = [0.0; 3];
        for span in spans {
            match *span {
                SpanLoad::Point { a, p } => {
                    if a < x {
                        for i in 0..3 {
                            sum[i] += p[i];
                            arm[i] += (x - a) * p[i];
                        }
                    }
                    particular[0] += p[0] * fixed_fixed_axial_influence(x, a, l);
                    particular[1] += p[1] * fixed_fixed_influence(x, a, l);
                    particular[2] += p[2] * fixed_fixed_influence(x, a, l);
                }
                SpanLoad::Line { x1, x2, w1, w2 } => {
                    let upper = x.min(x2);
                    for i in 0..3 {
                        let w = |s: f64| SpanLoad::intensity(x1, x2, w1[i], w2[i], s);
                        sum[i] += integrate(x1, upper, &w);
                        arm[i] += integrate(x1, upper, |s| (x - s) * w(s));

                        let influence = |s: f64| {
                            if i == 0 {
                                fixed_fixed_axial_influence(x, s, l)
                            } else {
                                fixed_fixed_influence(x, s, l)
                            }
                        };
                        // Split at x where the influence line has a kink
                        let split = x.clamp(x1, x2);
                        particular[i] += integrate(x1, split, |s| w(s) * influence(s))
                            + integrate(split, x2, |s| w(s) * influence(s));
                    }
                }
            }
        }

        let forces = StationForces {
            axial: -(f[0] + sum[0]),
            shear_y: -(f[1] + sum[1]),
            shear_z: -(f[2] + sum[2]),
            torsion: -f[3],
            moment_y: -(f[4] + x * f[2] + arm[2]),
            moment_z: -(f[5] - x * f[1] - arm[1]),
        };

        let ratio = |value: f64, modulus: Option<f64>| match modulus {
            Some(m) if m > 0.0 => value / m,
            _ => 0.0,
        };
        let s = &self.section;
        let stress = StationStress::from_components(
            forces.axial / s.a,
            ratio(forces.moment_y, s.sy),
            ratio(forces.moment_z, s.sz),
            forces.shear_y / s.shear_area_y(),
            forces.shear_z / s.shear_area_z(),
            ratio(forces.torsion, s.wt),
        );

        let xi = x / l;
        let (phi_y, phi_z) = self.props.shear_factors(l);
        let ny = shear_hermite(x, l, phi_y);
        let nz = shear_hermite(x, l, phi_z);
        let ea = self.props.e * self.props.a;
        let eiz = self.props.e * self.props.iz;
        let eiy = self.props.e * self.props.iy;
        let displacement = [
            d[0] * (1.0 - xi) + d[6] * xi + particular[0] / ea,
            ny[0] * d[1] + ny[1] * d[5] + ny[2] * d[7] + ny[3] * d[11] + particular[1] / eiz,
            nz[0] * d[2] - nz[1] * d[4] + nz[2] * d[8] - nz[3] * d[10] + particular[2] / eiy,
        ];

        BeamStation {
            position: x,
            forces,
            stress,
            displacement,
        }
    }

    /// Stations along the beam for one load case
    pub fn recover(&self, d_elem: &DVector<f64>, case: &str, scale: f64, axial: f64, stations: usize) -> BeamResult {
        let k = self.local_stiffness(axial);
        let fer = self.fixed_end_forces(case, scale);
        let d_local = self.transform * Vec12::from_iterator(d_elem.iter().copied());
        let f = condense_releases(&k, &self.releases) * d_local + condense_fer(&fer, &k, &self.releases);
        let d_full = recover_released(&d_local, &k, &fer, &self.releases);
        let spans = self.span_loads(case, scale);

        let n = stations.max(2);
        let stations = (0..n)
            .map(|i| {
                let x = self.length * i as f64 / (n - 1) as f64;
                self.station(x, &f, &d_full, &spans)
            })
            .collect();

        BeamResult {
            beam: self.id.clone(),
            stations,
        }
    }
}

/// Plate element prepared for one run
#[derive(Debug, Clone)]
pub struct PlateElement {
    pub id: String,
    pub node_ids: Vec<String>,
    pub dofs: Vec<usize>,
    pub geometry: PlateGeometry,
    pub props: PlateProperties,
    /// Local stiffness folded onto the plate's nodes
    pub k_local: DMatrix<f64>,
    pub transform: DMatrix<f64>,
    pub loads: Vec<PlateLoad>,
}

impl PlateElement {
    fn new(model: &StructuralModel, plate: &Plate, dofs: &DofMap) -> AnalysisResult<Self> {
        let material = model
            .material(&plate.material)
            .ok_or_else(|| AnalysisError::MaterialNotFound(plate.material.clone()))?;

        let mut coords = Vec::with_capacity(plate.nodes.len());
        let mut element_dofs = Vec::with_capacity(6 * plate.nodes.len());
        for id in &plate.nodes {
            let node = model
                .node(id)
                .ok_or_else(|| AnalysisError::NodeNotFound(id.clone()))?;
            coords.push(node.coords());
            let node_dofs = dofs
                .node_dofs(id)
                .ok_or_else(|| AnalysisError::NodeNotFound(id.clone()))?;
            element_dofs.extend_from_slice(&node_dofs);
        }

        let geometry = plate_geometry(&coords, plate.rotation)?;
        let props = PlateProperties {
            e: material.e,
            nu: material.nu,
            g: material.shear_modulus(),
            t: plate.thickness,
            rho: material.rho,
            alpha: material.alpha,
        };
        let k_local = fold_matrix(&geometry, &plate_local_stiffness(&geometry, &props)?);
        let transform = plate_transformation_matrix(&geometry.rotation, geometry.node_count);

        Ok(Self {
            id: plate.id.clone(),
            node_ids: plate.nodes.clone(),
            dofs: element_dofs,
            geometry,
            props,
            k_local,
            transform,
            loads: plate.loads.clone(),
        })
    }

    fn case_loads<'a>(&'a self, case: &'a str) -> impl Iterator<Item = &'a PlateLoad> + 'a {
        self.loads.iter().filter(move |load| load.case() == case)
    }

    /// Free thermal strains of the case loads
    fn thermal_state(&self, case: &str, scale: f64) -> ([f64; 3], [f64; 3]) {
        let mut e0 = [0.0; 3];
        let mut k0 = [0.0; 3];
        for load in self.case_loads(case) {
            if let PlateLoad::Thermal(t) = load {
                let (e, k) = thermal_strains(&self.props, t.delta_t * scale, t.gradient * scale);
                for i in 0..3 {
                    e0[i] += e[i];
                    k0[i] += k[i];
                }
            }
        }
        (e0, k0)
    }

    /// Equivalent nodal loads in local axes, folded onto the plate nodes
    fn local_loads(&self, case: &str, scale: f64) -> AnalysisResult<DVector<f64>> {
        let g = &self.geometry;
        let mut f = Vec24::zeros();
        for load in self.case_loads(case) {
            match load {
                PlateLoad::Pressure(p) => {
                    f += plate_pressure_load(g, &[p.pressure * scale; 4])?;
                }
                PlateLoad::VaryingPressure(v) => {
                    let mut corners = [0.0; 4];
                    for (c, &node) in g.corner_nodes.iter().enumerate() {
                        corners[c] = v.pressures.get(node).copied().unwrap_or(0.0) * scale;
                    }
                    f += plate_pressure_load(g, &corners)?;
                }
                PlateLoad::Thermal(_) => {}
            }
        }
        let (e0, k0) = self.thermal_state(case, scale);
        if e0.iter().chain(k0.iter()).any(|v| *v != 0.0) {
            f += plate_thermal_load(g, &self.props, &e0, &k0)?;
        }
        Ok(fold_vector(g, &f))
    }

    fn recover(&self, d_elem: &DVector<f64>, case: &str, scale: f64) -> AnalysisResult<PlateResult> {
        let d_local = &self.transform * d_elem;
        let (e0, k0) = self.thermal_state(case, scale);
        let corners = plate_corner_resultants(
            &self.geometry,
            &self.props,
            &unfold_vector(&self.geometry, &d_local),
            &e0,
            &k0,
        )?;

        // Average corners that collapse onto the same node
        let n = self.geometry.node_count;
        let mut sums = vec![PlateResultants::default(); n];
        let mut counts = vec![0usize; n];
        for (c, &node) in self.geometry.corner_nodes.iter().enumerate() {
            counts[node] += 1;
            for k in 0..3 {
                sums[node].membrane[k] += corners[c].membrane[k];
                sums[node].moments[k] += corners[c].moments[k];
            }
            for k in 0..2 {
                sums[node].shear[k] += corners[c].shear[k];
            }
        }

        let values = sums
            .iter()
            .zip(counts.iter())
            .map(|(r, &count)| {
                let w = 1.0 / count.max(1) as f64;
                PlateNodeResult::from_resultants(
                    PlateForces {
                        nx: r.membrane[0] * w,
                        ny: r.membrane[1] * w,
                        nxy: r.membrane[2] * w,
                        qx: r.shear[0] * w,
                        qy: r.shear[1] * w,
                    },
                    PlateMoments {
                        mx: r.moments[0] * w,
                        my: r.moments[1] * w,
                        mxy: r.moments[2] * w,
                    },
                    self.props.t,
                )
            })
            .collect();

        Ok(PlateResult {
            plate: self.id.clone(),
            nodes: self.node_ids.clone(),
            values,
        })
    }
}

/// Result of one element for one load case
#[derive(Debug, Clone)]
pub enum ElementResult {
    Beam(BeamResult),
    Plate(PlateResult),
}

/// Closed set of element kinds
#[derive(Debug, Clone)]
pub enum Element {
    Beam(BeamElement),
    Plate(PlateElement),
}

impl Element {
    /// Prepare every beam and plate of `model`, beams first, in declaration order
    pub fn build_all(model: &StructuralModel, dofs: &DofMap, config: &AnalysisConfig) -> AnalysisResult<Vec<Element>> {
        let mut elements = Vec::with_capacity(model.beams.len() + model.plates.len());
        for beam in &model.beams {
            elements.push(Element::Beam(BeamElement::new(model, beam, dofs, config)?));
        }
        for plate in &model.plates {
            elements.push(Element::Plate(PlateElement::new(model, plate, dofs)?));
        }
        Ok(elements)
    }

    pub fn id(&self) -> &str {
        match self {
            Element::Beam(b) => &b.id,
            Element::Plate(p) => &p.id,
        }
    }

    pub fn dofs(&self) -> &[usize] {
        match self {
            Element::Beam(b) => &b.dofs,
            Element::Plate(p) => &p.dofs,
        }
    }

    /// Displacements of this element's DOFs taken from a full vector
    pub fn gather(&self, full: &DVector<f64>) -> DVector<f64> {
        let dofs = self.dofs();
        DVector::from_iterator(dofs.len(), dofs.iter().map(|&i| full[i]))
    }

    /// Global stiffness; `axial` is the beam axial force for P-Delta (ignored by plates)
    pub fn global_stiffness(&self, axial: f64) -> DMatrix<f64> {
        match self {
            Element::Beam(b) => {
                let k = condense_releases(&b.local_stiffness(axial), &b.releases);
                let kg = b.transform.transpose() * k * b.transform;
                DMatrix::from_iterator(12, 12, kg.iter().copied())
            }
            Element::Plate(p) => p.transform.transpose() * &p.k_local * &p.transform,
        }
    }

    pub fn global_mass(&self, formulation: MassFormulation) -> AnalysisResult<DMatrix<f64>> {
        match self {
            Element::Beam(b) => {
                let m = match formulation {
                    MassFormulation::Consistent => beam_consistent_mass(&b.props, b.length),
                    MassFormulation::Lumped => beam_lumped_mass(&b.props, b.length),
                };
                let mg = b.transform.transpose() * m * b.transform;
                Ok(DMatrix::from_iterator(12, 12, mg.iter().copied()))
            }
            Element::Plate(p) => {
                let m = match formulation {
                    MassFormulation::Consistent => {
                        fold_matrix(&p.geometry, &plate_consistent_mass(&p.geometry, &p.props)?)
                    }
                    MassFormulation::Lumped => plate_lumped_mass(&p.geometry, &p.props),
                };
                Ok(p.transform.transpose() * m * &p.transform)
            }
        }
    }

    /// Equivalent nodal loads (global axes) of the element loads of `case`
    pub fn equivalent_loads(&self, case: &str, scale: f64, axial: f64) -> AnalysisResult<DVector<f64>> {
        match self {
            Element::Beam(b) => {
                let k = b.local_stiffness(axial);
                let fer = condense_fer(&b.fixed_end_forces(case, scale), &k, &b.releases);
                let f = -(b.transform.transpose() * fer);
                Ok(DVector::from_iterator(12, f.iter().copied()))
            }
            Element::Plate(p) => Ok(p.transform.transpose() * p.local_loads(case, scale)?),
        }
    }

    /// Axial force (tension positive) used for the next P-Delta iteration
    pub fn axial_force(&self, d_elem: &DVector<f64>, case: &str, scale: f64, axial: f64) -> f64 {
        match self {
            Element::Beam(b) => b.end_forces(d_elem, case, scale, axial)[6],
            Element::Plate(_) => 0.0,
        }
    }

    pub fn recover(
        &self,
        d_elem: &DVector<f64>,
        case: &str,
        scale: f64,
        axial: f64,
        stations: usize,
    ) -> AnalysisResult<ElementResult> {
        match self {
            Element::Beam(b) => Ok(ElementResult::Beam(b.recover(d_elem, case, scale, axial, stations))),
            Element::Plate(p) => Ok(ElementResult::Plate(p.recover(d_elem, case, scale)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Material, Node, Restraint};
    use crate::loads::{LoadCase, LoadDirection};
    use approx::assert_relative_eq;

    fn model_with(beam: Beam) -> StructuralModel {
        let mut model = StructuralModel::new("P");
        model.load_cases.push(LoadCase::dead());
        model.materials.push(Material::steel("S"));
        model
            .sections
            .push(Section::rectangular("R", "S", 0.2, 0.4));
        model
            .nodes
            .push(Node::new("A", 0.0, 0.0, 0.0).with_restraint(Restraint::fixed()));
        model.nodes.push(Node::new("B", 4.0, 0.0, 0.0));
        model.beams.push(beam);
        model
    }

    #[test]
    fn test_global_stiffness_is_symmetric() {
        let model = model_with(
            Beam::new("B1", "A", "B", "R")
                .with_rotation(0.4)
                .with_offsets([0.1, 0.0, 0.2], [-0.1, 0.05, 0.0]),
        );
        let dofs = DofMap::new(&model);
        let elements = Element::build_all(&model, &dofs, &AnalysisConfig::default()).unwrap();
        let k = elements[0].global_stiffness(0.0);
        assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-3, max_relative = 1e-9);
    }

    #[test]
    fn test_uniform_load_moment_at_fixed_ends() {
        let model = model_with(Beam::new("B1", "A", "B", "R").with_load(BeamLoad::uniform(
            -10.0,
            LoadDirection::Fy,
            "Dead",
        )));
        let dofs = DofMap::new(&model);
        let elements = Element::build_all(&model, &dofs, &AnalysisConfig::default()).unwrap();

        // Both ends held: the member forces are the fixed-end forces
        let d = DVector::zeros(12);
        let result = match elements[0].recover(&d, "Dead", 1.0, 0.0, 5).unwrap() {
            ElementResult::Beam(b) => b,
            other => panic!("expected beam result, got {:?}", other),
        };
        let w = 10.0_f64;
        let l = 4.0_f64;
        let start = result.start().unwrap();
        let mid = &result.stations[2];
        let end = result.end().unwrap();
        assert_relative_eq!(start.forces.moment_z.abs(), w * l * l / 12.0, max_relative = 1e-10);
        assert_relative_eq!(end.forces.moment_z, start.forces.moment_z, max_relative = 1e-10);
        assert_relative_eq!(mid.forces.moment_z.abs(), w * l * l / 24.0, max_relative = 1e-10);
        assert!(mid.forces.moment_z * start.forces.moment_z < 0.0);
        assert_relative_eq!(mid.forces.shear_y, 0.0, epsilon = 1e-9);
        // Fixed-fixed midspan deflection w L^4 / 384 EI
        let ei = 200e9 * 0.2 * 0.4_f64.powi(3) / 12.0;
        assert_relative_eq!(mid.displacement[1], -w * l.powi(4) / (384.0 * ei), max_relative = 1e-8);
    }

    #[test]
    fn test_global_direction_load_is_projected() {
        // Vertical column: global -X load maps onto a local transverse axis
        let mut model = model_with(Beam::new("B1", "A", "B", "R"));
        model.nodes[1].y = 4.0;
        model.nodes[1].x = 0.0;
        model.beams[0].loads.push(BeamLoad::point(-5.0, 2.0, LoadDirection::FX, "Dead"));
        let dofs = DofMap::new(&model);
        let elements = Element::build_all(&model, &dofs, &AnalysisConfig::default()).unwrap();
        let f = elements[0].equivalent_loads("Dead", 1.0, 0.0).unwrap();
        assert_relative_eq!(f[0] + f[6], -5.0, epsilon = 1e-9);
        assert_relative_eq!(f[1] + f[7], 0.0, epsilon = 1e-9);
    }
}
