//! Flat shell element math: MITC4 bending plus bilinear membrane
//!
//! References:
//! - "Finite Element Procedures, 2nd Edition", Klaus-Jurgen Bathe
//! - Dvorkin & Bathe, "A continuum mechanics based four-node shell element" (1984)
//!
//! Every plate is integrated as a 4-node quadrilateral in its own local frame
//! with 6 DOFs per corner: DX, DY, DZ, RX, RY, RZ. A triangle is handled as a
//! quadrilateral with its last two corners collapsed onto the third node.
//!
//! Sign conventions in the local frame:
//! - curvatures: kx = ry,x ; ky = -rx,y ; kxy = ry,y - rx,x
//! - transverse shear: gxz = w,x + ry ; gyz = w,y - rx
//! - fibre strain at height z: e = e_membrane + z * k

use nalgebra::{DMatrix, DVector, SMatrix, SVector};

use super::{Mat3, Vec3};
use crate::error::{AnalysisError, AnalysisResult};

pub type Mat24 = SMatrix<f64, 24, 24>;
pub type Vec24 = SVector<f64, 24>;
type B3 = SMatrix<f64, 3, 24>;
type B2 = SMatrix<f64, 2, 24>;

/// Shear correction factor for a homogeneous plate
const SHEAR_CORRECTION: f64 = 5.0 / 6.0;

/// Drilling penalty relative to G t
const DRILLING_RATIO: f64 = 1e-3;

const GP: f64 = 0.577_350_269_189_625_8;

/// 2x2 Gauss points, ordered like the corners
const GAUSS_2X2: [(f64, f64); 4] = [(-GP, -GP), (GP, -GP), (GP, GP), (-GP, GP)];

/// Natural coordinates of the four corners
const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Material and thickness constants of a plate
#[derive(Debug, Clone, Copy)]
pub struct PlateProperties {
    pub e: f64,
    pub nu: f64,
    pub g: f64,
    pub t: f64,
    pub rho: f64,
    pub alpha: f64,
}

/// Local frame and planar corner coordinates of a plate
#[derive(Debug, Clone)]
pub struct PlateGeometry {
    /// Direction cosines, rows are the local x, y, z axes in global axes
    pub rotation: Mat3,
    /// Corner coordinates projected onto the mean plane
    pub local: [[f64; 2]; 4],
    /// Plate node index of each quadrilateral corner
    pub corner_nodes: [usize; 4],
    /// Number of plate nodes (3 or 4)
    pub node_count: usize,
    /// Largest distance of a node from the mean plane divided by sqrt(area)
    pub warping: f64,
    /// Projected area
    pub area: f64,
}

/// Build the local frame of a 3- or 4-node plate.
///
/// The normal is the cross product of the diagonals (quads) or of two edges
/// (triangles); local x follows the first edge projected onto the mean plane
/// and is then rotated by `rotation` about the normal.
pub fn plate_geometry(coords: &[[f64; 3]], rotation: f64) -> AnalysisResult<PlateGeometry> {
    let n = coords.len();
    if !(3..=4).contains(&n) {
        return Err(AnalysisError::UnsupportedFeature(format!(
            "plates with {} nodes (only 3 or 4 are supported)",
            n
        )));
    }

    let p: Vec<Vec3> = coords.iter().map(|c| Vec3::new(c[0], c[1], c[2])).collect();
    let centroid = p.iter().fold(Vec3::zeros(), |acc, v| acc + v) / n as f64;

    let normal = if n == 4 {
        (p[2] - p[0]).cross(&(p[3] - p[1]))
    } else {
        (p[1] - p[0]).cross(&(p[2] - p[0]))
    };
    if normal.norm() < 1e-14 {
        return Err(AnalysisError::InvalidInput("plate has zero area".to_string()));
    }
    let z = normal.normalize();

    let edge = p[1] - p[0];
    let in_plane = edge - z * edge.dot(&z);
    if in_plane.norm() < 1e-14 {
        return Err(AnalysisError::InvalidInput("plate has a zero-length edge".to_string()));
    }
    let x0 = in_plane.normalize();
    let y0 = z.cross(&x0);
    let (s, c) = rotation.sin_cos();
    let x = x0 * c + y0 * s;
    let y = z.cross(&x);

    let corner_nodes = if n == 4 { [0, 1, 2, 3] } else { [0, 1, 2, 2] };
    let mut local = [[0.0; 2]; 4];
    let mut max_height: f64 = 0.0;
    for (corner, &node) in corner_nodes.iter().enumerate() {
        let d = p[node] - centroid;
        local[corner] = [d.dot(&x), d.dot(&y)];
        max_height = max_height.max(d.dot(&z).abs());
    }

    // Shoelace area of the projected polygon
    let mut twice_area = 0.0;
    for i in 0..4 {
        let a = local[i];
        let b = local[(i + 1) % 4];
        twice_area += a[0] * b[1] - b[0] * a[1];
    }
    let area = twice_area / 2.0;
    let convex = n == 3
        || (0..4).all(|i| {
            let prev = local[(i + 3) % 4];
            let here = local[i];
            let next = local[(i + 1) % 4];
            let turn = (here[0] - prev[0]) * (next[1] - here[1]) - (here[1] - prev[1]) * (next[0] - here[0]);
            turn > 1e-10 * area.abs()
        });
    if area <= 0.0 || !convex {
        return Err(AnalysisError::InvalidInput(
            "plate nodes are not ordered around a convex perimeter".to_string(),
        ));
    }

    Ok(PlateGeometry {
        rotation: Mat3::new(
            x[0], x[1], x[2],
            y[0], y[1], y[2],
            z[0], z[1], z[2],
        ),
        local,
        corner_nodes,
        node_count: n,
        warping: max_height / area.sqrt(),
        area,
    })
}

/// Plane stress constitutive matrix [Dm]
pub fn membrane_constitutive_matrix(e: f64, nu: f64) -> Mat3 {
    let f = e / (1.0 - nu * nu);
    Mat3::new(
        f,      f * nu, 0.0,
        f * nu, f,      0.0,
        0.0,    0.0,    f * (1.0 - nu) / 2.0,
    )
}

/// Bending constitutive matrix [Db] = Dm * t³ / 12
pub fn bending_constitutive_matrix(e: f64, nu: f64, t: f64) -> Mat3 {
    membrane_constitutive_matrix(e, nu) * (t.powi(3) / 12.0)
}

fn shape(r: f64, s: f64) -> [f64; 4] {
    [
        (1.0 - r) * (1.0 - s) / 4.0,
        (1.0 + r) * (1.0 - s) / 4.0,
        (1.0 + r) * (1.0 + s) / 4.0,
        (1.0 - r) * (1.0 + s) / 4.0,
    ]
}

fn shape_derivatives(r: f64, s: f64) -> ([f64; 4], [f64; 4]) {
    (
        [-(1.0 - s) / 4.0, (1.0 - s) / 4.0, (1.0 + s) / 4.0, -(1.0 + s) / 4.0],
        [-(1.0 - r) / 4.0, -(1.0 + r) / 4.0, (1.0 + r) / 4.0, (1.0 - r) / 4.0],
    )
}

/// Jacobian [[x,r  y,r], [x,s  y,s]]
fn jacobian(local: &[[f64; 2]; 4], r: f64, s: f64) -> [[f64; 2]; 2] {
    let (dn_dr, dn_ds) = shape_derivatives(r, s);
    let mut j = [[0.0; 2]; 2];
    for i in 0..4 {
        j[0][0] += dn_dr[i] * local[i][0];
        j[0][1] += dn_dr[i] * local[i][1];
        j[1][0] += dn_ds[i] * local[i][0];
        j[1][1] += dn_ds[i] * local[i][1];
    }
    j
}

/// Shape functions, Cartesian derivatives and Jacobian at a point
struct ShapeData {
    n: [f64; 4],
    dn_dx: [f64; 4],
    dn_dy: [f64; 4],
    j: [[f64; 2]; 2],
    det_j: f64,
}

fn shape_data(local: &[[f64; 2]; 4], r: f64, s: f64) -> AnalysisResult<ShapeData> {
    let j = jacobian(local, r, s);
    let det_j = j[0][0] * j[1][1] - j[0][1] * j[1][0];
    if det_j <= 1e-14 {
        return Err(AnalysisError::InvalidInput(
            "plate is distorted (non-positive Jacobian)".to_string(),
        ));
    }

    let (dn_dr, dn_ds) = shape_derivatives(r, s);
    let mut dn_dx = [0.0; 4];
    let mut dn_dy = [0.0; 4];
    for i in 0..4 {
        dn_dx[i] = (j[1][1] * dn_dr[i] - j[0][1] * dn_ds[i]) / det_j;
        dn_dy[i] = (-j[1][0] * dn_dr[i] + j[0][0] * dn_ds[i]) / det_j;
    }

    Ok(ShapeData {
        n: shape(r, s),
        dn_dx,
        dn_dy,
        j,
        det_j,
    })
}

/// Membrane strain-displacement matrix: [ex, ey, gxy]
fn membrane_b(sd: &ShapeData) -> B3 {
    let mut b = B3::zeros();
    for i in 0..4 {
        let u = 6 * i;
        let v = 6 * i + 1;
        b[(0, u)] = sd.dn_dx[i];
        b[(1, v)] = sd.dn_dy[i];
        b[(2, u)] = sd.dn_dy[i];
        b[(2, v)] = sd.dn_dx[i];
    }
    b
}

/// Curvature-displacement matrix: [kx, ky, kxy]
fn bending_b(sd: &ShapeData) -> B3 {
    let mut b = B3::zeros();
    for i in 0..4 {
        let rx = 6 * i + 3;
        let ry = 6 * i + 4;
        b[(0, ry)] = sd.dn_dx[i];
        b[(1, rx)] = -sd.dn_dy[i];
        b[(2, rx)] = -sd.dn_dx[i];
        b[(2, ry)] = sd.dn_dy[i];
    }
    b
}

/// Covariant transverse shear strains [g_r, g_s] evaluated directly at a point
fn covariant_shear(local: &[[f64; 2]; 4], r: f64, s: f64) -> B2 {
    let j = jacobian(local, r, s);
    let n = shape(r, s);
    let (dn_dr, dn_ds) = shape_derivatives(r, s);

    let mut b = B2::zeros();
    for i in 0..4 {
        let w = 6 * i + 2;
        let rx = 6 * i + 3;
        let ry = 6 * i + 4;
        // g_r = w,r + x,r * ry - y,r * rx
        b[(0, w)] = dn_dr[i];
        b[(0, ry)] = j[0][0] * n[i];
        b[(0, rx)] = -j[0][1] * n[i];
        // g_s = w,s + x,s * ry - y,s * rx
        b[(1, w)] = dn_ds[i];
        b[(1, ry)] = j[1][0] * n[i];
        b[(1, rx)] = -j[1][1] * n[i];
    }
    b
}

/// In-plane rotation mismatch: rz - (v,x - u,y) / 2
fn drilling_b(sd: &ShapeData) -> SMatrix<f64, 1, 24> {
    let mut b = SMatrix::<f64, 1, 24>::zeros();
    for i in 0..4 {
        b[(0, 6 * i)] = 0.5 * sd.dn_dy[i];
        b[(0, 6 * i + 1)] = -0.5 * sd.dn_dx[i];
        b[(0, 6 * i + 5)] = sd.n[i];
    }
    b
}

/// MITC4 assumed transverse shear strain matrix: [gxz, gyz]
fn shear_b(local: &[[f64; 2]; 4], sd: &ShapeData, r: f64, s: f64) -> B2 {
    // Tying points: A (0, 1), C (0, -1) for g_r; B (-1, 0), D (1, 0) for g_s
    let a = covariant_shear(local, 0.0, 1.0);
    let c = covariant_shear(local, 0.0, -1.0);
    let bp = covariant_shear(local, -1.0, 0.0);
    let d = covariant_shear(local, 1.0, 0.0);

    let g_r = a.row(0) * (0.5 * (1.0 + s)) + c.row(0) * (0.5 * (1.0 - s));
    let g_s = d.row(1) * (0.5 * (1.0 + r)) + bp.row(1) * (0.5 * (1.0 - r));

    // [g_r, g_s] = J [gxz, gyz]
    let det = sd.det_j;
    let j = sd.j;
    let mut b = B2::zeros();
    b.set_row(0, &((g_r * j[1][1] - g_s * j[0][1]) / det));
    b.set_row(1, &((-g_r * j[1][0] + g_s * j[0][0]) / det));
    b
}

/// Local 24x24 stiffness of the quadrilateral (membrane + bending + shear + drilling)
pub fn plate_local_stiffness(geom: &PlateGeometry, props: &PlateProperties) -> AnalysisResult<Mat24> {
    let dm = membrane_constitutive_matrix(props.e, props.nu) * props.t;
    let db = bending_constitutive_matrix(props.e, props.nu, props.t);
    let ds = SHEAR_CORRECTION * props.g * props.t;

    let mut k = Mat24::zeros();
    for &(r, s) in GAUSS_2X2.iter() {
        let sd = shape_data(&geom.local, r, s)?;
        let bm = membrane_b(&sd);
        let bb = bending_b(&sd);
        let bs = shear_b(&geom.local, &sd, r, s);

        k += (bm.transpose() * dm * bm + bb.transpose() * db * bb + bs.transpose() * bs * ds) * sd.det_j;
    }

    // Drilling penalty on rz - (v,x - u,y) / 2, zero under any rigid rotation
    let gamma = DRILLING_RATIO * props.g * props.t;
    for &(r, s) in GAUSS_2X2.iter() {
        let sd = shape_data(&geom.local, r, s)?;
        let bd = drilling_b(&sd);
        k += bd.transpose() * bd * (gamma * sd.det_j);
    }

    Ok(k)
}

/// Consistent mass of the quadrilateral in local axes
pub fn plate_consistent_mass(geom: &PlateGeometry, props: &PlateProperties) -> AnalysisResult<Mat24> {
    let translational = props.rho * props.t;
    let rotary = props.rho * props.t.powi(3) / 12.0;

    let mut m = Mat24::zeros();
    for &(r, s) in GAUSS_2X2.iter() {
        let sd = shape_data(&geom.local, r, s)?;
        for i in 0..4 {
            for j in 0..4 {
                let nn = sd.n[i] * sd.n[j] * sd.det_j;
                for dof in 0..3 {
                    m[(6 * i + dof, 6 * j + dof)] += translational * nn;
                }
                for dof in 3..6 {
                    m[(6 * i + dof, 6 * j + dof)] += rotary * nn;
                }
            }
        }
    }
    Ok(m)
}

/// Tributary area of each corner, the integral of N_i over the quadrilateral
fn corner_areas(local: &[[f64; 2]; 4]) -> [f64; 4] {
    let mut areas = [0.0; 4];
    for &(r, s) in GAUSS_2X2.iter() {
        let j = jacobian(local, r, s);
        let det_j = j[0][0] * j[1][1] - j[0][1] * j[1][0];
        for (area, n) in areas.iter_mut().zip(shape(r, s)) {
            *area += n * det_j;
        }
    }
    areas
}

/// Lumped mass of the plate, already expressed per plate node (6n x 6n)
///
/// Each node carries the mass of its tributary area, so a skewed quad
/// puts more mass at its wide corners.
pub fn plate_lumped_mass(geom: &PlateGeometry, props: &PlateProperties) -> DMatrix<f64> {
    let n = geom.node_count;
    let areas = corner_areas(&geom.local);

    let mut m = DMatrix::zeros(6 * n, 6 * n);
    for (&node, area) in geom.corner_nodes.iter().zip(areas) {
        let translational = props.rho * props.t * area;
        let rotary = props.rho * props.t.powi(3) / 12.0 * area;
        for dof in 0..3 {
            m[(6 * node + dof, 6 * node + dof)] += translational;
            m[(6 * node + 3 + dof, 6 * node + 3 + dof)] += rotary;
        }
    }
    m
}

/// Equivalent nodal loads of a normal pressure given at the four corners
pub fn plate_pressure_load(geom: &PlateGeometry, corner_pressures: &[f64; 4]) -> AnalysisResult<Vec24> {
    let mut f = Vec24::zeros();
    for &(r, s) in GAUSS_2X2.iter() {
        let sd = shape_data(&geom.local, r, s)?;
        let p: f64 = (0..4).map(|i| sd.n[i] * corner_pressures[i]).sum();
        for i in 0..4 {
            f[6 * i + 2] += sd.n[i] * p * sd.det_j;
        }
    }
    Ok(f)
}

/// Free thermal strains: membrane [ex, ey, gxy] and curvature [kx, ky, kxy]
pub fn thermal_strains(props: &PlateProperties, delta_t: f64, gradient: f64) -> ([f64; 3], [f64; 3]) {
    let e0 = props.alpha * delta_t;
    let k0 = props.alpha * gradient;
    ([e0, e0, 0.0], [k0, k0, 0.0])
}

/// Equivalent nodal loads that reproduce free thermal strains
pub fn plate_thermal_load(
    geom: &PlateGeometry,
    props: &PlateProperties,
    membrane_strain: &[f64; 3],
    curvature: &[f64; 3],
) -> AnalysisResult<Vec24> {
    let dm = membrane_constitutive_matrix(props.e, props.nu) * props.t;
    let db = bending_constitutive_matrix(props.e, props.nu, props.t);
    let e0 = nalgebra::Vector3::from_row_slice(membrane_strain);
    let k0 = nalgebra::Vector3::from_row_slice(curvature);

    let mut f = Vec24::zeros();
    for &(r, s) in GAUSS_2X2.iter() {
        let sd = shape_data(&geom.local, r, s)?;
        f += (membrane_b(&sd).transpose() * (dm * e0) + bending_b(&sd).transpose() * (db * k0)) * sd.det_j;
    }
    Ok(f)
}

/// Stress resultants at a point of the mid-surface
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlateResultants {
    /// Membrane forces per unit length [Nx, Ny, Nxy]
    pub membrane: [f64; 3],
    /// Moments per unit length [Mx, My, Mxy]
    pub moments: [f64; 3],
    /// Transverse shear forces per unit length [Qx, Qy]
    pub shear: [f64; 2],
}

/// Stress resultants at the four corners, extrapolated from the 2x2 Gauss points
pub fn plate_corner_resultants(
    geom: &PlateGeometry,
    props: &PlateProperties,
    d_local: &Vec24,
    membrane_strain: &[f64; 3],
    curvature: &[f64; 3],
) -> AnalysisResult<[PlateResultants; 4]> {
    let dm = membrane_constitutive_matrix(props.e, props.nu) * props.t;
    let db = bending_constitutive_matrix(props.e, props.nu, props.t);
    let ds = SHEAR_CORRECTION * props.g * props.t;
    let e0 = nalgebra::Vector3::from_row_slice(membrane_strain);
    let k0 = nalgebra::Vector3::from_row_slice(curvature);

    let mut at_gauss = [PlateResultants::default(); 4];
    for (g, &(r, s)) in GAUSS_2X2.iter().enumerate() {
        let sd = shape_data(&geom.local, r, s)?;
        let n = dm * (membrane_b(&sd) * d_local - e0);
        let m = db * (bending_b(&sd) * d_local - k0);
        let q = shear_b(&geom.local, &sd, r, s) * d_local * ds;
        at_gauss[g] = PlateResultants {
            membrane: [n[0], n[1], n[2]],
            moments: [m[0], m[1], m[2]],
            shear: [q[0], q[1]],
        };
    }

    let root3 = 3.0_f64.sqrt();
    let mut corners = [PlateResultants::default(); 4];
    for (c, &(r, s)) in CORNERS.iter().enumerate() {
        let w = shape(r * root3, s * root3);
        let out = &mut corners[c];
        for (g, res) in at_gauss.iter().enumerate() {
            for k in 0..3 {
                out.membrane[k] += w[g] * res.membrane[k];
                out.moments[k] += w[g] * res.moments[k];
            }
            for k in 0..2 {
                out.shear[k] += w[g] * res.shear[k];
            }
        }
    }
    Ok(corners)
}

/// Fold a quadrilateral matrix onto the plate's own nodes (6n x 6n)
pub fn fold_matrix(geom: &PlateGeometry, k: &Mat24) -> DMatrix<f64> {
    let n = geom.node_count;
    let mut out = DMatrix::zeros(6 * n, 6 * n);
    for (ci, &ni) in geom.corner_nodes.iter().enumerate() {
        for (cj, &nj) in geom.corner_nodes.iter().enumerate() {
            for a in 0..6 {
                for b in 0..6 {
                    out[(6 * ni + a, 6 * nj + b)] += k[(6 * ci + a, 6 * cj + b)];
                }
            }
        }
    }
    out
}

/// Fold a quadrilateral load vector onto the plate's own nodes
pub fn fold_vector(geom: &PlateGeometry, f: &Vec24) -> DVector<f64> {
    let mut out = DVector::zeros(6 * geom.node_count);
    for (c, &node) in geom.corner_nodes.iter().enumerate() {
        for a in 0..6 {
            out[6 * node + a] += f[6 * c + a];
        }
    }
    out
}

/// Expand plate node displacements to the quadrilateral corners
pub fn unfold_vector(geom: &PlateGeometry, d: &DVector<f64>) -> Vec24 {
    let mut out = Vec24::zeros();
    for (c, &node) in geom.corner_nodes.iter().enumerate() {
        for a in 0..6 {
            out[6 * c + a] = d[6 * node + a];
        }
    }
    out
}

/// Block-diagonal local-to-global transformation for `node_count` nodes
pub fn plate_transformation_matrix(rotation: &Mat3, node_count: usize) -> DMatrix<f64> {
    let blocks = 2 * node_count;
    let mut t = DMatrix::zeros(3 * blocks, 3 * blocks);
    for b in 0..blocks {
        t.view_mut((3 * b, 3 * b), (3, 3)).copy_from(rotation);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn steel_plate(t: f64) -> PlateProperties {
        PlateProperties {
            e: 200e9,
            nu: 0.3,
            g: 200e9 / 2.6,
            t,
            rho: 7850.0,
            alpha: 12e-6,
        }
    }

    fn square(size: f64) -> PlateGeometry {
        plate_geometry(
            &[[0.0, 0.0, 0.0], [size, 0.0, 0.0], [size, size, 0.0], [0.0, size, 0.0]],
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn test_geometry_of_flat_square() {
        let g = square(2.0);
        assert_relative_eq!(g.area, 4.0, epsilon = 1e-12);
        assert_relative_eq!(g.warping, 0.0, epsilon = 1e-12);
        assert_relative_eq!(g.rotation[(2, 2)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(g.rotation[(0, 0)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_warped_quad_reports_warping() {
        let g = plate_geometry(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.1], [1.0, 1.0, 0.0], [0.0, 1.0, 0.1]],
            0.0,
        )
        .unwrap();
        assert!(g.warping > 0.01);
    }

    #[test]
    fn test_five_node_plate_is_unsupported() {
        let coords = [[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.5, 1.5, 0.0], [0.0, 1.0, 0.0]];
        assert!(matches!(
            plate_geometry(&coords, 0.0),
            Err(AnalysisError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_stiffness_is_symmetric() {
        let g = plate_geometry(
            &[[0.0, 0.0, 0.0], [2.0, 0.2, 0.0], [2.3, 1.8, 0.0], [-0.1, 1.5, 0.0]],
            0.3,
        )
        .unwrap();
        let k = plate_local_stiffness(&g, &steel_plate(0.02)).unwrap();
        for i in 0..24 {
            for j in 0..24 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-3, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_rigid_translation_is_strain_free() {
        let g = square(1.0);
        let k = plate_local_stiffness(&g, &steel_plate(0.01)).unwrap();
        let mut d = Vec24::zeros();
        for i in 0..4 {
            d[6 * i + 2] = 1.0;
        }
        let f = k * d;
        assert!(f.norm() < 1e-3 * k[(2, 2)]);
    }

    #[test]
    fn test_rigid_rotations_are_strain_free() {
        let g = plate_geometry(
            &[[0.0, 0.0, 0.0], [2.0, 0.2, 0.0], [2.3, 1.8, 0.0], [-0.1, 1.5, 0.0]],
            0.0,
        )
        .unwrap();
        let k = plate_local_stiffness(&g, &steel_plate(0.02)).unwrap();
        let scale = k.amax();

        // About local z (drilling), local x and local y
        let theta = 1e-3;
        let mut about_z = Vec24::zeros();
        let mut about_x = Vec24::zeros();
        let mut about_y = Vec24::zeros();
        for (c, &[x, y]) in g.local.iter().enumerate() {
            about_z[6 * c] = -theta * y;
            about_z[6 * c + 1] = theta * x;
            about_z[6 * c + 5] = theta;
            about_x[6 * c + 2] = theta * y;
            about_x[6 * c + 3] = theta;
            about_y[6 * c + 2] = -theta * x;
            about_y[6 * c + 4] = theta;
        }
        for d in [about_z, about_x, about_y] {
            assert!((k * d).amax() < 1e-9 * scale * theta, "{}", (k * d).amax());
        }

        // A bare rz twist is resisted
        let mut twist = Vec24::zeros();
        twist[5] = theta;
        assert!((k * twist).amax() > 0.0);
    }

    #[test]
    fn test_pressure_load_sums_to_total_force() {
        let g = square(3.0);
        let f = plate_pressure_load(&g, &[-2.0; 4]).unwrap();
        let total: f64 = (0..4).map(|i| f[6 * i + 2]).sum();
        assert_relative_eq!(total, -18.0, epsilon = 1e-10);
    }

    #[test]
    fn test_lumped_mass_of_triangle() {
        let g = plate_geometry(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]], 0.0).unwrap();
        assert_eq!(g.node_count, 3);
        assert_relative_eq!(g.area, 2.0, epsilon = 1e-12);
        let m = plate_lumped_mass(&g, &steel_plate(0.1));
        // The collapsed corner pair carries the same third as the others
        for node in 0..3 {
            assert_relative_eq!(m[(6 * node, 6 * node)] * 3.0, 7850.0 * 0.1 * 2.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_lumped_mass_follows_tributary_area() {
        let g = plate_geometry(
            &[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [3.0, 2.0, 0.0], [1.0, 2.0, 0.0]],
            0.0,
        )
        .unwrap();
        let m = plate_lumped_mass(&g, &steel_plate(0.1));
        let rho_t = 7850.0 * 0.1;

        // Wide edge corners 5/3 each, narrow edge corners 4/3 each
        assert_relative_eq!(m[(0, 0)], rho_t * 5.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(m[(6, 6)], rho_t * 5.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(m[(12, 12)], rho_t * 4.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(m[(18, 18)], rho_t * 4.0 / 3.0, max_relative = 1e-12);

        let total: f64 = (0..4).map(|node| m[(6 * node + 2, 6 * node + 2)]).sum();
        assert_relative_eq!(total, rho_t * g.area, max_relative = 1e-12);
    }

    #[test]
    fn test_uniform_membrane_stretch_recovers_exact_force() {
        let g = square(1.0);
        let props = steel_plate(0.01);
        let strain = 1e-4;
        let mut d = Vec24::zeros();
        for (c, xy) in g.local.iter().enumerate() {
            d[6 * c] = strain * xy[0];
        }
        let corners = plate_corner_resultants(&g, &props, &d, &[0.0; 3], &[0.0; 3]).unwrap();
        let dm = membrane_constitutive_matrix(props.e, props.nu);
        for res in corners.iter() {
            assert_relative_eq!(res.membrane[0], dm[(0, 0)] * strain * props.t, max_relative = 1e-9);
            assert_relative_eq!(res.membrane[1], dm[(1, 0)] * strain * props.t, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_free_thermal_expansion_is_stress_free() {
        let g = square(1.0);
        let props = steel_plate(0.01);
        let (e0, k0) = thermal_strains(&props, 30.0, 0.0);
        let mut d = Vec24::zeros();
        for (c, xy) in g.local.iter().enumerate() {
            d[6 * c] = e0[0] * xy[0];
            d[6 * c + 1] = e0[1] * xy[1];
        }
        let corners = plate_corner_resultants(&g, &props, &d, &e0, &k0).unwrap();
        for res in corners.iter() {
            assert!(res.membrane[0].abs() < 1e-6);
            assert!(res.membrane[1].abs() < 1e-6);
        }
    }
}
