//! Beam element math: stiffness, mass, transformations and fixed-end forces
//!
//! Local DOF order for a beam is [u, v, w, rx, ry, rz] at the start followed by
//! the same six at the end. Rotations follow the right-hand rule, so
//! `rz = dv/dx` and `ry = -dw/dx`.

pub mod plate;
pub mod sparse;

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};

use crate::error::{AnalysisError, AnalysisResult};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// 12x12 matrix for beam stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for beam forces/displacements
pub type Vec12 = SVector<f64, 12>;

/// 3-point Gauss-Legendre rule on [-1, 1] as (point, weight)
pub const GAUSS_3: [(f64, f64); 3] = [
    (-0.774_596_669_241_483_4, 5.0 / 9.0),
    (0.0, 8.0 / 9.0),
    (0.774_596_669_241_483_4, 5.0 / 9.0),
];

/// Section and material constants needed by the beam formulation
#[derive(Debug, Clone, Copy)]
pub struct BeamProperties {
    pub e: f64,
    pub g: f64,
    pub a: f64,
    pub iy: f64,
    pub iz: f64,
    pub j: f64,
    /// Shear areas (along y, along z). `None` disables shear deformation.
    pub shear_areas: Option<(f64, f64)>,
    pub rho: f64,
}

impl BeamProperties {
    /// Timoshenko factors φ = 12EI / (G·As·L²) for bending in the local x-y
    /// and x-z planes, zero without shear areas
    pub fn shear_factors(&self, length: f64) -> (f64, f64) {
        let l2 = length * length;
        match self.shear_areas {
            Some((asy, asz)) if asy > 0.0 && asz > 0.0 => (
                12.0 * self.e * self.iz / (self.g * asy * l2),
                12.0 * self.e * self.iy / (self.g * asz * l2),
            ),
            _ => (0.0, 0.0),
        }
    }
}

/// Direction cosine matrix (rows are the local x, y, z axes in global axes)
///
/// Local axis conventions:
/// - vertical members: local y lies in the global XY plane, local z = global Z
/// - horizontal members: local y = global Y
/// - inclined members: local z is horizontal
///
/// `rotation` then spins local y and z about local x.
pub fn beam_rotation_matrix(start: &[f64; 3], end: &[f64; 3], rotation: f64) -> AnalysisResult<Mat3> {
    let d = Vec3::new(end[0] - start[0], end[1] - start[1], end[2] - start[2]);
    let length = d.norm();
    if length < 1e-10 {
        return Err(AnalysisError::InvalidInput("beam has zero length".to_string()));
    }

    let x = d / length;

    let (y, z) = if x[0].abs() < 1e-10 && x[2].abs() < 1e-10 {
        if x[1] > 0.0 {
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
        } else {
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
        }
    } else if d[1].abs() < 1e-10 {
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = x.cross(&y).normalize();
        (y, z)
    } else {
        let proj = Vec3::new(d[0], 0.0, d[2]);
        let z = if x[1] > 0.0 { proj.cross(&x) } else { x.cross(&proj) }.normalize();
        let y = z.cross(&x).normalize();
        (y, z)
    };

    let (y, z) = if rotation.abs() > 1e-12 {
        let (s, c) = rotation.sin_cos();
        (y * c + z * s, -y * s + z * c)
    } else {
        (y, z)
    };

    Ok(Mat3::new(
        x[0], x[1], x[2],
        y[0], y[1], y[2],
        z[0], z[1], z[2],
    ))
}

/// Block-diagonal 12x12 transformation from a 3x3 direction cosine matrix
pub fn beam_transformation_matrix(r: &Mat3) -> Mat12 {
    let mut t = Mat12::zeros();
    for block in 0..4 {
        t.fixed_view_mut::<3, 3>(block * 3, block * 3).copy_from(r);
    }
    t
}

/// Skew-symmetric cross product matrix, `skew(a) * b == a × b`
fn skew(v: &[f64; 3]) -> Mat3 {
    Mat3::new(
        0.0, -v[2], v[1],
        v[2], 0.0, -v[0],
        -v[1], v[0], 0.0,
    )
}

/// Rigid-arm transformation from node DOFs to flexible-end DOFs (global axes).
///
/// For an arm `o` from the node to the element end, `u_end = u_node + θ × o`.
pub fn rigid_offset_matrix(offset_start: &[f64; 3], offset_end: &[f64; 3]) -> Mat12 {
    let mut r = Mat12::identity();
    r.fixed_view_mut::<3, 3>(0, 3).copy_from(&(-skew(offset_start)));
    r.fixed_view_mut::<3, 3>(6, 9).copy_from(&(-skew(offset_end)));
    r
}

/// Local 12x12 elastic stiffness matrix.
///
/// With shear areas present the bending terms use the Timoshenko correction
/// φ = 12EI / (G·As·L²).
pub fn beam_local_stiffness(props: &BeamProperties, length: f64) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;
    let e = props.e;

    let (phi_y, phi_z) = props.shear_factors(l);

    let ea_l = e * props.a / l;
    let gj_l = props.g * props.j / l;

    // Bending in the local x-y plane (about z)
    let bz = e * props.iz / (1.0 + phi_y);
    let z12 = 12.0 * bz / l3;
    let z6 = 6.0 * bz / l2;
    let z4 = (4.0 + phi_y) * bz / l;
    let z2 = (2.0 - phi_y) * bz / l;

    // Bending in the local x-z plane (about y)
    let by = e * props.iy / (1.0 + phi_z);
    let y12 = 12.0 * by / l3;
    let y6 = 6.0 * by / l2;
    let y4 = (4.0 + phi_z) * by / l;
    let y2 = (2.0 - phi_z) * by / l;

    #[rustfmt::skip]
    let data = [
        ea_l,  0.0,   0.0,   0.0,   0.0,  0.0,   -ea_l, 0.0,   0.0,   0.0,   0.0,  0.0,
        0.0,   z12,   0.0,   0.0,   0.0,  z6,    0.0,   -z12,  0.0,   0.0,   0.0,  z6,
        0.0,   0.0,   y12,   0.0,   -y6,  0.0,   0.0,   0.0,   -y12,  0.0,   -y6,  0.0,
        0.0,   0.0,   0.0,   gj_l,  0.0,  0.0,   0.0,   0.0,   0.0,   -gj_l, 0.0,  0.0,
        0.0,   0.0,   -y6,   0.0,   y4,   0.0,   0.0,   0.0,   y6,    0.0,   y2,   0.0,
        0.0,   z6,    0.0,   0.0,   0.0,  z4,    0.0,   -z6,   0.0,   0.0,   0.0,  z2,
        -ea_l, 0.0,   0.0,   0.0,   0.0,  0.0,   ea_l,  0.0,   0.0,   0.0,   0.0,  0.0,
        0.0,   -z12,  0.0,   0.0,   0.0,  -z6,   0.0,   z12,   0.0,   0.0,   0.0,  -z6,
        0.0,   0.0,   -y12,  0.0,   y6,   0.0,   0.0,   0.0,   y12,   0.0,   y6,   0.0,
        0.0,   0.0,   0.0,   -gj_l, 0.0,  0.0,   0.0,   0.0,   0.0,   gj_l,  0.0,  0.0,
        0.0,   0.0,   -y6,   0.0,   y2,   0.0,   0.0,   0.0,   y6,    0.0,   y4,   0.0,
        0.0,   z6,    0.0,   0.0,   0.0,  z2,    0.0,   -z6,   0.0,   0.0,   0.0,  z4,
    ];

    Mat12::from_row_slice(&data)
}

/// Geometric stiffness matrix for P-Delta analysis
///
/// # Arguments
/// * `p` - Axial force (positive = tension)
/// * `a` - Cross-sectional area
/// * `iy` - Moment of inertia about y
/// * `iz` - Moment of inertia about z
/// * `length` - Beam length
pub fn beam_geometric_stiffness(p: f64, a: f64, iy: f64, iz: f64, length: f64) -> Mat12 {
    if p.abs() < 1e-10 {
        return Mat12::zeros();
    }

    let l = length;
    let l2 = l * l;
    let ip = iy + iz;
    let p_l = p / l;
    let s = 6.0 * p_l / 5.0;
    let c = p_l * l / 10.0;
    let d4 = 2.0 * p_l * l2 / 15.0;
    let d2 = -p_l * l2 / 30.0;
    let t = p_l * ip / a;

    #[rustfmt::skip]
    let data = [
        p_l,  0.0,  0.0,  0.0,  0.0,  0.0,  -p_l, 0.0,  0.0,  0.0,  0.0,  0.0,
        0.0,  s,    0.0,  0.0,  0.0,  c,    0.0,  -s,   0.0,  0.0,  0.0,  c,
        0.0,  0.0,  s,    0.0,  -c,   0.0,  0.0,  0.0,  -s,   0.0,  -c,   0.0,
        0.0,  0.0,  0.0,  t,    0.0,  0.0,  0.0,  0.0,  0.0,  -t,   0.0,  0.0,
        0.0,  0.0,  -c,   0.0,  d4,   0.0,  0.0,  0.0,  c,    0.0,  d2,   0.0,
        0.0,  c,    0.0,  0.0,  0.0,  d4,   0.0,  -c,   0.0,  0.0,  0.0,  d2,
        -p_l, 0.0,  0.0,  0.0,  0.0,  0.0,  p_l,  0.0,  0.0,  0.0,  0.0,  0.0,
        0.0,  -s,   0.0,  0.0,  0.0,  -c,   0.0,  s,    0.0,  0.0,  0.0,  -c,
        0.0,  0.0,  -s,   0.0,  c,    0.0,  0.0,  0.0,  s,    0.0,  c,    0.0,
        0.0,  0.0,  0.0,  -t,   0.0,  0.0,  0.0,  0.0,  0.0,  t,    0.0,  0.0,
        0.0,  0.0,  -c,   0.0,  d2,   0.0,  0.0,  0.0,  c,    0.0,  d4,   0.0,
        0.0,  c,    0.0,  0.0,  0.0,  d2,   0.0,  -c,   0.0,  0.0,  0.0,  d4,
    ];

    Mat12::from_row_slice(&data)
}

/// Consistent mass matrix in local axes
pub fn beam_consistent_mass(props: &BeamProperties, length: f64) -> Mat12 {
    let l = length;
    let m = props.rho * props.a * l;
    let b = m / 420.0;
    let ax = m / 6.0;
    let ip = if props.a > 0.0 { (props.iy + props.iz) / props.a } else { 0.0 };
    let tx = m * ip / 6.0;

    #[rustfmt::skip]
    let data = [
        2.0*ax, 0.0,        0.0,         0.0,    0.0,          0.0,          ax,     0.0,        0.0,         0.0,    0.0,          0.0,
        0.0,    156.0*b,    0.0,         0.0,    0.0,          22.0*l*b,     0.0,    54.0*b,     0.0,         0.0,    0.0,          -13.0*l*b,
        0.0,    0.0,        156.0*b,     0.0,    -22.0*l*b,    0.0,          0.0,    0.0,        54.0*b,      0.0,    13.0*l*b,     0.0,
        0.0,    0.0,        0.0,         2.0*tx, 0.0,          0.0,          0.0,    0.0,        0.0,         tx,     0.0,          0.0,
        0.0,    0.0,        -22.0*l*b,   0.0,    4.0*l*l*b,    0.0,          0.0,    0.0,        -13.0*l*b,   0.0,    -3.0*l*l*b,   0.0,
        0.0,    22.0*l*b,   0.0,         0.0,    0.0,          4.0*l*l*b,    0.0,    13.0*l*b,   0.0,         0.0,    0.0,          -3.0*l*l*b,
        ax,     0.0,        0.0,         0.0,    0.0,          0.0,          2.0*ax, 0.0,        0.0,         0.0,    0.0,          0.0,
        0.0,    54.0*b,     0.0,         0.0,    0.0,          13.0*l*b,     0.0,    156.0*b,    0.0,         0.0,    0.0,          -22.0*l*b,
        0.0,    0.0,        54.0*b,      0.0,    -13.0*l*b,    0.0,          0.0,    0.0,        156.0*b,     0.0,    22.0*l*b,     0.0,
        0.0,    0.0,        0.0,         tx,     0.0,          0.0,          0.0,    0.0,        0.0,         2.0*tx, 0.0,          0.0,
        0.0,    0.0,        13.0*l*b,    0.0,    -3.0*l*l*b,   0.0,          0.0,    0.0,        22.0*l*b,    0.0,    4.0*l*l*b,    0.0,
        0.0,    -13.0*l*b,  0.0,         0.0,    0.0,          -3.0*l*l*b,   0.0,    -22.0*l*b,  0.0,         0.0,    0.0,          4.0*l*l*b,
    ];

    Mat12::from_row_slice(&data)
}

/// Lumped (diagonal) mass matrix in local axes
pub fn beam_lumped_mass(props: &BeamProperties, length: f64) -> Mat12 {
    let half = props.rho * props.a * length / 2.0;
    let rot = |i: f64| props.rho * i * length / 2.0;
    let diag = [
        half,
        half,
        half,
        rot(props.iy + props.iz),
        rot(props.iy),
        rot(props.iz),
    ];

    let mut m = Mat12::zeros();
    for (i, &v) in diag.iter().enumerate() {
        m[(i, i)] = v;
        m[(i + 6, i + 6)] = v;
    }
    m
}

fn split_released(releases: &[bool; 12]) -> (std::vec::Vec<usize>, std::vec::Vec<usize>) {
    let kept = (0..12).filter(|&i| !releases[i]).collect();
    let released = (0..12).filter(|&i| releases[i]).collect();
    (kept, released)
}

fn invert_released_block(k: &Mat12, released: &[usize]) -> Mat {
    let n = released.len();
    let k22 = Mat::from_fn(n, n, |i, j| k[(released[i], released[j])]);
    match k22.clone().try_inverse() {
        Some(inv) => inv,
        // A DOF released at both ends (e.g. torsion) carries nothing
        None => k22.pseudo_inverse(1e-12).unwrap_or_else(|_| Mat::zeros(n, n)),
    }
}

/// Static condensation of released DOFs: `k11 - k12 * inv(k22) * k21`,
/// expanded back to 12x12 with zero rows/columns at the released DOFs
pub fn condense_releases(k: &Mat12, releases: &[bool; 12]) -> Mat12 {
    let (kept, released) = split_released(releases);
    if released.is_empty() {
        return *k;
    }

    let k22_inv = invert_released_block(k, &released);
    let k12 = Mat::from_fn(kept.len(), released.len(), |i, j| k[(kept[i], released[j])]);
    let correction = &k12 * &k22_inv * k12.transpose();

    let mut out = Mat12::zeros();
    for (i, &ui) in kept.iter().enumerate() {
        for (j, &uj) in kept.iter().enumerate() {
            out[(ui, uj)] = k[(ui, uj)] - correction[(i, j)];
        }
    }
    out
}

/// Condensation of the fixed-end force vector: `fer1 - k12 * inv(k22) * fer2`
pub fn condense_fer(fer: &Vec12, k: &Mat12, releases: &[bool; 12]) -> Vec12 {
    let (kept, released) = split_released(releases);
    if released.is_empty() {
        return *fer;
    }

    let k22_inv = invert_released_block(k, &released);
    let k12 = Mat::from_fn(kept.len(), released.len(), |i, j| k[(kept[i], released[j])]);
    let fer2 = Vec::from_iterator(released.len(), released.iter().map(|&r| fer[r]));
    let correction = &k12 * &k22_inv * fer2;

    let mut out = Vec12::zeros();
    for (i, &ui) in kept.iter().enumerate() {
        out[ui] = fer[ui] - correction[i];
    }
    out
}

/// Fill the released DOFs of a local displacement vector from the kept ones:
/// `d2 = -inv(k22) * (k21 * d1 + fer2)`
pub fn recover_released(d: &Vec12, k: &Mat12, fer: &Vec12, releases: &[bool; 12]) -> Vec12 {
    let (kept, released) = split_released(releases);
    if released.is_empty() {
        return *d;
    }

    let k22_inv = invert_released_block(k, &released);
    let rhs = Vec::from_iterator(
        released.len(),
        released.iter().map(|&r| {
            let coupled: f64 = kept.iter().map(|&u| k[(r, u)] * d[u]).sum();
            coupled + fer[r]
        }),
    );
    let d2 = -(k22_inv * rhs);

    let mut out = *d;
    for (i, &r) in released.iter().enumerate() {
        out[r] = d2[i];
    }
    out
}

/// Cubic Hermite shape functions [N1, N2, N3, N4] at `x` on a span of length `l`
pub fn hermite(x: f64, l: f64) -> [f64; 4] {
    shear_hermite(x, l, 0.0)
}

/// Deflection shape functions of a Timoshenko beam with shear factor `phi`;
/// they reduce to [`hermite`] when `phi` is zero
pub fn shear_hermite(x: f64, l: f64, phi: f64) -> [f64; 4] {
    let xi = x / l;
    let xi2 = xi * xi;
    let xi3 = xi2 * xi;
    let shear = xi - xi2;
    let d = 1.0 + phi;
    [
        (1.0 - 3.0 * xi2 + 2.0 * xi3 + phi * (1.0 - xi)) / d,
        l * (xi - 2.0 * xi2 + xi3 + phi * shear / 2.0) / d,
        (3.0 * xi2 - 2.0 * xi3 + phi * xi) / d,
        l * (xi3 - xi2 - phi * shear / 2.0) / d,
    ]
}

/// Fixed-end forces of a concentrated force `p` at distance `a` along local
/// axis `axis` (0 = x, 1 = y, 2 = z).
///
/// The vector holds the forces the supports exert on a fully fixed member,
/// so the equivalent nodal load is its negative.
pub fn fer_point_load(p: f64, a: f64, length: f64, axis: usize) -> Vec12 {
    let mut fer = Vec12::zeros();
    let a = a.clamp(0.0, length);

    match axis {
        0 => {
            let xi = a / length;
            fer[0] = -p * (1.0 - xi);
            fer[6] = -p * xi;
        }
        1 => {
            let n = hermite(a, length);
            fer[1] = -p * n[0];
            fer[5] = -p * n[1];
            fer[7] = -p * n[2];
            fer[11] = -p * n[3];
        }
        2 => {
            let n = hermite(a, length);
            fer[2] = -p * n[0];
            fer[4] = p * n[1];
            fer[8] = -p * n[2];
            fer[10] = p * n[3];
        }
        _ => {}
    }

    fer
}

/// Fixed-end forces of a load varying linearly from `w1` at `x1` to `w2` at `x2`
pub fn fer_linear_load(w1: f64, w2: f64, x1: f64, x2: f64, length: f64, axis: usize) -> Vec12 {
    let mut fer = Vec12::zeros();
    let span = x2 - x1;
    if span <= 0.0 {
        return fer;
    }

    // Exact: the integrand is at most quartic
    for &(g, wt) in GAUSS_3.iter() {
        let s = x1 + (g + 1.0) * span / 2.0;
        let w = w1 + (w2 - w1) * (s - x1) / span;
        fer += fer_point_load(w * wt * span / 2.0, s, length, axis);
    }
    fer
}

/// Fixed-end forces of a temperature change with optional section gradients
pub fn fer_thermal(props: &BeamProperties, alpha: f64, delta_t: f64, gradient_y: f64, gradient_z: f64) -> Vec12 {
    let mut fer = Vec12::zeros();

    let n = props.e * props.a * alpha * delta_t;
    fer[0] = n;
    fer[6] = -n;

    let mz = props.e * props.iz * alpha * gradient_y;
    fer[5] = -mz;
    fer[11] = mz;

    let my = props.e * props.iy * alpha * gradient_z;
    fer[4] = my;
    fer[10] = -my;

    fer
}

/// Transverse deflection at `x` of a fixed-fixed span under a unit force at `a`,
/// multiplied by the bending stiffness EI
pub fn fixed_fixed_influence(x: f64, a: f64, length: f64) -> f64 {
    let l = length;
    let (x, a) = if x <= a { (x, a) } else { (l - x, l - a) };
    let b = l - a;
    x * x * b * b * (3.0 * a * l - 2.0 * a * x - l * x) / (6.0 * l.powi(3))
}

/// Axial displacement at `x` of a fixed-fixed span under a unit axial force at `a`,
/// multiplied by the axial stiffness EA
pub fn fixed_fixed_axial_influence(x: f64, a: f64, length: f64) -> f64 {
    if x <= a {
        x * (length - a) / length
    } else {
        a * (length - x) / length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn props() -> BeamProperties {
        BeamProperties {
            e: 200e9,
            g: 77e9,
            a: 0.01,
            iy: 1e-4,
            iz: 2e-4,
            j: 1e-5,
            shear_areas: None,
            rho: 7850.0,
        }
    }

    fn assert_symmetric(k: &Mat12) {
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-6, max_relative = 1e-10);
            }
        }
    }

    #[test]
    fn test_rotation_matrix_horizontal() {
        let r = beam_rotation_matrix(&[0.0, 0.0, 0.0], &[10.0, 0.0, 0.0], 0.0).unwrap();
        assert_relative_eq!(r[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(r[(1, 1)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(r[(2, 2)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_matrix_vertical() {
        let r = beam_rotation_matrix(&[0.0, 0.0, 0.0], &[0.0, 10.0, 0.0], 0.0).unwrap();
        assert_relative_eq!(r[(0, 1)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(r[(1, 0)], -1.0, epsilon = 1e-12);
        assert_relative_eq!(r[(2, 2)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_matrix_is_orthonormal_for_inclined_beam() {
        let r = beam_rotation_matrix(&[1.0, 2.0, 3.0], &[4.0, 7.0, -1.0], 0.4).unwrap();
        let should_be_identity = r * r.transpose();
        assert_relative_eq!(should_be_identity, Mat3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_is_rejected() {
        assert!(beam_rotation_matrix(&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0], 0.0).is_err());
    }

    #[test]
    fn test_local_matrices_are_symmetric() {
        let mut p = props();
        assert_symmetric(&beam_local_stiffness(&p, 4.0));
        p.shear_areas = Some((0.004, 0.006));
        assert_symmetric(&beam_local_stiffness(&p, 4.0));
        assert_symmetric(&beam_geometric_stiffness(-1e5, p.a, p.iy, p.iz, 4.0));
        assert_symmetric(&beam_consistent_mass(&p, 4.0));
    }

    #[test]
    fn test_shear_deformation_softens_bending() {
        let mut p = props();
        let k_eb = beam_local_stiffness(&p, 2.0);
        p.shear_areas = Some((0.004, 0.004));
        let k_t = beam_local_stiffness(&p, 2.0);
        assert!(k_t[(1, 1)] < k_eb[(1, 1)]);
        assert_relative_eq!(k_t[(0, 0)], k_eb[(0, 0)]);
    }

    #[test]
    fn test_consistent_mass_total() {
        let p = props();
        let m = beam_consistent_mass(&p, 3.0);
        let total = p.rho * p.a * 3.0;
        // Rigid translation along y picks up the full mass
        let sum = m[(1, 1)] + m[(1, 7)] + m[(7, 1)] + m[(7, 7)];
        assert_relative_eq!(sum, total, max_relative = 1e-12);
    }

    #[test]
    fn test_midspan_point_load_fer() {
        let fer = fer_point_load(-10.0, 2.5, 5.0, 1);
        assert_relative_eq!(fer[1], 5.0, epsilon = 1e-12);
        assert_relative_eq!(fer[7], 5.0, epsilon = 1e-12);
        assert_relative_eq!(fer[5], 10.0 * 5.0 / 8.0, epsilon = 1e-12);
        assert_relative_eq!(fer[11], -10.0 * 5.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_load_fer_matches_closed_form() {
        let (w, l) = (-3.0, 6.0);
        let fer = fer_linear_load(w, w, 0.0, l, l, 2);
        assert_relative_eq!(fer[2], -w * l / 2.0, epsilon = 1e-10);
        assert_relative_eq!(fer[4], w * l * l / 12.0, epsilon = 1e-10);
        assert_relative_eq!(fer[10], -w * l * l / 12.0, epsilon = 1e-10);
    }

    #[test]
    fn test_condensed_pin_has_no_moment_stiffness() {
        let k = beam_local_stiffness(&props(), 4.0);
        let kc = condense_releases(&k, &[false, false, false, false, false, true, false, false, false, false, false, false]);
        for j in 0..12 {
            assert_eq!(kc[(5, j)], 0.0);
        }
        assert_symmetric(&kc);
        // Propped cantilever stiffness 3EI/L³ at the pinned end
        assert_relative_eq!(kc[(1, 1)], 3.0 * 200e9 * 2e-4 / 64.0, max_relative = 1e-10);
    }

    #[test]
    fn test_shear_hermite_reproduces_timoshenko_cantilever() {
        // Tip load P = 1 on a cantilever with EI = 1, L = 1
        let phi = 0.4;
        let tip = 1.0 / 3.0 + phi / 12.0;
        let slope = 0.5;
        for xi in [0.0, 0.25, 0.5, 0.8, 1.0] {
            let n = shear_hermite(xi, 1.0, phi);
            let v = n[2] * tip + n[3] * slope;
            let exact = xi * xi * (3.0 - xi) / 6.0 + phi * xi / 12.0;
            assert_relative_eq!(v, exact, epsilon = 1e-14);
        }
        assert_eq!(shear_hermite(0.3, 2.0, 0.0), hermite(0.3, 2.0));
    }

    #[test]
    fn test_influence_function_is_symmetric() {
        let l = 7.0;
        assert_relative_eq!(
            fixed_fixed_influence(2.0, 5.0, l),
            fixed_fixed_influence(5.0, 2.0, l),
            epsilon = 1e-12
        );
        // Midspan deflection under midspan load: L³/(192)
        assert_relative_eq!(fixed_fixed_influence(3.5, 3.5, l), l.powi(3) / 192.0, epsilon = 1e-12);
    }
}
