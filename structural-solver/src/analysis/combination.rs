//! Load combinations by linear superposition
//!
//! Raw components (displacements, reactions, forces, stress components) are
//! scaled and summed; quantities that are not linear in the loads (von Mises,
//! principal stresses) are recomputed from the summed components.

use std::collections::HashMap;

use log::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::loads::LoadCombination;
use crate::results::{
    BeamResult, BeamStation, LoadResult, NodeDisplacement, NodeResult, PlateForces, PlateMoments, PlateNodeResult,
    PlateResult, PlateStress, Reactions, ResultSource, StationForces, StationStress,
};

/// Quantities that superpose linearly
trait Superpose {
    /// `self += factor * other`
    fn add_scaled(&mut self, other: &Self, factor: f64);

    fn scale(&mut self, factor: f64);

    /// Recompute derived values after summation
    fn finish(&mut self) {}
}

macro_rules! superpose_fields {
    ($ty:ty, $($field:ident),+) => {
        impl Superpose for $ty {
            fn add_scaled(&mut self, other: &Self, factor: f64) {
                $(self.$field += factor * other.$field;)+
            }

            fn scale(&mut self, factor: f64) {
                $(self.$field *= factor;)+
            }
        }
    };
}

superpose_fields!(NodeDisplacement, dx, dy, dz, rx, ry, rz);
superpose_fields!(Reactions, fx, fy, fz, mx, my, mz);
superpose_fields!(StationForces, axial, shear_y, shear_z, torsion, moment_y, moment_z);
superpose_fields!(PlateForces, nx, ny, nxy, qx, qy);
superpose_fields!(PlateMoments, mx, my, mxy);

impl Superpose for StationStress {
    fn add_scaled(&mut self, other: &Self, factor: f64) {
        self.axial += factor * other.axial;
        self.bending_y += factor * other.bending_y;
        self.bending_z += factor * other.bending_z;
        self.shear_y += factor * other.shear_y;
        self.shear_z += factor * other.shear_z;
        self.torsion += factor * other.torsion;
    }

    fn scale(&mut self, factor: f64) {
        self.axial *= factor;
        self.bending_y *= factor;
        self.bending_z *= factor;
        self.shear_y *= factor;
        self.shear_z *= factor;
        self.torsion *= factor;
    }

    fn finish(&mut self) {
        self.update_von_mises();
    }
}

impl Superpose for PlateStress {
    fn add_scaled(&mut self, other: &Self, factor: f64) {
        self.sx += factor * other.sx;
        self.sy += factor * other.sy;
        self.txy += factor * other.txy;
    }

    fn scale(&mut self, factor: f64) {
        self.sx *= factor;
        self.sy *= factor;
        self.txy *= factor;
    }
}

impl Superpose for NodeResult {
    fn add_scaled(&mut self, other: &Self, factor: f64) {
        self.displacement.add_scaled(&other.displacement, factor);
        if let (Some(r), Some(o)) = (self.reaction.as_mut(), other.reaction.as_ref()) {
            r.add_scaled(o, factor);
        }
    }

    fn scale(&mut self, factor: f64) {
        self.displacement.scale(factor);
        if let Some(r) = self.reaction.as_mut() {
            r.scale(factor);
        }
    }
}

impl Superpose for BeamStation {
    fn add_scaled(&mut self, other: &Self, factor: f64) {
        self.forces.add_scaled(&other.forces, factor);
        self.stress.add_scaled(&other.stress, factor);
        for (d, o) in self.displacement.iter_mut().zip(other.displacement.iter()) {
            *d += factor * o;
        }
    }

    fn scale(&mut self, factor: f64) {
        self.forces.scale(factor);
        self.stress.scale(factor);
        for d in self.displacement.iter_mut() {
            *d *= factor;
        }
    }

    fn finish(&mut self) {
        self.stress.finish();
    }
}

impl Superpose for PlateNodeResult {
    fn add_scaled(&mut self, other: &Self, factor: f64) {
        self.forces.add_scaled(&other.forces, factor);
        self.moments.add_scaled(&other.moments, factor);
        self.top.add_scaled(&other.top, factor);
        self.bottom.add_scaled(&other.bottom, factor);
    }

    fn scale(&mut self, factor: f64) {
        self.forces.scale(factor);
        self.moments.scale(factor);
        self.top.scale(factor);
        self.bottom.scale(factor);
    }

    fn finish(&mut self) {
        self.update_derived();
    }
}

fn add_all<T: Superpose>(target: &mut [T], other: &[T], factor: f64) {
    for (t, o) in target.iter_mut().zip(other.iter()) {
        t.add_scaled(o, factor);
    }
}

fn scale_all<T: Superpose>(target: &mut [T], factor: f64) {
    target.iter_mut().for_each(|t| t.scale(factor));
}

fn finish_all<T: Superpose>(target: &mut [T]) {
    target.iter_mut().for_each(|t| t.finish());
}

impl Superpose for BeamResult {
    fn add_scaled(&mut self, other: &Self, factor: f64) {
        add_all(&mut self.stations, &other.stations, factor);
    }

    fn scale(&mut self, factor: f64) {
        scale_all(&mut self.stations, factor);
    }

    fn finish(&mut self) {
        finish_all(&mut self.stations);
    }
}

impl Superpose for PlateResult {
    fn add_scaled(&mut self, other: &Self, factor: f64) {
        add_all(&mut self.values, &other.values, factor);
    }

    fn scale(&mut self, factor: f64) {
        scale_all(&mut self.values, factor);
    }

    fn finish(&mut self) {
        finish_all(&mut self.values);
    }
}

impl Superpose for LoadResult {
    fn add_scaled(&mut self, other: &Self, factor: f64) {
        add_all(&mut self.nodes, &other.nodes, factor);
        add_all(&mut self.beams, &other.beams, factor);
        add_all(&mut self.plates, &other.plates, factor);
    }

    fn scale(&mut self, factor: f64) {
        scale_all(&mut self.nodes, factor);
        scale_all(&mut self.beams, factor);
        scale_all(&mut self.plates, factor);
    }

    fn finish(&mut self) {
        finish_all(&mut self.beams);
        finish_all(&mut self.plates);
    }
}

/// Superpose the case results of `combination`
///
/// Every referenced case must be present in `cases`; all case results share
/// the same layout because they come from the same model.
pub fn combine(combination: &LoadCombination, cases: &HashMap<&str, &LoadResult>) -> AnalysisResult<LoadResult> {
    let mut factors = combination.factors.iter();
    let (first_case, first_factor) = factors.next().ok_or_else(|| {
        AnalysisError::InvalidInput(format!("load combination '{}' has no load cases", combination.id))
    })?;

    let lookup = |case: &str| {
        cases.get(case).copied().ok_or_else(|| {
            AnalysisError::Reference(format!(
                "load combination '{}' needs load case '{}' which was not analysed",
                combination.id, case
            ))
        })
    };

    let mut result = lookup(first_case)?.clone();
    result.scale(*first_factor);
    for (case, factor) in factors {
        result.add_scaled(lookup(case)?, *factor);
    }
    result.finish();

    result.name = combination.id.clone();
    result.source = ResultSource::Combination;
    debug!(
        "Combined '{}' from {} load case(s)",
        combination.id,
        combination.factors.len()
    );
    Ok(result)
}
