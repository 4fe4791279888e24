//! Nodal restraint conditions

use serde::{Deserialize, Serialize};

/// Restraint flags at a node. A restrained DOF has zero displacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restraint {
    /// Restrained in X translation
    pub dx: bool,
    /// Restrained in Y translation
    pub dy: bool,
    /// Restrained in Z translation
    pub dz: bool,
    /// Restrained in X rotation
    pub rx: bool,
    /// Restrained in Y rotation
    pub ry: bool,
    /// Restrained in Z rotation
    pub rz: bool,
}

impl Restraint {
    /// No restraints
    pub fn free() -> Self {
        Self::default()
    }

    /// All DOFs restrained
    pub fn fixed() -> Self {
        Self::with_restraints(true, true, true, true, true, true)
    }

    /// Translations restrained, rotations free
    pub fn pinned() -> Self {
        Self::with_restraints(true, true, true, false, false, false)
    }

    /// X translation restrained only
    pub fn roller_x() -> Self {
        Self::with_restraints(true, false, false, false, false, false)
    }

    /// Y translation restrained only
    pub fn roller_y() -> Self {
        Self::with_restraints(false, true, false, false, false, false)
    }

    /// Z translation restrained only
    pub fn roller_z() -> Self {
        Self::with_restraints(false, false, true, false, false, false)
    }

    /// Create a restraint with specific flags
    pub fn with_restraints(dx: bool, dy: bool, dz: bool, rx: bool, ry: bool, rz: bool) -> Self {
        Self { dx, dy, dz, rx, ry, rz }
    }

    /// Flags as [DX, DY, DZ, RX, RY, RZ]
    pub fn as_array(&self) -> [bool; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Check if any DOF is restrained
    pub fn is_supported(&self) -> bool {
        self.as_array().iter().any(|&r| r)
    }

    /// Count number of restrained DOFs
    pub fn num_restrained(&self) -> usize {
        self.as_array().iter().filter(|&&r| r).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(Restraint::fixed().num_restrained(), 6);
        assert_eq!(Restraint::pinned().num_restrained(), 3);
        assert!(!Restraint::pinned().rx);
        assert!(Restraint::roller_z().dz);
        assert!(!Restraint::free().is_supported());
    }
}
