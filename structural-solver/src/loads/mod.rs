//! Load types, load cases and load combinations

mod beam_load;
mod load_case;
mod load_combo;
mod node_load;
mod plate_load;

pub use beam_load::{BeamLoad, DistributedLoad, LoadDirection, PointLoad, ThermalLoad};
pub use load_case::{LoadCase, LoadCategory};
pub use load_combo::{CombinationCategory, LoadCombination};
pub use node_load::NodeLoad;
pub use plate_load::{PlateLoad, PlateThermalLoad, PressureLoad, VaryingPressureLoad};
