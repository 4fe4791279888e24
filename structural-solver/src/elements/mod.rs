//! Structural elements module

mod beam;
mod material;
mod node;
mod plate;
mod restraint;
mod section;

pub use beam::{Beam, BeamReleases};
pub use material::Material;
pub use node::Node;
pub use plate::Plate;
pub use restraint::Restraint;
pub use section::Section;
