mod asset;
pub mod bounds;
pub mod transform;

pub use asset::*;
