mod physics;
mod primitive;

pub use physics::*;
pub use primitive::*;
