mod remap;
pub use remap::*;

mod pseudo3d;
pub use pseudo3d::*;
