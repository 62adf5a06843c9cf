mod bounding_box;
mod box_intersection;
mod cell;
mod vec3;

pub use bounding_box::*;
pub use box_intersection::*;
pub use cell::*;
pub use vec3::*;
