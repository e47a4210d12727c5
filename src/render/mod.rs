pub mod camera;
pub mod colormap;
pub mod geometry;
pub mod pipeline;
pub mod shaders;

pub use camera::Camera;
pub use colormap::{ControlPoint, TransferFunction};
pub use pipeline::VolumeRenderer;
