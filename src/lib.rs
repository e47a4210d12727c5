//! Interactive GPU volume viewer for medical and scientific 3D scalar
//! fields: DICOM series, NIfTI files and legacy VTK structured grids.
//!
//! The engine renders one active volume at a time via OpenGL ray marching,
//! with an orbital camera, preset or custom transfer functions, an
//! orthogonal slice mode and a bounding-box overlay. GPU resources are built
//! lazily on the first render call after a load, so volumes can be loaded on
//! threads without a current GL context.

pub mod render;
pub mod volume;

pub use render::{Camera, ControlPoint, TransferFunction, VolumeRenderer};
pub use volume::{VolumeBuffer, VolumeError};
