pub mod buffer;
pub mod dicom;
pub mod loader;
pub mod nifti;
pub mod vtk;

pub use buffer::{FieldData, ScalarField, VolumeBuffer};
pub use loader::{load_volume, VolumeError};
