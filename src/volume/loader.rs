use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::volume::buffer::VolumeBuffer;
use crate::volume::{dicom, nifti, vtk};

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("unsupported file type: {0:?}")]
    UnsupportedFormat(String),

    #[error("no usable DICOM slices in directory")]
    NoSlices,

    #[error("inconsistent slice dimensions in series")]
    InconsistentDimensions,

    #[error("dataset is not a 3D volume")]
    NotVolumetric,

    #[error("malformed VTK file: {0}")]
    MalformedVtk(String),

    #[error("volume is empty after decoding")]
    EmptyVolume,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] ::nifti::NiftiError),
}

/// Loads a volume from a path: a directory is read as a DICOM series, a
/// `.nii`/`.nii.gz` file as NIfTI, a `.vtk` file as a legacy structured
/// points grid.
pub fn load_volume(path: &Path) -> Result<VolumeBuffer, VolumeError> {
    if !path.exists() {
        return Err(VolumeError::PathNotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return dicom::load_series(path);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let volume = match extension.as_str() {
        // A ".gz" suffix is taken as a compressed NIfTI file.
        "nii" | "gz" => nifti::load_file(path)?,
        "vtk" => vtk::load_file(path)?,
        other => return Err(VolumeError::UnsupportedFormat(other.to_owned())),
    };

    if volume.is_empty() {
        return Err(VolumeError::EmptyVolume);
    }
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_reported() {
        let err = load_volume(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, VolumeError::PathNotFound(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join("voxview-loader-test.xyz");
        std::fs::write(&path, b"not a volume").unwrap();
        let err = load_volume(&path).unwrap_err();
        assert!(matches!(err, VolumeError::UnsupportedFormat(ext) if ext == "xyz"));
        let _ = std::fs::remove_file(&path);
    }
}
