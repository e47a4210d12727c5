use std::path::Path;

use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::volume::buffer::{self, VolumeBuffer};
use crate::volume::loader::VolumeError;

/// Loads a `.nii` or `.nii.gz` file into a single-field 16-bit volume.
///
/// Decoding goes through f32 so scale slope/intercept and the file's
/// datatype are handled uniformly; values are then stored at the medical
/// pipeline's native 16-bit width. Volumes with more than three dimensions
/// keep only their first 3D sub-volume.
pub fn load_file(path: &Path) -> Result<VolumeBuffer, VolumeError> {
    let object = ReaderOptions::new().read_file(path)?;
    let header = object.header().clone();
    let data = object.into_volume().into_ndarray::<f32>()?;

    if data.ndim() < 3 {
        return Err(VolumeError::NotVolumetric);
    }
    let shape = data.shape().to_vec();
    let (nx, ny, nz) = (shape[0], shape[1], shape[2]);
    if nx == 0 || ny == 0 || nz == 0 {
        return Err(VolumeError::EmptyVolume);
    }

    let mut index = vec![0usize; data.ndim()];
    let mut samples = Vec::with_capacity(nx * ny * nz);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                index[0] = x;
                index[1] = y;
                index[2] = z;
                let value = data[index.as_slice()];
                samples.push(value.round().clamp(0.0, 65535.0) as u16);
            }
        }
    }

    let spacing = [
        spacing_or_unit(header.pixdim[1]),
        spacing_or_unit(header.pixdim[2]),
        spacing_or_unit(header.pixdim[3]),
    ];

    log::info!(
        "NIfTI volume: {nx}x{ny}x{nz} voxels, spacing ({}, {}, {})",
        spacing[0],
        spacing[1],
        spacing[2]
    );

    Ok(buffer::from_u16_samples(
        nx as u32,
        ny as u32,
        nz as u32,
        spacing,
        samples,
    ))
}

fn spacing_or_unit(pixdim: f32) -> f64 {
    let pixdim = pixdim.abs() as f64;
    if pixdim > 1e-6 {
        pixdim
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_pixdim_falls_back_to_unit_spacing() {
        assert_eq!(spacing_or_unit(0.0), 1.0);
        assert_eq!(spacing_or_unit(0.5), 0.5);
        // Some headers carry a negative pixdim sign convention.
        assert_eq!(spacing_or_unit(-2.0), 2.0);
    }
}
