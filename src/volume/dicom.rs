use std::cmp::Ordering;
use std::path::Path;

use dicom::object::{open_file, FileDicomObject, InMemDicomObject};
use dicom::pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption};
use dicom_dictionary_std::tags;
use ndarray::{s, Array2};

use crate::volume::buffer::{self, VolumeBuffer};
use crate::volume::loader::VolumeError;

/// Loads a directory of DICOM slice files into a single-field 16-bit volume.
///
/// Slice ordering and z-spacing rely on inherited heuristics rather than a
/// clinical guarantee: the sort key falls back from ImagePositionPatient z
/// through SliceLocation to InstanceNumber, and the z-spacing from position
/// deltas through SliceThickness to 1.0.
pub fn load_series(dir: &Path) -> Result<VolumeBuffer, VolumeError> {
    let mut slices: Vec<(f32, FileDicomObject<InMemDicomObject>)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let object = match open_file(&path) {
            Ok(object) => object,
            Err(err) => {
                log::warn!("skipping {}: {err}", path.display());
                continue;
            }
        };
        match sort_key(&object) {
            Some(key) => slices.push((key, object)),
            None => log::warn!(
                "skipping {}: no position, slice location or instance number",
                path.display()
            ),
        }
    }
    if slices.is_empty() {
        return Err(VolumeError::NoSlices);
    }

    slices.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut images: Vec<Array2<u16>> = Vec::with_capacity(slices.len());
    for (_, object) in &slices {
        let Some(image) = decode_image(object) else {
            return Err(VolumeError::NoSlices);
        };
        images.push(image);
    }

    let (height, width) = images[0].dim();
    if images.iter().any(|image| image.dim() != (height, width)) {
        return Err(VolumeError::InconsistentDimensions);
    }

    let mut samples = Vec::with_capacity(width * height * images.len());
    for image in &images {
        samples.extend(image.iter().copied());
    }

    let (spacing_x, spacing_y) = pixel_spacing(&slices[0].1);
    let positions: Vec<f32> = slices.iter().map(|(key, _)| *key).collect();
    let spacing_z = derive_z_spacing(&positions, slice_thickness(&slices[0].1));

    log::info!(
        "DICOM series: {}x{}x{} voxels, spacing ({spacing_x}, {spacing_y}, {spacing_z})",
        width,
        height,
        images.len()
    );

    Ok(buffer::from_u16_samples(
        width as u32,
        height as u32,
        images.len() as u32,
        [spacing_x, spacing_y, spacing_z],
        samples,
    ))
}

/// Slice sort key: ImagePositionPatient z, then SliceLocation, then
/// InstanceNumber. Files carrying none of the three are skipped.
fn sort_key(object: &FileDicomObject<InMemDicomObject>) -> Option<f32> {
    if let Some(z) = object
        .element(tags::IMAGE_POSITION_PATIENT)
        .ok()
        .and_then(|e| e.to_multi_float32().ok())
        .and_then(|pos| pos.get(2).copied())
    {
        return Some(z);
    }
    if let Some(location) = object
        .element(tags::SLICE_LOCATION)
        .ok()
        .and_then(|e| e.to_float32().ok())
    {
        return Some(location);
    }
    object
        .element(tags::INSTANCE_NUMBER)
        .ok()
        .and_then(|e| e.to_int::<i32>().ok())
        .map(|n| n as f32)
}

fn decode_image(object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<u16>> {
    let pixel_data = object.decode_pixel_data().ok()?;
    let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
    pixel_data
        .to_ndarray_with_options::<u16>(&options)
        .ok()
        .map(|arr| arr.slice_move(s![0, .., .., 0]))
}

/// PixelSpacing is row spacing then column spacing, i.e. (y, x).
fn pixel_spacing(object: &FileDicomObject<InMemDicomObject>) -> (f64, f64) {
    object
        .element(tags::PIXEL_SPACING)
        .ok()
        .and_then(|e| e.to_multi_float64().ok())
        .filter(|spacing| spacing.len() >= 2)
        .map(|spacing| (spacing[1], spacing[0]))
        .unwrap_or((1.0, 1.0))
}

fn slice_thickness(object: &FileDicomObject<InMemDicomObject>) -> Option<f64> {
    object
        .element(tags::SLICE_THICKNESS)
        .ok()
        .and_then(|e| e.to_float64().ok())
}

/// Z-spacing from the delta of the first two sorted slice keys, falling back
/// to SliceThickness, then to 1.0. When the sort key came from instance
/// numbers the delta degenerates to an index step, which is the intended
/// last-resort behavior.
fn derive_z_spacing(sorted_positions: &[f32], thickness: Option<f64>) -> f64 {
    if sorted_positions.len() > 1 {
        let delta = (sorted_positions[1] - sorted_positions[0]).abs() as f64;
        if delta > 1e-6 {
            return delta;
        }
    }
    match thickness {
        Some(thickness) if thickness > 0.0 => thickness,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_spacing_prefers_position_delta() {
        assert_eq!(derive_z_spacing(&[-12.0, -9.5, -7.0], Some(5.0)), 2.5);
    }

    #[test]
    fn z_spacing_falls_back_to_thickness_on_degenerate_positions() {
        assert_eq!(derive_z_spacing(&[3.0, 3.0, 3.0], Some(1.25)), 1.25);
    }

    #[test]
    fn z_spacing_defaults_to_unit() {
        assert_eq!(derive_z_spacing(&[7.0], None), 1.0);
        assert_eq!(derive_z_spacing(&[1.0, 1.0], Some(-2.0)), 1.0);
    }

    #[test]
    fn empty_directory_yields_no_slices() {
        let dir = std::env::temp_dir().join("voxview-empty-dicom");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(matches!(load_series(&dir), Err(VolumeError::NoSlices)));
        let _ = std::fs::remove_dir(&dir);
    }
}
