use glam::Vec3;

/// Spacing values below this are treated as degenerate when deriving physical
/// extents, so a flat or malformed header never collapses the render box.
pub const MIN_SPACING: f64 = 1e-4;

/// Decoded samples of one scalar field.
///
/// Medical sources (DICOM, NIfTI) keep their native 16-bit width; structured
/// grid sources carry floats already normalized to [0, 1].
#[derive(Debug, Clone)]
pub enum FieldData {
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl FieldData {
    pub fn len(&self) -> usize {
        match self {
            FieldData::U16(data) => data.len(),
            FieldData::F32(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One named scalar field over the volume's grid, with the original value
/// range recorded before any normalization.
#[derive(Debug, Clone)]
pub struct ScalarField {
    pub name: String,
    pub data: FieldData,
    pub min: f32,
    pub max: f32,
}

/// Dense 3D scalar grid with physical voxel spacing.
///
/// Samples are stored depth-major: index = (z * height + y) * width + x,
/// so the first `width * height` entries form the z = 0 slice.
#[derive(Debug, Clone, Default)]
pub struct VolumeBuffer {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Physical voxel spacing in millimeters, (x, y, z).
    pub spacing: [f64; 3],
    pub origin: Vec3,
    pub fields: Vec<ScalarField>,
}

impl VolumeBuffer {
    pub fn new(
        width: u32,
        height: u32,
        depth: u32,
        spacing: [f64; 3],
        fields: Vec<ScalarField>,
    ) -> Self {
        let voxels = width as usize * height as usize * depth as usize;
        debug_assert!(fields.iter().all(|f| f.data.len() == voxels));
        Self {
            width,
            height,
            depth,
            spacing,
            origin: Vec3::ZERO,
            fields,
        }
    }

    /// A buffer is empty until a load succeeds; any zero dimension or the
    /// absence of fields counts as empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() || self.width == 0 || self.height == 0 || self.depth == 0
    }

    pub fn voxel_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// Resets to the initial unloaded state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Physical box extents (dimensions x spacing), with degenerate spacing
    /// floored so the box never collapses to zero volume.
    pub fn physical_size(&self) -> Vec3 {
        Vec3::new(
            self.width as f32 * self.spacing[0].max(MIN_SPACING) as f32,
            self.height as f32 * self.spacing[1].max(MIN_SPACING) as f32,
            self.depth as f32 * self.spacing[2].max(MIN_SPACING) as f32,
        )
    }

    /// Voxel extent along a slice axis (0 = Z, 1 = Y, 2 = X).
    pub fn axis_extent(&self, axis: u8) -> u32 {
        match axis {
            0 => self.depth,
            1 => self.height,
            _ => self.width,
        }
    }

    pub fn field(&self, index: usize) -> Option<&ScalarField> {
        self.fields.get(index)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Raw 16-bit samples of the first field, when the volume came from a
    /// medical source. Depth-major order, element stride 1.
    pub fn raw_u16_samples(&self) -> Option<&[u16]> {
        match self.fields.first().map(|f| &f.data) {
            Some(FieldData::U16(data)) => Some(data),
            _ => None,
        }
    }
}

/// Builds a single-field buffer from raw 16-bit medical samples.
pub fn from_u16_samples(
    width: u32,
    height: u32,
    depth: u32,
    spacing: [f64; 3],
    samples: Vec<u16>,
) -> VolumeBuffer {
    let (min, max) = samples
        .iter()
        .fold((u16::MAX, u16::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let field = ScalarField {
        name: "intensity".to_owned(),
        data: FieldData::U16(samples),
        min: min as f32,
        max: max as f32,
    };
    VolumeBuffer::new(width, height, depth, spacing, vec![field])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_buffer(w: u32, h: u32, d: u32) -> VolumeBuffer {
        from_u16_samples(w, h, d, [1.0, 1.0, 1.0], vec![0; (w * h * d) as usize])
    }

    #[test]
    fn default_buffer_is_empty() {
        let buffer = VolumeBuffer::default();
        assert!(buffer.is_empty());
        assert_eq!(buffer.voxel_count(), 0);
    }

    #[test]
    fn populated_buffer_reports_counts() {
        let buffer = test_buffer(4, 3, 2);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.voxel_count(), 24);
        assert_eq!(buffer.fields[0].data.len(), 24);
    }

    #[test]
    fn clear_returns_to_unloaded_state() {
        let mut buffer = test_buffer(4, 3, 2);
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.raw_u16_samples().is_none());
    }

    #[test]
    fn physical_size_scales_by_spacing() {
        let mut buffer = test_buffer(64, 64, 32);
        buffer.spacing = [1.0, 1.0, 2.0];
        let size = buffer.physical_size();
        assert_eq!(size, Vec3::new(64.0, 64.0, 64.0));
    }

    #[test]
    fn physical_size_floors_degenerate_spacing() {
        let mut buffer = test_buffer(10, 10, 10);
        buffer.spacing = [0.0, -1.0, 1.0];
        let size = buffer.physical_size();
        assert!(size.x > 0.0 && size.y > 0.0);
    }

    #[test]
    fn axis_extent_follows_slice_axis_convention() {
        let buffer = test_buffer(5, 7, 9);
        assert_eq!(buffer.axis_extent(0), 9); // Z
        assert_eq!(buffer.axis_extent(1), 7); // Y
        assert_eq!(buffer.axis_extent(2), 5); // X
    }

    #[test]
    fn raw_samples_record_value_range() {
        let buffer = from_u16_samples(2, 1, 1, [1.0; 3], vec![100, 4000]);
        assert_eq!(buffer.fields[0].min, 100.0);
        assert_eq!(buffer.fields[0].max, 4000.0);
    }
}
