use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Fixed resolution of the RGBA8 lookup table consumed as a 1D texture.
pub const LUT_SIZE: usize = 256;

/// Number of named colormap presets.
pub const PRESET_COUNT: i32 = 10;

/// Display names for the presets, in index order.
pub const PRESET_NAMES: [&str; PRESET_COUNT as usize] = [
    "Grayscale (inverted)",
    "Grayscale",
    "Hot",
    "Turbo",
    "Plasma",
    "Cividis",
    "Inferno",
    "Magma",
    "Jet",
    "Viridis",
];

/// One control point of a custom transfer function. Positions live in [0, 1];
/// callers may hand them over unsorted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub position: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Maps a preset index and a normalized scalar value to a color.
///
/// Preset 0 is an inverted grayscale ramp; the rest are classic or
/// perceptually-oriented palettes sampled at `t`.
pub fn preset_color(preset: i32, t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    match preset {
        0 => Vec3::splat(1.0 - t),
        1 => Vec3::splat(t),
        2 => hot(t),
        3 => turbo(t),
        4 => plasma(t),
        5 => cividis(t),
        6 => inferno(t),
        7 => magma(t),
        8 => jet(t),
        _ => viridis(t),
    }
}

/// Hot colormap (black -> red -> yellow -> white)
fn hot(t: f32) -> Vec3 {
    if t < 1.0 / 3.0 {
        Vec3::new(3.0 * t, 0.0, 0.0)
    } else if t < 2.0 / 3.0 {
        Vec3::new(1.0, 3.0 * t - 1.0, 0.0)
    } else {
        Vec3::new(1.0, 1.0, 3.0 * t - 2.0)
    }
}

/// Turbo colormap (improved rainbow)
fn turbo(t: f32) -> Vec3 {
    let r = if t < 0.5 {
        (0.13 + 0.87 * (2.0 * t).powf(0.25)).clamp(0.0, 1.0)
    } else {
        (0.8685 + 0.1315 * (2.0 * (1.0 - t)).powf(0.25)).clamp(0.0, 1.0)
    };
    let g = if t < 0.25 {
        4.0 * t
    } else if t < 0.75 {
        1.0
    } else {
        1.0 - 4.0 * (t - 0.75)
    }
    .clamp(0.0, 1.0);
    let b = if t < 0.5 {
        (0.8 * (1.0 - 2.0 * t).powf(0.25)).clamp(0.0, 1.0)
    } else {
        (0.1 + 0.9 * (2.0 * t - 1.0).powf(0.25)).clamp(0.0, 1.0)
    };
    Vec3::new(r, g, b)
}

/// Plasma colormap (perceptually uniform approximation)
fn plasma(t: f32) -> Vec3 {
    let r = (0.050383 + t * (0.940015 - 0.050383)).clamp(0.0, 1.0);
    let g = (0.029803 + t * (0.975158 - 0.029803) * (1.0 - t)).clamp(0.0, 1.0);
    let b = (0.527975 + t * (0.131326 - 0.527975)).clamp(0.0, 1.0);
    Vec3::new(r, g, b)
}

/// Cividis colormap (blue -> gray -> yellow, piecewise approximation)
fn cividis(t: f32) -> Vec3 {
    let low = Vec3::new(0.0, 0.135, 0.304);
    let mid = Vec3::new(0.488, 0.485, 0.471);
    let high = Vec3::new(0.995, 0.909, 0.217);
    if t < 0.5 {
        low.lerp(mid, t * 2.0)
    } else {
        mid.lerp(high, (t - 0.5) * 2.0)
    }
}

/// Inferno colormap (perceptually uniform approximation)
fn inferno(t: f32) -> Vec3 {
    let r = (0.001462 + t * (0.988362 - 0.001462)).clamp(0.0, 1.0);
    let g = (0.000466 + t * t * (0.982895 - 0.000466)).clamp(0.0, 1.0);
    let b = (0.013866 + t * (1.0 - t) * (0.416065 - 0.013866)).clamp(0.0, 1.0);
    Vec3::new(r, g, b)
}

/// Magma colormap (perceptually uniform approximation)
fn magma(t: f32) -> Vec3 {
    let r = (0.001462 + t * (0.987053 - 0.001462)).clamp(0.0, 1.0);
    let g = (0.000466 + t * t * (0.991438 - 0.000466)).clamp(0.0, 1.0);
    let b = (0.013866 + t * (0.644237 - 0.013866) * (1.0 - t)).clamp(0.0, 1.0);
    Vec3::new(r, g, b)
}

/// Classic Jet colormap
fn jet(t: f32) -> Vec3 {
    let r = (1.5 - 4.0 * (t - 0.75).abs()).clamp(0.0, 1.0);
    let g = (1.5 - 4.0 * (t - 0.5).abs()).clamp(0.0, 1.0);
    let b = (1.5 - 4.0 * (t - 0.25).abs()).clamp(0.0, 1.0);
    Vec3::new(r, g, b)
}

/// Viridis colormap (perceptually uniform approximation)
fn viridis(t: f32) -> Vec3 {
    let r = (0.267004 + t * (0.993248 - 0.267004)).clamp(0.0, 1.0);
    let g = (0.004874 + t * (0.906157 - 0.004874)).clamp(0.0, 1.0);
    let b = (0.329415 + t * (0.143936 - 0.329415) + t * t * 0.5).clamp(0.0, 1.0);
    Vec3::new(r, g, b)
}

/// Scalar-intensity-to-color mapping: either a preset palette or a custom
/// sequence of interpolated control points.
#[derive(Debug, Clone)]
pub struct TransferFunction {
    preset: i32,
    custom: bool,
    points: Vec<ControlPoint>,
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self {
            preset: 0,
            custom: false,
            points: Vec::new(),
        }
    }
}

impl TransferFunction {
    /// Selects a preset palette; out-of-range indices clamp to [0, 9].
    pub fn set_preset(&mut self, index: i32) {
        self.preset = index.clamp(0, PRESET_COUNT - 1);
    }

    pub fn preset(&self) -> i32 {
        self.preset
    }

    pub fn set_custom_mode(&mut self, enabled: bool) {
        self.custom = enabled;
    }

    pub fn custom_mode(&self) -> bool {
        self.custom
    }

    pub fn set_control_points(&mut self, points: Vec<ControlPoint>) {
        self.points = points;
    }

    /// Samples the active source at `LUT_SIZE` evenly spaced positions,
    /// producing RGBA8 bytes. In preset mode alpha is always 255; opacity is
    /// shaped only by a custom transfer function's explicit alpha channel.
    pub fn build_lut(&self) -> Vec<u8> {
        let mut lut = Vec::with_capacity(LUT_SIZE * 4);
        if self.custom {
            let mut points = self.points.clone();
            points.sort_by(|a, b| {
                a.position
                    .partial_cmp(&b.position)
                    .unwrap_or(Ordering::Equal)
            });
            for i in 0..LUT_SIZE {
                let t = i as f32 / (LUT_SIZE - 1) as f32;
                let [r, g, b, a] = sample_control_points(&points, t);
                lut.push(to_byte(r));
                lut.push(to_byte(g));
                lut.push(to_byte(b));
                lut.push(to_byte(a));
            }
        } else {
            for i in 0..LUT_SIZE {
                let t = i as f32 / (LUT_SIZE - 1) as f32;
                let c = preset_color(self.preset, t);
                lut.push(to_byte(c.x));
                lut.push(to_byte(c.y));
                lut.push(to_byte(c.z));
                lut.push(255);
            }
        }
        lut
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Interpolates sorted control points at `t`. Zero points yield fully
/// transparent black; a single point yields that point's constant RGBA.
fn sample_control_points(points: &[ControlPoint], t: f32) -> [f32; 4] {
    match points {
        [] => [0.0, 0.0, 0.0, 0.0],
        [p] => [p.r, p.g, p.b, p.a],
        _ => {
            let first = points[0];
            let last = points[points.len() - 1];
            if t <= first.position {
                return [first.r, first.g, first.b, first.a];
            }
            if t >= last.position {
                return [last.r, last.g, last.b, last.a];
            }
            for pair in points.windows(2) {
                let (lo, hi) = (pair[0], pair[1]);
                if t <= hi.position {
                    let span = (hi.position - lo.position).max(1e-6);
                    let s = (t - lo.position) / span;
                    return [
                        lo.r + (hi.r - lo.r) * s,
                        lo.g + (hi.g - lo.g) * s,
                        lo.b + (hi.b - lo.b) * s,
                        lo.a + (hi.a - lo.a) * s,
                    ];
                }
            }
            [last.r, last.g, last.b, last.a]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lut_has_fixed_size_and_opaque_alpha_for_every_preset() {
        for preset in 0..PRESET_COUNT {
            let mut tf = TransferFunction::default();
            tf.set_preset(preset);
            let lut = tf.build_lut();
            assert_eq!(lut.len(), LUT_SIZE * 4);
            assert!(lut.chunks_exact(4).all(|px| px[3] == 255));
        }
    }

    #[test]
    fn preset_index_clamps_both_ways() {
        let mut tf = TransferFunction::default();
        tf.set_preset(29);
        assert_eq!(tf.preset(), 9);
        tf.set_preset(-4);
        assert_eq!(tf.preset(), 0);
    }

    #[test]
    fn lut_is_deterministic_for_repeated_preset_selection() {
        let mut tf = TransferFunction::default();
        tf.set_preset(3);
        let first = tf.build_lut();
        tf.set_preset(3);
        let second = tf.build_lut();
        assert_eq!(first, second);
    }

    #[test]
    fn inverted_grayscale_runs_white_to_black() {
        let mut tf = TransferFunction::default();
        tf.set_preset(0);
        let lut = tf.build_lut();
        assert_eq!(&lut[0..3], &[255, 255, 255]);
        assert_eq!(&lut[lut.len() - 4..lut.len() - 1], &[0, 0, 0]);
    }

    #[test]
    fn empty_custom_function_is_fully_transparent() {
        let mut tf = TransferFunction::default();
        tf.set_custom_mode(true);
        let lut = tf.build_lut();
        assert!(lut.chunks_exact(4).all(|px| px == [0, 0, 0, 0]));
    }

    #[test]
    fn single_point_custom_function_is_constant() {
        let mut tf = TransferFunction::default();
        tf.set_custom_mode(true);
        tf.set_control_points(vec![ControlPoint {
            position: 0.4,
            r: 1.0,
            g: 0.5,
            b: 0.0,
            a: 0.25,
        }]);
        let lut = tf.build_lut();
        assert!(lut
            .chunks_exact(4)
            .all(|px| px == [255, 128, 0, to_byte(0.25)]));
    }

    #[test]
    fn unsorted_points_are_sorted_before_interpolation() {
        let mut tf = TransferFunction::default();
        tf.set_custom_mode(true);
        tf.set_control_points(vec![
            ControlPoint {
                position: 1.0,
                r: 1.0,
                g: 1.0,
                b: 1.0,
                a: 1.0,
            },
            ControlPoint {
                position: 0.0,
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 0.0,
            },
        ]);
        let lut = tf.build_lut();
        // Midpoint lands halfway between the two endpoints.
        let mid = &lut[(LUT_SIZE / 2) * 4..(LUT_SIZE / 2) * 4 + 4];
        for channel in mid {
            assert!((*channel as i32 - 128).abs() <= 1);
        }
    }

    #[test]
    fn preset_colors_stay_in_gamut() {
        for preset in 0..PRESET_COUNT {
            for i in 0..=100 {
                let c = preset_color(preset, i as f32 / 100.0);
                assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
            }
        }
    }
}
