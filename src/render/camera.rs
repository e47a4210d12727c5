use glam::{Mat4, Vec3};

/// Shortest distance the camera may sit from the target.
pub const MIN_RADIUS: f32 = 0.1;

/// Elevation stops just short of the poles so the world-up vector used by
/// the view matrix never becomes parallel to the view direction.
const MAX_ELEVATION: f32 = 89.9;

/// Orbital camera that rotates around a fixed target point.
///
/// Parameterized by azimuth/elevation in degrees and a radius, which keeps
/// "frame the content" a closed-form radius computation and sidesteps roll
/// drift: the basis is rebuilt from world-up on every update.
pub struct Camera {
    azimuth: f32,
    elevation: f32,
    radius: f32,
    target: Vec3,
    position: Vec3,
    /// Vertical field of view (degrees)
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            azimuth: 0.0,
            elevation: 0.0,
            radius: 5.0,
            target: Vec3::ZERO,
            position: Vec3::ZERO,
            fov: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        };
        camera.update_position();
        camera
    }
}

impl Camera {
    /// Rotate camera by delta angles in degrees.
    pub fn rotate(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.azimuth = (self.azimuth + delta_azimuth).rem_euclid(360.0);
        self.elevation =
            (self.elevation + delta_elevation).clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.update_position();
    }

    /// Zoom camera by delta distance, never closer than `MIN_RADIUS`.
    pub fn zoom(&mut self, delta_radius: f32) {
        self.radius = (self.radius - delta_radius).max(MIN_RADIUS);
        self.update_position();
    }

    /// Absolute angle set with the same wrap/clamp rules as `rotate`,
    /// for externally driven or animated views.
    pub fn set_angles(&mut self, azimuth_deg: f32, elevation_deg: f32) {
        self.azimuth = azimuth_deg.rem_euclid(360.0);
        self.elevation = elevation_deg.clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.update_position();
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Position the camera to frame an axis-aligned box of size w x h x d
    /// centered at the origin, whole box inside the frustum regardless of
    /// the volume's aspect ratio.
    pub fn frame_box(&mut self, w: f32, h: f32, d: f32) {
        let box_radius = 0.5 * (w * w + h * h + d * d).sqrt();
        self.azimuth = 45.0;
        self.elevation = 20.0;

        // Distance at which the bounding sphere exactly fills the vertical
        // field of view, with a 1.2x margin.
        let half_fov = (self.fov * 0.5).to_radians();
        let distance = box_radius / half_fov.sin();
        self.radius = (distance * 1.2).max(MIN_RADIUS);

        self.near = (self.radius - 2.0 * box_radius).max(0.05);
        self.far = (self.radius + 2.0 * box_radius).max(self.near + 0.1);
        self.update_position();
    }

    fn update_position(&mut self) {
        let elev = self.elevation.to_radians();
        let azim = self.azimuth.to_radians();
        self.position = self.target
            + self.radius
                * Vec3::new(elev.cos() * azim.sin(), elev.sin(), elev.cos() * azim.cos());
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_wraps_azimuth_and_clamps_elevation() {
        let mut camera = Camera::default();
        camera.rotate(725.0, 200.0);
        assert!(camera.azimuth() >= 0.0 && camera.azimuth() < 360.0);
        assert!((camera.azimuth() - 5.0).abs() < 1e-3);
        assert_eq!(camera.elevation(), 89.9);

        camera.rotate(-10.0, -500.0);
        assert_eq!(camera.elevation(), -89.9);
    }

    #[test]
    fn full_turn_is_a_no_op_on_azimuth() {
        let mut camera = Camera::default();
        camera.set_angles(123.0, 10.0);
        for _ in 0..4 {
            camera.rotate(360.0, 0.0);
        }
        assert!((camera.azimuth() - 123.0).abs() < 1e-3);
    }

    #[test]
    fn zoom_never_goes_below_min_radius() {
        let mut camera = Camera::default();
        camera.zoom(1.0e9);
        assert_eq!(camera.radius(), MIN_RADIUS);
        camera.zoom(-2.0);
        assert!(camera.radius() > MIN_RADIUS);
    }

    #[test]
    fn set_angles_applies_wrap_and_clamp() {
        let mut camera = Camera::default();
        camera.set_angles(-90.0, 120.0);
        assert_eq!(camera.azimuth(), 270.0);
        assert_eq!(camera.elevation(), 89.9);
    }

    #[test]
    fn frame_box_keeps_planes_positive_and_ordered() {
        let boxes = [
            (1.0, 1.0, 1.0),
            (64.0, 64.0, 64.0),
            (1000.0, 1.0, 1.0),
            (1e-5, 1e-5, 1e-5),
            (0.0, 0.0, 0.0),
        ];
        for (w, h, d) in boxes {
            let mut camera = Camera::default();
            camera.frame_box(w, h, d);
            let box_radius = 0.5 * f32::sqrt(w * w + h * h + d * d);
            assert!(camera.near() > 0.0, "near must stay positive for {w}x{h}x{d}");
            assert!(camera.near() < camera.far());
            assert!(camera.radius() >= box_radius);
        }
    }

    #[test]
    fn frame_box_radius_matches_bounding_sphere_fit() {
        // A 64x64x32 volume with spacing (1,1,2) has physical box (64,64,64).
        let mut camera = Camera::default();
        camera.frame_box(64.0, 64.0, 64.0);
        let r = 0.5 * f32::sqrt(64.0 * 64.0 * 3.0);
        let expected = 1.2 * (r / (22.5f32.to_radians()).sin());
        assert!((camera.radius() - expected).abs() < 1e-3);
        assert_eq!(camera.azimuth(), 45.0);
        assert_eq!(camera.elevation(), 20.0);
    }

    #[test]
    fn position_derives_from_spherical_coordinates() {
        let mut camera = Camera::default();
        camera.set_angles(0.0, 0.0);
        let p = camera.position();
        assert!((p.x).abs() < 1e-5);
        assert!((p.y).abs() < 1e-5);
        assert!((p.z - camera.radius()).abs() < 1e-5);

        camera.set_angles(90.0, 0.0);
        let p = camera.position();
        assert!((p.x - camera.radius()).abs() < 1e-4);
    }
}
