/// Named orthographic projections as (azimuth, elevation) in degrees.
pub const ORTHO_VIEWS: &[(&str, f32, f32)] = &[
    ("xy", -90.0, 90.0),
    ("xz", -90.0, 0.0),
    ("yz", 0.0, 0.0),
    ("-xy", 90.0, -90.0),
    ("-xz", 90.0, 0.0),
    ("-yz", 180.0, 0.0),
];

/// Orbit camera around a target point, projected orthographically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub azimuth: f32,
    pub elevation: f32,
    /// Screen pixels per voxel.
    pub zoom: f32,
    /// Pan offset in screen pixels.
    pub pan: [f32; 2],
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            azimuth: -90.0,
            elevation: 30.0,
            zoom: 1.0,
            pan: [0.0, 0.0],
        }
    }
}

impl Camera {
    pub fn named(name: &str) -> Option<Self> {
        ORTHO_VIEWS
            .iter()
            .find(|(view, _, _)| *view == name)
            .map(|(_, azimuth, elevation)| Self {
                azimuth: *azimuth,
                elevation: *elevation,
                ..Self::default()
            })
    }

    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth = (self.azimuth + d_azimuth + 180.0).rem_euclid(360.0) - 180.0;
        self.elevation = (self.elevation + d_elevation).clamp(-90.0, 90.0);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan[0] += dx;
        self.pan[1] += dy;
    }

    /// Screen-right and screen-up unit vectors for the current angles.
    fn basis(&self) -> ([f32; 3], [f32; 3]) {
        let az = self.azimuth.to_radians();
        let el = self.elevation.to_radians();
        let right = [-az.sin(), az.cos(), 0.0];
        let up = [-el.sin() * az.cos(), -el.sin() * az.sin(), el.cos()];
        (right, up)
    }

    /// Projects a display-space point to 2D screen offsets relative to the
    /// target; y grows downwards.
    pub fn project(&self, p: [f32; 3], target: [f32; 3]) -> [f32; 2] {
        let (right, up) = self.basis();
        let d = [p[0] - target[0], p[1] - target[1], p[2] - target[2]];
        let u = d[0] * right[0] + d[1] * right[1] + d[2] * right[2];
        let v = d[0] * up[0] + d[1] * up[1] + d[2] * up[2];
        [
            u * self.zoom + self.pan[0],
            -v * self.zoom + self.pan[1],
        ]
    }

    /// Zoom that fits a box of `bounds` into `size` screen pixels.
    pub fn fit(&mut self, bounds: [f32; 3], size: [f32; 2]) {
        let extent = bounds.iter().copied().fold(0.0f32, f32::max).max(1.0);
        self.zoom = size[0].min(size[1]) / extent;
        self.pan = [0.0, 0.0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-4 && (a[1] - b[1]).abs() < 1e-4
    }

    #[test]
    fn named_views_resolve() {
        let camera = Camera::named("-yz").unwrap();
        assert_eq!((camera.azimuth, camera.elevation), (180.0, 0.0));
        assert!(Camera::named("zz").is_none());
    }

    #[test]
    fn side_view_drops_the_x_axis() {
        let camera = Camera::named("yz").unwrap();
        let target = [0.0, 0.0, 0.0];
        assert!(close(camera.project([5.0, 0.0, 0.0], target), [0.0, 0.0]));
        assert!(close(camera.project([0.0, 2.0, 0.0], target), [2.0, 0.0]));
        assert!(close(camera.project([0.0, 0.0, 3.0], target), [0.0, -3.0]));
    }

    #[test]
    fn top_view_drops_the_z_axis() {
        let camera = Camera::named("xy").unwrap();
        let target = [0.0, 0.0, 0.0];
        assert!(close(camera.project([0.0, 0.0, 9.0], target), [0.0, 0.0]));
        assert!(!close(camera.project([4.0, 0.0, 0.0], target), [0.0, 0.0]));
    }

    #[test]
    fn elevation_is_clamped_and_azimuth_wraps() {
        let mut camera = Camera::default();
        camera.orbit(270.0, 120.0);
        assert_eq!(camera.elevation, 90.0);
        assert!((camera.azimuth - 180.0).abs() < 1e-4 || (camera.azimuth + 180.0).abs() < 1e-4);
    }
}
