//! Orbit controls: rotate around a target, dolly in and out, pan.
//!
//! Input is accumulated into pending deltas and applied by [`OrbitControls::update`],
//! which is called once per frame. With damping enabled the deltas decay
//! geometrically instead of being consumed at once, so the camera glides to a
//! stop after the mouse is released.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::camera::PerspectiveCamera;

const EPS: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y
    phi: f32,
    /// Azimuth around +Y, measured from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Spherical {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Spherical {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Pixels moved per arrow key press
    pub key_pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Viewport height in pixels; drag distances are relative to it
    pub viewport_height: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
    home: (Vec3, Vec3),
}

impl OrbitControls {
    pub fn new(camera: &mut PerspectiveCamera, viewport_height: f32) -> Self {
        let mut controls = OrbitControls {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            key_pan_speed: 7.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            viewport_height,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            home: (camera.position, Vec3::ZERO),
        };
        controls.update(camera);
        controls
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Drag by `(dx, dy)` pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        let height = self.viewport_height.max(1.0);
        self.rotate_left(TAU * dx / height * self.rotate_speed);
        self.rotate_up(TAU * dy / height * self.rotate_speed);
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Moves the camera towards the target by one wheel notch
    pub fn dolly_in(&mut self) {
        self.scale *= self.zoom_scale();
    }

    pub fn dolly_out(&mut self) {
        self.scale /= self.zoom_scale();
    }

    /// Pans by `(dx, dy)` pixels so the scene follows the pointer
    pub fn pan(&mut self, camera: &PerspectiveCamera, dx: f32, dy: f32) {
        let height = self.viewport_height.max(1.0);
        let distance = (camera.position - self.target).length() * (camera.fov.to_radians() / 2.0).tan();
        let (right, up) = camera.basis();
        self.pan_offset -= right * (2.0 * dx * distance / height * self.pan_speed);
        self.pan_offset += up * (2.0 * dy * distance / height * self.pan_speed);
    }

    /// Restores the camera pose the controls were created with
    pub fn reset(&mut self, camera: &mut PerspectiveCamera) {
        camera.position = self.home.0;
        self.target = self.home.1;
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;
        self.update(camera);
    }

    pub fn distance(&self, camera: &PerspectiveCamera) -> f32 {
        (camera.position - self.target).length()
    }

    /// Applies pending input to the camera; returns whether it moved
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let last_position = camera.position;
        let last_target = self.target;

        let mut spherical = Spherical::from_offset(camera.position - self.target);
        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * factor;
        spherical.phi += self.delta_phi * factor;
        spherical.phi = spherical.phi.clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * factor;
        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(last_position) > EPS || self.target.distance_squared(last_target) > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PerspectiveCamera, OrbitControls) {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        camera.position = Vec3::new(1.0, 1.0, 2.0);
        let controls = OrbitControls::new(&mut camera, 100.0);
        (camera, controls)
    }

    #[test]
    fn creation_aims_camera_at_target() {
        let (camera, controls) = setup();
        assert_eq!(camera.target, Vec3::ZERO);
        assert!((camera.position - Vec3::new(1.0, 1.0, 2.0)).length() < 1e-5);
        assert!((controls.distance(&camera) - 6.0f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn rotation_keeps_distance() {
        let (mut camera, mut controls) = setup();
        let before = controls.distance(&camera);
        controls.rotate(25.0, 10.0);
        assert!(controls.update(&mut camera));
        assert!((controls.distance(&camera) - before).abs() < 1e-4);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn dolly_in_moves_closer() {
        let (mut camera, mut controls) = setup();
        let before = controls.distance(&camera);
        controls.dolly_in();
        controls.update(&mut camera);
        assert!((controls.distance(&camera) - before * 0.95).abs() < 1e-4);
        controls.dolly_out();
        controls.update(&mut camera);
        assert!((controls.distance(&camera) - before).abs() < 1e-4);
    }

    #[test]
    fn damping_spreads_motion_over_frames() {
        let (mut camera, mut controls) = setup();
        controls.enable_damping = true;
        let start = camera.position;
        controls.rotate(50.0, 0.0);
        controls.update(&mut camera);
        let first_step = camera.position.distance(start);
        let mid = camera.position;
        controls.update(&mut camera);
        let second_step = camera.position.distance(mid);
        assert!(first_step > 0.0);
        assert!(second_step < first_step);
        assert!(second_step > 0.0);
        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let (mut camera, mut controls) = setup();
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let offset = camera.position - controls.target;
        assert!(offset.y > 0.0);
        assert!(Vec3::new(offset.x, 0.0, offset.z).length() > 0.0);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let (mut camera, mut controls) = setup();
        let offset_before = camera.position - controls.target;
        controls.pan(&camera, 10.0, 0.0);
        controls.update(&mut camera);
        assert!(controls.target.length() > 0.0);
        let offset_after = camera.position - controls.target;
        assert!((offset_after - offset_before).length() < 1e-4);
    }

    #[test]
    fn reset_returns_home() {
        let (mut camera, mut controls) = setup();
        controls.rotate(40.0, 30.0);
        controls.dolly_in();
        controls.pan(&camera, 5.0, 5.0);
        controls.update(&mut camera);
        controls.reset(&mut camera);
        assert!((camera.position - Vec3::new(1.0, 1.0, 2.0)).length() < 1e-5);
        assert_eq!(controls.target, Vec3::ZERO);
    }
}
