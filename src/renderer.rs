use glam::{Mat3, Vec2};

use crate::camera::PerspectiveCamera;
use crate::graphics::{draw_line, draw_triangle, Frame, Framebuffer};
use crate::scene::Scene;
use crate::vertex::Vertex;

pub const MAX_PIXEL_RATIO: f32 = 2.0;

const WIREFRAME_COLOR: [u8; 3] = [255, 255, 255];

/// Software renderer drawing a scene with normal-based shading.
///
/// The scene is rasterized at `size * pixel_ratio` and box-filtered back down
/// to the logical size when the frame is taken.
pub struct Renderer {
    width: usize,
    height: usize,
    pixel_ratio: f32,
    framebuffer: Framebuffer,
    pub wireframe: bool,
    render_calls: u64,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width,
            height,
            pixel_ratio: 1.0,
            framebuffer: Framebuffer::new(width, height),
            wireframe: false,
            render_calls: 0,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn render_calls(&self) -> u64 {
        self.render_calls
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.resize_buffer();
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = if ratio.is_finite() { ratio.clamp(1.0, MAX_PIXEL_RATIO) } else { 1.0 };
        self.resize_buffer();
    }

    fn resize_buffer(&mut self) {
        let width = (self.width as f32 * self.pixel_ratio).round() as usize;
        let height = (self.height as f32 * self.pixel_ratio).round() as usize;
        if width != self.framebuffer.width || height != self.framebuffer.height {
            self.framebuffer = Framebuffer::new(width, height);
        }
    }

    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.render_calls += 1;
        self.framebuffer.clear();

        let width = self.framebuffer.width as f32;
        let height = self.framebuffer.height as f32;
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();

        for object in &scene.objects {
            let model_view = view * object.transform;
            let mvp = projection * model_view;
            let linear = Mat3::from_mat4(model_view);
            if linear.determinant() == 0.0 {
                // Zero scale collapses the object to a point
                continue;
            }
            let normal_matrix = linear.inverse().transpose();

            let mesh = &object.mesh;
            let projected: Vec<Option<Vertex>> = mesh
                .positions
                .iter()
                .zip(&mesh.normals)
                .map(|(position, normal)| {
                    let clip = mvp * position.extend(1.0);
                    if clip.w < camera.near {
                        return None;
                    }
                    let ndc = clip.truncate() / clip.w;
                    Some(Vertex {
                        screen_position: Vec2::new(
                            (ndc.x + 1.0) * 0.5 * width,
                            (1.0 - ndc.y) * 0.5 * height,
                        ),
                        depth: ndc.z,
                        normal: (normal_matrix * *normal).normalize_or_zero(),
                    })
                })
                .collect();

            for [a, b, c] in mesh.triangles() {
                let (Some(v0), Some(v1), Some(v2)) = (projected[a], projected[b], projected[c]) else {
                    continue;
                };
                if self.wireframe {
                    for (from, to) in [(v0, v1), (v1, v2), (v2, v0)] {
                        draw_line(
                            from.screen_position,
                            to.screen_position,
                            &mut self.framebuffer,
                            WIREFRAME_COLOR,
                        );
                    }
                } else {
                    draw_triangle(&v0, &v1, &v2, &mut self.framebuffer);
                }
            }
        }
    }

    /// The last rendered image at logical size
    pub fn frame(&self) -> Frame {
        self.framebuffer.downsample(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::BLACK;
    use crate::mesh::{Mesh, TorusOptions};
    use crate::scene::{ObjectKind, SceneObject};
    use glam::{Mat4, Vec3};
    use std::rc::Rc;

    fn camera(aspect: f32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, aspect, 0.1, 100.0);
        camera.position = Vec3::new(0.0, 0.0, 3.0);
        camera.look_at(Vec3::ZERO);
        camera
    }

    fn donut_scene(transform: Mat4) -> Scene {
        let mut scene = Scene::default();
        scene.add(SceneObject {
            kind: ObjectKind::Donut,
            mesh: Rc::new(Mesh::torus(&TorusOptions::default())),
            transform,
        });
        scene
    }

    #[test]
    fn empty_scene_renders_black() {
        let mut renderer = Renderer::new(16, 8);
        renderer.render(&Scene::default(), &camera(2.0));
        let frame = renderer.frame();
        assert_eq!((frame.width, frame.height), (16, 8));
        assert!(frame.pixels.iter().all(|p| *p == BLACK));
        assert_eq!(renderer.render_calls(), 1);
    }

    #[test]
    fn donut_facing_camera_is_blue_across_its_ring() {
        let mut renderer = Renderer::new(80, 80);
        renderer.render(&donut_scene(Mat4::IDENTITY), &camera(1.0));
        let frame = renderer.frame();
        // The hole of the torus stays empty
        assert_eq!(frame.pixel(40, 40), BLACK);
        // Front of the tube, about 5.5px right of centre, faces the camera
        let front = frame.pixel(45, 40);
        assert!(front[2] > 200, "{front:?}");
        // Far outside the ring nothing is drawn
        assert_eq!(frame.pixel(70, 40), BLACK);
    }

    #[test]
    fn zero_scale_objects_are_skipped() {
        let mut renderer = Renderer::new(20, 20);
        renderer.render(&donut_scene(Mat4::from_scale(Vec3::ZERO)), &camera(1.0));
        assert!(renderer.frame().pixels.iter().all(|p| *p == BLACK));
    }

    #[test]
    fn objects_behind_the_camera_are_not_drawn() {
        let mut renderer = Renderer::new(20, 20);
        let behind = Mat4::from_translation(Vec3::new(0.0, 0.0, 6.0));
        renderer.render(&donut_scene(behind), &camera(1.0));
        assert!(renderer.frame().pixels.iter().all(|p| *p == BLACK));
    }

    #[test]
    fn pixel_ratio_is_clamped_and_frame_stays_logical() {
        let mut renderer = Renderer::new(10, 6);
        renderer.set_pixel_ratio(3.0);
        assert_eq!(renderer.pixel_ratio(), MAX_PIXEL_RATIO);
        renderer.render(&donut_scene(Mat4::IDENTITY), &camera(10.0 / 6.0));
        let frame = renderer.frame();
        assert_eq!((frame.width, frame.height), (10, 6));
    }

    #[test]
    fn wireframe_draws_white_edges() {
        let mut renderer = Renderer::new(30, 30);
        renderer.wireframe = true;
        renderer.render(&donut_scene(Mat4::IDENTITY), &camera(1.0));
        assert!(renderer.frame().pixels.iter().any(|p| *p == WIREFRAME_COLOR));
    }
}
