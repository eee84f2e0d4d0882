use glam::Vec2;

use crate::math::{edge_function, normal_color};
use crate::vertex::Vertex;

pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];

/// Colour buffer with a matching depth buffer
pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    pub color: Vec<Rgb>,
    pub depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            color: vec![BLACK; width * height],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.color.fill(BLACK);
        self.depth.fill(f32::INFINITY);
    }

    /// Box-filters the buffer down to `width` x `height`
    pub fn downsample(&self, width: usize, height: usize) -> Frame {
        if width == self.width && height == self.height {
            return Frame {
                width,
                height,
                pixels: self.color.clone(),
            };
        }

        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let y0 = y * self.height / height.max(1);
            let y1 = ((y + 1) * self.height / height.max(1)).max(y0 + 1).min(self.height);
            for x in 0..width {
                let x0 = x * self.width / width.max(1);
                let x1 = ((x + 1) * self.width / width.max(1)).max(x0 + 1).min(self.width);
                let mut sum = [0u32; 3];
                let mut count = 0u32;
                for sy in y0..y1 {
                    for sx in x0..x1 {
                        let c = self.color[sy * self.width + sx];
                        sum[0] += c[0] as u32;
                        sum[1] += c[1] as u32;
                        sum[2] += c[2] as u32;
                        count += 1;
                    }
                }
                let count = count.max(1);
                pixels.push([
                    (sum[0] / count) as u8,
                    (sum[1] / count) as u8,
                    (sum[2] / count) as u8,
                ]);
            }
        }
        Frame {
            width,
            height,
            pixels,
        }
    }
}

/// A finished frame at logical resolution
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgb>,
}

impl Frame {
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            BLACK
        }
    }
}

/// Draws a triangle shaded by its interpolated normal
pub fn draw_triangle(v0: &Vertex, v1: &Vertex, v2: &Vertex, target: &mut Framebuffer) {
    if target.width == 0 || target.height == 0 {
        return;
    }

    // Compute bounding box of the triangle
    let min_x = v0
        .screen_position
        .x
        .min(v1.screen_position.x)
        .min(v2.screen_position.x)
        .floor()
        .max(0.0);
    let max_x = v0
        .screen_position
        .x
        .max(v1.screen_position.x)
        .max(v2.screen_position.x)
        .ceil()
        .min(target.width as f32 - 1.0);
    let min_y = v0
        .screen_position
        .y
        .min(v1.screen_position.y)
        .min(v2.screen_position.y)
        .floor()
        .max(0.0);
    let max_y = v0
        .screen_position
        .y
        .max(v1.screen_position.y)
        .max(v2.screen_position.y)
        .ceil()
        .min(target.height as f32 - 1.0);
    if min_x > max_x || min_y > max_y {
        return;
    }

    let area = edge_function(v0.screen_position, v1.screen_position, v2.screen_position);
    if area.abs() < f32::EPSILON {
        return;
    }

    for y in min_y as usize..=max_y as usize {
        for x in min_x as usize..=max_x as usize {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);

            // Dividing by the signed area makes both windings come out positive
            let w0 = edge_function(v1.screen_position, v2.screen_position, p) / area;
            let w1 = edge_function(v2.screen_position, v0.screen_position, p) / area;
            let w2 = edge_function(v0.screen_position, v1.screen_position, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let depth = v0.depth * w0 + v1.depth * w1 + v2.depth * w2;
            if depth > 1.0 {
                continue;
            }

            let offset = y * target.width + x;
            if depth < target.depth[offset] {
                target.depth[offset] = depth;
                let normal = v0.normal * w0 + v1.normal * w1 + v2.normal * w2;
                target.color[offset] = normal_color(normal);
            }
        }
    }
}

/// Draws a line between two points in the buffer using Bresenham's algorithm
pub fn draw_line(from: Vec2, to: Vec2, target: &mut Framebuffer, color: Rgb) {
    let (mut x0, mut y0, x1, y1) = (
        from.x.round() as isize,
        from.y.round() as isize,
        to.x.round() as isize,
        to.y.round() as isize,
    );
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x0 >= 0 && x0 < target.width as isize && y0 >= 0 && y0 < target.height as isize {
            target.color[y0 as usize * target.width + x0 as usize] = color;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
