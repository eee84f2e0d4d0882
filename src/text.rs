//! Extruded, bevelled text geometry.
//!
//! Each glyph contour is pushed outward along mitred vectors to form the bevel
//! rings, the rings are stitched into flat-shaded walls, and the outermost
//! front and back rings are filled with lyon to make the caps.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};

use crate::error::TextError;
use crate::font::Font;
use crate::math::{calculate_normal, point_in_polygon, signed_area};
use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    pub size: f32,
    /// Extrusion depth along +Z, not counting the bevel
    pub depth: f32,
    pub curve_segments: u32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_offset: f32,
    pub bevel_segments: u32,
}

impl Default for TextOptions {
    fn default() -> Self {
        TextOptions {
            size: 0.5,
            depth: 0.2,
            curve_segments: 12,
            bevel_enabled: true,
            bevel_thickness: 0.03,
            bevel_size: 0.02,
            bevel_offset: 0.0,
            bevel_segments: 5,
        }
    }
}

/// A glyph contour with its outward directions.
struct Contour {
    points: Vec<Vec2>,
    /// Per edge `i -> i + 1`, pointing away from the filled region
    edge_normals: Vec<Vec2>,
    /// Per point, mitred so an offset of `d` keeps both edges `d` away
    bevel: Vec<Vec2>,
}

impl Contour {
    fn new(points: Vec<Vec2>, hole: bool) -> Self {
        let n = points.len();
        let mut sign = if signed_area(&points) > 0.0 { 1.0 } else { -1.0 };
        if hole {
            sign = -sign;
        }

        let edge_normals: Vec<Vec2> = (0..n)
            .map(|i| {
                let d = points[(i + 1) % n] - points[i];
                Vec2::new(d.y, -d.x).normalize_or_zero() * sign
            })
            .collect();

        let bevel = (0..n)
            .map(|i| {
                let prev = edge_normals[(i + n - 1) % n];
                let next = edge_normals[i];
                match (prev + next).try_normalize() {
                    // Miter length is capped at 2 for very sharp corners
                    Some(m) => m / m.dot(next).max(0.5),
                    None => next,
                }
            })
            .collect();

        Contour {
            points,
            edge_normals,
            bevel,
        }
    }

    fn ring(&self, offset: f32) -> impl Iterator<Item = Vec2> + '_ {
        self.points
            .iter()
            .zip(&self.bevel)
            .map(move |(p, b)| *p + *b * offset)
    }
}

/// Z position and outward offset of each ring from front to back.
fn layers(options: &TextOptions) -> Vec<(f32, f32)> {
    if !options.bevel_enabled {
        return vec![(0.0, 0.0), (options.depth, 0.0)];
    }

    let segments = options.bevel_segments.max(1);
    let bevel_at = |b: u32| {
        let t = b as f32 / segments as f32 * FRAC_PI_2;
        (
            options.bevel_thickness * t.cos(),
            options.bevel_size * t.sin() + options.bevel_offset,
        )
    };

    let full = options.bevel_size + options.bevel_offset;
    let mut layers = Vec::with_capacity(segments as usize * 2 + 2);
    layers.extend((0..segments).map(|b| {
        let (z, offset) = bevel_at(b);
        (-z, offset)
    }));
    layers.push((0.0, full));
    layers.push((options.depth, full));
    layers.extend((0..segments).rev().map(|b| {
        let (z, offset) = bevel_at(b);
        (options.depth + z, offset)
    }));
    layers
}

#[derive(Default)]
struct MeshBuilder {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    fn cap(&mut self, contours: &[Contour], offset: f32, z: f32, normal: Vec3) -> Result<(), TextError> {
        let mut path = Path::builder();
        for contour in contours {
            let mut ring = contour.ring(offset);
            let Some(first) = ring.next() else {
                continue;
            };
            path.begin(point(first.x, first.y));
            for p in ring {
                path.line_to(point(p.x, p.y));
            }
            path.close();
        }
        let path = path.build();

        let mut buffers: VertexBuffers<Vec3, u32> = VertexBuffers::new();
        FillTessellator::new()
            .tessellate_path(
                &path,
                &FillOptions::default(),
                &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
                    let p = vertex.position();
                    Vec3::new(p.x, p.y, z)
                }),
            )
            .map_err(TextError::Tessellation)?;

        let base = self.positions.len() as u32;
        self.normals
            .extend(std::iter::repeat(normal).take(buffers.vertices.len()));
        self.positions.extend(buffers.vertices);
        self.indices.extend(buffers.indices.iter().map(|i| i + base));
        Ok(())
    }

    fn wall(&mut self, contour: &Contour, front: (f32, f32), back: (f32, f32)) {
        let (z_front, offset_front) = front;
        let (z_back, offset_back) = back;
        let near: Vec<Vec3> = contour.ring(offset_front).map(|p| p.extend(z_front)).collect();
        let far: Vec<Vec3> = contour.ring(offset_back).map(|p| p.extend(z_back)).collect();

        let n = near.len();
        for j in 0..n {
            let k = (j + 1) % n;
            let quad = [near[j], near[k], far[k], far[j]];
            let Some(mut normal) =
                calculate_normal(quad[0], quad[1], quad[3]).or_else(|| calculate_normal(quad[1], quad[2], quad[3]))
            else {
                continue;
            };
            if normal.truncate().dot(contour.edge_normals[j]) < 0.0 {
                normal = -normal;
            }

            let base = self.positions.len() as u32;
            self.positions.extend_from_slice(&quad);
            self.normals.extend_from_slice(&[normal; 4]);
            self.indices
                .extend_from_slice(&[base, base + 1, base + 3, base + 1, base + 2, base + 3]);
        }
    }
}

/// Splits a glyph's contours into filled outlines and holes by nesting depth.
fn classify(contours: Vec<Vec<Vec2>>) -> Vec<Contour> {
    let holes: Vec<bool> = contours
        .iter()
        .enumerate()
        .map(|(i, contour)| {
            let depth = contours
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && point_in_polygon(contour[0], other))
                .count();
            depth % 2 == 1
        })
        .collect();

    contours
        .into_iter()
        .zip(holes)
        .map(|(points, hole)| Contour::new(points, hole))
        .collect()
}

/// Builds the centred text mesh for `text` set in `font`.
pub fn text_mesh(font: &Font, text: &str, options: &TextOptions) -> Result<Mesh, TextError> {
    let layers = layers(options);
    let (Some(&front), Some(&back)) = (layers.first(), layers.last()) else {
        return Ok(Mesh::new(Vec::new(), Vec::new(), Vec::new()));
    };

    let mut builder = MeshBuilder::default();
    for glyph in font.outlines(text, options.size, options.curve_segments)? {
        let contours = classify(glyph.contours);
        builder.cap(&contours, front.1, front.0, Vec3::NEG_Z)?;
        builder.cap(&contours, back.1, back.0, Vec3::Z)?;
        for contour in &contours {
            for pair in layers.windows(2) {
                builder.wall(contour, pair[0], pair[1]);
            }
        }
    }

    let mut mesh = Mesh::new(builder.positions, builder.normals, builder.indices);
    mesh.center();
    Ok(mesh)
}
