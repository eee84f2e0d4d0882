use std::f32::consts::TAU;

use glam::Vec3;

use crate::aabb::Aabb3;

/// Indexed triangle geometry with per-vertex normals.
///
/// The local bounding box is computed when the mesh is built and kept in sync
/// by [`Mesh::translate`].
#[derive(Debug, Clone)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    bounds: Aabb3,
}

/// Torus parameters: ring radius, tube radius and segment counts.
#[derive(Debug, Clone, Copy)]
pub struct TorusOptions {
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
}

impl Default for TorusOptions {
    fn default() -> Self {
        TorusOptions {
            radius: 0.3,
            tube: 0.2,
            radial_segments: 32,
            tubular_segments: 64,
        }
    }
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Self {
        debug_assert_eq!(positions.len(), normals.len());
        let bounds = Aabb3::from_points(positions.iter().copied());
        Mesh {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    /// Torus in the XY plane around the Z axis.
    pub fn torus(options: &TorusOptions) -> Self {
        let radial = options.radial_segments.max(2);
        let tubular = options.tubular_segments.max(3);
        let capacity = ((radial + 1) * (tubular + 1)) as usize;
        let mut positions = Vec::with_capacity(capacity);
        let mut normals = Vec::with_capacity(capacity);

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let ring = options.radius + options.tube * v.cos();
                let position = Vec3::new(ring * u.cos(), ring * u.sin(), options.tube * v.sin());
                let center = Vec3::new(options.radius * u.cos(), options.radius * u.sin(), 0.0);
                positions.push(position);
                normals.push((position - center).normalize_or_zero());
            }
        }

        let mut indices = Vec::with_capacity((radial * tubular * 6) as usize);
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = (tubular + 1) * j + i - 1;
                let b = (tubular + 1) * (j - 1) + i - 1;
                let c = (tubular + 1) * (j - 1) + i;
                let d = (tubular + 1) * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Mesh::new(positions, normals, indices)
    }

    pub fn bounding_box(&self) -> Aabb3 {
        self.bounds
    }

    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
        self.bounds = self.bounds.translated(offset);
    }

    /// Moves the geometry so its bounding box is centred on the origin
    pub fn center(&mut self) {
        let offset = -self.bounds.center();
        self.translate(offset);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torus_bounds_match_radii() {
        let torus = Mesh::torus(&TorusOptions::default());
        let bounds = torus.bounding_box();
        assert!((bounds.max.x - 0.5).abs() < 1e-5);
        assert!((bounds.min.x + 0.5).abs() < 1e-5);
        assert!((bounds.max.y - 0.5).abs() < 1e-3);
        assert!((bounds.max.z - 0.2).abs() < 1e-3);
        assert!((bounds.min.z + 0.2).abs() < 1e-3);
    }

    #[test]
    fn torus_topology() {
        let torus = Mesh::torus(&TorusOptions::default());
        assert_eq!(torus.positions.len(), 33 * 65);
        assert_eq!(torus.triangle_count(), 32 * 64 * 2);
        assert!(torus
            .indices
            .iter()
            .all(|&i| (i as usize) < torus.positions.len()));
    }

    #[test]
    fn torus_normals_point_away_from_ring() {
        let torus = Mesh::torus(&TorusOptions::default());
        for (p, n) in torus.positions.iter().zip(&torus.normals) {
            assert!((n.length() - 1.0).abs() < 1e-4);
            let ring = Vec3::new(p.x, p.y, 0.0).normalize() * 0.3;
            assert!((*p - ring).dot(*n) > 0.0);
        }
    }

    #[test]
    fn center_moves_box_to_origin() {
        let mut mesh = Mesh::new(
            vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 5.0, 2.0), Vec3::new(2.0, 3.0, 1.5)],
            vec![Vec3::Z; 3],
            vec![0, 1, 2],
        );
        mesh.center();
        let bounds = mesh.bounding_box();
        assert!(bounds.center().length() < 1e-6);
        assert_eq!(bounds.size(), Vec3::new(2.0, 4.0, 1.0));
        assert_eq!(mesh.positions[0], Vec3::new(-1.0, -2.0, -0.5));
        assert_eq!(mesh.triangles().next(), Some([0, 1, 2]));
    }
}
