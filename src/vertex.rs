use glam::{Vec2, Vec3};

/// Projected vertex with screen position, depth, and view-space normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub screen_position: Vec2,
    /// Normalized device depth in [-1, 1]
    pub depth: f32,
    pub normal: Vec3,
}
