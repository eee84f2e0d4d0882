use glam::{Vec2, Vec3};

use crate::graphics::Rgb;

/// Edge function used in rasterization
pub fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Calculates the unit normal of a triangle, or `None` when it is degenerate
pub fn calculate_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    (b - a).cross(c - a).try_normalize()
}

/// Maps a view-space normal to a colour the way a normal material does
pub fn normal_color(normal: Vec3) -> Rgb {
    let n = normal.normalize_or_zero() * 0.5 + Vec3::splat(0.5);
    [
        (n.x * 255.0).clamp(0.0, 255.0) as u8,
        (n.y * 255.0).clamp(0.0, 255.0) as u8,
        (n.z * 255.0).clamp(0.0, 255.0) as u8,
    ]
}

/// Shoelace area; positive for counter-clockwise contours
pub fn signed_area(points: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

/// Even-odd ray cast
pub fn point_in_polygon(p: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn area_sign_follows_winding() {
        let mut points = square();
        assert!((signed_area(&points) - 1.0).abs() < 1e-6);
        points.reverse();
        assert!((signed_area(&points) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn point_in_polygon_square() {
        let points = square();
        assert!(point_in_polygon(Vec2::new(0.5, 0.5), &points));
        assert!(!point_in_polygon(Vec2::new(1.5, 0.5), &points));
        assert!(!point_in_polygon(Vec2::new(0.5, -0.1), &points));
    }

    #[test]
    fn normal_color_of_facing_normal() {
        assert_eq!(normal_color(Vec3::Z), [127, 127, 255]);
        assert_eq!(normal_color(Vec3::ZERO), [127, 127, 127]);
    }

    #[test]
    fn degenerate_triangle_has_no_normal() {
        assert!(calculate_normal(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
        assert_eq!(
            calculate_normal(Vec3::ZERO, Vec3::X, Vec3::Y),
            Some(Vec3::Z)
        );
    }
}
