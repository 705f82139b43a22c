use glam::Vec2;

/// Quads thinner than this (in squared pixels) are treated as edge-on
const DEGENERATE_AREA: f32 = 1e-3;

/// Signed area of a polygon (positive when counter-clockwise)
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

/// Point-in-convex-quad test, winding agnostic, edges inclusive
pub fn quad_contains(quad: &[Vec2; 4], point: Vec2) -> bool {
    if signed_area(quad).abs() < DEGENERATE_AREA {
        return false;
    }

    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let cross = (b - a).perp_dot(point - a);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}
