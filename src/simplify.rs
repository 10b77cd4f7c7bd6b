// src/simplify.rs - Douglas-Peucker simplification of closed outlines

use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point as CurvePoint;

use crate::geometry::Point;

/// Simplify one open chain; the chain's last point is left off the result
fn simplify_without_end(chain: &[Point], epsilon: f64) -> Vec<Point> {
    let curve: Vec<CurvePoint<i32>> = chain.iter().map(|&p| p.into()).collect();
    approximate_polygon_dp(&curve, epsilon, true)
        .into_iter()
        .map(Point::from)
        .collect()
}

/// Simplify a closed outline so no dropped vertex lies farther than
/// `tolerance` from the line of the edge that replaced it.
/// The result is implicitly closed: its last vertex connects to its first.
pub fn simplify_closed(points: &[Point], tolerance: f64) -> Vec<Point> {
    let mut ring: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if ring.last() != Some(&p) {
            ring.push(p);
        }
    }
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return ring;
    }

    // Split the loop at the vertex farthest from the first one
    let origin = ring[0];
    let dist2 = |p: &Point| {
        let (dx, dy) = ((p.x - origin.x) as i64, (p.y - origin.y) as i64);
        dx * dx + dy * dy
    };
    let mut split = 0;
    for (idx, p) in ring.iter().enumerate().skip(1) {
        if dist2(p) > dist2(&ring[split]) {
            split = idx;
        }
    }
    if split == 0 {
        return vec![origin];
    }

    // approximate_polygon_dp rejects a zero epsilon; the smallest positive one
    // still drops only vertices lying exactly on the chord
    let epsilon = tolerance.max(f64::MIN_POSITIVE);

    let mut second_half: Vec<Point> = ring[split..].to_vec();
    second_half.push(origin);

    let mut result = simplify_without_end(&ring[..=split], epsilon);
    result.extend(simplify_without_end(&second_half, epsilon));
    result
}
