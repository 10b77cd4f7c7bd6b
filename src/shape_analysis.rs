// src/shape_analysis.rs - Bounding boxes and exact minimal enclosing circles

use nalgebra::{Matrix2, Point2, Vector2};

use crate::boundary::Boundary;
use crate::errors::{GrainError, Result};
use crate::geometry::{BoundingBox, Candidate, EnclosingCircle, Point};

/// Slack allowed when testing containment during the incremental search
const CONTAINMENT_EPSILON: f64 = 1e-7;

/// Axis-aligned box over the points, touching the extreme point on each side
pub fn calculate_bounding_box(points: &[Point]) -> Result<BoundingBox> {
    let first = points
        .first()
        .ok_or_else(|| GrainError::Geometry("cannot bound an empty point set".to_string()))?;

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Ok(BoundingBox {
        top_left: Point::new(min_x, min_y),
        bottom_right: Point::new(max_x, max_y),
        size: ((max_x - min_x) as u32, (max_y - min_y) as u32),
    })
}

#[derive(Debug, Clone, Copy)]
struct Disk {
    center: Point2<f64>,
    radius: f64,
}

impl Disk {
    fn contains(&self, p: &Point2<f64>) -> bool {
        nalgebra::distance(&self.center, p) <= self.radius + CONTAINMENT_EPSILON
    }

    fn from_diameter(a: &Point2<f64>, b: &Point2<f64>) -> Self {
        Self {
            center: nalgebra::center(a, b),
            radius: nalgebra::distance(a, b) / 2.0,
        }
    }

    /// Smallest disk with all three points on or inside its rim
    fn from_three(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Self {
        let ab = b - a;
        let ac = c - a;
        let m = Matrix2::new(ab.x, ab.y, ac.x, ac.y);

        if m.determinant().abs() > f64::EPSILON {
            let rhs = Vector2::new(ab.norm_squared() / 2.0, ac.norm_squared() / 2.0);
            if let Some(offset) = m.lu().solve(&rhs) {
                let center = *a + offset;
                return Self {
                    center,
                    radius: nalgebra::distance(&center, a),
                };
            }
        }

        // Collinear: the outermost pair spans the disk
        [(a, b), (a, c), (b, c)]
            .into_iter()
            .map(|(p, q)| Self::from_diameter(p, q))
            .fold(Self::from_diameter(a, a), |best, d| if d.radius > best.radius { d } else { best })
    }
}

/// Exact smallest circle containing every point (incremental Welzl construction)
pub fn minimal_enclosing_circle(points: &[Point]) -> Result<EnclosingCircle> {
    let pts: Vec<Point2<f64>> = points
        .iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect();

    let first = pts
        .first()
        .ok_or_else(|| GrainError::Geometry("cannot enclose an empty point set".to_string()))?;

    let mut disk = Disk { center: *first, radius: 0.0 };
    for i in 1..pts.len() {
        if disk.contains(&pts[i]) {
            continue;
        }
        disk = Disk { center: pts[i], radius: 0.0 };
        for j in 0..i {
            if disk.contains(&pts[j]) {
                continue;
            }
            disk = Disk::from_diameter(&pts[i], &pts[j]);
            for k in 0..j {
                if !disk.contains(&pts[k]) {
                    disk = Disk::from_three(&pts[i], &pts[j], &pts[k]);
                }
            }
        }
    }

    let circle = EnclosingCircle {
        center: (disk.center.x, disk.center.y),
        radius: disk.radius,
    };
    debug_assert!(points.iter().all(|p| circle.contains(*p, 1e-6)));

    Ok(circle)
}

/// Fit one boundary; fewer than three points is a geometry error
pub fn fit_candidate(boundary: &Boundary) -> Result<Candidate> {
    if boundary.points.len() < 3 {
        return Err(GrainError::Geometry(format!(
            "boundary {} has {} points, at least 3 are required",
            boundary.id,
            boundary.points.len()
        )));
    }

    let bbox = calculate_bounding_box(&boundary.points)?;
    let circle = minimal_enclosing_circle(&boundary.points)?.rounded();

    Ok(Candidate {
        boundary_id: boundary.id,
        circle,
        bbox,
    })
}

/// Fit every boundary, preserving input order
pub fn fit_candidates(boundaries: &[Boundary]) -> Result<Vec<Candidate>> {
    boundaries.iter().map(fit_candidate).collect()
}
