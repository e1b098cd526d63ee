//! Small geometric helpers shared by the builders and the renderers.

use glam::{DVec2, dvec2};

use crate::projection::Projection;

/// Corners of an axis-aligned rectangle, counter-clockwise from `min`
pub fn rect_points(a: DVec2, b: DVec2) -> Vec<DVec2> {
    let (min, max) = (a.min(b), a.max(b));
    vec![min, dvec2(max.x, min.y), max, dvec2(min.x, max.y)]
}

/// Corners of a rectangle of size `2·half` around `centre`
pub fn centred_rect(centre: DVec2, half: DVec2) -> Vec<DVec2> {
    rect_points(centre - half, centre + half)
}

/// Skew-rotate world points about `centre`, then project them.
pub fn plan_points(proj: &Projection, points: &[DVec2], centre: DVec2) -> Vec<DVec2> {
    points
        .iter()
        .map(|&p| {
            let r = proj.rotate(p, centre);
            proj.pt(r.x, r.y)
        })
        .collect()
}

/// Project world points without rotation
pub fn project(proj: &Projection, points: &[DVec2]) -> Vec<DVec2> {
    points.iter().map(|p| proj.pt(p.x, p.y)).collect()
}

/// Half the plan height of a `width × length` rectangle (length along the
/// face) once rotated by an angle with the given sine and cosine.
pub fn rotated_half_height(width: f64, length: f64, sin: f64, cos: f64) -> f64 {
    (length * cos.abs() + width * sin.abs()) / 2.0
}

/// Straight strokes filling `boundary` at `angle_deg`, `spacing` apart.
///
/// Back-ends without a native fill (or with one we do not trust across
/// viewers) draw these instead of a pattern. Works for any simple polygon.
pub fn hatch_strokes(boundary: &[DVec2], angle_deg: f64, spacing: f64) -> Vec<(DVec2, DVec2)> {
    if boundary.len() < 3 || !(spacing > 0.0) {
        return Vec::new();
    }
    // Work in a frame where the strokes are horizontal.
    let rot = DVec2::from_angle(angle_deg.to_radians());
    let inv = dvec2(rot.x, -rot.y);
    let local: Vec<DVec2> = boundary.iter().map(|&p| inv.rotate(p)).collect();
    let (lo, hi) = local
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));

    let mut strokes = Vec::new();
    let mut y = lo + spacing / 2.0;
    while y < hi {
        let mut xs: Vec<f64> = Vec::new();
        for i in 0..local.len() {
            let p = local[i];
            let q = local[(i + 1) % local.len()];
            if (p.y <= y && y < q.y) || (q.y <= y && y < p.y) {
                xs.push(p.x + (y - p.y) * (q.x - p.x) / (q.y - p.y));
            }
        }
        xs.sort_by(|a, b| a.total_cmp(b));
        for pair in xs.chunks_exact(2) {
            strokes.push((rot.rotate(dvec2(pair[0], y)), rot.rotate(dvec2(pair[1], y))));
        }
        y += spacing;
    }
    strokes
}
