// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Elliptic arc to cubic Bézier conversion, following the SVG 1.1
//! "arc implementation notes".

use std::f64::consts::{PI, TAU};

use crate::geom::Point;

// For a 90° circular arc, a constant as derived from
// http://spencermortensen.com/articles/bezier-circle
const QUARTER_ARC_FACTOR: f64 = 0.551915024494;

/// Converts an elliptic arc from `p` to `c` into cubic Bézier segments.
///
/// Returns three points per segment: two control points and an endpoint.
/// The implicit start of the first segment is `p`. Returns an empty list
/// for degenerate arcs (zero radius or coincident endpoints).
pub fn arc_to_bezier(
    p: Point,
    c: Point,
    r: Point,
    x_axis_rotation: f64,
    large_arc: bool,
    sweep: bool,
) -> Vec<Point> {
    let (px, py) = (p.x, p.y);
    let (cx, cy) = (c.x, c.y);
    let mut rx = r.x.abs();
    let mut ry = r.y.abs();

    if rx == 0.0 || ry == 0.0 {
        return Vec::new();
    }

    let (sin_phi, cos_phi) = (x_axis_rotation * TAU / 360.0).sin_cos();

    let pxp = cos_phi * (px - cx) / 2.0 + sin_phi * (py - cy) / 2.0;
    let pyp = -sin_phi * (px - cx) / 2.0 + cos_phi * (py - cy) / 2.0;

    if pxp == 0.0 && pyp == 0.0 {
        return Vec::new();
    }

    let lambda = sq(pxp) / sq(rx) + sq(pyp) / sq(ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let (center_x, center_y, mut theta1, mut dtheta) =
        arc_center(px, py, cx, cy, rx, ry, large_arc, sweep, sin_phi, cos_phi, pxp, pyp);

    // If `dtheta` is 90.0000000001 degrees, `ratio` evaluates to
    // 1.0000000001 and the arc gets an extra, useless segment.
    // Round to 1.0 when the ratio is close enough.
    let mut ratio = dtheta.abs() / (TAU / 4.0);
    if (1.0 - ratio).abs() < 1e-7 {
        ratio = 1.0;
    }

    let nseg = (ratio.ceil() as usize).max(1);
    dtheta /= nseg as f64;

    let mut pts = Vec::with_capacity(nseg * 3);
    for _ in 0..nseg {
        for q in approx_unit_arc(theta1, dtheta) {
            pts.push(map_to_ellipse(q, rx, ry, cos_phi, sin_phi, center_x, center_y));
        }
        theta1 += dtheta;
    }

    pts
}

#[allow(clippy::too_many_arguments)]
fn arc_center(
    px: f64,
    py: f64,
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    large_arc: bool,
    sweep: bool,
    sin_phi: f64,
    cos_phi: f64,
    pxp: f64,
    pyp: f64,
) -> (f64, f64, f64, f64) {
    let rxsq = sq(rx);
    let rysq = sq(ry);
    let pxpsq = sq(pxp);
    let pypsq = sq(pyp);

    let mut radicand = rxsq * rysq - rxsq * pypsq - rysq * pxpsq;
    if radicand < 0.0 {
        // Floating error can push the radicand slightly below zero.
        radicand = 0.0;
    } else {
        radicand /= rxsq * pypsq + rysq * pxpsq;
        radicand = radicand.sqrt();
    }

    if large_arc == sweep {
        radicand = -radicand;
    }

    let center_xp = radicand * rx / ry * pyp;
    let center_yp = radicand * -ry / rx * pxp;

    let center_x = cos_phi * center_xp - sin_phi * center_yp + (px + cx) / 2.0;
    let center_y = sin_phi * center_xp + cos_phi * center_yp + (py + cy) / 2.0;

    let vx1 = (pxp - center_xp) / rx;
    let vy1 = (pyp - center_yp) / ry;
    let vx2 = (-pxp - center_xp) / rx;
    let vy2 = (-pyp - center_yp) / ry;

    let theta1 = vector_angle(1.0, 0.0, vx1, vy1);
    let mut dtheta = vector_angle(vx1, vy1, vx2, vy2);

    if !sweep && dtheta > 0.0 {
        dtheta -= TAU;
    }
    if sweep && dtheta < 0.0 {
        dtheta += TAU;
    }

    (center_x, center_y, theta1, dtheta)
}

/// The signed angle between two vectors.
fn vector_angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
    let sign = if ux * vy - uy * vx < 0.0 { -1.0 } else { 1.0 };
    let dot = (ux * vx + uy * vy).clamp(-1.0, 1.0);
    sign * dot.acos()
}

/// One cubic segment approximating the unit-circle arc
/// from `theta1` over `dtheta`.
fn approx_unit_arc(theta1: f64, dtheta: f64) -> [Point; 3] {
    let a = if dtheta == PI / 2.0 {
        QUARTER_ARC_FACTOR
    } else if dtheta == -PI / 2.0 {
        -QUARTER_ARC_FACTOR
    } else {
        let at = (dtheta / 2.0).tan();
        dtheta.sin() * ((4.0 + 3.0 * at * at).sqrt() - 1.0) / 3.0
    };

    let x1 = theta1.cos();
    let y1 = theta1.sin();
    let x2 = (theta1 + dtheta).cos();
    let y2 = (theta1 + dtheta).sin();

    [
        Point::new(x1 - y1 * a, y1 + x1 * a),
        Point::new(x2 + y2 * a, y2 - x2 * a),
        Point::new(x2, y2),
    ]
}

fn map_to_ellipse(
    p: Point,
    rx: f64,
    ry: f64,
    cos_phi: f64,
    sin_phi: f64,
    center_x: f64,
    center_y: f64,
) -> Point {
    let x = p.x * rx;
    let y = p.y * ry;

    let xp = cos_phi * x - sin_phi * y;
    let yp = sin_phi * x + cos_phi * y;

    Point::new(xp + center_x, yp + center_y)
}

fn sq(v: f64) -> f64 {
    v * v
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestArc {
        p1: (f64, f64),
        r: (f64, f64),
        angle: f64,
        large_arc: bool,
        sweep: bool,
        p2: (f64, f64),
    }

    fn arc(z: &TestArc) -> Vec<Point> {
        arc_to_bezier(
            Point::new(z.p1.0, z.p1.1),
            Point::new(z.p2.0, z.p2.1),
            Point::new(z.r.0, z.r.1),
            z.angle,
            z.large_arc,
            z.sweep,
        )
    }

    fn cases() -> Vec<TestArc> {
        vec![
            TestArc { p1: (0.0, 20.0), r: (50.0, 20.0), angle: 0.0, large_arc: false, sweep: false, p2: (-50.0, 0.0) },
            TestArc { p1: (0.0, 20.0), r: (50.0, 20.0), angle: 0.0, large_arc: true, sweep: false, p2: (-50.0, 0.0) },
            TestArc { p1: (0.0, 20.0), r: (50.0, 20.0), angle: 0.0, large_arc: true, sweep: true, p2: (-50.0, 0.0) },
            TestArc { p1: (0.0, 20.0), r: (50.0, 20.0), angle: 0.0, large_arc: false, sweep: true, p2: (-50.0, 0.0) },
            TestArc { p1: (0.0, 20.0), r: (50.0, 20.0), angle: 10.0, large_arc: false, sweep: false, p2: (-50.0, 0.0) },
            TestArc { p1: (0.0, 20.0), r: (50.0, 20.0), angle: 20.0, large_arc: false, sweep: false, p2: (-50.0, 0.0) },
            TestArc { p1: (0.0, 20.0), r: (50.0, 20.0), angle: 30.0, large_arc: false, sweep: false, p2: (-50.0, 0.0) },
            // The four quarters of a circle.
            TestArc { p1: (29.4, 15.5), r: (13.9, 13.9), angle: 0.0, large_arc: false, sweep: true, p2: (15.5, 29.4) },
            TestArc { p1: (15.5, 29.4), r: (13.9, 13.9), angle: 0.0, large_arc: false, sweep: true, p2: (1.6, 15.5) },
            TestArc { p1: (1.6, 15.5), r: (13.9, 13.9), angle: 0.0, large_arc: false, sweep: true, p2: (15.5, 1.6) },
            TestArc { p1: (15.5, 1.6), r: (13.9, 13.9), angle: 0.0, large_arc: false, sweep: true, p2: (29.4, 15.5) },
        ]
    }

    #[test]
    fn endpoint_is_reached() {
        for z in cases() {
            let pts = arc(&z);
            assert!(!pts.is_empty());
            let end = pts[pts.len() - 1];
            assert!((end.x - z.p2.0).abs() < 1e-5, "{} != {}", end.x, z.p2.0);
            assert!((end.y - z.p2.1).abs() < 1e-5, "{} != {}", end.y, z.p2.1);
        }
    }

    #[test]
    fn segment_count_bounds() {
        for z in cases() {
            let pts = arc(&z);
            assert_eq!(pts.len() % 3, 0);
            let nseg = pts.len() / 3;
            assert!((1..=4).contains(&nseg), "{} segments", nseg);
        }
    }

    #[test]
    fn quarter_circle_is_one_segment() {
        let z = TestArc {
            p1: (29.4, 15.5),
            r: (13.9, 13.9),
            angle: 0.0,
            large_arc: false,
            sweep: true,
            p2: (15.5, 29.4),
        };
        assert_eq!(arc(&z).len(), 3);
    }

    #[test]
    fn degenerate_arcs() {
        let z = TestArc {
            p1: (0.0, 0.0),
            r: (0.0, 10.0),
            angle: 0.0,
            large_arc: false,
            sweep: false,
            p2: (10.0, 10.0),
        };
        assert!(arc(&z).is_empty());

        let z = TestArc {
            p1: (5.0, 5.0),
            r: (10.0, 10.0),
            angle: 0.0,
            large_arc: false,
            sweep: false,
            p2: (5.0, 5.0),
        };
        assert!(arc(&z).is_empty());
    }
}
