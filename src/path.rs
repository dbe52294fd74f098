// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An SVG path data decoder.
//!
//! Expands the full path grammar (`M/L/H/V/C/S/Q/T/A/Z`, absolute and
//! relative) into a list of absolute `M`, `L`, `C` and `Q` commands.
//! Elliptic arcs are converted into cubic Bézier runs.

use crate::arc::arc_to_bezier;
use crate::geom::Point;
use crate::Error;

/// A path command tag.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PathCommand {
    MoveTo,
    LineTo,
    CurveTo,
    QuadTo,
}

/// A path command with its absolute coordinates.
///
/// Consecutive commands of the same kind are coalesced, so `points` holds:
///
/// - exactly one point for `MoveTo`
/// - one or more points for `LineTo`
/// - a positive multiple of three points for `CurveTo`
/// - a positive multiple of two points for `QuadTo`
#[derive(Clone, PartialEq, Debug)]
pub struct PathCmd {
    /// The command tag.
    pub cmd: PathCommand,

    /// Command coordinates, always absolute.
    pub points: Vec<Point>,
}

/// Decodes an SVG path `d` attribute value.
pub fn parse_path(text: &str) -> Result<Vec<PathCmd>, Error> {
    let mut d = PathDecoder {
        text,
        pos: 0,
        first: Point::new(0.0, 0.0),
        last: Point::new(0.0, 0.0),
        lastc: Point::new(0.0, 0.0),
        lastq: Point::new(0.0, 0.0),
        cmds: Vec::new(),
    };
    d.run()?;
    Ok(d.cmds)
}

struct PathDecoder<'a> {
    text: &'a str,
    pos: usize,

    /// First point of the current subpath, restored on `Z`.
    first: Point,
    /// The current point.
    last: Point,
    /// Last cubic control point, for smooth `S`.
    lastc: Point,
    /// Last quadratic control point, for smooth `T`.
    lastq: Point,

    cmds: Vec<PathCmd>,
}

impl<'a> PathDecoder<'a> {
    fn run(&mut self) -> Result<(), Error> {
        loop {
            self.skip_spaces();
            if self.at_end() {
                return Ok(());
            }
            self.step()?;
        }
    }

    fn step(&mut self) -> Result<(), Error> {
        let (cmd, rel) = self.next_cmd()?;
        match cmd {
            b'M' => {
                let pts = self.points()?;
                let p0 = pts[0];
                if rel {
                    self.last.x += p0.x;
                    self.last.y += p0.y;
                } else {
                    self.last = p0;
                }
                self.first = self.last;
                let first = self.last;
                self.add_cmd(PathCommand::MoveTo, vec![first]);
                // Extra coordinate pairs after a moveto are lineto's.
                self.line(&pts[1..], rel);
            }

            b'L' => {
                let pts = self.points()?;
                self.line(&pts, rel);
            }

            b'H' => {
                for n in self.numbers()? {
                    if rel {
                        self.last.x += n;
                    } else {
                        self.last.x = n;
                    }
                    let p = self.last;
                    self.add_cmd(PathCommand::LineTo, vec![p]);
                }
            }

            b'V' => {
                for n in self.numbers()? {
                    if rel {
                        self.last.y += n;
                    } else {
                        self.last.y = n;
                    }
                    let p = self.last;
                    self.add_cmd(PathCommand::LineTo, vec![p]);
                }
            }

            b'C' => {
                let start = self.pos;
                let pts = self.points()?;
                self.cubic_bezier(start, &pts, rel)?;
            }

            b'S' => {
                let start = self.pos;
                let pts = self.points()?;
                if pts.len() < 2 {
                    return Err(Error::MalformedInput(format!(
                        "invalid smooth cubic bezier at position {}",
                        start
                    )));
                }

                // Reflection of the previous cubic control point.
                let p1 = Point::new(
                    2.0 * self.last.x - self.lastc.x,
                    2.0 * self.last.y - self.lastc.y,
                );
                let (p2, p3) = if rel {
                    (
                        Point::new(self.last.x + pts[0].x, self.last.y + pts[0].y),
                        Point::new(self.last.x + pts[1].x, self.last.y + pts[1].y),
                    )
                } else {
                    (pts[0], pts[1])
                };

                self.add_cmd(PathCommand::CurveTo, vec![p1, p2, p3]);
                self.cubic_bezier(start, &pts[2..], rel)?;
            }

            b'Q' => {
                let start = self.pos;
                let pts = self.points()?;
                self.quad_bezier(start, &pts, rel)?;
            }

            b'T' => {
                let start = self.pos;
                let pts = self.points()?;

                // Reflection of the previous quadratic control point.
                let p1 = Point::new(
                    2.0 * self.last.x - self.lastq.x,
                    2.0 * self.last.y - self.lastq.y,
                );
                let p2 = if rel {
                    Point::new(self.last.x + pts[0].x, self.last.y + pts[0].y)
                } else {
                    pts[0]
                };

                self.add_cmd(PathCommand::QuadTo, vec![p1, p2]);
                self.quad_bezier(start, &pts[1..], rel)?;
            }

            b'A' => loop {
                let rx = self.number()?;
                self.separator();
                let ry = self.number()?;
                self.separator();
                let angle = self.number()?;
                self.separator();
                let large_arc = self.number()? != 0.0;
                self.separator();
                let sweep = self.number()? != 0.0;
                self.separator();
                let x = self.number()?;
                self.separator();
                let y = self.number()?;

                let end = if rel {
                    Point::new(self.last.x + x, self.last.y + y)
                } else {
                    Point::new(x, y)
                };

                let pts =
                    arc_to_bezier(self.last, end, Point::new(rx, ry), angle, large_arc, sweep);
                if pts.is_empty() {
                    // A degenerate arc draws nothing, but the cursor
                    // still moves to its endpoint.
                    self.last = end;
                } else {
                    self.add_cmd(PathCommand::CurveTo, pts);
                }
                self.lastc = self.last;
                self.lastq = self.last;

                if !self.is_number_ahead() {
                    break;
                }
            },

            b'Z' => {
                self.last = self.first;
                self.lastc = self.last;
                self.lastq = self.last;
            }

            _ => unreachable!(),
        }

        Ok(())
    }

    /// Appends a command, extending the previous one when the tags match.
    fn add_cmd(&mut self, cmd: PathCommand, points: Vec<Point>) {
        self.last = *points.last().unwrap();
        self.lastc = match cmd {
            PathCommand::CurveTo => points[points.len() - 2],
            _ => self.last,
        };
        self.lastq = match cmd {
            PathCommand::QuadTo => points[points.len() - 2],
            _ => self.last,
        };

        match self.cmds.last_mut() {
            Some(prev) if prev.cmd == cmd && cmd != PathCommand::MoveTo => {
                prev.points.extend(points);
            }
            _ => self.cmds.push(PathCmd { cmd, points }),
        }
    }

    fn line(&mut self, pts: &[Point], rel: bool) {
        for p in pts {
            if rel {
                self.last.x += p.x;
                self.last.y += p.y;
            } else {
                self.last = *p;
            }
            let p = self.last;
            self.add_cmd(PathCommand::LineTo, vec![p]);
        }
    }

    fn cubic_bezier(&mut self, start: usize, pts: &[Point], rel: bool) -> Result<(), Error> {
        if pts.len() % 3 != 0 {
            return Err(Error::MalformedInput(format!(
                "invalid number of cubic bezier coordinates at position {}",
                start
            )));
        }

        for triple in pts.chunks(3) {
            let (p1, p2, p3) = if rel {
                (
                    Point::new(self.last.x + triple[0].x, self.last.y + triple[0].y),
                    Point::new(self.last.x + triple[1].x, self.last.y + triple[1].y),
                    Point::new(self.last.x + triple[2].x, self.last.y + triple[2].y),
                )
            } else {
                (triple[0], triple[1], triple[2])
            };
            self.add_cmd(PathCommand::CurveTo, vec![p1, p2, p3]);
        }

        Ok(())
    }

    fn quad_bezier(&mut self, start: usize, pts: &[Point], rel: bool) -> Result<(), Error> {
        if pts.len() % 2 != 0 {
            return Err(Error::MalformedInput(format!(
                "invalid number of quadratic bezier coordinates at position {}",
                start
            )));
        }

        for pair in pts.chunks(2) {
            let (p1, p2) = if rel {
                (
                    Point::new(self.last.x + pair[0].x, self.last.y + pair[0].y),
                    Point::new(self.last.x + pair[1].x, self.last.y + pair[1].y),
                )
            } else {
                (pair[0], pair[1])
            };
            self.add_cmd(PathCommand::QuadTo, vec![p1, p2]);
        }

        Ok(())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn byte(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).cloned()
    }

    fn skip_spaces(&mut self) {
        while self.byte().map_or(false, |c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consumes whitespace and at most one comma.
    fn separator(&mut self) {
        self.skip_spaces();
        if self.byte() == Some(b',') {
            self.pos += 1;
        }
    }

    fn is_number_ahead(&mut self) -> bool {
        self.skip_spaces();
        matches!(self.byte(), Some(b'0'..=b'9') | Some(b'.') | Some(b'-') | Some(b'+'))
    }

    fn next_cmd(&mut self) -> Result<(u8, bool), Error> {
        let c = match self.byte() {
            Some(c) => c,
            None => {
                return Err(Error::MalformedInput(
                    "unexpected end of path data".to_string(),
                ));
            }
        };

        if !b"MmLlHhVvCcSsQqTtAaZz".contains(&c) {
            return Err(Error::MalformedInput(format!(
                "unexpected command '{}' at position {}",
                c as char, self.pos
            )));
        }

        self.pos += 1;
        Ok((c.to_ascii_uppercase(), c.is_ascii_lowercase()))
    }

    fn number(&mut self) -> Result<f64, Error> {
        self.skip_spaces();

        let start = self.pos;
        if matches!(self.byte(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        while matches!(self.byte(), Some(b'0'..=b'9') | Some(b'.')) {
            self.pos += 1;
        }
        if matches!(self.byte(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.byte(), Some(b'-') | Some(b'+')) {
                self.pos += 1;
            }
            while matches!(self.byte(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }

        if start == self.pos {
            return Err(Error::MalformedInput(format!(
                "expected number at position {}",
                start
            )));
        }

        self.text[start..self.pos].parse().map_err(|_| {
            Error::MalformedInput(format!("invalid number at position {}", start))
        })
    }

    fn point(&mut self) -> Result<Point, Error> {
        let x = self.number()?;
        self.separator();
        let y = self.number()?;
        Ok(Point::new(x, y))
    }

    /// One or more coordinate pairs.
    fn points(&mut self) -> Result<Vec<Point>, Error> {
        let mut r = vec![self.point()?];
        loop {
            self.separator();
            if !self.is_number_ahead() {
                return Ok(r);
            }
            r.push(self.point()?);
        }
    }

    /// One or more plain numbers.
    fn numbers(&mut self) -> Result<Vec<f64>, Error> {
        let mut r = vec![self.number()?];
        loop {
            self.separator();
            if !self.is_number_ahead() {
                return Ok(r);
            }
            r.push(self.number()?);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn rect_path() {
        let cmds = parse_path("M0,0 L16,0 L16,16 L0,16 Z").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].cmd, PathCommand::MoveTo);
        assert_eq!(cmds[0].points, vec![pt(0.0, 0.0)]);
        assert_eq!(cmds[1].cmd, PathCommand::LineTo);
        assert_eq!(
            cmds[1].points,
            vec![pt(16.0, 0.0), pt(16.0, 16.0), pt(0.0, 16.0)]
        );
    }

    #[test]
    fn relative_h_and_v() {
        let cmds = parse_path("M10 10 h 5 v 5 z").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].points, vec![pt(10.0, 10.0)]);
        assert_eq!(cmds[1].points, vec![pt(15.0, 10.0), pt(15.0, 15.0)]);
    }

    #[test]
    fn repeated_relative_h_moves_the_cursor() {
        let cmds = parse_path("M0,0 h 5 5 5").unwrap();
        assert_eq!(
            cmds[1].points,
            vec![pt(5.0, 0.0), pt(10.0, 0.0), pt(15.0, 0.0)]
        );
    }

    #[test]
    fn moveto_with_extra_pairs_emits_lines() {
        let cmds = parse_path("M1,1 2,2 3,3").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].points, vec![pt(1.0, 1.0)]);
        assert_eq!(cmds[1].cmd, PathCommand::LineTo);
        assert_eq!(cmds[1].points, vec![pt(2.0, 2.0), pt(3.0, 3.0)]);

        let cmds = parse_path("m1,1 1,1 1,1").unwrap();
        assert_eq!(cmds[0].points, vec![pt(1.0, 1.0)]);
        assert_eq!(cmds[1].points, vec![pt(2.0, 2.0), pt(3.0, 3.0)]);
    }

    #[test]
    fn close_restores_the_subpath_start() {
        let cmds = parse_path("M1,2 L4,2 4,4 Z l1,1").unwrap();
        // No line is emitted for `Z` itself; the following line coalesces
        // into the previous run and starts over from the subpath start.
        assert_eq!(cmds.len(), 2);
        assert_eq!(
            cmds[1].points,
            vec![pt(4.0, 2.0), pt(4.0, 4.0), pt(2.0, 3.0)]
        );
    }

    #[test]
    fn smooth_cubic_reflects_the_control_point() {
        let cmds = parse_path("M0,0 C1,2 3,2 4,0 S7,-2 8,0").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1].cmd, PathCommand::CurveTo);
        assert_eq!(cmds[1].points.len(), 6);
        // 2*last - lastc = 2*(4,0) - (3,2)
        assert_eq!(cmds[1].points[3], pt(5.0, -2.0));
    }

    #[test]
    fn smooth_cubic_without_cubic_reflects_the_current_point() {
        let cmds = parse_path("M1,1 S3,3 4,1").unwrap();
        assert_eq!(cmds[1].cmd, PathCommand::CurveTo);
        assert_eq!(cmds[1].points[0], pt(1.0, 1.0));
    }

    #[test]
    fn smooth_quad_reflects_the_control_point() {
        let cmds = parse_path("M0,0 Q2,4 4,0 T8,0").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1].cmd, PathCommand::QuadTo);
        assert_eq!(cmds[1].points.len(), 4);
        // 2*last - lastq = 2*(4,0) - (2,4)
        assert_eq!(cmds[1].points[2], pt(6.0, -4.0));
    }

    #[test]
    fn arc_becomes_cubic_run() {
        let cmds = parse_path("M0,20 A 50,20 0 1 0 -50,0").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1].cmd, PathCommand::CurveTo);
        assert_eq!(cmds[1].points.len(), 9);
        let end = cmds[1].points[8];
        assert!((end.x - -50.0).abs() < 1e-5);
        assert!((end.y - 0.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_arc_still_moves_the_cursor() {
        let cmds = parse_path("M0,0 A 0,5 0 0 0 10,10 L10,0").unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1].cmd, PathCommand::LineTo);
        assert_eq!(cmds[1].points, vec![pt(10.0, 0.0)]);
    }

    #[test]
    fn multiplicity_invariants() {
        let cmds =
            parse_path("M0,0 L1,1 2,2 C1,1 2,2 3,3 4,4 5,5 6,6 Q1,1 2,2 3,3 4,4").unwrap();
        for c in &cmds {
            match c.cmd {
                PathCommand::MoveTo => assert_eq!(c.points.len(), 1),
                PathCommand::LineTo => assert!(!c.points.is_empty()),
                PathCommand::CurveTo => {
                    assert!(!c.points.is_empty() && c.points.len() % 3 == 0)
                }
                PathCommand::QuadTo => {
                    assert!(!c.points.is_empty() && c.points.len() % 2 == 0)
                }
            }
        }
    }

    #[test]
    fn adjacent_negative_numbers() {
        let cmds = parse_path("M10-5L-1-2").unwrap();
        assert_eq!(cmds[0].points, vec![pt(10.0, -5.0)]);
        assert_eq!(cmds[1].points, vec![pt(-1.0, -2.0)]);
    }

    #[test]
    fn exponent_numbers() {
        let cmds = parse_path("M1e1,2E-1").unwrap();
        assert_eq!(cmds[0].points, vec![pt(10.0, 0.2)]);
    }

    #[test]
    fn errors() {
        assert!(parse_path("X5,5").is_err());
        assert!(parse_path("M").is_err());
        assert!(parse_path("M1,1 C1,2").is_err());
        assert!(parse_path("M1,1 Q1,2 3,4 5,6").is_err());
        assert!(parse_path("M1,.2.3").is_err());
        assert!(parse_path("M0,0 A 50,20 0 1").is_err());
    }
}
