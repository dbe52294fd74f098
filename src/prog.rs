// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The icon bytecode emitter.
//!
//! A program starts with four viewbox coordinates (no opcode), followed
//! by opcodes with run-length-packed point vectors, and ends with `STOP`.

use crate::color::Color;
use crate::coord::write_coord;
use crate::geom::{Point, Transform};
use crate::path::{PathCmd, PathCommand};
use crate::Error;

/// End of an icon program.
pub const OP_STOP: u8 = 0x00;
/// Solid fill with an explicit RGBA colour (four bytes follow).
pub const OP_FILL_RGBA: u8 = 0x01;
/// Solid fill indexed into palette row 0 (one byte follows).
pub const OP_FILL_INDEX: u8 = 0x02;
/// Move beginning the first subpath (one point follows).
pub const OP_MOVE_BEGIN: u8 = 0x70;
/// Move beginning a subsequent subpath (one point follows).
pub const OP_MOVE_CONT: u8 = 0x71;
/// Line run base. The low five bits hold the point count minus one.
pub const OP_LINE: u8 = 0x80;
/// Cubic Bézier run base. The low nibble holds the segment count minus one.
pub const OP_CUBIC: u8 = 0xA0;
/// Quadratic Bézier run base. The low nibble holds the segment count minus one.
pub const OP_QUAD: u8 = 0xB0;

/// Max points per line opcode.
const MAX_LINE_RUN: usize = 0x20;
/// Max segments per curve opcode.
const MAX_CURVE_RUN: usize = 0x10;

/// A compiled icon variant.
#[derive(Clone, PartialEq, Debug)]
pub struct ProgImage {
    /// Variant width in pixels.
    pub width: u16,

    /// Variant height in pixels.
    pub height: u16,

    /// The icon program bytes.
    pub data: Vec<u8>,
}

impl ProgImage {
    /// Returns the variant's pixel area.
    #[inline]
    pub fn pixel_area(&self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }
}

/// The icon program memory.
///
/// Collects opcodes and coordinates. Path points are mapped through the
/// transform installed by [`ProgMem::begin_path`] and encoded with the
/// configured precision tolerance.
#[derive(Debug)]
pub struct ProgMem {
    buf: Vec<u8>,

    /// Coordinate precision tolerance.
    precision: f64,

    /// Set once the current path has emitted its first subpath.
    in_path: bool,

    ts: Transform,
}

impl ProgMem {
    /// Creates an empty program with the specified coordinate precision.
    pub fn new(precision: f64) -> Self {
        ProgMem {
            buf: Vec::new(),
            precision,
            in_path: false,
            ts: Transform::default(),
        }
    }

    /// Returns the collected program bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.buf
    }

    /// Emits the `STOP` opcode.
    pub fn stop(&mut self) {
        self.byte(OP_STOP);
    }

    /// Emits a solid fill with an explicit colour.
    pub fn fill_rgba(&mut self, c: Color) {
        self.byte(OP_FILL_RGBA);
        self.byte(c.r);
        self.byte(c.g);
        self.byte(c.b);
        self.byte(c.a);
    }

    /// Emits a solid fill referencing palette row 0.
    pub fn fill_index(&mut self, index: u8) {
        self.byte(OP_FILL_INDEX);
        self.byte(index);
    }

    /// Emits the viewbox corners. Must come before any opcode.
    pub fn viewbox(&mut self, left: f64, top: f64, right: f64, bottom: f64) {
        self.coord(left);
        self.coord(top);
        self.coord(right);
        self.coord(bottom);
    }

    /// Starts a new path with the specified point transform.
    pub fn begin_path(&mut self, ts: Transform) {
        self.ts = ts;
        self.in_path = false;
    }

    /// Emits a path command.
    pub fn path_cmd(&mut self, cmd: &PathCmd) -> Result<(), Error> {
        let n = cmd.points.len();
        match cmd.cmd {
            PathCommand::MoveTo => {
                if n != 1 {
                    return Err(Error::InvalidBytecode(format!(
                        "move op with {} points",
                        n
                    )));
                }
                let op = if self.in_path { OP_MOVE_CONT } else { OP_MOVE_BEGIN };
                self.in_path = true;
                self.byte(op);
                self.points(&cmd.points);
                Ok(())
            }

            PathCommand::LineTo => {
                if n == 0 {
                    return Err(Error::InvalidBytecode("empty line op".to_string()));
                }
                self.add_op(OP_LINE, MAX_LINE_RUN, 1, &cmd.points);
                Ok(())
            }

            PathCommand::CurveTo => {
                if n == 0 || n % 3 != 0 {
                    return Err(Error::InvalidBytecode(format!(
                        "empty or invalid cubic bezier op length {}",
                        n
                    )));
                }
                self.add_op(OP_CUBIC, MAX_CURVE_RUN, 3, &cmd.points);
                Ok(())
            }

            PathCommand::QuadTo => {
                if n == 0 || n % 2 != 0 {
                    return Err(Error::InvalidBytecode(format!(
                        "empty or invalid quadratic bezier op length {}",
                        n
                    )));
                }
                self.add_op(OP_QUAD, MAX_CURVE_RUN, 2, &cmd.points);
                Ok(())
            }
        }
    }

    /// Emits a run of points, splitting it over several opcodes
    /// when it exceeds the largest legal run.
    fn add_op(&mut self, baseop: u8, max_rep: usize, mul: usize, points: &[Point]) {
        let mut points = points;
        while points.len() > mul * max_rep {
            self.byte(baseop + (max_rep - 1) as u8);
            self.points(&points[..mul * max_rep]);
            points = &points[mul * max_rep..];
        }
        self.byte(baseop + (points.len() / mul - 1) as u8);
        self.points(points);
    }

    fn points(&mut self, points: &[Point]) {
        for p in points {
            let (x, y) = self.ts.apply(p.x, p.y);
            self.coord(x);
            self.coord(y);
        }
    }

    fn coord(&mut self, v: f64) {
        write_coord(&mut self.buf, v, self.precision);
    }

    fn byte(&mut self, b: u8) {
        self.buf.push(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> PathCmd {
        PathCmd {
            cmd: PathCommand::LineTo,
            points: (0..n).map(|i| Point::new(i as f64, 0.0)).collect(),
        }
    }

    #[test]
    fn move_begin_then_continue() {
        let mut mem = ProgMem::new(1e-4);
        mem.begin_path(Transform::default());
        let m = PathCmd {
            cmd: PathCommand::MoveTo,
            points: vec![Point::new(1.0, 2.0)],
        };
        mem.path_cmd(&m).unwrap();
        mem.path_cmd(&m).unwrap();
        mem.begin_path(Transform::default());
        mem.path_cmd(&m).unwrap();

        let data = mem.into_data();
        assert_eq!(data[0], OP_MOVE_BEGIN);
        assert_eq!(data[3], OP_MOVE_CONT);
        assert_eq!(data[6], OP_MOVE_BEGIN);
    }

    #[test]
    fn line_run_splits_at_thirty_two() {
        let mut mem = ProgMem::new(1e-4);
        mem.begin_path(Transform::default());
        mem.path_cmd(&lines(33)).unwrap();

        let data = mem.into_data();
        assert_eq!(data[0], OP_LINE + 31);
        // 32 points, one byte per coordinate.
        assert_eq!(data[1 + 64], OP_LINE + 0);
        assert_eq!(data.len(), 1 + 64 + 1 + 2);
    }

    #[test]
    fn full_runs_have_no_empty_tail() {
        let mut mem = ProgMem::new(1e-4);
        mem.begin_path(Transform::default());
        mem.path_cmd(&lines(32)).unwrap();

        let data = mem.into_data();
        assert_eq!(data[0], OP_LINE + 31);
        assert_eq!(data.len(), 1 + 64);
    }

    #[test]
    fn curve_run_counts_segments() {
        let mut mem = ProgMem::new(1e-4);
        mem.begin_path(Transform::default());
        let c = PathCmd {
            cmd: PathCommand::CurveTo,
            points: (0..6).map(|i| Point::new(i as f64, 1.0)).collect(),
        };
        mem.path_cmd(&c).unwrap();

        let data = mem.into_data();
        // Two segments.
        assert_eq!(data[0], OP_CUBIC + 1);
    }

    #[test]
    fn transform_applies_to_path_points() {
        let mut mem = ProgMem::new(1e-4);
        let mut ts = Transform::default();
        ts.translate(10.0, 0.0);
        mem.begin_path(ts);
        mem.path_cmd(&PathCmd {
            cmd: PathCommand::MoveTo,
            points: vec![Point::new(1.0, 1.0)],
        })
        .unwrap();

        let data = mem.into_data();
        assert_eq!(data[0], OP_MOVE_BEGIN);
        // x = 11 in tier 1.
        assert_eq!(data[1], ((11 + 64) << 1) | 0x01);
    }

    #[test]
    fn malformed_commands_are_rejected() {
        let mut mem = ProgMem::new(1e-4);
        mem.begin_path(Transform::default());
        assert!(mem
            .path_cmd(&PathCmd { cmd: PathCommand::MoveTo, points: Vec::new() })
            .is_err());
        assert!(mem
            .path_cmd(&PathCmd { cmd: PathCommand::LineTo, points: Vec::new() })
            .is_err());
        assert!(mem
            .path_cmd(&PathCmd {
                cmd: PathCommand::CurveTo,
                points: vec![Point::new(0.0, 0.0)],
            })
            .is_err());
        assert!(mem
            .path_cmd(&PathCmd {
                cmd: PathCommand::QuadTo,
                points: vec![Point::new(0.0, 0.0)],
            })
            .is_err());
    }
}
