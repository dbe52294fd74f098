// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use float_cmp::ApproxEqUlps;

use crate::Error;

/// A trait for fuzzy/approximate equality comparisons of float numbers.
pub trait FuzzyEq<Rhs: ?Sized = Self> {
    /// Returns `true` if values are approximately equal.
    fn fuzzy_eq(&self, other: &Rhs) -> bool;

    /// Returns `true` if values are not approximately equal.
    #[inline]
    fn fuzzy_ne(&self, other: &Rhs) -> bool {
        !self.fuzzy_eq(other)
    }
}

/// A trait for fuzzy/approximate comparisons of float numbers.
pub trait FuzzyZero: FuzzyEq {
    /// Returns `true` if the number is approximately zero.
    fn is_fuzzy_zero(&self) -> bool;
}

impl FuzzyEq for f64 {
    #[inline]
    fn fuzzy_eq(&self, other: &f64) -> bool {
        self.approx_eq_ulps(other, 4)
    }
}

impl FuzzyZero for f64 {
    #[inline]
    fn is_fuzzy_zero(&self) -> bool {
        self.fuzzy_eq(&0.0)
    }
}

/// A 2D point representation.
#[derive(Clone, Copy, PartialEq)]
pub struct Point {
    /// Position along the X-axis.
    pub x: f64,

    /// Position along the Y-axis.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Point({} {})", self.x, self.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A 2D affine transform representation.
///
/// The six values form the matrix below; the third row is implicit:
///
/// ```text
/// a c e
/// b d f
/// 0 0 1
/// ```
#[derive(Clone, Copy, Debug)]
#[allow(missing_docs)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    #[inline]
    fn default() -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Transform {
    /// Constructs a new transform.
    #[inline]
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Transform { a, b, c, d, e, f }
    }

    /// Constructs a new translate transform.
    #[inline]
    pub fn new_translate(x: f64, y: f64) -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Constructs a new scale transform.
    #[inline]
    pub fn new_scale(sx: f64, sy: f64) -> Self {
        Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Constructs a new rotate transform.
    ///
    /// `angle` is in degrees.
    #[inline]
    pub fn new_rotate(angle: f64) -> Self {
        let v = angle.to_radians();
        let a = v.cos();
        let b = v.sin();
        let c = -b;
        let d = a;
        Transform::new(a, b, c, d, 0.0, 0.0)
    }

    /// Translates the current transform.
    #[inline]
    pub fn translate(&mut self, x: f64, y: f64) {
        self.append(&Transform::new_translate(x, y));
    }

    /// Scales the current transform.
    #[inline]
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.append(&Transform::new_scale(sx, sy));
    }

    /// Rotates the current transform.
    #[inline]
    pub fn rotate(&mut self, angle: f64) {
        self.append(&Transform::new_rotate(angle));
    }

    /// Rotates the current transform at the specified position.
    #[inline]
    pub fn rotate_at(&mut self, angle: f64, x: f64, y: f64) {
        self.translate(x, y);
        self.rotate(angle);
        self.translate(-x, -y);
    }

    /// Appends transform to the current transform.
    ///
    /// The appended transform applies to a point first.
    #[inline]
    pub fn append(&mut self, other: &Transform) {
        let ts = multiply(self, other);
        self.a = ts.a;
        self.b = ts.b;
        self.c = ts.c;
        self.d = ts.d;
        self.e = ts.e;
        self.f = ts.f;
    }

    /// Returns `true` if the transform is default, aka `(1 0 0 1 0 0)`.
    pub fn is_default(&self) -> bool {
        self.a.fuzzy_eq(&1.0)
            && self.b.fuzzy_eq(&0.0)
            && self.c.fuzzy_eq(&0.0)
            && self.d.fuzzy_eq(&1.0)
            && self.e.fuzzy_eq(&0.0)
            && self.f.fuzzy_eq(&0.0)
    }

    /// Applies the transform to the selected coordinates.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Applies the transform to the selected point.
    #[inline]
    pub fn map_point(&self, p: Point) -> Point {
        let (x, y) = self.apply(p.x, p.y);
        Point::new(x, y)
    }

    /// Parses a transform from an SVG `transform` attribute value.
    ///
    /// Supports `matrix`, `translate`, `rotate` and `scale` with
    /// whitespace- and comma-separated arguments.
    pub fn from_svg_attr(text: &str) -> Result<Self, Error> {
        let mut ts = Transform::default();
        let mut scanner = TransformScanner::new(text);
        while let Some((name, start)) = scanner.next_function()? {
            let args = scanner.arguments()?;
            match name {
                "matrix" => {
                    if args.len() != 6 {
                        return Err(arity_error(name, "6", args.len(), start));
                    }
                    ts.append(&Transform::new(
                        args[0], args[1], args[2], args[3], args[4], args[5],
                    ));
                }
                "translate" => {
                    if args.len() != 1 && args.len() != 2 {
                        return Err(arity_error(name, "1 or 2", args.len(), start));
                    }
                    let cy = args.get(1).cloned().unwrap_or(0.0);
                    ts.translate(args[0], cy);
                }
                "rotate" => {
                    if args.len() != 1 && args.len() != 3 {
                        return Err(arity_error(name, "1 or 3", args.len(), start));
                    }
                    if args.len() == 3 {
                        ts.rotate_at(args[0], args[1], args[2]);
                    } else {
                        ts.rotate(args[0]);
                    }
                }
                "scale" => {
                    if args.len() != 1 && args.len() != 2 {
                        return Err(arity_error(name, "1 or 2", args.len(), start));
                    }
                    let sy = args.get(1).cloned().unwrap_or(args[0]);
                    ts.scale(args[0], sy);
                }
                _ => {
                    return Err(Error::MalformedInput(format!(
                        "unknown transform function '{}' at position {}",
                        name, start
                    )));
                }
            }
        }

        Ok(ts)
    }
}

fn multiply(a: &Transform, b: &Transform) -> Transform {
    Transform {
        a: a.a * b.a + a.c * b.b,
        b: a.b * b.a + a.d * b.b,
        c: a.a * b.c + a.c * b.d,
        d: a.b * b.c + a.d * b.d,
        e: a.a * b.e + a.c * b.f + a.e,
        f: a.b * b.e + a.d * b.f + a.f,
    }
}

fn arity_error(name: &str, expected: &str, got: usize, pos: usize) -> Error {
    Error::MalformedInput(format!(
        "'{}' at position {} must have {} arguments, got {}",
        name, pos, expected, got
    ))
}

/// A scanner over `fn-name(arg, arg ...)` groups.
struct TransformScanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> TransformScanner<'a> {
    fn new(text: &'a str) -> Self {
        TransformScanner { text, pos: 0 }
    }

    fn byte(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).cloned()
    }

    fn skip_spaces(&mut self) {
        while self.byte().map_or(false, |c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Scans the next function name and its opening paren.
    ///
    /// Returns the name and its start position, or `None` at the end.
    fn next_function(&mut self) -> Result<Option<(&'a str, usize)>, Error> {
        self.skip_spaces();
        if self.byte().is_none() {
            return Ok(None);
        }

        let start = self.pos;
        while self.byte().map_or(false, |c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }

        if start == self.pos {
            return Err(Error::MalformedInput(format!(
                "expected transform function name at position {}",
                start
            )));
        }

        let name = &self.text[start..self.pos];

        self.skip_spaces();
        if self.byte() != Some(b'(') {
            return Err(Error::MalformedInput(format!(
                "expected '(' after transform function '{}' at position {}",
                name, start
            )));
        }
        self.pos += 1;

        Ok(Some((name, start)))
    }

    /// Scans the argument list up to and including the closing paren.
    fn arguments(&mut self) -> Result<Vec<f64>, Error> {
        let mut args = Vec::new();
        loop {
            self.skip_spaces();
            match self.byte() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(args);
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {
                    let start = self.pos;
                    while self
                        .byte()
                        .map_or(false, |c| !c.is_ascii_whitespace() && c != b',' && c != b')')
                    {
                        self.pos += 1;
                    }
                    let arg = &self.text[start..self.pos];
                    let n = arg.parse::<f64>().map_err(|_| {
                        Error::MalformedInput(format!(
                            "expected transform function argument at position {}, got '{}'",
                            start, arg
                        ))
                    })?;
                    args.push(n);
                }
                None => {
                    return Err(Error::MalformedInput(format!(
                        "expected ')' at position {}",
                        self.pos
                    )));
                }
            }
        }
    }
}
