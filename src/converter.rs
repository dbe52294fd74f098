// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The SVG tree walker.
//!
//! Compiles one preprocessed SVG document into an icon program.
//! The document is expected to be reduced to `<svg>`, `<g>` and `<path>`
//! elements with solid fills; everything else is ignored.

use std::collections::HashMap;

use crate::color::Color;
use crate::geom::Transform;
use crate::options::Options;
use crate::palette::{ColorStats, MAX_PALETTE_COLORS};
use crate::path::{self, PathCommand};
use crate::prog::{ProgImage, ProgMem};
use crate::Error;

/// Runs the colour-collection pass over one SVG document.
///
/// Compiles the document the same way [`compile`] does, but throws the
/// program away and only records the resolved fill colours in `stats`.
pub fn collect_colors(text: &str, opts: &Options, stats: &mut ColorStats) -> Result<(), Error> {
    convert(text, opts, &opts.palette, &HashMap::new(), Some(stats))?;
    Ok(())
}

/// Compiles one SVG document into an icon program.
///
/// `palette` is the resolved authoritative palette row; fills found in it
/// are emitted as palette indices, everything else as explicit RGBA.
pub fn compile(text: &str, opts: &Options, palette: &[Color]) -> Result<ProgImage, Error> {
    let colormap = palette
        .iter()
        .take(MAX_PALETTE_COLORS)
        .enumerate()
        .map(|(i, &c)| (c, i as u8))
        .collect();
    convert(text, opts, palette, &colormap, None)
}

fn convert(
    text: &str,
    opts: &Options,
    palette: &[Color],
    colormap: &HashMap<Color, u8>,
    stats: Option<&mut ColorStats>,
) -> Result<ProgImage, Error> {
    let doc = roxmltree::Document::parse(text)?;

    let mut conv = Converter {
        opts,
        palette,
        colormap,
        stats,
        mem: ProgMem::new(opts.epsilon),
        width: 0,
        height: 0,
        has_svg: false,
    };

    conv.node(doc.root_element(), Transform::default(), Color::TRANSPARENT)?;

    if !conv.has_svg {
        return Err(Error::MalformedInput("missing 'svg' element".to_string()));
    }

    conv.mem.stop();
    Ok(ProgImage {
        width: conv.width,
        height: conv.height,
        data: conv.mem.into_data(),
    })
}

struct Converter<'a> {
    opts: &'a Options,
    palette: &'a [Color],
    colormap: &'a HashMap<Color, u8>,
    stats: Option<&'a mut ColorStats>,

    mem: ProgMem,
    width: u16,
    height: u16,
    has_svg: bool,
}

impl Converter<'_> {
    /// Walks one node and its subtree.
    ///
    /// `ts` and `fill` carry the inherited state; passing them by value
    /// down the recursion is the push/pop discipline.
    fn node(&mut self, node: roxmltree::Node, ts: Transform, fill: Color) -> Result<(), Error> {
        if is_hidden(node) {
            return Ok(());
        }

        if node.has_attribute("clip-path") {
            log::warn!("'clip-path' is not supported and will be ignored");
        }

        let mut ts = ts;
        if let Some(value) = node.attribute("transform") {
            ts.append(&Transform::from_svg_attr(value)?);
        }

        let mut fill = fill;
        if let Some(value) = presentation_attr(node, "fill") {
            if value == "none" {
                fill = Color::TRANSPARENT;
            } else if let Some(c) = Color::from_hex(value) {
                fill = c;
            } else {
                log::warn!("unsupported fill '{}' is treated as undefined", value);
            }
        }

        match node.tag_name().name() {
            "svg" => self.svg(node)?,
            "path" => self.path(node, ts, fill)?,
            _ => {}
        }

        for child in node.children() {
            if child.is_element() {
                self.node(child, ts, fill)?;
            }
        }

        Ok(())
    }

    fn svg(&mut self, node: roxmltree::Node) -> Result<(), Error> {
        let ws = node.attribute("width").unwrap_or("");
        self.width = parse_dimension(ws)
            .ok_or_else(|| Error::MalformedInput(format!("error parsing width '{}'", ws)))?;

        let hs = node.attribute("height").unwrap_or("");
        self.height = parse_dimension(hs)
            .ok_or_else(|| Error::MalformedInput(format!("error parsing height '{}'", hs)))?;

        let vb = node.attribute("viewBox").unwrap_or("");
        let nums: Vec<f64> = vb
            .split_whitespace()
            .map(|t| t.parse().map_err(|_| ()))
            .collect::<Result<_, ()>>()
            .map_err(|_| Error::MalformedInput(format!("error parsing viewBox '{}'", vb)))?;
        if nums.len() != 4 {
            return Err(Error::MalformedInput(format!(
                "error parsing viewBox '{}'",
                vb
            )));
        }

        self.mem
            .viewbox(nums[0], nums[1], nums[0] + nums[2], nums[1] + nums[3]);
        self.has_svg = true;
        Ok(())
    }

    fn path(&mut self, node: roxmltree::Node, ts: Transform, fill: Color) -> Result<(), Error> {
        if fill.a == 0 {
            log::debug!("skipping invisible path");
            return Ok(());
        }

        let cmds = path::parse_path(node.attribute("d").unwrap_or(""))?;

        if cmds.is_empty() {
            return Ok(());
        }
        if cmds.len() == 1 && cmds[0].cmd == PathCommand::MoveTo {
            return Ok(());
        }

        self.fill(fill);

        self.mem.begin_path(ts);
        for cmd in &cmds {
            self.mem.path_cmd(cmd)?;
        }

        Ok(())
    }

    /// Resolves and emits a fill colour.
    fn fill(&mut self, c: Color) {
        let mut c = c;

        if self.opts.color_magnet > 0.0 {
            let dm_square = self.opts.color_magnet * self.opts.color_magnet;
            for &p in self.palette {
                let dr = i32::from(c.r) - i32::from(p.r);
                let dg = i32::from(c.g) - i32::from(p.g);
                let db = i32::from(c.b) - i32::from(p.b);
                if f64::from(dr * dr + dg * dg + db * db) < dm_square {
                    c = p;
                    break;
                }
            }
        }

        if let Some(stats) = self.stats.as_mut() {
            *stats.entry(c).or_insert(0) += 1;
        }

        match self.colormap.get(&c) {
            Some(&i) => self.mem.fill_index(i),
            None => self.mem.fill_rgba(c),
        }
    }
}

/// Resolves a presentation attribute.
///
/// A declaration in the `style` attribute takes precedence over
/// the attribute of the same name, per CSS.
fn presentation_attr<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    if let Some(style) = node.attribute("style") {
        for declaration in simplecss::DeclarationTokenizer::from(style) {
            if declaration.name == name {
                return Some(declaration.value);
            }
        }
    }

    node.attribute(name)
}

fn is_hidden(node: roxmltree::Node) -> bool {
    presentation_attr(node, "display") == Some("none")
}

fn parse_dimension(s: &str) -> Option<u16> {
    let s = s.trim();
    let s = s.strip_suffix("px").unwrap_or(s);
    match s.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}
