// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The icon pack disassembler.
//!
//! Prints a human-readable trace of a pack: palette tables and one
//! program dump per icon image. Structural errors are reported inside
//! the trace rather than returned; only write failures are.

use std::io::Write;

use crate::color::Color;
use crate::coord::read_coord;
use crate::pack::{self, ICON_MAGIC, MAX_SECTION_SIZE, PACK_MAGIC, PALETTE_MAGIC};
use crate::prog::{
    OP_CUBIC, OP_FILL_INDEX, OP_FILL_RGBA, OP_LINE, OP_MOVE_BEGIN, OP_MOVE_CONT, OP_QUAD,
    OP_STOP,
};

/// Disassembles a whole pack into `w`.
pub fn dump_pack<W: Write>(data: &[u8], w: &mut W) -> std::io::Result<()> {
    if data.len() < 8 || data[0..4] != PACK_MAGIC {
        writeln!(w, "# invalid header {}", hex_bytes(&data[..data.len().min(8)]))?;
        return Ok(());
    }

    let nicons = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    writeln!(w, "# {} icons", nicons)?;

    let mut pal0: Vec<Color> = Vec::new();
    let mut pos = 8;

    loop {
        if pos == data.len() {
            writeln!(w, "# EOF")?;
            return Ok(());
        }
        if pos + 8 > data.len() {
            writeln!(w, "# truncated section header")?;
            return Ok(());
        }

        let magic = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
        let nbytes =
            u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                as usize;
        if nbytes > MAX_SECTION_SIZE {
            writeln!(w, "# section size too large")?;
            return Ok(());
        }
        if pos + 8 + nbytes > data.len() {
            writeln!(w, "# unexpected end of file")?;
            return Ok(());
        }

        let payload = &data[pos + 8..pos + 8 + nbytes];
        pos += 8 + nbytes;

        match magic {
            PALETTE_MAGIC => {
                let (index, pal) = match pack::parse_palette(payload) {
                    Ok(v) => v,
                    Err(e) => {
                        writeln!(w, "# palette data ERROR {}", e)?;
                        return Ok(());
                    }
                };

                writeln!(w, "PALETTE {} # {} entries", index, pal.len())?;
                for (i, c) in pal.iter().enumerate() {
                    writeln!(
                        w,
                        "{:02x} {:02x} {:02x} {:02x}  RGBA {:3}: {}",
                        c.r,
                        c.g,
                        c.b,
                        c.a,
                        i,
                        color_str(*c)
                    )?;
                }
                if index == 0 {
                    pal0 = pal;
                }
                writeln!(w)?;
            }

            ICON_MAGIC => {
                let elem = match pack::parse_icon(payload) {
                    Ok(v) => v,
                    Err(e) => {
                        writeln!(w, "# icon data ERROR {}", e)?;
                        return Ok(());
                    }
                };

                for im in &elem.images {
                    writeln!(w, "ICON \"{}\" {}×{}", elem.name, im.width, im.height)?;
                    dump_prog(w, &pal0, &im.data)?;
                    writeln!(w)?;
                }
            }

            _ => {
                writeln!(w, "# unrecognised section '{}'", pack::magic_str(&magic))?;
                writeln!(w)?;
            }
        }
    }
}

/// Disassembles one icon program into `w`.
pub fn dump_prog<W: Write>(w: &mut W, palette: &[Color], data: &[u8]) -> std::io::Result<()> {
    let mut r = ProgReader {
        out: w,
        data,
        pal: palette,
        pos: 0,
        invalid: false,
    };

    writeln!(r.out, "# viewbox:")?;
    r.point()?;
    r.point()?;

    while r.pos < r.data.len() {
        r.step()?;
    }

    Ok(())
}

struct ProgReader<'a, W> {
    out: &'a mut W,
    data: &'a [u8],
    pal: &'a [Color],
    pos: usize,

    /// Set after an unrecognised opcode; the rest of the program is
    /// hex-dumped without interpretation.
    invalid: bool,
}

impl<W: Write> ProgReader<'_, W> {
    fn byte(&mut self) -> u8 {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                b
            }
            None => 0,
        }
    }

    fn coord(&mut self) -> f64 {
        match read_coord(&self.data[self.pos..]) {
            Some((v, n)) => {
                self.pos += n;
                v
            }
            None => {
                self.pos = self.data.len();
                0.0
            }
        }
    }

    fn point(&mut self) -> std::io::Result<()> {
        let s = self.pos;
        let x = self.coord();
        let y = self.coord();
        let dump = hex_bytes(&self.data[s..self.pos]);
        writeln!(self.out, "{:<24}   {:8.4}  {:8.4}", dump, x, y)
    }

    fn step(&mut self) -> std::io::Result<()> {
        if !self.invalid {
            return self.step_cmd();
        }

        let e = (self.pos + 8).min(self.data.len());
        writeln!(self.out, "{}", hex_bytes(&self.data[self.pos..e]))?;
        self.pos = e;
        Ok(())
    }

    fn step_cmd(&mut self) -> std::io::Result<()> {
        let s = self.pos;
        let op = self.byte();

        let mut ncoords = 0;
        let cmd = match op {
            OP_STOP => "STOP".to_string(),

            OP_FILL_RGBA => {
                let c = Color::new(self.byte(), self.byte(), self.byte(), self.byte());
                format!("SOLIDFILL-rgba {}", color_str(c))
            }

            OP_FILL_INDEX => {
                let i = usize::from(self.byte());
                let c = match self.pal.get(i) {
                    Some(&c) => c,
                    None => {
                        writeln!(self.out, "# INVALID palette index")?;
                        Color::TRANSPARENT
                    }
                };
                format!("SOLIDFILL-idx {} → {}", i, color_str(c))
            }

            OP_MOVE_BEGIN => {
                ncoords = 1;
                "M-begin".to_string()
            }
            OP_MOVE_CONT => {
                ncoords = 1;
                "M-cont".to_string()
            }

            0x80..=0x9F => {
                ncoords = usize::from(op - OP_LINE) + 1;
                format!("L {}", ncoords)
            }

            0xA0..=0xAF => {
                let nseg = usize::from(op - OP_CUBIC) + 1;
                ncoords = 3 * nseg;
                format!("C {}", nseg)
            }

            0xB0..=0xBF => {
                let nseg = usize::from(op - OP_QUAD) + 1;
                ncoords = 2 * nseg;
                format!("Q {}", nseg)
            }

            _ => {
                self.invalid = true;
                "INVALID".to_string()
            }
        };

        let dump = hex_bytes(&self.data[s..self.pos]);
        writeln!(self.out, "{:<24}  {}", dump, cmd)?;

        for _ in 0..ncoords {
            self.point()?;
        }

        Ok(())
    }
}

fn color_str(c: Color) -> String {
    if c.a != 255 {
        format!(
            "rgba({:.4},{:.4},{:.4},{:.4})",
            f64::from(c.r) / 255.0,
            f64::from(c.g) / 255.0,
            f64::from(c.b) / 255.0,
            f64::from(c.a) / 255.0
        )
    } else {
        format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
    }
}

fn hex_bytes(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::IconPack;
    use crate::prog::ProgImage;

    fn dump(pack: &IconPack) -> String {
        let mut buf = Vec::new();
        pack.write_to(&mut buf).unwrap();
        let mut out = Vec::new();
        dump_pack(&buf, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn trace_structure() {
        let mut pack = IconPack::new();
        pack.palettes = vec![vec![Color::new(255, 0, 0, 255)]];
        pack.add_icon(
            "dot",
            vec![ProgImage {
                width: 16,
                height: 16,
                data: vec![
                    0x81, 0x81, 0xA1, 0xA1, // viewbox
                    0x02, 0x00, // fill idx 0
                    0x70, 0x81, 0x81, // M 0,0
                    0x81, // L x2
                    0xA1, 0x81, 0xA1, 0xA1, // two points
                    0x00, // stop
                ],
            }],
        );

        let text = dump(&pack);
        assert!(text.starts_with("# 1 icons\n"));
        assert!(text.contains("PALETTE 0 # 1 entries"));
        assert!(text.contains("SOLIDFILL-idx 0 → #ff0000"));
        assert!(text.contains("ICON \"dot\" 16×16"));
        assert!(text.contains("# viewbox:"));
        assert!(text.contains("M-begin"));
        assert!(text.contains("L 2"));
        assert!(text.contains("STOP"));
        assert!(text.ends_with("# EOF\n"));
    }

    #[test]
    fn invalid_opcode_switches_to_hex_dump() {
        let mut pack = IconPack::new();
        pack.add_icon(
            "bad",
            vec![ProgImage {
                width: 1,
                height: 1,
                data: vec![
                    0x81, 0x81, 0x81, 0x81, // viewbox
                    0x42, // not an opcode
                    1, 2, 3, 4, 5, 6, 7, 8, 9,
                ],
            }],
        );

        let text = dump(&pack);
        assert!(text.contains("INVALID"));
        // The rest is dumped in 8-byte chunks, not interpreted.
        assert!(text.contains("01 02 03 04 05 06 07 08"));
        assert!(text.contains("\n09\n"));
    }

    #[test]
    fn bad_header() {
        let mut out = Vec::new();
        dump_pack(b"garbage!", &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("# invalid header"));
    }
}
