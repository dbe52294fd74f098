// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The icon pack container.
//!
//! A little-endian chunked format:
//!
//! ```text
//! "icpk" | u32 icon count
//! section...
//! ```
//!
//! where each section is a four-byte ASCII magic, a `u32` payload length
//! and the payload. `PALT` sections hold palette rows, `ICON` sections
//! hold an icon's image variants. Readers skip unknown magics.

use std::io::{Read, Write};

use crate::color::Color;
use crate::prog::ProgImage;
use crate::Error;

/// The container header magic.
pub const PACK_MAGIC: [u8; 4] = *b"icpk";
/// The palette section magic.
pub const PALETTE_MAGIC: [u8; 4] = *b"PALT";
/// The icon section magic.
pub const ICON_MAGIC: [u8; 4] = *b"ICON";

/// Sections above this size are refused by both the writer and the reader.
pub const MAX_SECTION_SIZE: usize = 1 << 20;

/// An icon with its image variants.
#[derive(Clone, PartialEq, Debug)]
pub struct PackElem {
    /// The icon name. At most 255 bytes survive serialisation.
    pub name: String,

    /// Image variants, largest first.
    pub images: Vec<ProgImage>,
}

/// An icon pack: the palette rows and the icons.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct IconPack {
    /// Palette rows. Row 0 is the one icon programs index into.
    pub palettes: Vec<Vec<Color>>,

    /// The packed icons.
    pub elems: Vec<PackElem>,
}

impl IconPack {
    /// Creates an empty pack.
    pub fn new() -> Self {
        IconPack::default()
    }

    /// Adds an icon, sorting its variants by decreasing pixel area.
    pub fn add_icon(&mut self, name: &str, mut images: Vec<ProgImage>) {
        images.sort_by(|a, b| b.pixel_area().cmp(&a.pixel_area()));
        self.elems.push(PackElem {
            name: name.to_string(),
            images,
        });
    }

    /// Writes the pack: the header, the palette rows, then the icons
    /// in lexicographic name order.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), Error> {
        w.write_all(&PACK_MAGIC)?;
        w.write_all(&(self.elems.len() as u32).to_le_bytes())?;

        for (i, row) in self.palettes.iter().enumerate() {
            write_section(w, PALETTE_MAGIC, &palette_bytes(i, row)?)?;
        }

        let mut order: Vec<&PackElem> = self.elems.iter().collect();
        order.sort_by(|a, b| a.name.cmp(&b.name));

        for elem in order {
            write_section(w, ICON_MAGIC, &icon_bytes(elem)?)?;
        }

        Ok(())
    }

    /// Reads a pack back.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, Error> {
        let mut header = [0u8; 8];
        r.read_exact(&mut header).map_err(at_eof)?;

        if header[0..4] != PACK_MAGIC {
            return Err(Error::InvalidContainer("not an icon pack".to_string()));
        }

        let icon_count = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let mut pack = IconPack::new();
        while let Some((magic, data)) = read_section(r)? {
            match magic {
                PALETTE_MAGIC => {
                    let (index, colors) = parse_palette(&data)?;
                    let index = usize::from(index);
                    if pack.palettes.len() <= index {
                        pack.palettes.resize(index + 1, Vec::new());
                    }
                    pack.palettes[index] = colors;
                }
                ICON_MAGIC => {
                    pack.elems.push(parse_icon(&data)?);
                }
                _ => {
                    log::warn!(
                        "unrecognised section '{}' skipped",
                        magic_str(&magic)
                    );
                }
            }
        }

        if pack.elems.len() != icon_count as usize {
            log::warn!(
                "pack header promises {} icons, found {}",
                icon_count,
                pack.elems.len()
            );
        }

        Ok(pack)
    }
}

pub(crate) fn magic_str(magic: &[u8; 4]) -> String {
    magic.iter().map(|&b| char::from(b)).collect()
}

fn write_section<W: Write>(w: &mut W, magic: [u8; 4], payload: &[u8]) -> Result<(), Error> {
    if payload.len() > MAX_SECTION_SIZE {
        return Err(Error::InvalidContainer(format!(
            "'{}' section payload of {} bytes is too large",
            magic_str(&magic),
            payload.len()
        )));
    }

    w.write_all(&magic)?;
    w.write_all(&(payload.len() as u32).to_le_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// Reads the next section. Returns `None` at a clean end of input.
fn read_section<R: Read>(r: &mut R) -> Result<Option<([u8; 4], Vec<u8>)>, Error> {
    let mut header = [0u8; 8];
    let mut filled = 0;
    while filled < header.len() {
        let n = r.read(&mut header[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(Error::InvalidContainer(
                "truncated section header".to_string(),
            ));
        }
        filled += n;
    }

    let magic = [header[0], header[1], header[2], header[3]];
    let nbytes = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if nbytes > MAX_SECTION_SIZE {
        return Err(Error::InvalidContainer("section size too large".to_string()));
    }

    let mut data = vec![0; nbytes];
    r.read_exact(&mut data).map_err(at_eof)?;

    Ok(Some((magic, data)))
}

fn at_eof(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::InvalidContainer("unexpected end of file".to_string())
    } else {
        Error::Io(e)
    }
}

fn palette_bytes(index: usize, row: &[Color]) -> Result<Vec<u8>, Error> {
    if index > 255 {
        return Err(Error::InvalidContainer(format!(
            "palette row index {} does not fit a section",
            index
        )));
    }
    if row.len() > 255 {
        return Err(Error::InvalidContainer(format!(
            "palette row with {} colours does not fit a section",
            row.len()
        )));
    }

    let mut buf = Vec::with_capacity(2 + row.len() * 4);
    buf.push(index as u8);
    buf.push(row.len() as u8);
    for c in row {
        buf.extend_from_slice(&[c.r, c.g, c.b, c.a]);
    }
    Ok(buf)
}

pub(crate) fn parse_palette(data: &[u8]) -> Result<(u8, Vec<Color>), Error> {
    let n = data.len();
    if n < 2 || n != 2 + 4 * usize::from(data[1]) {
        return Err(Error::InvalidContainer(format!(
            "invalid palette size {}",
            n
        )));
    }

    let index = data[0];
    let colors = data[2..]
        .chunks(4)
        .map(|c| Color::new(c[0], c[1], c[2], c[3]))
        .collect();
    Ok((index, colors))
}

fn icon_bytes(elem: &PackElem) -> Result<Vec<u8>, Error> {
    let mut name = elem.name.as_str();
    if name.len() > 255 {
        let mut end = 255;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name = &name[..end];
    }

    if elem.images.len() > 255 {
        return Err(Error::InvalidContainer(format!(
            "icon '{}' with {} variants does not fit a section",
            name,
            elem.images.len()
        )));
    }

    let mut buf = Vec::new();
    buf.push(name.len() as u8);
    buf.extend_from_slice(name.as_bytes());
    buf.push(elem.images.len() as u8);

    for im in &elem.images {
        buf.extend_from_slice(&im.width.to_le_bytes());
        buf.extend_from_slice(&im.height.to_le_bytes());
        buf.extend_from_slice(&(im.data.len() as u32).to_le_bytes());
    }

    for im in &elem.images {
        buf.extend_from_slice(&im.data);
    }

    Ok(buf)
}

pub(crate) fn parse_icon(data: &[u8]) -> Result<PackElem, Error> {
    let invalid = || Error::InvalidContainer("invalid icon header".to_string());

    let name_end = 1 + usize::from(*data.first().ok_or_else(invalid)?);
    if name_end + 1 > data.len() {
        return Err(invalid());
    }

    let name = std::str::from_utf8(&data[1..name_end])
        .map_err(|_| Error::InvalidContainer("icon name is not UTF-8".to_string()))?
        .to_string();

    let image_count = usize::from(data[name_end]);
    let mut data = &data[name_end + 1..];

    const IMAGE_HEADER_SIZE: usize = 8;
    if data.len() < image_count * IMAGE_HEADER_SIZE {
        return Err(invalid());
    }

    let mut headers = Vec::with_capacity(image_count);
    for _ in 0..image_count {
        let width = u16::from_le_bytes([data[0], data[1]]);
        let height = u16::from_le_bytes([data[2], data[3]]);
        let size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        data = &data[IMAGE_HEADER_SIZE..];
        headers.push((width, height, size));
    }

    let mut images = Vec::with_capacity(image_count);
    for (width, height, size) in headers {
        if data.len() < size {
            return Err(Error::InvalidContainer("invalid image data".to_string()));
        }
        images.push(ProgImage {
            width,
            height,
            data: data[..size].to_vec(),
        });
        data = &data[size..];
    }

    if !data.is_empty() {
        return Err(Error::InvalidContainer(
            "garbage after image data".to_string(),
        ));
    }

    Ok(PackElem { name, images })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u16, height: u16) -> ProgImage {
        ProgImage {
            width,
            height,
            data: vec![0x81, 0x81, 0xA1, 0xA1, 0x00],
        }
    }

    fn sample_pack() -> IconPack {
        let mut pack = IconPack::new();
        pack.palettes = vec![
            vec![Color::new(0, 0, 0, 255), Color::new(255, 255, 255, 255)],
            vec![Color::new(255, 255, 255, 255), Color::new(0, 0, 0, 255)],
        ];
        pack.add_icon("a", vec![image(16, 16), image(32, 32)]);
        pack.add_icon("b", vec![image(16, 16)]);
        pack
    }

    fn encode(pack: &IconPack) -> Vec<u8> {
        let mut buf = Vec::new();
        pack.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn roundtrip() {
        let pack = sample_pack();
        let buf = encode(&pack);
        let back = IconPack::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(back, pack);
    }

    #[test]
    fn header_and_section_order() {
        let mut pack = IconPack::new();
        pack.palettes = vec![vec![Color::new(0, 0, 0, 255), Color::new(255, 255, 255, 255)]];
        // Insertion order does not matter; output is sorted by name.
        pack.add_icon("b", vec![image(16, 16)]);
        pack.add_icon("a", vec![image(16, 16)]);

        let buf = encode(&pack);
        assert_eq!(&buf[0..4], b"icpk");
        assert_eq!(u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]), 2);
        assert_eq!(&buf[8..12], b"PALT");

        // PALT payload: index, count, 2 colours.
        let palt_len = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]) as usize;
        assert_eq!(palt_len, 2 + 2 * 4);

        let icon1 = 16 + palt_len;
        assert_eq!(&buf[icon1..icon1 + 4], b"ICON");
        assert_eq!(buf[icon1 + 8], 1); // name length
        assert_eq!(buf[icon1 + 9], b'a');

        let icon1_len =
            u32::from_le_bytes([buf[icon1 + 4], buf[icon1 + 5], buf[icon1 + 6], buf[icon1 + 7]])
                as usize;
        let icon2 = icon1 + 8 + icon1_len;
        assert_eq!(&buf[icon2..icon2 + 4], b"ICON");
        assert_eq!(buf[icon2 + 9], b'b');
    }

    #[test]
    fn variants_are_sorted_by_decreasing_area() {
        let pack = sample_pack();
        assert_eq!(pack.elems[0].images[0].width, 32);
        assert_eq!(pack.elems[0].images[1].width, 16);
    }

    #[test]
    fn unknown_sections_are_skipped() {
        let mut buf = encode(&sample_pack());
        buf.extend_from_slice(b"WHAT");
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&[0xAB, 0xCD]);

        let back = IconPack::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(back, sample_pack());
    }

    #[test]
    fn bad_magic() {
        assert!(IconPack::read_from(&mut &b"nope0000"[..]).is_err());
    }

    #[test]
    fn truncated_input() {
        let buf = encode(&sample_pack());
        assert!(IconPack::read_from(&mut &buf[..6]).is_err());
        assert!(IconPack::read_from(&mut &buf[..buf.len() - 1]).is_err());
    }

    #[test]
    fn oversized_section() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&PACK_MAGIC);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&PALETTE_MAGIC);
        buf.extend_from_slice(&(MAX_SECTION_SIZE as u32 + 1).to_le_bytes());

        assert!(IconPack::read_from(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn mismatched_image_header() {
        // One image of 100 bytes promised, none present.
        let mut payload = vec![1, b'x', 1];
        payload.extend_from_slice(&16u16.to_le_bytes());
        payload.extend_from_slice(&16u16.to_le_bytes());
        payload.extend_from_slice(&100u32.to_le_bytes());

        let mut buf = Vec::new();
        buf.extend_from_slice(&PACK_MAGIC);
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&ICON_MAGIC);
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&payload);

        assert!(IconPack::read_from(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn long_names_are_truncated() {
        let mut pack = IconPack::new();
        let long = "x".repeat(300);
        pack.add_icon(&long, vec![image(16, 16)]);

        let buf = encode(&pack);
        let back = IconPack::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(back.elems[0].name.len(), 255);
    }
}
