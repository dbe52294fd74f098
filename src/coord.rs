// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A variable-width coordinate codec.
//!
//! A coordinate is stored in 1, 2 or 4 bytes, whichever is the smallest
//! tier that represents it within the requested precision. The low two
//! bits of the first byte tag the tier, so the stream is self-delimiting:
//!
//! - `x1` - integer in `-64..=63`, one byte
//! - `10` - multiple of 1/64 in `-128..128`, two bytes little-endian
//! - `00` - an `f32` with its two lowest mantissa bits zeroed,
//!   four bytes little-endian

/// Appends the encoding of `v` with precision tolerance `eps` to `buf`.
pub fn write_coord(buf: &mut Vec<u8>, v: f64, eps: f64) {
    let i = v.round();
    if (v - i).abs() <= eps && i >= -64.0 && i < 64.0 {
        buf.push((((i as i32 + 64) as u8) << 1) | 0x01);
        return;
    }

    let n = (v * 64.0).round() / 64.0;
    if (v - n).abs() <= eps && n >= -128.0 && n < 128.0 {
        let x = ((n * 64.0) as i32 + 128 * 64) as u16;
        let word = (x << 2) | 0x02;
        buf.extend_from_slice(&word.to_le_bytes());
        return;
    }

    // The two lowest mantissa bits are sacrificed to the tier tag.
    let bits = (v as f32).to_bits() & !0x03;
    buf.extend_from_slice(&bits.to_le_bytes());
}

/// Reads one coordinate from the start of `data`.
///
/// Returns the value and the number of bytes consumed,
/// or `None` when `data` does not hold a complete number.
pub fn read_coord(data: &[u8]) -> Option<(f64, usize)> {
    let b0 = *data.first()?;

    if b0 & 0x01 != 0 {
        return Some((f64::from((b0 >> 1) as i32 - 64), 1));
    }

    if b0 & 0x02 != 0 {
        if data.len() < 2 {
            return None;
        }
        let word = u16::from_le_bytes([data[0], data[1]]);
        let x = (word >> 2) as i32 - 128 * 64;
        return Some((f64::from(x) / 64.0, 2));
    }

    if data.len() < 4 {
        return None;
    }
    let bits = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    Some((f64::from(f32::from_bits(bits)), 4))
}
