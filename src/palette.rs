// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The palette resolver.
//!
//! Builds the authoritative palette row from the base colours and the
//! fill statistics of the first compile pass, then derives the
//! parallel-indexed alternative rows.

use std::collections::HashMap;

use crate::color::Color;

/// The most colours a palette row can hold.
///
/// Palette indices are stored in one byte, both in the fill opcode
/// and in the container's palette sections.
pub const MAX_PALETTE_COLORS: usize = 255;

/// Fill colours observed across all icons, with use counts.
pub type ColorStats = HashMap<Color, u32>;

/// A palette-row derivation rule.
///
/// Each rule produces one alternative palette row from row 0.
#[derive(Clone, Default, Debug)]
pub struct ColorTransform {
    /// Explicit colour substitutions. Checked first.
    pub map: HashMap<Color, Color>,

    /// Invert the luma of colours without an explicit substitution.
    pub invert_luma: bool,
}

/// Builds the palette rows.
///
/// Row 0 holds the deduplicated base colours and, when `auto_extend` is
/// set, the observed colours ordered by ascending use count with ties
/// broken by channel order. Each transform derives one more row of the
/// same length.
pub fn resolve_palettes(
    base: &[Color],
    auto_extend: bool,
    transforms: &[ColorTransform],
    stats: &ColorStats,
) -> Vec<Vec<Color>> {
    let mut row0: Vec<Color> = Vec::new();
    for &c in base {
        if !row0.contains(&c) {
            row0.push(c);
        }
    }

    if auto_extend {
        let mut observed: Vec<(u32, Color)> = stats
            .iter()
            .filter(|(c, _)| !row0.contains(c))
            .map(|(&c, &n)| (n, c))
            .collect();
        observed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        for (_, c) in observed {
            if row0.len() >= MAX_PALETTE_COLORS {
                log::warn!("palette is full, the remaining colors are dropped");
                break;
            }
            row0.push(c);
        }
    }

    let mut rows = vec![row0];
    for t in transforms {
        let row = rows[0]
            .iter()
            .map(|&c| match t.map.get(&c) {
                Some(&mapped) => mapped,
                None if t.invert_luma => c.invert_luma(),
                None => c,
            })
            .collect();
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::new(r, g, b, 255)
    }

    #[test]
    fn base_colors_are_deduplicated_in_order() {
        let base = [rgb(1, 1, 1), rgb(2, 2, 2), rgb(1, 1, 1)];
        let rows = resolve_palettes(&base, false, &[], &ColorStats::new());
        assert_eq!(rows, vec![vec![rgb(1, 1, 1), rgb(2, 2, 2)]]);
    }

    #[test]
    fn auto_extension_orders_by_frequency() {
        let mut stats = ColorStats::new();
        stats.insert(rgb(10, 0, 0), 7);
        stats.insert(rgb(20, 0, 0), 2);
        stats.insert(rgb(30, 0, 0), 2);
        stats.insert(rgb(1, 1, 1), 100); // already in base

        let base = [rgb(1, 1, 1)];
        let rows = resolve_palettes(&base, true, &[], &stats);
        assert_eq!(
            rows[0],
            vec![rgb(1, 1, 1), rgb(20, 0, 0), rgb(30, 0, 0), rgb(10, 0, 0)]
        );
    }

    #[test]
    fn every_color_resolves_to_a_unique_index() {
        let mut stats = ColorStats::new();
        for i in 0..20u8 {
            stats.insert(rgb(i, 0, 0), u32::from(i) + 1);
        }
        let rows = resolve_palettes(&[], true, &[], &stats);

        let mut seen = std::collections::HashSet::new();
        for c in &rows[0] {
            assert!(seen.insert(*c));
        }
        assert_eq!(rows[0].len(), 20);
    }

    #[test]
    fn transforms_produce_parallel_rows() {
        let black = rgb(0, 0, 0);
        let white = rgb(255, 255, 255);
        let grey = rgb(0x80, 0x80, 0x80);

        let mut map = HashMap::new();
        map.insert(black, white);
        let t = ColorTransform { map, invert_luma: true };

        let rows = resolve_palettes(&[black, grey], false, &[t], &ColorStats::new());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), rows[1].len());
        assert_eq!(rows[1][0], white);
        assert_eq!(rows[1][1], grey.invert_luma());
    }

    #[test]
    fn passthrough_transform() {
        let t = ColorTransform::default();
        let rows = resolve_palettes(&[rgb(5, 5, 5)], false, &[t], &ColorStats::new());
        assert_eq!(rows[0], rows[1]);
    }
}
