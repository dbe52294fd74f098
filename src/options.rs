// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::color::Color;
use crate::palette::ColorTransform;

/// Compile options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Coordinate precision tolerance.
    ///
    /// A coordinate is stored in the smallest encoding that stays within
    /// this distance from the exact value.
    ///
    /// Default: 0.0001
    pub epsilon: f64,

    /// Ordered base palette colours. Can be empty.
    ///
    /// Default: empty
    pub palette: Vec<Color>,

    /// Extend the palette with the colours observed during compilation,
    /// ordered by ascending use count.
    ///
    /// Default: disabled
    pub auto_palette: bool,

    /// Snap fill colours to the first palette colour closer than this
    /// distance in RGB space. Zero disables snapping.
    ///
    /// Default: 0
    pub color_magnet: f64,

    /// Alternative palette derivations, one row each.
    ///
    /// Default: empty
    pub color_transforms: Vec<ColorTransform>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            epsilon: 1e-4,
            palette: Vec::new(),
            auto_palette: false,
            color_magnet: 0.0,
            color_transforms: Vec::new(),
        }
    }
}
