// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`icpk` compiles preprocessed SVG icons into a compact bytecode and packs
them into a single container file.

The input documents are expected to be already reduced to a tree of
`<svg>`, `<g>` and `<path>` elements with solid fill presentation
attributes; flattening strokes, groups and shapes is a job for an external
drawing tool.

## Pipeline

- The tree walker resolves inherited transforms and fills and decodes
  each `<path>` into absolute `M`/`L`/`C`/`Q` commands, converting
  elliptic arcs into cubic Béziers along the way
- The bytecode emitter packs the commands into run-length opcodes,
  mapping every point through the composed transform and encoding each
  coordinate in 1, 2 or 4 bytes within a configurable tolerance
- The palette resolver collects the solid fills of all icons, merges them
  with the base palette and derives themed alternative rows
- The pack writer lays palettes and icons out in a chunked,
  magic-tagged container; the disassembler prints the same stream back
  as a readable trace
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::identity_op)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::upper_case_acronyms)]

mod arc;
mod color;
mod converter;
mod coord;
mod disasm;
mod error;
mod geom;
mod options;
mod pack;
mod palette;
mod path;
mod prog;

pub use crate::arc::arc_to_bezier;
pub use crate::color::Color;
pub use crate::converter::{collect_colors, compile};
pub use crate::coord::{read_coord, write_coord};
pub use crate::disasm::{dump_pack, dump_prog};
pub use crate::error::Error;
pub use crate::geom::{FuzzyEq, FuzzyZero, Point, Transform};
pub use crate::options::Options;
pub use crate::pack::{IconPack, PackElem, MAX_SECTION_SIZE};
pub use crate::palette::{resolve_palettes, ColorStats, ColorTransform, MAX_PALETTE_COLORS};
pub use crate::path::{parse_path, PathCmd, PathCommand};
pub use crate::prog::{ProgImage, ProgMem};
