// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use pico_args::Arguments;

use icpk::{
    collect_colors, compile, dump_pack, resolve_palettes, Color, ColorStats, ColorTransform,
    IconPack, Options,
};

const HELP: &str = "\
icpk compiles preprocessed SVG icons into a compact bytecode pack.

Every directory must hold the same set of *.svg files, one directory
per size variant. The set of the first directory decides which icons
are packed.

USAGE:
  icpk [OPTIONS] <icons-dir>... <out-pack>

OPTIONS:
  -h, --help            Prints help information
  -V, --version         Prints version information

  --epsilon EPS         Sets the coordinate precision tolerance
                        [default: 0.0001]
  --palette COLORS      Sets the comma-separated base palette
                        Example: '#000000,#ffffff'
  --auto-palette        Extends the palette with the observed colours,
                        rarest first
  --color-magnet DIST   Snaps fills to palette colours closer than DIST
                        in RGB space [default: 0 (off)]
  --variant SPEC        Adds a derived palette row. SPEC is a
                        comma-separated list of '#from=#to' mappings
                        and/or the word 'invert'.
                        This option can be set multiple times

  --disasm              Also writes a <out-pack>.disasm trace
  --show-colors         Prints each icon's fill colours
  -v                    Verbose operation
  --quiet               Disables warnings

ARGS:
  <icons-dir>...        Size-variant directories
  <out-pack>            Output pack file
";

#[derive(Debug)]
struct Args {
    epsilon: f64,
    palette: Vec<Color>,
    auto_palette: bool,
    color_magnet: f64,
    variants: Vec<ColorTransform>,

    disasm: bool,
    show_colors: bool,
    verbose: bool,
    quiet: bool,

    free: Vec<PathBuf>,
}

fn collect_args() -> Result<Args, pico_args::Error> {
    let mut input = Arguments::from_env();

    if input.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    Ok(Args {
        epsilon: input
            .opt_value_from_fn("--epsilon", parse_epsilon)?
            .unwrap_or(1e-4),
        palette: input
            .opt_value_from_fn("--palette", parse_palette)?
            .unwrap_or_default(),
        auto_palette: input.contains("--auto-palette"),
        color_magnet: input
            .opt_value_from_fn("--color-magnet", parse_magnet)?
            .unwrap_or(0.0),
        variants: input.values_from_fn("--variant", parse_variant)?,

        disasm: input.contains("--disasm"),
        show_colors: input.contains("--show-colors"),
        verbose: input.contains("-v"),
        quiet: input.contains("--quiet"),

        free: input.finish().into_iter().map(PathBuf::from).collect(),
    })
}

fn parse_epsilon(s: &str) -> Result<f64, String> {
    let n: f64 = s.parse().map_err(|_| "invalid number")?;

    if n.is_finite() && n >= 0.0 {
        Ok(n)
    } else {
        Err("EPS must be a non-negative number".to_string())
    }
}

fn parse_magnet(s: &str) -> Result<f64, String> {
    let n: f64 = s.parse().map_err(|_| "invalid number")?;

    if n.is_finite() && n >= 0.0 {
        Ok(n)
    } else {
        Err("DIST must be a non-negative number".to_string())
    }
}

fn parse_palette(s: &str) -> Result<Vec<Color>, String> {
    let mut colors = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        let c = Color::from_hex(part).ok_or_else(|| format!("invalid colour '{}'", part))?;
        colors.push(c);
    }

    Ok(colors)
}

fn parse_variant(s: &str) -> Result<ColorTransform, String> {
    let mut transform = ColorTransform::default();
    for part in s.split(',') {
        let part = part.trim();
        if part == "invert" {
            transform.invert_luma = true;
            continue;
        }

        let (from, to) = part
            .split_once('=')
            .ok_or_else(|| format!("expected '#from=#to' or 'invert', got '{}'", part))?;
        let from = Color::from_hex(from.trim()).ok_or_else(|| format!("invalid colour '{}'", from))?;
        let to = Color::from_hex(to.trim()).ok_or_else(|| format!("invalid colour '{}'", to))?;
        transform.map.insert(from, to);
    }

    Ok(transform)
}

fn main() {
    let args = match collect_args() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}.", e);
            process::exit(1);
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            log::set_max_level(if args.verbose {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Warn
            });
        }
    }

    if let Err(e) = process(args) {
        eprintln!("Error: {}.", e);
        process::exit(1);
    }
}

fn process(mut args: Args) -> Result<(), String> {
    if args.free.len() < 2 {
        return Err("expected at least one icons directory and an output file".to_string());
    }
    let output = args.free.pop().unwrap();
    let dirs = args.free;

    let opts = Options {
        epsilon: args.epsilon,
        palette: args.palette,
        auto_palette: args.auto_palette,
        color_magnet: args.color_magnet,
        color_transforms: args.variants,
    };

    let names = svg_basenames(&dirs[0])
        .map_err(|e| format!("{}: {}", dirs[0].display(), e))?;
    if names.is_empty() {
        return Err(format!("no SVG files found in '{}'", dirs[0].display()));
    }

    // First pass: collect the fill colours of every icon variant.
    let mut stats = ColorStats::new();
    for name in &names {
        for dir in &dirs {
            let path = dir.join(name);
            let text = std::fs::read_to_string(&path)
                .map_err(|e| format!("{}: {}", path.display(), e))?;

            let mut file_stats = ColorStats::new();
            collect_colors(&text, &opts, &mut file_stats)
                .map_err(|e| format!("{}: {}", path.display(), e))?;

            if args.show_colors {
                println!("{}:", path.display());
                let mut colors: Vec<Color> = file_stats.keys().cloned().collect();
                colors.sort();
                for c in colors {
                    println!("  #{:02x}{:02x}{:02x}", c.r, c.g, c.b);
                }
            }

            for (c, n) in file_stats {
                *stats.entry(c).or_insert(0) += n;
            }
        }
    }

    let rows = resolve_palettes(&opts.palette, opts.auto_palette, &opts.color_transforms, &stats);

    // Second pass: emit the icon programs against the resolved palette.
    let mut pack = IconPack::new();
    for name in &names {
        let mut images = Vec::new();
        for dir in &dirs {
            let path = dir.join(name);
            let text = std::fs::read_to_string(&path)
                .map_err(|e| format!("{}: {}", path.display(), e))?;
            let image = compile(&text, &opts, &rows[0])
                .map_err(|e| format!("{}: {}", path.display(), e))?;
            images.push(image);
        }

        let icon_name = name.strip_suffix(".svg").unwrap_or(name);
        pack.add_icon(icon_name, images);
    }
    pack.palettes = rows;

    let file =
        File::create(&output).map_err(|e| format!("{}: {}", output.display(), e))?;
    let mut writer = std::io::BufWriter::new(file);
    pack.write_to(&mut writer)
        .map_err(|e| format!("{}: {}", output.display(), e))?;
    writer
        .flush()
        .map_err(|e| format!("{}: {}", output.display(), e))?;

    if args.disasm {
        let mut os = output.clone().into_os_string();
        os.push(".disasm");
        let disasm_path = PathBuf::from(os);

        // Re-read the file we just wrote; the trace always reflects
        // what actually landed on disk.
        let data =
            std::fs::read(&output).map_err(|e| format!("{}: {}", output.display(), e))?;

        let file = File::create(&disasm_path)
            .map_err(|e| format!("{}: {}", disasm_path.display(), e))?;
        let mut writer = std::io::BufWriter::new(file);
        dump_pack(&data, &mut writer)
            .map_err(|e| format!("{}: {}", disasm_path.display(), e))?;
        writer
            .flush()
            .map_err(|e| format!("{}: {}", disasm_path.display(), e))?;
    }

    Ok(())
}

fn svg_basenames(dir: &std::path::Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(".svg") {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, record.args()),
                log::Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, record.args()),
                log::Level::Info => eprintln!("Info (in {}:{}): {}", target, line, record.args()),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, record.args()),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, record.args()),
            }
        }
    }

    fn flush(&self) {}
}
