//! Drive the full print-design pipeline from the command line:
//! decode, segment, filter, composite layers, optionally tile a
//! pattern, run pre-flight, and export at a print size.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use spotpress_export::{ExportSize, encode_jpeg, encode_png, export_dimensions, fit_for_export};
use spotpress_pipeline::{Dimensions, PatternKind, PatternSpec, Rgb, pattern, preflight};
use spotpress_session::{EditorSession, EditorState};

/// Process a design raster and export it print-ready.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input image path.
    input: PathBuf,

    /// Output image path (.png keeps transparency, .jpg flattens
    /// onto the fabric color).
    #[arg(short, long)]
    output: PathBuf,

    /// Editor state JSON (recolor, filters, layers); defaults apply
    /// when omitted, including corner background auto-detection.
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Register a font as NAME=PATH; may repeat. The first one is
    /// also the fallback for unknown family names.
    #[arg(long, value_name = "NAME=PATH")]
    font: Vec<String>,

    /// Register an image-layer asset as HANDLE=PATH; may repeat.
    #[arg(long, value_name = "HANDLE=PATH")]
    asset: Vec<String>,

    /// Export at a print preset's pixel size (standard, large,
    /// pocket, allover).
    #[arg(long, conflicts_with = "multiplier")]
    preset: Option<String>,

    /// Export at a multiple of the source resolution.
    #[arg(long, default_value_t = 1.0)]
    multiplier: f64,

    /// Tile the composited design as a repeating pattern instead of
    /// fitting it.
    #[arg(long, value_enum)]
    pattern: Option<PatternArg>,

    /// Pattern tile size as a percentage of the output width.
    #[arg(long, default_value_t = 20.0)]
    density: f64,

    /// Pattern rotation in degrees.
    #[arg(long, default_value_t = 0.0)]
    rotate: f64,

    /// Run the print pre-flight scan and report issues on stderr.
    #[arg(long)]
    preflight: bool,

    /// Shift colors that sit too close to the fabric before export.
    #[arg(long)]
    auto_contrast: bool,

    /// Fabric color as a hex string, overriding the state's value.
    #[arg(long, value_name = "HEX")]
    fabric: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternArg {
    Grid,
    Brick,
    HalfDrop,
}

impl From<PatternArg> for PatternKind {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Grid => Self::Grid,
            PatternArg::Brick => Self::Brick,
            PatternArg::HalfDrop => Self::HalfDrop,
        }
    }
}

/// Split a repeatable `KEY=PATH` argument.
fn split_binding(raw: &str, flag: &str) -> Result<(String, PathBuf), String> {
    raw.split_once('=')
        .map(|(key, path)| (key.to_owned(), PathBuf::from(path)))
        .ok_or_else(|| format!("--{flag} must be KEY=PATH, got: '{raw}'"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Reading design from {}", args.input.display());
    let bytes = std::fs::read(&args.input)?;
    let original = spotpress_pipeline::decode_design(&bytes)?;
    let source_dims = Dimensions {
        width: original.width(),
        height: original.height(),
    };

    let mut session = EditorSession::new(original)?;

    if let Some(state_path) = &args.state {
        eprintln!("Loading editor state from {}", state_path.display());
        let state: EditorState = serde_json::from_str(&std::fs::read_to_string(state_path)?)?;
        session.update(|current| *current = state);
    }

    for raw in &args.font {
        let (name, path) = split_binding(raw, "font")?;
        eprintln!("Registering font {name} from {}", path.display());
        session.fonts_mut().register(name, std::fs::read(&path)?)?;
    }
    for raw in &args.asset {
        let (handle, path) = split_binding(raw, "asset")?;
        eprintln!("Registering asset {handle} from {}", path.display());
        let raster = image::open(&path)?.to_rgba8();
        session.assets_mut().insert(handle, raster);
    }

    let fabric = match &args.fabric {
        Some(hex) => Rgb::from_hex(hex)?,
        None => session.state().fabric_color,
    };

    eprintln!(
        "Rendering {}x{} design ({} layers)...",
        source_dims.width,
        source_dims.height,
        session.state().layers.len()
    );
    let composite = session.render()?;
    for (id, reason) in &composite.skipped {
        eprintln!("warning: layer {id:?} skipped: {reason}");
    }
    let mut design = composite.image;

    if args.auto_contrast {
        eprintln!("Applying contrast fix against rgb({}, {}, {})", fabric.r, fabric.g, fabric.b);
        preflight::auto_contrast_fix(&mut design, fabric);
    }

    if args.preflight {
        let report = preflight::analyze(&design, fabric);
        if report.issues.is_empty() {
            eprintln!("Pre-flight: no issues detected");
        } else {
            for issue in &report.issues {
                eprintln!("Pre-flight: {issue}");
            }
        }
        for spot in &report.spot_colors {
            eprintln!(
                "Spot color rgb({}, {}, {}) x{}",
                spot.color.r, spot.color.g, spot.color.b, spot.frequency
            );
        }
    }

    let size = args.preset.as_ref().map_or(
        ExportSize::Multiplier(args.multiplier),
        |id| ExportSize::Preset(id.clone()),
    );
    let target = export_dimensions(source_dims, &size)?;
    eprintln!("Export target: {}x{}", target.width, target.height);

    let export = if let Some(kind) = args.pattern {
        eprintln!(
            "Tiling {:?} pattern at density {:.0}%, rotation {:.1} deg",
            PatternKind::from(kind),
            args.density,
            args.rotate
        );
        pattern::tile_pattern(
            &design,
            &PatternSpec {
                kind: kind.into(),
                density: args.density,
                rotation: args.rotate,
            },
            target,
        )?
    } else {
        fit_for_export(&design, target)?
    };

    let is_jpeg = args
        .output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
    let encoded = if is_jpeg {
        encode_jpeg(&export, fabric)?
    } else {
        encode_png(&export)?
    };

    eprintln!("Saving to {}", args.output.display());
    std::fs::write(&args.output, encoded)?;
    eprintln!("Done.");
    Ok(())
}
