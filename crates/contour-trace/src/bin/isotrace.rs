//! Command line contour tracer.
//!
//! Traces iso-contours of a built-in demo field and writes the resulting
//! polylines as JSON, optionally caching the computed strips between
//! runs.

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use contour_engine::EngineConfig;
use contour_trace::{level_steps, ContourSet};
use field_common::{GridSpec, IsoCurveSet, Limits};

#[derive(Parser, Debug)]
#[command(name = "isotrace")]
#[command(about = "Trace iso-contours of a scalar field")]
struct Args {
    /// Demo field: circle, ripple, saddle, radial or nan-disk
    #[arg(short, long, default_value = "circle")]
    field: String,

    /// Iso-levels as a comma separated list
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    levels: Vec<f64>,

    /// Lowest level when generating a stepped level list
    #[arg(long, allow_hyphen_values = true)]
    min_level: Option<f64>,

    /// Highest level when generating a stepped level list
    #[arg(long, allow_hyphen_values = true)]
    max_level: Option<f64>,

    /// Level spacing when generating a stepped level list
    #[arg(long)]
    interval: Option<f64>,

    /// Domain rectangle as min-x,min-y,max-x,max-y
    #[arg(
        long,
        default_value = "-2,-2,2,2",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    limits: Vec<f64>,

    /// Primary partition cells per axis
    #[arg(long, default_value_t = 16)]
    primary: usize,

    /// Secondary partition cells per axis
    #[arg(long, default_value_t = 256)]
    secondary: usize,

    /// Refit the working rectangle to the contours instead of covering
    /// the full domain
    #[arg(long)]
    refit: bool,

    /// Keep unpaired open strips without logging them
    #[arg(long)]
    weld_override: bool,

    /// Strip cache file: adopted when it matches, rewritten otherwise
    #[arg(long)]
    cache: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct ContourReport {
    field: String,
    levels: Vec<f64>,
    discontinuities: usize,
    contours: Vec<LevelContours>,
}

#[derive(Serialize)]
struct LevelContours {
    level: f64,
    strips: Vec<StripPoints>,
}

#[derive(Serialize)]
struct StripPoints {
    closed: bool,
    points: Vec<(f64, f64)>,
}

type Field = Box<dyn Fn(f64, f64) -> f64>;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = engine_config(&args)?;
    let field = demo_field(&args.field)?;
    let mut contours = ContourSet::new(config, field)?;

    let mut adopted = false;
    if let Some(cache) = &args.cache {
        adopted = contours.load(Path::new(cache));
        if adopted {
            info!(path = %cache, "adopted cached contour set");
        }
    }

    if !adopted {
        contours.run()?;
        if let Some(cache) = &args.cache {
            contours.persist(Path::new(cache))?;
            info!(path = %cache, "cached contour set");
        }
    }

    let Some(set) = contours.set() else {
        bail!("no contour set was produced");
    };
    let report = contour_report(&args.field, set, contours.config());
    info!(
        levels = report.contours.len(),
        strips = report.contours.iter().map(|c| c.strips.len()).sum::<usize>(),
        discontinuities = report.discontinuities,
        "contour tracing complete"
    );

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            info!(path = %path, "report written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn engine_config(args: &Args) -> Result<EngineConfig> {
    let levels = if !args.levels.is_empty() {
        args.levels.clone()
    } else if let (Some(min), Some(max), Some(step)) =
        (args.min_level, args.max_level, args.interval)
    {
        let levels = level_steps(min, max, step);
        if levels.is_empty() {
            bail!("no levels between {min} and {max} at interval {step}");
        }
        levels
    } else {
        bail!("supply --levels, or all of --min-level, --max-level and --interval");
    };

    let &[min_x, min_y, max_x, max_y] = args.limits.as_slice() else {
        bail!("--limits takes exactly four values: min-x,min-y,max-x,max-y");
    };

    Ok(EngineConfig {
        levels,
        limits: Limits::new(min_x, min_y, max_x, max_y),
        primary: GridSpec::new(args.primary, args.primary),
        secondary: GridSpec::new(args.secondary, args.secondary),
        extrapolate: !args.refit,
        weld_override: args.weld_override,
    })
}

fn demo_field(name: &str) -> Result<Field> {
    let field: Field = match name {
        "circle" => Box::new(|x, y| x * x + y * y - 1.0),
        "ripple" => Box::new(|x, y| (x * 2.0).sin() + (y * 3.0).cos() * 0.5),
        "saddle" => Box::new(|x, y| x * y),
        "radial" => Box::new(|x, y| (x * x + y * y).sqrt()),
        "nan-disk" => Box::new(|x, y| {
            let r2 = x * x + y * y;
            if r2 < 0.25 {
                f64::NAN
            } else {
                r2
            }
        }),
        other => bail!("unknown field '{other}'; expected circle, ripple, saddle, radial or nan-disk"),
    };
    Ok(field)
}

/// Flatten the configured levels of a set into the JSON report shape,
/// leaving any internal fence levels out.
fn contour_report(field: &str, set: &IsoCurveSet, config: &EngineConfig) -> ContourReport {
    let configured = config.levels.len().min(set.level_count());
    let contours = (0..configured)
        .map(|level_idx| LevelContours {
            level: set.levels[level_idx],
            strips: set.lists[level_idx]
                .iter()
                .map(|strip| StripPoints {
                    closed: strip.is_closed(),
                    points: set.strip_points(strip),
                })
                .collect(),
        })
        .collect();

    ContourReport {
        field: field.to_string(),
        levels: config.levels.clone(),
        discontinuities: set.discontinuities.len(),
        contours,
    }
}
