#![allow(dead_code)]

mod app;
mod data;
mod log;
mod pipeline;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use spectral_lib::CaseVariant;

use app::ViewerSession;
use data::assets::Composite;
use data::settings::ViewerSettings;
use pipeline::coordinate::{MapResult, Point, Rect, Size, StaticMeasurements};
use pipeline::lookup::LookupOutcome;

#[derive(Parser)]
#[command(
    name = "geo-spectral-viewer",
    version,
    about = "Geometry and spectrum lookup on phase-angle composites"
)]
struct Cli {
    /// Settings file (JSON); flags below override it
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Asset directory holding geo-cubes and composites
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Mission label prefix of asset filenames
    #[arg(long, global = true)]
    label: Option<String>,

    /// Spectral library document (JSON)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Wavelength point budget
    #[arg(short = 'n', long, global = true)]
    max_points: Option<usize>,

    /// Atmospheric case: standard, no_ch4 or no_haze
    #[arg(long, global = true)]
    case: Option<CaseVariant>,

    /// Composite band selection: 5_2_1.3 or 2_1.6_1.3
    #[arg(long, global = true)]
    composite: Option<Composite>,

    /// Emit JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Emit the spectrum as CSV
    #[arg(long, global = true, default_value_t = false)]
    csv: bool,

    /// Save the session log (.txt, .json or .sh)
    #[arg(long, global = true)]
    session_log: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long, global = true, default_value_t = false)]
    verb: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List phase angles whose geo-cube is present
    Phases,
    /// Geometry and spectrum at a native pixel
    Pixel {
        /// Phase angle in degrees (snapped to the 5° grid)
        #[arg(long)]
        phase: Option<u32>,
        #[arg(short, long)]
        x: u32,
        #[arg(short, long)]
        y: u32,
    },
    /// Replay clicks on the displayed composite, in order
    Click {
        #[arg(long)]
        phase: Option<u32>,
        /// Pointer position X,Y in viewport pixels (repeatable)
        #[arg(long = "at", value_parser = parse_pair, required = true)]
        at: Vec<(f64, f64)>,
        /// Displayed image size WxH (defaults to the natural size)
        #[arg(long, value_parser = parse_size)]
        display: Option<(f64, f64)>,
        /// Natural image size WxH (defaults to the composite's header)
        #[arg(long, value_parser = parse_size)]
        natural: Option<(f64, f64)>,
        /// Image top-left X,Y in viewport pixels
        #[arg(long, value_parser = parse_pair, default_value = "0,0")]
        image_origin: (f64, f64),
        /// Container top-left X,Y in viewport pixels
        #[arg(long, value_parser = parse_pair, default_value = "0,0")]
        container_origin: (f64, f64),
    },
}

fn parse_two(s: &str, sep: char) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(sep)
        .ok_or_else(|| format!("expected two numbers separated by '{}', got '{}'", sep, s))?;
    let parse = |v: &str| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e));
    Ok((parse(a)?, parse(b)?))
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    parse_two(s, ',')
}

fn parse_size(s: &str) -> Result<(f64, f64), String> {
    parse_two(s, 'x')
}

fn resolve_settings(cli: &Cli) -> Result<ViewerSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => ViewerSettings::load(path)?,
        None => ViewerSettings::default(),
    };
    if let Some(dir) = &cli.assets {
        settings.asset_dir = dir.clone();
    }
    if let Some(label) = &cli.label {
        settings.mission_label = label.clone();
    }
    if let Some(path) = &cli.library {
        settings.library_path = path.clone();
    }
    if let Some(n) = cli.max_points {
        settings.max_points = n;
    }
    if let Some(case) = cli.case {
        settings.default_case = case;
    }
    if let Some(composite) = cli.composite {
        settings.composite = composite;
    }
    Ok(settings)
}

fn print_outcome(cli: &Cli, outcome: &LookupOutcome) -> Result<(), Box<dyn std::error::Error>> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    if cli.csv {
        print!("{}", outcome.curve.to_csv());
        return Ok(());
    }

    println!("Pixel ({}, {})", outcome.x, outcome.y);
    println!("{}", outcome.reading);
    match &outcome.selection {
        Some(sel) => println!(
            "Row {}: matched inc {:.1}°, emi {:.1}°, az {:.1}°",
            sel.row, sel.matched.incidence, sel.matched.emission, sel.matched.azimuth
        ),
        None => println!("Row: N/A"),
    }
    if outcome.curve.is_empty() {
        println!("Spectrum ({}): N/A", outcome.curve.case.label());
    } else {
        println!(
            "Spectrum ({}): {} points, {:.3}-{:.3} µm",
            outcome.curve.case.label(),
            outcome.curve.len(),
            outcome.curve.wavelength.first().copied().unwrap_or(f64::NAN),
            outcome.curve.wavelength.last().copied().unwrap_or(f64::NAN)
        );
        if let Some((lo, hi)) = outcome.curve.intensity_range() {
            println!("  intensity {:.6} .. {:.6}", lo, hi);
        }
        if let Some([w, i]) = outcome.curve.peak() {
            println!("  peak {:.6} at {:.3} µm", i, w);
        }
    }
    Ok(())
}

fn run(cli: &Cli, session: &mut ViewerSession) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Phases => {
            let composite = session.composite();
            for phase in session.catalog().available_phases() {
                let has_image = session.catalog().composite_path(phase, composite).is_file();
                println!(
                    "{:>3}°  {}{}",
                    phase,
                    session.catalog().geo_file_name(phase),
                    if has_image { "" } else { "  (no composite)" }
                );
            }
        }
        Command::Pixel { phase, x, y } => {
            session.load_configured_library()?;
            session.select_phase(phase.unwrap_or(session.settings().default_phase));
            session.wait_for_cube_default()?;
            let outcome = session.inspect_pixel(*x, *y)?;
            print_outcome(cli, &outcome)?;
        }
        Command::Click {
            phase,
            at,
            display,
            natural,
            image_origin,
            container_origin,
        } => {
            session.load_configured_library()?;
            session.select_phase(phase.unwrap_or(session.settings().default_phase));
            session.wait_for_cube_default()?;

            let natural = match natural {
                Some((w, h)) => Size::new(*w, *h),
                None => session.image().natural(),
            };
            let display = display.map(|(w, h)| Size::new(w, h)).unwrap_or(natural);
            let measurements = StaticMeasurements {
                container: Rect::new(container_origin.0, container_origin.1, 0.0, 0.0),
                image: Rect::new(image_origin.0, image_origin.1, display.width, display.height),
                natural,
                display,
            };

            for &(px, py) in at {
                match session.click(&measurements, Point::new(px, py))? {
                    MapResult::Placed(_) => {
                        if let Some(outcome) = session.last_lookup() {
                            print_outcome(cli, outcome)?;
                        }
                    }
                    MapResult::Cleared => println!("({}, {}): marker cleared", px, py),
                    MapResult::Outside => println!("({}, {}): outside image", px, py),
                    MapResult::Unavailable => println!("({}, {}): image size unavailable", px, py),
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verb { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    ::log::info!("Starting geo-spectral-viewer v{}", env!("CARGO_PKG_VERSION"));

    let settings = resolve_settings(&cli)?;
    let mut session = ViewerSession::new(settings)?;
    let result = run(&cli, &mut session);

    if let Some(path) = &cli.session_log {
        session.session_log().save(path)?;
        ::log::info!("Session log written to {}", path.display());
    }
    result
}
