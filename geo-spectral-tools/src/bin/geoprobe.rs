//! geoprobe: Decode a geo-cube file and print band values at a pixel.

use clap::Parser;
use std::path::PathBuf;

use geocube::{summarize, Band, GeoCube};

#[derive(Parser)]
#[command(
    name = "geoprobe",
    version,
    about = "Decode a 9-band geo-cube (.img) and print per-pixel geometry"
)]
struct Cli {
    /// Input geo-cube file
    #[arg(short, long)]
    r#in: PathBuf,

    /// Sample (column) index
    #[arg(short, long, default_value_t = 340)]
    x: i64,

    /// Line (row) index
    #[arg(short, long, default_value_t = 340)]
    y: i64,

    /// Print per-band summaries instead of a single pixel
    #[arg(long, default_value_t = false)]
    summary: bool,

    /// Emit JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Verbose mode
    #[arg(short, long, default_value_t = false)]
    verb: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verb { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    let cube = GeoCube::open(&cli.r#in)?;
    log::info!("Decoded {}", cli.r#in.display());

    if cli.summary {
        let summaries = summarize(&cube);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            return Ok(());
        }
        println!("{:<16} {:>9} {:>12} {:>12} {:>12}", "band", "finite", "min", "max", "mean");
        for s in &summaries {
            let fmt = |v: Option<f64>| v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "N/A".into());
            println!(
                "{:<16} {:>9} {:>12} {:>12} {:>12}",
                s.band.label(),
                s.finite_count,
                fmt(s.min.map(f64::from)),
                fmt(s.max.map(f64::from)),
                fmt(s.mean)
            );
        }
        return Ok(());
    }

    let (sx, sy, _) = cube.clamp_position(cli.x, cli.y, 0);
    if cli.json {
        let values: Vec<(Band, Option<f32>)> = Band::ALL
            .iter()
            .map(|&b| (b, cube.value_at(sx, sy, b)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    println!("pixel ({}, {})", sx, sy);
    for band in Band::ALL {
        match cube.value_at(sx, sy, band) {
            Some(v) => println!("  [{}] {:<16} {:>12.4} {}", band.index(), band.label(), v, band.unit()),
            None => println!("  [{}] {:<16} {:>12}", band.index(), band.label(), "N/A"),
        }
    }
    Ok(())
}
