//! specsample: Sample a spectral library document to a point budget.

use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use spectral_lib::{sample, SpectralLibrary};

#[derive(Parser)]
#[command(
    name = "specsample",
    version,
    about = "Downsample an angle-indexed spectral library (JSON) to a point budget"
)]
struct Cli {
    /// Input library document
    #[arg(short, long)]
    r#in: PathBuf,

    /// Output document (or - for stdout)
    #[arg(short, long, default_value = "-")]
    out: String,

    /// Maximum number of wavelength points to keep (0 = keep all)
    #[arg(short = 'n', long, default_value_t = 2000)]
    max_points: usize,

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

    let library = SpectralLibrary::open(&cli.r#in)?;
    let sampled = sample(library, cli.max_points);
    sampled.validate()?;

    let json = sampled.to_json()?;
    if cli.out == "-" {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        out.write_all(json.as_bytes())?;
        out.flush()?;
    } else {
        let mut out = BufWriter::new(File::create(&cli.out)?);
        out.write_all(json.as_bytes())?;
        out.flush()?;
    }

    log::info!(
        "Wrote {} of {} wavelengths (step {})",
        sampled.wavelength.len(),
        sampled.source_points(),
        sampled.step()
    );
    Ok(())
}
