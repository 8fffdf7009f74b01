use std::path::PathBuf;

use clap::Parser;
use mapzebview::{AppError, RunOptions, Settings};
use tracing::Level;

/// Zebrafish brain atlas viewer.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Marker line to show instead of the configured default.
    #[arg(long)]
    marker: Option<String>,
    /// Region to select; may be repeated.
    #[arg(long = "region")]
    regions: Vec<String>,
    /// ROI file (.npy, .h5, .hdf5) to import; may be repeated.
    #[arg(long = "rois")]
    roi_files: Vec<PathBuf>,
    /// Settings file; `mapzebview.toml` in the working directory otherwise.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use the synthetic offline atlas.
    #[arg(long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.debug |= cli.debug;
    init_logging(settings.debug);

    let mut builder = RunOptions::builder().regions(cli.regions);
    if let Some(marker) = cli.marker {
        builder = builder.marker(marker);
    }
    for path in cli.roi_files {
        builder = builder.roi_file(path);
    }

    mapzebview::run(settings, builder.build()?)
}
