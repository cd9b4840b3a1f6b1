mod decimate;
mod encode;
mod io;
mod plot;
mod range;
mod source;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "barograph",
    about = "Weather station readings: select, downsample and chart"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Downsample readings into chart points (LTTB, per field)
    Decimate(decimate::Opts),
    /// Select raw readings in a time window, oldest first
    Range(range::Opts),
    /// Generate an HTML plot of readings
    Plot(plot::Opts),
    /// Transcode readings between encodings
    Encode(encode::Opts),
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Logs go to stderr; stdout carries data.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Decimate(opts) => decimate::decimate(&opts).await,
        Command::Range(opts) => range::range(&opts).await,
        Command::Plot(opts) => plot::plot(&opts).await,
        Command::Encode(opts) => encode::encode(&opts).await,
    }
}
