use std::time::SystemTime;

use barograph::{select, Decimation, DEFAULT_THRESHOLD};
use clap::Args;
use eyre::Result;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::io::Output;
use crate::source::{load, WindowOpts};

#[derive(Args, Debug)]
pub struct Opts {
    /// Maximum number of chart points per field (LTTB downsampling threshold)
    #[clap(long, env = "BAROGRAPH_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    threshold: usize,

    #[clap(flatten)]
    window: WindowOpts,

    /// Pretty-print the JSON output
    #[clap(long, default_value_t = false)]
    pretty: bool,

    /// Output file [default: stdout]
    #[clap(long, default_value = "stdout")]
    output: String,

    /// Input files [default: stdin]
    pub files: Vec<String>,
}

pub async fn decimate(opts: &Opts) -> Result<()> {
    let window = opts.window.window(SystemTime::now())?;
    let raw = select(load(&opts.files).await?, window.as_ref());
    let points = Decimation::new(&raw, opts.threshold)?.points();
    info!(
        raw = raw.len(),
        points = points.len(),
        threshold = opts.threshold,
        "decimated readings"
    );

    let buf = if opts.pretty {
        serde_json::to_vec_pretty(&points)?
    } else {
        serde_json::to_vec(&points)?
    };

    let mut output = Output::from_filename(&opts.output).await?;
    output.write_all(&buf).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
