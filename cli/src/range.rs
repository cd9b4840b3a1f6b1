use std::time::SystemTime;

use barograph::{select, Codec, CsvCodec, Format, JsonCodec};
use clap::Args;
use eyre::Result;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::io::Output;
use crate::source::{load, WindowOpts};

#[derive(Args, Debug)]
pub struct Opts {
    #[clap(flatten)]
    window: WindowOpts,

    /// Output encoding (json, csv)
    #[clap(long, default_value = "json")]
    to: Format,

    /// Output file [default: stdout]
    #[clap(long, default_value = "stdout")]
    output: String,

    /// Input files [default: stdin]
    pub files: Vec<String>,
}

pub async fn range(opts: &Opts) -> Result<()> {
    let window = opts.window.window(SystemTime::now())?;
    let selected = select(load(&opts.files).await?, window.as_ref());
    info!(count = selected.len(), "selected readings");

    let mut output = Output::from_filename(&opts.output).await?;
    for reading in &selected {
        match opts.to {
            Format::Json => JsonCodec.encode(&mut output, reading).await?,
            Format::Csv => CsvCodec.encode(&mut output, reading).await?,
        }
    }
    output.flush().await?;
    Ok(())
}
