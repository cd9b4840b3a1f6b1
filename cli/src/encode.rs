use barograph::{Codec, CsvCodec, Format, JsonCodec, Reading};
use clap::Args;
use eyre::{Result, WrapErr};
use tokio::io::AsyncWriteExt;

use crate::io::{sources, Input, Output};

#[derive(Args, Debug)]
pub struct Opts {
    /// Output encoding (json, csv)
    #[clap(long, default_value = "json")]
    pub to: Format,

    /// Output file [default: stdout]
    #[clap(long, default_value = "stdout")]
    pub output: String,

    /// Input files [default: stdin]
    pub files: Vec<String>,
}

pub async fn encode(opts: &Opts) -> Result<()> {
    let mut output = Output::from_filename(&opts.output).await?;

    for source in sources(&opts.files) {
        let mut input = Input::from_filename(&source).await?;
        let Some(from) = input.detect_format().await? else {
            continue;
        };

        while let Some(reading) = decode(&mut input, from)
            .await
            .wrap_err_with(|| format!("decoding {}", source))?
        {
            match opts.to {
                Format::Json => JsonCodec.encode(&mut output, &reading).await?,
                Format::Csv => CsvCodec.encode(&mut output, &reading).await?,
            }
        }
    }

    output.flush().await?;
    Ok(())
}

async fn decode(input: &mut Input, format: Format) -> Result<Option<Reading>> {
    match format {
        Format::Json => JsonCodec.decode(input).await,
        Format::Csv => CsvCodec.decode(input).await,
    }
}
