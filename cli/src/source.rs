use std::time::SystemTime;

use barograph::{parse_timestamp, readings, CsvCodec, Format, JsonCodec, Period, Reading, Window};
use clap::Args;
use duration_string::DurationString;
use eyre::{Result, WrapErr};
use futures::TryStreamExt as _;
use tracing::{debug, info};

use crate::io::{sources, Input};

#[derive(Args, Debug, Default)]
pub struct WindowOpts {
    /// Select a calendar month in UTC, e.g. "2023-04"
    #[clap(long, conflicts_with_all = ["last", "start", "end"])]
    pub period: Option<Period>,

    /// Select the trailing span ending now, e.g. "24h", "7d"
    #[clap(long, conflicts_with_all = ["start", "end"])]
    pub last: Option<DurationString>,

    /// Window start, RFC 3339 (requires --end)
    #[clap(long, requires = "end")]
    pub start: Option<String>,

    /// Window end, RFC 3339 (requires --start)
    #[clap(long, requires = "start")]
    pub end: Option<String>,
}

impl WindowOpts {
    /// The selected window, or `None` to keep every reading.
    pub fn window(&self, now: SystemTime) -> Result<Option<Window>> {
        if let Some(period) = self.period {
            return Ok(Some(Window::from_period(period)));
        }
        if let Some(last) = &self.last {
            return Ok(Some(Window::last(last.clone().into(), now)));
        }
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Ok(Some(Window::new(
                parse_timestamp(start)?,
                parse_timestamp(end)?,
            )?)),
            (None, None) => Ok(None),
            _ => eyre::bail!("--start and --end must be given together"),
        }
    }
}

/// Decodes every reading from `files` (stdin when empty), auto-detecting
/// JSON or CSV per source.
pub async fn load(files: &[String]) -> Result<Vec<Reading>> {
    let mut all = Vec::new();
    for source in sources(files) {
        let mut input = Input::from_filename(&source)
            .await
            .wrap_err_with(|| format!("opening {}", source))?;
        let Some(format) = input.detect_format().await? else {
            debug!(%source, "empty input");
            continue;
        };

        let decoded: Vec<Reading> = match format {
            Format::Json => readings(JsonCodec, input).try_collect().await,
            Format::Csv => readings(CsvCodec, input).try_collect().await,
        }
        .wrap_err_with(|| format!("decoding {}", source))?;

        info!(%source, ?format, count = decoded.len(), "loaded readings");
        all.extend(decoded);
    }
    Ok(all)
}
