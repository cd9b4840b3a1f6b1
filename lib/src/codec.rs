use async_trait::async_trait;
use eyre::{Result, WrapErr};
use futures::stream::{self, Stream};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _};

use crate::Reading;

/// Line-oriented encoding of readings. `decode` yields `None` at end of input.
#[async_trait]
pub trait Codec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &self,
        writer: &mut W,
        reading: &Reading,
    ) -> Result<()>;
    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &self,
        reader: &mut R,
    ) -> Result<Option<Reading>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    // Picks a codec from the first non-blank byte of a stream.
    pub fn detect(first: u8) -> Self {
        if first == b'{' {
            Format::Json
        } else {
            Format::Csv
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown encoding: {0} (expected json or csv)")]
pub struct UnknownFormat(pub String);

impl std::str::FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

// Reads the next non-blank line into `buf`. Returns false at end of input.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<bool>
where
    R: AsyncBufRead + Unpin + Send,
{
    loop {
        buf.clear();
        if reader.read_until(b'\n', buf).await? == 0 {
            return Ok(false);
        }
        if !buf.iter().all(u8::is_ascii_whitespace) {
            return Ok(true);
        }
    }
}

pub struct JsonCodec;

#[async_trait]
impl Codec for JsonCodec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &self,
        writer: &mut W,
        reading: &Reading,
    ) -> Result<()> {
        writer.write_all(&serde_json::to_vec(reading)?).await?;
        writer.write_all(b"\n").await?;
        Ok(())
    }

    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &self,
        reader: &mut R,
    ) -> Result<Option<Reading>> {
        let mut buf = Vec::new();
        if !next_line(reader, &mut buf).await? {
            return Ok(None);
        }
        serde_json::from_slice(&buf)
            .map(Some)
            .wrap_err("malformed JSON reading")
    }
}

pub struct CsvCodec;

#[async_trait]
impl Codec for CsvCodec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &self,
        writer: &mut W,
        reading: &Reading,
    ) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.serialize(reading)?;
        let buf = wtr.into_inner().map_err(|e| eyre::eyre!(e.to_string()))?;
        writer.write_all(&buf).await?;
        Ok(())
    }

    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &self,
        reader: &mut R,
    ) -> Result<Option<Reading>> {
        let mut buf = Vec::new();
        if !next_line(reader, &mut buf).await? {
            return Ok(None);
        }
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(buf.as_slice());
        match rdr.deserialize().next() {
            Some(record) => record.map(Some).wrap_err("malformed CSV reading"),
            None => Ok(None),
        }
    }
}

/// Decodes `reader` until end of input, yielding each reading in turn.
/// The stream ends after the first error.
pub fn readings<C, R>(codec: C, reader: R) -> impl Stream<Item = Result<Reading>>
where
    C: Codec + Send + Sync,
    R: AsyncBufRead + Unpin + Send,
{
    stream::try_unfold((codec, reader), |(codec, mut reader)| async move {
        let next = codec.decode(&mut reader).await?;
        Ok(next.map(|reading| (reading, (codec, reader))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::millis_to_system_time;
    use futures::TryStreamExt as _;

    fn sample(id: u64) -> Reading {
        Reading {
            id,
            created_at: millis_to_system_time(1_700_000_000_000 + id as i64 * 60_000),
            temperature_bmp: 4.25,
            temperature_dht: 3.9,
            pressure_bmp: 1008.5,
            humidity_dht: 81.0,
        }
    }

    #[tokio::test]
    async fn json_lines() {
        let mut out = Vec::new();
        JsonCodec.encode(&mut out, &sample(1)).await.unwrap();
        JsonCodec.encode(&mut out, &sample(2)).await.unwrap();
        assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 2);

        let mut input = out.as_slice();
        assert_eq!(JsonCodec.decode(&mut input).await.unwrap(), Some(sample(1)));
        assert_eq!(JsonCodec.decode(&mut input).await.unwrap(), Some(sample(2)));
        assert_eq!(JsonCodec.decode(&mut input).await.unwrap(), None);
    }

    #[tokio::test]
    async fn csv_column_order() {
        let mut out = Vec::new();
        CsvCodec.encode(&mut out, &sample(3)).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "3,2023-11-14T22:16:20Z,4.25,3.9,1008.5,81.0\n"
        );
    }

    #[tokio::test]
    async fn csv_decode_trims_and_skips_blank_lines() {
        let mut input: &[u8] = b"\n  \n5, 2023-11-14T22:16:20Z ,1,2,3,4\n";
        let reading = CsvCodec.decode(&mut input).await.unwrap().unwrap();
        assert_eq!(reading.id, 5);
        assert_eq!(reading.pressure_bmp, 3.0);
        assert_eq!(reading.humidity_dht, 4.0);
        assert_eq!(CsvCodec.decode(&mut input).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_input_is_an_error() {
        let mut input: &[u8] = b"{\"id\":1}\n";
        assert!(JsonCodec.decode(&mut input).await.is_err());

        let mut input: &[u8] = b"1,yesterday,1,2,3,4\n";
        assert!(CsvCodec.decode(&mut input).await.is_err());
    }

    #[tokio::test]
    async fn stream_of_readings() {
        let mut buf = Vec::new();
        for id in 0..5 {
            CsvCodec.encode(&mut buf, &sample(id)).await.unwrap();
        }
        let all: Vec<Reading> = readings(CsvCodec, buf.as_slice())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(all, (0..5).map(sample).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn stream_stops_at_first_error() {
        let input: &[u8] = b"{\"id\":1}\n";
        let result: Result<Vec<Reading>> = readings(JsonCodec, input).try_collect().await;
        assert!(result.is_err());
    }

    #[test]
    fn detects_format() {
        assert_eq!(Format::detect(b'{'), Format::Json);
        assert_eq!(Format::detect(b'1'), Format::Csv);
        assert_eq!("csv".parse::<Format>().unwrap(), Format::Csv);
        assert!("msgpack".parse::<Format>().is_err());
    }
}
