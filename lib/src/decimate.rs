use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::lttb::{downsample, DownsampleError, Sample};
use crate::{Field, Reading};

/// About 8000 readings arrive per month; browsers chart 1000 points without lag.
pub const DEFAULT_THRESHOLD: usize = 1000;

/// One chart-ready record.
///
/// Each field is downsampled on its own, so the values at one index may come
/// from different source readings. `created_at` is taken from the
/// temperature_BMP series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub id: usize,
    /// Unix milliseconds.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "temperature_BMP")]
    pub temperature_bmp: f64,
    #[serde(rename = "temperature_DHT")]
    pub temperature_dht: f64,
    #[serde(rename = "humidity_DHT")]
    pub humidity_dht: f64,
    #[serde(rename = "pressure_BMP")]
    pub pressure_bmp: f64,
}

/// Projects one field of `readings` into an (x, y) series keyed by Unix milliseconds.
pub fn project(readings: &[Reading], field: Field) -> Vec<Sample> {
    readings
        .iter()
        .map(|r| (r.timestamp_millis(), field.value(r)))
        .collect()
}

/// Every field of a reading set, downsampled independently to the same length.
#[derive(Debug, Clone)]
pub struct Decimation {
    series: BTreeMap<Field, Vec<Sample>>,
    len: usize,
}

impl Decimation {
    /// `readings` must be sorted oldest first.
    pub fn new(readings: &[Reading], threshold: usize) -> Result<Self, DownsampleError> {
        let mut series = BTreeMap::new();
        for field in Field::ALL {
            let trimmed = downsample(&project(readings, field), threshold)?;
            debug!(
                field = field.name(),
                raw = readings.len(),
                trimmed = trimmed.len(),
                "downsampled field"
            );
            series.insert(field, trimmed);
        }
        // Same input length and threshold for every field.
        let len = series.values().map(Vec::len).min().unwrap_or(0);
        Ok(Decimation { series, len })
    }

    pub fn series(&self, field: Field) -> &[Sample] {
        self.series.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stitches the per-field series together by position.
    pub fn points(&self) -> Vec<ChartPoint> {
        let value = |field: Field, i: usize| self.series(field)[i].1;
        (0..self.len)
            .map(|i| ChartPoint {
                id: i,
                created_at: self.series(Field::TemperatureBmp)[i].0 as i64,
                temperature_bmp: value(Field::TemperatureBmp, i),
                temperature_dht: value(Field::TemperatureDht, i),
                humidity_dht: value(Field::HumidityDht, i),
                pressure_bmp: value(Field::PressureBmp, i),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::millis_to_system_time;

    const MINUTE: i64 = 60_000;

    fn readings(n: usize) -> Vec<Reading> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                Reading {
                    id: i as u64 + 1,
                    created_at: millis_to_system_time(1_680_307_200_000 + i as i64 * 5 * MINUTE),
                    temperature_bmp: 12.0 + (t / 40.0).sin() * 6.0,
                    temperature_dht: 11.5 + (t / 13.0).cos() * 5.0,
                    humidity_dht: 60.0 + (t / 7.0).sin() * 20.0,
                    pressure_bmp: 1010.0 + (t / 90.0).cos() * 8.0,
                }
            })
            .collect()
    }

    #[test]
    fn projection_uses_millisecond_timestamps() {
        let rs = readings(3);
        let series = project(&rs, Field::PressureBmp);
        assert_eq!(series[1].0, 1_680_307_500_000.0);
        assert_eq!(series[1].1, rs[1].pressure_bmp);
    }

    #[test]
    fn every_field_has_threshold_points() {
        let d = Decimation::new(&readings(8000), DEFAULT_THRESHOLD).unwrap();
        assert_eq!(d.len(), DEFAULT_THRESHOLD);
        for field in Field::ALL {
            assert_eq!(d.series(field).len(), DEFAULT_THRESHOLD);
        }
        assert_eq!(d.points().len(), DEFAULT_THRESHOLD);
    }

    #[test]
    fn short_input_passes_through() {
        let rs = readings(10);
        let points = Decimation::new(&rs, DEFAULT_THRESHOLD).unwrap().points();
        assert_eq!(points.len(), 10);
        for (i, (p, r)) in points.iter().zip(&rs).enumerate() {
            assert_eq!(p.id, i);
            assert_eq!(p.created_at as f64, r.timestamp_millis());
            assert_eq!(p.humidity_dht, r.humidity_dht);
        }
    }

    #[test]
    fn empty_input() {
        let d = Decimation::new(&[], DEFAULT_THRESHOLD).unwrap();
        assert!(d.is_empty());
        assert!(d.points().is_empty());
    }

    #[test]
    fn threshold_error_propagates() {
        assert!(Decimation::new(&readings(10), 1).is_err());
    }

    #[test]
    fn endpoints_are_shared_by_all_fields() {
        let rs = readings(500);
        let points = Decimation::new(&rs, 50).unwrap().points();
        let (first, last) = (&points[0], &points[49]);
        assert_eq!(first.created_at as f64, rs[0].timestamp_millis());
        assert_eq!(first.pressure_bmp, rs[0].pressure_bmp);
        assert_eq!(last.created_at as f64, rs[499].timestamp_millis());
        assert_eq!(last.temperature_dht, rs[499].temperature_dht);
    }

    // Independent per-field selection is accepted behaviour: the same output
    // index may point at different source readings for different fields.
    #[test]
    fn fields_may_pick_different_timestamps_at_the_same_index() {
        let d = Decimation::new(&readings(2000), 100).unwrap();
        let differs = (1..d.len() - 1).any(|i| {
            let x = d.series(Field::TemperatureBmp)[i].0;
            Field::ALL[1..].iter().any(|&f| d.series(f)[i].0 != x)
        });
        assert!(differs);

        // The chart point still carries temperature_BMP's timestamp.
        let points = d.points();
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.created_at as f64, d.series(Field::TemperatureBmp)[i].0);
        }
    }

    #[test]
    fn chart_point_json_shape() {
        let points = Decimation::new(&readings(1), 10).unwrap().points();
        let json = serde_json::to_value(&points[0]).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "createdAt",
                "humidity_DHT",
                "id",
                "pressure_BMP",
                "temperature_BMP",
                "temperature_DHT"
            ]
        );
        assert_eq!(json["createdAt"], 1_680_307_200_000i64);
    }
}
