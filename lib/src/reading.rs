use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

// Reading is a single sample posted by the weather station.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub id: u64,
    #[serde(rename = "createdAt", with = "humantime_serde")]
    pub created_at: SystemTime,
    #[serde(rename = "temperature_BMP")]
    pub temperature_bmp: f64,
    #[serde(rename = "temperature_DHT")]
    pub temperature_dht: f64,
    #[serde(rename = "pressure_BMP")]
    pub pressure_bmp: f64,
    #[serde(rename = "humidity_DHT")]
    pub humidity_dht: f64,
}

impl Reading {
    /// Unix time of the reading in milliseconds. Negative before the epoch.
    pub fn timestamp_millis(&self) -> f64 {
        system_time_to_millis(self.created_at)
    }
}

pub fn system_time_to_millis(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as f64,
        Err(e) => -(e.duration().as_millis() as f64),
    }
}

pub fn millis_to_system_time(ms: i64) -> SystemTime {
    if ms >= 0 {
        UNIX_EPOCH + Duration::from_millis(ms as u64)
    } else {
        UNIX_EPOCH - Duration::from_millis(ms.unsigned_abs())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown field {0:?} (expected one of temperature_BMP, temperature_DHT, humidity_DHT, pressure_BMP)")]
pub struct FieldError(pub String);

/// A numeric measurement carried by every [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    TemperatureBmp,
    TemperatureDht,
    HumidityDht,
    PressureBmp,
}

impl Field {
    /// Chart order.
    pub const ALL: [Field; 4] = [
        Field::TemperatureBmp,
        Field::TemperatureDht,
        Field::HumidityDht,
        Field::PressureBmp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::TemperatureBmp => "temperature_BMP",
            Field::TemperatureDht => "temperature_DHT",
            Field::HumidityDht => "humidity_DHT",
            Field::PressureBmp => "pressure_BMP",
        }
    }

    pub fn value(self, reading: &Reading) -> f64 {
        match self {
            Field::TemperatureBmp => reading.temperature_bmp,
            Field::TemperatureDht => reading.temperature_dht,
            Field::HumidityDht => reading.humidity_dht,
            Field::PressureBmp => reading.pressure_bmp,
        }
    }

    /// Unit suffix used when labelling charts.
    pub fn unit(self) -> &'static str {
        match self {
            Field::TemperatureBmp | Field::TemperatureDht => "°C",
            Field::HumidityDht => "%",
            Field::PressureBmp => "hPa",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FieldError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> Reading {
        Reading {
            id: 7,
            created_at: millis_to_system_time(1_680_307_200_000),
            temperature_bmp: 21.5,
            temperature_dht: 21.1,
            pressure_bmp: 1013.2,
            humidity_dht: 48.0,
        }
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(reading()).unwrap();
        assert_eq!(json["createdAt"], "2023-04-01T00:00:00Z");
        assert_eq!(json["temperature_BMP"], 21.5);
        assert_eq!(json["humidity_DHT"], 48.0);
        assert_eq!(json["pressure_BMP"], 1013.2);
    }

    #[test]
    fn parses_fractional_timestamps() {
        let r: Reading = serde_json::from_str(
            r#"{"id":1,"createdAt":"2023-04-01T00:00:00.250Z","temperature_BMP":1,
                "temperature_DHT":2,"pressure_BMP":3,"humidity_DHT":4}"#,
        )
        .unwrap();
        assert_eq!(r.timestamp_millis(), 1_680_307_200_250.0);
    }

    #[test]
    fn millis_round_trip_before_epoch() {
        let t = millis_to_system_time(-1500);
        assert_eq!(system_time_to_millis(t), -1500.0);
    }

    #[test]
    fn field_projection() {
        let r = reading();
        let values: Vec<f64> = Field::ALL.iter().map(|f| f.value(&r)).collect();
        assert_eq!(values, vec![21.5, 21.1, 48.0, 1013.2]);
    }

    #[test]
    fn field_names_parse() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>(), Ok(field));
        }
        assert_eq!("HUMIDITY_dht".parse::<Field>(), Ok(Field::HumidityDht));
        assert_eq!(
            "wind".parse::<Field>(),
            Err(FieldError("wind".to_string()))
        );
    }
}
