use crate::domain::ports::Weather;
use crate::utils::error::{AirFlowError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Outdoor conditions at a point in time. Any of them may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// °C
    pub dry_bulb_temperature: Option<f64>,
    /// m/s, at the weather station.
    pub wind_speed: Option<f64>,
    /// Degrees clockwise from north.
    pub wind_direction: Option<f64>,
}

/// The same conditions at every date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstantWeather {
    #[serde(default)]
    pub dry_bulb_temperature: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_direction: Option<f64>,
}

impl ConstantWeather {
    pub fn new(dry_bulb_temperature: f64, wind_speed: f64) -> Self {
        Self {
            dry_bulb_temperature: Some(dry_bulb_temperature),
            wind_speed: Some(wind_speed),
            wind_direction: None,
        }
    }

    pub fn with_wind_direction(mut self, wind_direction: f64) -> Self {
        self.wind_direction = Some(wind_direction);
        self
    }
}

impl Weather for ConstantWeather {
    fn get_weather_data(&self, _date: NaiveDateTime) -> CurrentWeather {
        CurrentWeather {
            dry_bulb_temperature: self.dry_bulb_temperature,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherRow {
    timestamp: String,
    #[serde(default)]
    dry_bulb_temperature: Option<f64>,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    wind_direction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub timestamp: NaiveDateTime,
    pub data: CurrentWeather,
}

/// Weather read from a time series, interpolated linearly between records.
///
/// Dates before the first record or after the last one get the closest record.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSeries {
    records: Vec<WeatherRecord>,
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| AirFlowError::weather(format!("Unrecognised timestamp '{}'", value)))
}

impl WeatherSeries {
    pub fn new(mut records: Vec<WeatherRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(AirFlowError::weather("Weather series has no records"));
        }
        records.sort_by_key(|r| r.timestamp);
        Ok(Self { records })
    }

    /// Reads `timestamp,dry_bulb_temperature,wind_speed,wind_direction` CSV data.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (row_number, row) in csv_reader.deserialize::<WeatherRow>().enumerate() {
            let row = row?;
            let timestamp = parse_timestamp(&row.timestamp).map_err(|e| {
                AirFlowError::weather(format!("Row {}: {}", row_number + 1, e))
            })?;
            records.push(WeatherRecord {
                timestamp,
                data: CurrentWeather {
                    dry_bulb_temperature: row.dry_bulb_temperature,
                    wind_speed: row.wind_speed,
                    wind_direction: row.wind_direction,
                },
            });
        }

        tracing::debug!("Read {} weather records", records.len());
        Self::new(records)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_csv_reader(data)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    pub fn records(&self) -> &[WeatherRecord] {
        &self.records
    }

    pub fn first_timestamp(&self) -> NaiveDateTime {
        self.records[0].timestamp
    }

    pub fn last_timestamp(&self) -> NaiveDateTime {
        self.records[self.records.len() - 1].timestamp
    }
}

fn interpolate(a: Option<f64>, b: Option<f64>, fraction: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + fraction * (b - a)),
        (a, b) if fraction < 0.5 => a.or(b),
        (a, b) => b.or(a),
    }
}

/// Interpolates along the shortest arc, so 350° and 10° meet at 0°.
fn interpolate_direction(a: Option<f64>, b: Option<f64>, fraction: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let diff = (b - a + 540.0).rem_euclid(360.0) - 180.0;
            Some((a + fraction * diff).rem_euclid(360.0))
        }
        (a, b) => interpolate(a, b, fraction),
    }
}

impl Weather for WeatherSeries {
    fn get_weather_data(&self, date: NaiveDateTime) -> CurrentWeather {
        let next = self.records.partition_point(|r| r.timestamp <= date);
        if next == 0 {
            return self.records[0].data;
        }
        let previous = &self.records[next - 1];
        if next == self.records.len() || previous.timestamp == date {
            return previous.data;
        }
        let following = &self.records[next];

        let span = (following.timestamp - previous.timestamp).num_seconds() as f64;
        let fraction = (date - previous.timestamp).num_seconds() as f64 / span;

        CurrentWeather {
            dry_bulb_temperature: interpolate(
                previous.data.dry_bulb_temperature,
                following.data.dry_bulb_temperature,
                fraction,
            ),
            wind_speed: interpolate(previous.data.wind_speed, following.data.wind_speed, fraction),
            wind_direction: interpolate_direction(
                previous.data.wind_direction,
                following.data.wind_direction,
                fraction,
            ),
        }
    }

    fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.first_timestamp(), self.last_timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
timestamp,dry_bulb_temperature,wind_speed,wind_direction
2024-01-01 01:00,2.0,4.0,350
2024-01-01 00:00,0.0,2.0,
2024-01-01 02:00,4.0,,10
";

    fn at(value: &str) -> NaiveDateTime {
        parse_timestamp(value).unwrap()
    }

    #[test]
    fn test_records_are_sorted() {
        let series = WeatherSeries::from_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(series.records().len(), 3);
        assert_eq!(series.first_timestamp(), at("2024-01-01 00:00"));
        assert_eq!(series.last_timestamp(), at("2024-01-01 02:00"));
        assert_eq!(
            series.time_range(),
            Some((at("2024-01-01 00:00"), at("2024-01-01 02:00")))
        );
    }

    #[test]
    fn test_linear_interpolation() {
        let series = WeatherSeries::from_bytes(CSV.as_bytes()).unwrap();
        let w = series.get_weather_data(at("2024-01-01 00:30"));
        assert!((w.dry_bulb_temperature.unwrap() - 1.0).abs() < 1e-9);
        assert!((w.wind_speed.unwrap() - 3.0).abs() < 1e-9);
        // Only the later record has a direction.
        assert_eq!(w.wind_direction, Some(350.0));
    }

    #[test]
    fn test_exact_timestamps_and_clamping() {
        let series = WeatherSeries::from_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(
            series.get_weather_data(at("2024-01-01 01:00")).dry_bulb_temperature,
            Some(2.0)
        );
        assert_eq!(
            series.get_weather_data(at("2023-12-31 12:00")).dry_bulb_temperature,
            Some(0.0)
        );
        assert_eq!(
            series.get_weather_data(at("2024-01-02 00:00")).dry_bulb_temperature,
            Some(4.0)
        );
    }

    #[test]
    fn test_missing_value_uses_nearest_record() {
        let series = WeatherSeries::from_bytes(CSV.as_bytes()).unwrap();
        let early = series.get_weather_data(at("2024-01-01 01:15"));
        assert_eq!(early.wind_speed, Some(4.0));
        let late = series.get_weather_data(at("2024-01-01 01:45"));
        assert_eq!(late.wind_speed, Some(4.0));
    }

    #[test]
    fn test_wind_direction_shortest_arc() {
        let series = WeatherSeries::from_bytes(CSV.as_bytes()).unwrap();
        let w = series.get_weather_data(at("2024-01-01 01:30"));
        let direction = w.wind_direction.unwrap();
        assert!(direction.abs() < 1e-9 || (direction - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series_is_an_error() {
        let err = WeatherSeries::from_bytes(b"timestamp,dry_bulb_temperature\n").unwrap_err();
        assert!(matches!(err, AirFlowError::WeatherError { .. }));
    }

    #[test]
    fn test_bad_timestamp_reports_row() {
        let err = WeatherSeries::from_bytes(b"timestamp,dry_bulb_temperature\nyesterday,3\n")
            .unwrap_err();
        assert!(err.to_string().contains("Row 1"));
    }

    #[test]
    fn test_constant_weather() {
        let weather = ConstantWeather::new(5.0, 3.0).with_wind_direction(90.0);
        let w = weather.get_weather_data(at("2024-06-01 12:00"));
        assert_eq!(w.dry_bulb_temperature, Some(5.0));
        assert_eq!(w.wind_speed, Some(3.0));
        assert_eq!(w.wind_direction, Some(90.0));
    }
}
