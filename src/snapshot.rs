use std::fmt;

use chrono::prelude::*;
use serde::Serializer;
use serde_derive::{Deserialize, Serialize};

/// Body served by the sensor service. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorReading {
    pub soil: SoilReading,
    pub temperature: ValueReading,
    pub humidity: ValueReading,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoilReading {
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValueReading {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl SensorSnapshot {
    pub fn from_reading(reading: &SensorReading, timestamp: DateTime<Utc>) -> Self {
        SensorSnapshot {
            timestamp,
            soil_moisture: reading.soil.percent,
            temperature: reading.temperature.value,
            humidity: reading.humidity.value,
        }
    }

    /// Stamps the reading with the current UTC time.
    pub fn capture(reading: &SensorReading) -> Self {
        SensorSnapshot::from_reading(reading, Utc::now())
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Values in spreadsheet column order.
    pub fn row(&self) -> Vec<serde_json::Value> {
        vec![
            self.timestamp_string().into(),
            self.soil_moisture.into(),
            self.temperature.into(),
            self.humidity.into(),
        ]
    }
}

impl fmt::Display for SensorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{timestamp: {}, soilMoisture: {}, temperature: {}, humidity: {}}}",
            self.timestamp_string(),
            self.soil_moisture,
            self.temperature,
            self.humidity
        )
    }
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
}
