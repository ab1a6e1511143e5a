//! Reads the garden sensor service once and appends the reading, stamped with
//! the current UTC time, to a Firestore collection, a Google Sheet or a CSV
//! file.

use log::info;

pub mod auth;
pub mod config;
pub mod error;
pub mod sensor;
pub mod sink;
pub mod snapshot;

pub use config::{Config, SinkConfig};
pub use error::{ConfigError, Error, FetchError, Result, WriteError};
pub use sensor::{fetch_snapshot, SensorReader};
pub use sink::{Sink, WriteReceipt};
pub use snapshot::{SensorReading, SensorSnapshot};

/// Fetches one snapshot and hands it to the sink. Nothing is written when the
/// fetch fails.
pub fn log_once(reader: &SensorReader, sink: &mut dyn Sink) -> Result<SensorSnapshot> {
    let snapshot = reader.fetch()?;
    let receipt = sink.write(&snapshot)?;
    let record = serde_json::to_string(&snapshot).unwrap_or_else(|_| snapshot.to_string());
    info!("Logged data to {}: {}", receipt, record);
    Ok(snapshot)
}

/// One full run: credentials, fetch, write.
pub fn run(config: &Config) -> Result<SensorSnapshot> {
    let mut sink = sink::open(config)?;
    let reader = SensorReader::new(&config.sensor_url, config.timeout)?;
    log_once(&reader, sink.as_mut())
}
