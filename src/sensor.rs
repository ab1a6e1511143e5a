use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;

use crate::error::FetchError;
use crate::snapshot::*;

pub const DEFAULT_SENSOR_URL: &str = "https://gardenpi.duckdns.org/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SensorReader {
    client: Client,
    url: String,
    timeout: Duration,
}

impl SensorReader {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(SensorReader {
            client,
            url: url.to_string(),
            timeout,
        })
    }

    /// Reads the sensor once and stamps the values with the current time.
    pub fn fetch(&self) -> Result<SensorSnapshot, FetchError> {
        debug!("GET {} (timeout {:?})", self.url, self.timeout);
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| self.request_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.text().map_err(|err| self.request_error(err))?;
        debug!("sensor responded with {} bytes", body.len());
        let reading = parse_reading(&body)?;
        Ok(SensorSnapshot::capture(&reading))
    }

    fn request_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: self.url.clone(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Request {
                url: self.url.clone(),
                source: err,
            }
        }
    }
}

pub fn fetch_snapshot(url: &str, timeout: Duration) -> Result<SensorSnapshot, FetchError> {
    SensorReader::new(url, timeout)?.fetch()
}

pub fn parse_reading(body: &str) -> Result<SensorReading, FetchError> {
    Ok(serde_json::from_str(body)?)
}
