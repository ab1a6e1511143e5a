use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_derive::Deserialize;

use crate::error::ConfigError;
use crate::sensor::{DEFAULT_SENSOR_URL, DEFAULT_TIMEOUT};
use crate::sink::{FIRESTORE_ENDPOINT, SHEETS_ENDPOINT};

pub const DEFAULT_CREDENTIALS: &str = "firebase-key.json";
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a logging run needs, resolved from defaults, the config file
/// and the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub sensor_url: String,
    pub timeout: Duration,
    pub write_timeout: Duration,
    pub credentials: PathBuf,
    pub access_token: Option<String>,
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    Firestore(FirestoreConfig),
    Sheets(SheetsConfig),
    Csv(CsvConfig),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FirestoreConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    pub user_id: String,
    pub plant_id: String,
    #[serde(default = "firestore_endpoint")]
    pub endpoint: String,
}

impl FirestoreConfig {
    pub fn new(user_id: &str, plant_id: &str) -> Self {
        FirestoreConfig {
            project_id: None,
            user_id: user_id.to_string(),
            plant_id: plant_id.to_string(),
            endpoint: firestore_endpoint(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    #[serde(default = "sheets_endpoint")]
    pub endpoint: String,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: &str, sheet_name: &str) -> Self {
        SheetsConfig {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            endpoint: sheets_endpoint(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsvConfig {
    pub path: PathBuf,
}

/// On-disk config. Every field is optional so the command line can fill gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub sensor_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub write_timeout_secs: Option<u64>,
    pub credentials: Option<PathBuf>,
    pub sink: Option<SinkConfig>,
}

fn firestore_endpoint() -> String {
    FIRESTORE_ENDPOINT.to_string()
}

fn sheets_endpoint() -> String {
    SHEETS_ENDPOINT.to_string()
}

// A zero timeout would fail every request before it is sent.
fn timeout_secs(field: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidTimeout { field });
    }
    Ok(Duration::from_secs(secs))
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Config {
    pub fn new(sink: SinkConfig) -> Self {
        Config {
            sensor_url: DEFAULT_SENSOR_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            credentials: PathBuf::from(DEFAULT_CREDENTIALS),
            access_token: None,
            sink,
        }
    }

    /// Applies the file on top of the defaults. A sink given here wins over
    /// the one in the file.
    pub fn from_layers(
        file: Option<ConfigFile>,
        sink: Option<SinkConfig>,
    ) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let sink = match sink.or(file.sink) {
            Some(sink) => sink,
            None => return Err(ConfigError::MissingSink),
        };

        let mut config = Config::new(sink);
        if let Some(url) = file.sensor_url {
            config.sensor_url = url;
        }
        if let Some(secs) = file.timeout_secs {
            config.timeout = timeout_secs("timeout_secs", secs)?;
        }
        if let Some(secs) = file.write_timeout_secs {
            config.write_timeout = timeout_secs("write_timeout_secs", secs)?;
        }
        if let Some(credentials) = file.credentials {
            config.credentials = credentials;
        }
        Ok(config)
    }
}
