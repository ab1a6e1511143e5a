use std::fmt;

use reqwest::blocking::Client;
use url::Url;

use crate::auth::{ServiceAccount, StaticToken, TokenSource};
use crate::config::{Config, SinkConfig};
use crate::error::{ConfigError, Error, WriteError};
use crate::snapshot::SensorSnapshot;

mod csv_file;
mod firestore;
mod sheets;

pub use self::csv_file::CsvSink;
pub use self::firestore::{FirestoreSink, FIRESTORE_ENDPOINT};
pub use self::sheets::{SheetsSink, SHEETS_ENDPOINT};

/// Where a snapshot ended up after a successful write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReceipt {
    pub location: String,
}

impl fmt::Display for WriteReceipt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// Destination that appends one record per snapshot.
pub trait Sink {
    fn name(&self) -> &'static str;

    fn write(&mut self, snapshot: &SensorSnapshot) -> Result<WriteReceipt, WriteError>;
}

/// Opens the sink selected by the configuration. Credentials are loaded here,
/// before anything is fetched.
pub fn open(config: &Config) -> Result<Box<dyn Sink>, Error> {
    match &config.sink {
        SinkConfig::Csv(csv) => Ok(Box::new(CsvSink::new(&csv.path))),
        SinkConfig::Firestore(firestore) => {
            let tokens = token_source(config)?;
            let project_id = match firestore
                .project_id
                .clone()
                .or_else(|| tokens.project_id().map(str::to_string))
            {
                Some(project_id) => project_id,
                None => return Err(ConfigError::MissingProject.into()),
            };
            let sink = FirestoreSink::new(
                google_client(config)?,
                tokens,
                parse_endpoint(&firestore.endpoint)?,
                project_id,
                firestore.user_id.clone(),
                firestore.plant_id.clone(),
            );
            Ok(Box::new(sink))
        }
        SinkConfig::Sheets(sheets) => {
            let sink = SheetsSink::new(
                google_client(config)?,
                token_source(config)?,
                parse_endpoint(&sheets.endpoint)?,
                sheets.spreadsheet_id.clone(),
                sheets.sheet_name.clone(),
            );
            Ok(Box::new(sink))
        }
    }
}

fn token_source(config: &Config) -> Result<Box<dyn TokenSource>, WriteError> {
    match &config.access_token {
        Some(token) => Ok(Box::new(StaticToken(token.clone()))),
        None => Ok(Box::new(ServiceAccount::from_file(&config.credentials)?)),
    }
}

fn google_client(config: &Config) -> Result<Client, WriteError> {
    Client::builder()
        .timeout(config.write_timeout)
        .build()
        .map_err(WriteError::Client)
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    Url::parse(endpoint).map_err(|source| ConfigError::Url {
        url: endpoint.to_string(),
        source,
    })
}

/// Sends an authorized JSON POST and returns the parsed response body.
pub(crate) fn post_json(
    client: &Client,
    sink: &'static str,
    url: Url,
    token: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value, WriteError> {
    log::debug!("POST {}", url);
    let response = client
        .post(url.clone())
        .bearer_auth(token)
        .json(body)
        .send()
        .map_err(|source| WriteError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    let text = response.text().map_err(|source| WriteError::Request {
        url: url.to_string(),
        source,
    })?;
    if !status.is_success() {
        return Err(WriteError::Rejected {
            sink,
            status,
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|err| WriteError::Response {
        sink,
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CsvConfig, FirestoreConfig, SheetsConfig};

    #[test]
    fn opens_csv_without_credentials() {
        let mut config = Config::new(SinkConfig::Csv(CsvConfig {
            path: "readings.csv".into(),
        }));
        config.credentials = "/missing/key.json".into();
        let sink = open(&config).unwrap();
        assert_eq!(sink.name(), "csv");
    }

    #[test]
    fn firestore_needs_a_project() {
        let mut config = Config::new(SinkConfig::Firestore(FirestoreConfig::new(
            "user-1", "basil",
        )));
        config.access_token = Some("token".to_string());
        match open(&config) {
            Err(Error::Config(ConfigError::MissingProject)) => {}
            Err(other) => panic!("expected missing project, got {}", other),
            Ok(_) => panic!("expected missing project"),
        }
    }

    #[test]
    fn missing_key_file_fails_before_fetching() {
        let mut config = Config::new(SinkConfig::Sheets(SheetsConfig::new("sheet-id", "Log")));
        config.credentials = "/missing/key.json".into();
        match open(&config) {
            Err(Error::Write(WriteError::CredentialsFile { .. })) => {}
            Err(other) => panic!("expected credentials error, got {}", other),
            Ok(_) => panic!("expected credentials error"),
        }
    }

    #[test]
    fn client_setup_failure_has_its_own_variant() {
        let source = Client::new().get("http://[::1").send().unwrap_err();
        let err = WriteError::Client(source);
        assert!(err.to_string().starts_with("failed to build http client: "));
    }

    #[test]
    fn bad_endpoint_is_a_config_error() {
        let mut sheets = SheetsConfig::new("sheet-id", "Log");
        sheets.endpoint = "not a url".to_string();
        let mut config = Config::new(SinkConfig::Sheets(sheets));
        config.access_token = Some("token".to_string());
        assert!(matches!(
            open(&config),
            Err(Error::Config(ConfigError::Url { .. }))
        ));
    }
}
