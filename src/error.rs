use std::io;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("sensor service at {url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed sensor response: {0}")]
    Body(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to read credentials from {path}: {source}")]
    CredentialsFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid credentials: {0}")]
    Credentials(String),

    #[error("token exchange rejected with {status}: {body}")]
    Auth { status: StatusCode, body: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{sink} rejected the write with {status}: {body}")]
    Rejected {
        sink: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("unexpected response from {sink}: {reason}")]
    Response { sink: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no sink configured, pass one of firestore, sheets or csv")]
    MissingSink,

    #[error("{field} must be at least one second")]
    InvalidTimeout { field: &'static str },

    #[error("missing project id, set it in the config or use a key file that has one")]
    MissingProject,
}

/// Top level failure of a logging run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch sensor data: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to write snapshot: {0}")]
    Write(#[from] WriteError),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::Fetch(_) | Error::Write(_) => 1,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
