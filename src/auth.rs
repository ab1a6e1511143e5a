use std::fs;
use std::path::Path;

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use log::debug;
use reqwest::blocking::Client;
use ring::signature::RsaKeyPair;
use serde_derive::{Deserialize, Serialize};

use crate::error::WriteError;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Something that can hand out a bearer token for a Google API scope.
pub trait TokenSource {
    fn access_token(&self, client: &Client, scope: &str) -> Result<String, WriteError>;

    fn project_id(&self) -> Option<&str> {
        None
    }
}

/// Pre-issued token, e.g. from `gcloud auth print-access-token`.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn access_token(&self, _client: &Client, _scope: &str) -> Result<String, WriteError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct ServiceAccount {
    #[serde(default)]
    project_id: Option<String>,
    private_key: String,
    client_email: String,
    token_uri: String,
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

impl ServiceAccount {
    pub fn from_file(path: &Path) -> Result<Self, WriteError> {
        let contents = fs::read_to_string(path).map_err(|source| WriteError::CredentialsFile {
            path: path.to_path_buf(),
            source,
        })?;
        ServiceAccount::try_from_str(&contents)
    }

    pub fn try_from_str(input: &str) -> Result<Self, WriteError> {
        serde_json::from_str(input).map_err(|err| {
            WriteError::Credentials(format!("failed to parse service account key: {}", err))
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Builds the signed JWT that is exchanged for an access token.
    pub fn signed_assertion(&self, scope: &str) -> Result<String, WriteError> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(encode_json(&header)?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(encode_json(&claims)?);
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let key_pair = self.key_pair()?;
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| WriteError::Credentials("failed to sign token request".to_string()))?;

        Ok(format!(
            "{}.{}",
            signing_input,
            BASE64_URL_SAFE_NO_PAD.encode(&signature)
        ))
    }

    fn key_pair(&self) -> Result<RsaKeyPair, WriteError> {
        let mut reader = std::io::Cursor::new(self.private_key.as_bytes());
        let item = rustls_pemfile::read_one(&mut reader)
            .map_err(|err| WriteError::Credentials(format!("invalid PEM private key: {}", err)))?;
        match item {
            Some(rustls_pemfile::Item::Pkcs8Key(der)) => RsaKeyPair::from_pkcs8(
                der.secret_pkcs8_der(),
            )
            .map_err(|err| WriteError::Credentials(format!("rejected pkcs8 key: {}", err))),
            Some(rustls_pemfile::Item::Pkcs1Key(der)) => RsaKeyPair::from_der(
                der.secret_pkcs1_der(),
            )
            .map_err(|err| WriteError::Credentials(format!("rejected pkcs1 key: {}", err))),
            _ => Err(WriteError::Credentials(
                "no RSA private key in service account".to_string(),
            )),
        }
    }
}

impl TokenSource for ServiceAccount {
    fn access_token(&self, client: &Client, scope: &str) -> Result<String, WriteError> {
        let assertion = self.signed_assertion(scope)?;
        debug!("exchanging jwt for {} at {}", self.client_email, self.token_uri);

        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)];
        let response = client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .map_err(|source| WriteError::Request {
                url: self.token_uri.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| WriteError::Request {
            url: self.token_uri.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(WriteError::Auth { status, body });
        }

        let token: AccessToken = serde_json::from_str(&body).map_err(|err| {
            WriteError::Credentials(format!("malformed token response: {}", err))
        })?;
        Ok(token.access_token)
    }

    fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, WriteError> {
    serde_json::to_string(value)
        .map_err(|err| WriteError::Credentials(format!("failed to encode jwt: {}", err)))
}
