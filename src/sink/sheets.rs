use reqwest::blocking::Client;
use serde_json::{json, Value};
use url::Url;

use super::{post_json, Sink, WriteReceipt};
use crate::auth::{TokenSource, SPREADSHEETS_SCOPE};
use crate::error::WriteError;
use crate::snapshot::SensorSnapshot;

pub const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";

const SINK_NAME: &str = "sheets";

/// Appends one row per snapshot after the last row of a named sheet.
pub struct SheetsSink {
    client: Client,
    tokens: Box<dyn TokenSource>,
    endpoint: Url,
    spreadsheet_id: String,
    sheet_name: String,
}

impl SheetsSink {
    pub fn new(
        client: Client,
        tokens: Box<dyn TokenSource>,
        endpoint: Url,
        spreadsheet_id: String,
        sheet_name: String,
    ) -> Self {
        SheetsSink {
            client,
            tokens,
            endpoint,
            spreadsheet_id,
            sheet_name,
        }
    }

    pub fn append_url(&self) -> Result<Url, WriteError> {
        let mut url = self.endpoint.clone();
        let append = format!("{}:append", self.sheet_name);
        url.path_segments_mut()
            .map_err(|_| WriteError::Response {
                sink: SINK_NAME,
                reason: format!("endpoint {} cannot take a path", self.endpoint),
            })?
            .pop_if_empty()
            .extend(&[
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                append.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }
}

impl Sink for SheetsSink {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    fn write(&mut self, snapshot: &SensorSnapshot) -> Result<WriteReceipt, WriteError> {
        let url = self.append_url()?;
        let token = self.tokens.access_token(&self.client, SPREADSHEETS_SCOPE)?;
        let appended = post_json(&self.client, SINK_NAME, url, &token, &rows(snapshot))?;

        let range = appended
            .pointer("/updates/updatedRange")
            .and_then(Value::as_str)
            .unwrap_or(self.sheet_name.as_str());
        Ok(WriteReceipt {
            location: format!("{}/{}", self.spreadsheet_id, range),
        })
    }
}

pub fn rows(snapshot: &SensorSnapshot) -> Value {
    json!({ "values": [snapshot.row()] })
}
