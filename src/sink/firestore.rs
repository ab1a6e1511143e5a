use reqwest::blocking::Client;
use serde_json::{json, Map, Value};
use url::Url;

use super::{post_json, Sink, WriteReceipt};
use crate::auth::{TokenSource, DATASTORE_SCOPE};
use crate::error::WriteError;
use crate::snapshot::SensorSnapshot;

pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

const SINK_NAME: &str = "firestore";

/// Adds one document per snapshot under `users/{user}/plants/{plant}/logs`.
pub struct FirestoreSink {
    client: Client,
    tokens: Box<dyn TokenSource>,
    endpoint: Url,
    project_id: String,
    user_id: String,
    plant_id: String,
}

impl FirestoreSink {
    pub fn new(
        client: Client,
        tokens: Box<dyn TokenSource>,
        endpoint: Url,
        project_id: String,
        user_id: String,
        plant_id: String,
    ) -> Self {
        FirestoreSink {
            client,
            tokens,
            endpoint,
            project_id,
            user_id,
            plant_id,
        }
    }

    /// Collection that receives the log documents.
    pub fn collection_url(&self) -> Result<Url, WriteError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| WriteError::Response {
                sink: SINK_NAME,
                reason: format!("endpoint {} cannot take a path", self.endpoint),
            })?
            .pop_if_empty()
            .extend(&[
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                "users",
                self.user_id.as_str(),
                "plants",
                self.plant_id.as_str(),
                "logs",
            ]);
        Ok(url)
    }
}

impl Sink for FirestoreSink {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    fn write(&mut self, snapshot: &SensorSnapshot) -> Result<WriteReceipt, WriteError> {
        let url = self.collection_url()?;
        let token = self.tokens.access_token(&self.client, DATASTORE_SCOPE)?;
        let created = post_json(&self.client, SINK_NAME, url, &token, &document(snapshot))?;

        match created.get("name").and_then(Value::as_str) {
            Some(name) => Ok(WriteReceipt {
                location: name.to_string(),
            }),
            None => Err(WriteError::Response {
                sink: SINK_NAME,
                reason: "created document has no name".to_string(),
            }),
        }
    }
}

/// Firestore REST encoding of a snapshot.
pub fn document(snapshot: &SensorSnapshot) -> Value {
    let mut fields = Map::new();
    fields.insert(
        "timestamp".to_string(),
        json!({ "stringValue": snapshot.timestamp_string() }),
    );
    fields.insert("soilMoisture".to_string(), number(snapshot.soil_moisture));
    fields.insert("temperature".to_string(), number(snapshot.temperature));
    fields.insert("humidity".to_string(), number(snapshot.humidity));
    json!({ "fields": fields })
}

// Whole readings keep the integer type the sensor reported them with.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        json!({ "integerValue": format!("{}", value as i64) })
    } else {
        json!({ "doubleValue": value })
    }
}
