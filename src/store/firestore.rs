//! Firestore REST (v1) implementation of [`DocumentStore`].

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::{generate_id, is_valid_id, Document, DocumentStore, FieldValue, Fields, StoreError};
use crate::firebase::{error_message, ServiceCredentials};

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

pub struct FirestoreStore {
    client: Client,
    base_url: String,
    credentials: Arc<dyn ServiceCredentials>,
}

impl FirestoreStore {
    pub fn new(credentials: Arc<dyn ServiceCredentials>) -> Self {
        Self::with_base_url(credentials, FIRESTORE_API)
    }

    /// Point the store at another host, e.g. an emulator or a mock server.
    pub fn with_base_url(credentials: Arc<dyn ServiceCredentials>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    async fn documents_root(&self) -> Result<String, StoreError> {
        let project_id = self.credentials.project_id().await?;
        Ok(format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, project_id
        ))
    }

    /// `<root>/<collection>/<id>` with the id encoded as one path segment.
    async fn document_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }

        let root = self.documents_root().await?;
        let mut url = Url::parse(&root).map_err(|e| StoreError::Api(format!("invalid Firestore URL {}: {}", root, e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Api(format!("invalid Firestore URL {}", root)))?
            .push(collection)
            .push(id);
        Ok(url)
    }

    async fn token(&self) -> Result<String, StoreError> {
        Ok(self.credentials.access_token().await?)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn new_id(&self) -> String {
        generate_id()
    }

    async fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        let url = format!("{}/{}", self.documents_root().await?, collection);
        let body = json!({ "fields": encode_fields(&fields) });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token().await?)
            .query(&[("documentId", id)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Api(error_message(response, "Create document failed").await));
        }

        let wire: WireDocument = response.json().await?;
        debug!("created {}/{}", collection, id);
        decode_document(wire)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = match self.document_url(collection, id).await {
            Ok(url) => url,
            Err(StoreError::InvalidId(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let response = self.client.get(url).bearer_auth(self.token().await?).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Api(error_message(response, "Get document failed").await));
        }

        let wire: WireDocument = response.json().await?;
        decode_document(wire).map(Some)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}/{}", self.documents_root().await?, collection);
        let token = self.token().await?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(t) = page_token.take() {
                query.push(("pageToken", t));
            }

            let response = self.client.get(&url).bearer_auth(&token).query(&query).send().await?;

            if !response.status().is_success() {
                return Err(StoreError::Api(error_message(response, "List documents failed").await));
            }

            let page: ListDocumentsResponse = response.json().await?;
            for wire in page.documents {
                documents.push(decode_document(wire)?);
            }

            match page.next_page_token {
                Some(t) if !t.is_empty() => page_token = Some(t),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn find_eq(&self, collection: &str, field: &str, value: FieldValue) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}:runQuery", self.documents_root().await?);
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": encode_value(&value),
                    }
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token().await?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Api(error_message(response, "Run query failed").await));
        }

        let rows: Vec<RunQueryRow> = response.json().await?;
        rows.into_iter()
            .filter_map(|row| row.document)
            .map(decode_document)
            .collect()
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError> {
        let url = self.document_url(collection, id).await?;

        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.clone()))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let response = self
            .client
            .patch(url)
            .bearer_auth(self.token().await?)
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("{}/{}", collection, id)));
        }
        if !response.status().is_success() {
            return Err(StoreError::Api(error_message(response, "Update document failed").await));
        }

        let wire: WireDocument = response.json().await?;
        decode_document(wire)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(collection, id).await?;

        let response = self.client.delete(url).bearer_auth(self.token().await?).send().await?;

        if !response.status().is_success() {
            return Err(StoreError::Api(error_message(response, "Delete document failed").await));
        }

        debug!("deleted {}/{}", collection, id);
        Ok(())
    }
}

// Firestore wire format

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, WireValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    document: Option<WireDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum WireValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    StringValue(String),
    TimestampValue(String),
    ArrayValue(WireArray),
    MapValue(WireMap),
    GeoPointValue(WireGeoPoint),
    ReferenceValue(String),
    BytesValue(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireArray {
    #[serde(default)]
    values: Vec<WireValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireMap {
    #[serde(default)]
    fields: BTreeMap<String, WireValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireGeoPoint {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

fn encode_fields(fields: &Fields) -> BTreeMap<String, WireValue> {
    fields.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect()
}

fn encode_value(value: &FieldValue) -> WireValue {
    match value {
        FieldValue::Null => WireValue::NullValue(()),
        FieldValue::Bool(b) => WireValue::BooleanValue(*b),
        FieldValue::Integer(i) => WireValue::IntegerValue(i.to_string()),
        FieldValue::Double(d) => WireValue::DoubleValue(*d),
        FieldValue::String(s) => WireValue::StringValue(s.clone()),
        FieldValue::Timestamp(ts) => WireValue::TimestampValue(ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
        FieldValue::Array(values) => WireValue::ArrayValue(WireArray {
            values: values.iter().map(encode_value).collect(),
        }),
        FieldValue::Map(fields) => WireValue::MapValue(WireMap {
            fields: encode_fields(fields),
        }),
    }
}

fn decode_fields(fields: BTreeMap<String, WireValue>) -> Result<Fields, StoreError> {
    fields
        .into_iter()
        .map(|(k, v)| decode_value(v).map(|v| (k, v)))
        .collect()
}

fn decode_value(value: WireValue) -> Result<FieldValue, StoreError> {
    Ok(match value {
        WireValue::NullValue(()) => FieldValue::Null,
        WireValue::BooleanValue(b) => FieldValue::Bool(b),
        WireValue::IntegerValue(s) => FieldValue::Integer(
            s.parse()
                .map_err(|_| StoreError::Malformed(format!("invalid integer value '{}'", s)))?,
        ),
        WireValue::DoubleValue(d) => FieldValue::Double(d),
        WireValue::StringValue(s) | WireValue::ReferenceValue(s) | WireValue::BytesValue(s) => FieldValue::String(s),
        WireValue::TimestampValue(s) => FieldValue::Timestamp(
            DateTime::parse_from_rfc3339(&s)
                .map_err(|_| StoreError::Malformed(format!("invalid timestamp '{}'", s)))?
                .with_timezone(&Utc),
        ),
        WireValue::ArrayValue(array) => FieldValue::Array(
            array
                .values
                .into_iter()
                .map(decode_value)
                .collect::<Result<_, _>>()?,
        ),
        WireValue::MapValue(map) => FieldValue::Map(decode_fields(map.fields)?),
        WireValue::GeoPointValue(point) => {
            let mut fields = Fields::new();
            fields.insert("lat".to_string(), FieldValue::Double(point.latitude));
            fields.insert("lng".to_string(), FieldValue::Double(point.longitude));
            FieldValue::Map(fields)
        }
    })
}

fn decode_document(wire: WireDocument) -> Result<Document, StoreError> {
    let id = wire
        .name
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StoreError::Malformed(format!("invalid document name '{}'", wire.name)))?
        .to_string();

    Ok(Document {
        id,
        fields: decode_fields(wire.fields)?,
    })
}
