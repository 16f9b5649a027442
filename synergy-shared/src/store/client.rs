//! HTTP record store client
//!
//! [`HttpRecordStore`] talks to the hosted record store over its JSON API.
//! Every request carries the project id and public key headers. Endpoints:
//!
//! ```text
//! fetch   POST   {base}/v1/collections/{collection}/records/query
//! get     POST   {base}/v1/collections/{collection}/records/{id}/query
//! create  POST   {base}/v1/collections/{collection}/records      {"records": [...]}
//! update  PATCH  {base}/v1/collections/{collection}/records      {"records": [...]}
//! delete  DELETE {base}/v1/collections/{collection}/records      {"RecordIds": [...]}
//! invoke  POST   {base}/v1/functions/{name}                      multipart
//! ```
//!
//! # Example
//!
//! ```no_run
//! use synergy_shared::store::{HttpRecordStore, Query, RecordStore, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = HttpRecordStore::new(StoreConfig::from_env()?)?;
//! let page = store.fetch_records("project_c", &Query::select(&["Id", "name_c"])).await?;
//! println!("{} projects on this page", page.records.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use std::env;
use std::fmt;
use std::time::Duration;

use super::query::Query;
use super::record_store::{
    Envelope, Page, RecordOutcome, RecordStore, StoreError, StoreOperation, StoreResult,
};
use crate::models::RecordId;

/// Header carrying the project identifier
pub const PROJECT_ID_HEADER: &str = "X-Project-Id";

/// Record store connection settings
#[derive(Clone)]
pub struct StoreConfig {
    /// Base URL of the store API, without trailing slash
    pub base_url: String,

    pub project_id: String,

    /// Public API key, sent as a bearer token
    pub public_key: String,

    /// Per-request timeout; no timeout when `None`
    pub request_timeout_secs: Option<u64>,
}

impl StoreConfig {
    /// Loads settings from the environment
    ///
    /// # Environment Variables
    ///
    /// - `SYNERGY_STORE_URL`: store base URL (required)
    /// - `SYNERGY_PROJECT_ID`: project identifier (required)
    /// - `SYNERGY_PUBLIC_KEY`: public API key (required)
    /// - `SYNERGY_REQUEST_TIMEOUT_SECS`: request timeout (default: none)
    pub fn from_env() -> StoreResult<Self> {
        dotenvy::dotenv().ok();

        let base_url = required_var("SYNERGY_STORE_URL")?;
        let project_id = required_var("SYNERGY_PROJECT_ID")?;
        let public_key = required_var("SYNERGY_PUBLIC_KEY")?;

        let request_timeout_secs = env::var("SYNERGY_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            public_key,
            request_timeout_secs,
        })
    }
}

fn required_var(name: &str) -> StoreResult<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StoreError::Config(format!("{} environment variable is required", name)))
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("public_key", &redact(&self.public_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Keeps the first four characters of a secret for log correlation
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}***", prefix)
}

/// Record store backed by the hosted HTTP API
#[derive(Clone)]
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordStore {
    /// Builds the HTTP client with auth headers installed
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            PROJECT_ID_HEADER,
            HeaderValue::from_str(&config.project_id)
                .map_err(|e| StoreError::Config(format!("Invalid project id: {}", e)))?,
        );
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.public_key))
            .map_err(|e| StoreError::Config(format!("Invalid public key: {}", e)))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            base_url = %config.base_url,
            project_id = %config.project_id,
            "Record store client configured"
        );

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/v1/collections/{}/records", self.base_url, collection)
    }

    /// Invokes a hosted function with a multipart body
    ///
    /// Returns the function's `data` payload. A `success: false` answer
    /// becomes [`StoreError::Rejected`] keyed by the function name.
    pub async fn invoke_function<T: DeserializeOwned>(
        &self,
        name: &str,
        form: reqwest::multipart::Form,
    ) -> StoreResult<T> {
        tracing::debug!(function = name, "Invoking store function");

        let response = self
            .client
            .post(format!("{}/v1/functions/{}", self.base_url, name))
            .multipart(form)
            .send()
            .await?;

        let envelope: Envelope<T> = parse_response(response).await?;
        if !envelope.success {
            return Err(rejected(name, envelope.message));
        }

        envelope
            .data
            .ok_or_else(|| StoreError::Decode(format!("Function {} returned no data", name)))
    }

    async fn write_batch(
        &self,
        operation: StoreOperation,
        collection: &str,
        request: reqwest::RequestBuilder,
        expected: usize,
    ) -> StoreResult<Vec<RecordOutcome>> {
        let response = request.send().await?;
        let envelope: Envelope<JsonValue> = parse_response(response).await?;

        if !envelope.success {
            tracing::warn!(
                operation = operation.as_str(),
                collection,
                message = ?envelope.message,
                "Record store rejected batch"
            );
            return Err(rejected(collection, envelope.message));
        }

        let results = envelope.results.unwrap_or_default();
        if results.len() != expected {
            return Err(StoreError::Decode(format!(
                "Expected {} {} results from {}, got {}",
                expected,
                operation.as_str(),
                collection,
                results.len()
            )));
        }

        let failed = results.iter().filter(|r| !r.success).count();
        if failed > 0 {
            tracing::warn!(
                operation = operation.as_str(),
                collection,
                failed,
                total = expected,
                "Some records were rejected"
            );
        }

        Ok(results)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_records(&self, collection: &str, query: &Query) -> StoreResult<Page> {
        let response = self
            .client
            .post(format!("{}/query", self.records_url(collection)))
            .json(query)
            .send()
            .await?;

        let envelope: Envelope<Vec<JsonValue>> = parse_response(response).await?;
        if !envelope.success {
            return Err(rejected(collection, envelope.message));
        }

        let records = envelope.data.unwrap_or_default();
        let total = envelope.total;

        tracing::debug!(collection, count = records.len(), ?total, "Fetched records");
        Ok(Page { records, total })
    }

    async fn get_record_by_id(
        &self,
        collection: &str,
        id: RecordId,
        fields: &[String],
    ) -> StoreResult<Option<JsonValue>> {
        let query = Query {
            fields: fields.to_vec(),
            ..Default::default()
        };

        let response = self
            .client
            .post(format!("{}/{}/query", self.records_url(collection), id))
            .json(&query)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope: Envelope<JsonValue> = parse_response(response).await?;
        if !envelope.success {
            return Err(rejected(collection, envelope.message));
        }

        Ok(envelope.data.filter(|data| !data.is_null()))
    }

    async fn create_records(
        &self,
        collection: &str,
        records: Vec<JsonValue>,
    ) -> StoreResult<Vec<RecordOutcome>> {
        let expected = records.len();
        let request = self
            .client
            .post(self.records_url(collection))
            .json(&json!({ "records": records }));

        self.write_batch(StoreOperation::Create, collection, request, expected)
            .await
    }

    async fn update_records(
        &self,
        collection: &str,
        records: Vec<JsonValue>,
    ) -> StoreResult<Vec<RecordOutcome>> {
        let expected = records.len();
        let request = self
            .client
            .patch(self.records_url(collection))
            .json(&json!({ "records": records }));

        self.write_batch(StoreOperation::Update, collection, request, expected)
            .await
    }

    async fn delete_records(
        &self,
        collection: &str,
        ids: &[RecordId],
    ) -> StoreResult<Vec<RecordOutcome>> {
        let request = self
            .client
            .delete(self.records_url(collection))
            .json(&json!({ "RecordIds": ids }));

        self.write_batch(StoreOperation::Delete, collection, request, ids.len())
            .await
    }
}

fn rejected(target: &str, message: Option<String>) -> StoreError {
    StoreError::Rejected {
        collection: target.to_string(),
        message: message.unwrap_or_else(|| "request failed".to_string()),
    }
}

async fn ensure_success(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(StoreError::Http {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
