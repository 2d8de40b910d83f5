//! Appwrite REST backend.
//!
//! One [`AppwriteClient`] carries the endpoint, project and API key and is
//! shared by the document store, file storage and the identity provider.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::metrics::StoreTimer;
use crate::store::{DocumentStore, Query, StoreError};

/// Header carrying the project id.
pub const PROJECT_HEADER: &str = "X-Appwrite-Project";
/// Header carrying the server API key.
pub const KEY_HEADER: &str = "X-Appwrite-Key";
/// Header carrying a user session JWT.
pub const JWT_HEADER: &str = "X-Appwrite-JWT";

/// Connection settings for an Appwrite project.
#[derive(Debug, Clone)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

/// Error body returned by Appwrite.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Value>,
}

/// Thin authenticated HTTP client for the Appwrite REST API.
#[derive(Clone)]
pub struct AppwriteClient {
    http: Client,
    endpoint: String,
    project_id: String,
    api_key: String,
}

impl AppwriteClient {
    pub fn new(settings: &AppwriteSettings) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            project_id: settings.project_id.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Request authenticated with the server API key.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(PROJECT_HEADER, &self.project_id)
            .header(KEY_HEADER, &self.api_key)
    }

    /// Request made on behalf of the user owning `jwt`.
    pub fn session_request(&self, method: Method, path: &str, jwt: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(PROJECT_HEADER, &self.project_id)
            .header(JWT_HEADER, jwt)
    }

    /// Send a request and decode a JSON response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request whose response body is not needed.
    pub async fn send_empty(&self, request: RequestBuilder) -> Result<(), StoreError> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// Map non-success statuses to store errors.
pub async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(StoreError::NotFound),
        StatusCode::CONFLICT => Err(StoreError::Conflict),
        _ => {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_default();
            Err(StoreError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Encode queries as repeated `queries[]` parameters.
pub fn query_params(queries: &[Query]) -> Vec<(&'static str, String)> {
    queries
        .iter()
        .map(|q| ("queries[]", q.to_json().to_string()))
        .collect()
}

/// Path segment and body for an increment by `delta`.
fn increment_request(delta: f64) -> (&'static str, Value) {
    if delta < 0.0 {
        ("decrement", json!({ "value": -delta }))
    } else {
        ("increment", json!({ "value": delta }))
    }
}

/// Document store backed by an Appwrite database.
#[derive(Clone)]
pub struct AppwriteStore {
    client: AppwriteClient,
    database_id: String,
}

impl AppwriteStore {
    pub fn new(client: AppwriteClient, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
        }
    }

    fn documents_path(&self, collection: &str) -> String {
        format!(
            "/databases/{}/collections/{}/documents",
            self.database_id, collection
        )
    }

    fn document_path(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_path(collection), id)
    }
}

#[async_trait::async_trait]
impl DocumentStore for AppwriteStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let timer = StoreTimer::new("get_document", collection);
        let request = self
            .client
            .request(Method::GET, &self.document_path(collection, id));
        let result = self.client.send_json::<Value>(request).await;
        timer.finish(result.is_ok() || matches!(result, Err(StoreError::NotFound)));

        match result {
            Ok(doc) => Ok(Some(doc)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<Vec<Value>, StoreError> {
        let timer = StoreTimer::new("list_documents", collection);
        let request = self
            .client
            .request(Method::GET, &self.documents_path(collection))
            .query(&query_params(queries));
        let result = self.client.send_json::<DocumentList>(request).await;
        timer.finish(result.is_ok());

        let list = result?;
        debug!(collection = %collection, count = list.documents.len(), "Listed documents");
        Ok(list.documents)
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        let timer = StoreTimer::new("create_document", collection);
        let request = self
            .client
            .request(Method::POST, &self.documents_path(collection))
            .json(&json!({ "documentId": id, "data": data }));
        let result = self.client.send_json(request).await;
        timer.finish(result.is_ok());
        result
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        let timer = StoreTimer::new("update_document", collection);
        let request = self
            .client
            .request(Method::PATCH, &self.document_path(collection, id))
            .json(&json!({ "data": data }));
        let result = self.client.send_json(request).await;
        timer.finish(result.is_ok());
        result
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let timer = StoreTimer::new("delete_document", collection);
        let request = self
            .client
            .request(Method::DELETE, &self.document_path(collection, id));
        let result = self.client.send_empty(request).await;
        timer.finish(result.is_ok());
        result
    }

    async fn increment_attribute(
        &self,
        collection: &str,
        id: &str,
        attribute: &str,
        delta: f64,
    ) -> Result<Value, StoreError> {
        let timer = StoreTimer::new("increment_attribute", collection);
        let (action, body) = increment_request(delta);
        let path = format!("{}/{}/{}", self.document_path(collection, id), attribute, action);
        let request = self.client.request(Method::PATCH, &path).json(&body);
        let result = self.client.send_json(request).await;
        timer.finish(result.is_ok());
        result
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self
            .client
            .request(Method::GET, &format!("/databases/{}", self.database_id));
        self.client.send_empty(request).await
    }
}
