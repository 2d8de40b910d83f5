//! Hosted function executions.
//!
//! The exchange can run as an Appwrite function. Executions are created in
//! async mode and then polled at a fixed interval until they settle or the
//! overall deadline passes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::PollPolicy;
use crate::error::{check_status, error_message, ClientError, Result};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const JWT_HEADER: &str = "X-Appwrite-JWT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Waiting,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    /// Whether the execution will not change any more.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A function execution as reported by Appwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(rename = "$id")]
    pub id: String,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub response_status_code: u16,
    #[serde(default)]
    pub response_body: String,
    #[serde(default)]
    pub errors: String,
}

impl Execution {
    /// Decode the function's response body.
    ///
    /// A completed execution whose function answered with an error status
    /// becomes `ClientError::Status`; a failed execution becomes
    /// `ClientError::ExecutionFailed`.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        match self.status {
            ExecutionStatus::Completed => {}
            ExecutionStatus::Failed => {
                return Err(ClientError::ExecutionFailed {
                    execution_id: self.id.clone(),
                    message: if self.errors.is_empty() {
                        "execution failed".to_string()
                    } else {
                        self.errors.clone()
                    },
                })
            }
            _ => {
                return Err(ClientError::ExecutionFailed {
                    execution_id: self.id.clone(),
                    message: "execution has not finished".to_string(),
                })
            }
        }

        if self.response_status_code >= 400 {
            return Err(ClientError::Status {
                status: self.response_status_code,
                message: error_message(self.response_body.as_bytes()),
            });
        }

        Ok(serde_json::from_str(&self.response_body)?)
    }
}

/// Function execution endpoints.
#[async_trait]
pub trait ExecutionApi: Send + Sync {
    /// Start an async execution of `function_id` with `body`.
    async fn create_execution(
        &self,
        function_id: &str,
        body: &str,
        jwt: Option<&str>,
    ) -> Result<Execution>;

    async fn get_execution(
        &self,
        function_id: &str,
        execution_id: &str,
        jwt: Option<&str>,
    ) -> Result<Execution>;
}

/// Appwrite REST implementation of [`ExecutionApi`].
#[derive(Clone)]
pub struct AppwriteExecutionApi {
    http: Client,
    endpoint: String,
    project_id: String,
}

impl AppwriteExecutionApi {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
        })
    }

    fn request(&self, method: Method, path: &str, jwt: Option<&str>) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.endpoint, path))
            .header(PROJECT_HEADER, &self.project_id);
        match jwt {
            Some(jwt) => builder.header(JWT_HEADER, jwt),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Execution> {
        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ExecutionApi for AppwriteExecutionApi {
    async fn create_execution(
        &self,
        function_id: &str,
        body: &str,
        jwt: Option<&str>,
    ) -> Result<Execution> {
        let request = self
            .request(
                Method::POST,
                &format!("/functions/{}/executions", function_id),
                jwt,
            )
            .json(&json!({ "body": body, "async": true }));
        self.send(request).await
    }

    async fn get_execution(
        &self,
        function_id: &str,
        execution_id: &str,
        jwt: Option<&str>,
    ) -> Result<Execution> {
        let request = self.request(
            Method::GET,
            &format!("/functions/{}/executions/{}", function_id, execution_id),
            jwt,
        );
        self.send(request).await
    }
}

/// Runs an execution and waits for it to settle.
#[derive(Clone)]
pub struct ExecutionPoller {
    api: Arc<dyn ExecutionApi>,
    policy: PollPolicy,
}

impl ExecutionPoller {
    pub fn new(api: Arc<dyn ExecutionApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Start `function_id` and poll until it completes or fails.
    ///
    /// # Errors
    ///
    /// `ClientError::Timeout` when the execution has not settled by the
    /// deadline. Errors from the execution API are returned as they occur.
    pub async fn run(&self, function_id: &str, body: &str, jwt: Option<&str>) -> Result<Execution> {
        let deadline = Instant::now() + self.policy.timeout;
        let mut execution = self.api.create_execution(function_id, body, jwt).await?;
        let mut polls: u32 = 0;

        loop {
            if execution.status.is_settled() {
                debug!(
                    execution_id = %execution.id,
                    status = ?execution.status,
                    polls,
                    "Execution settled"
                );
                return Ok(execution);
            }

            if Instant::now() + self.policy.interval > deadline {
                warn!(
                    execution_id = %execution.id,
                    polls,
                    timeout_ms = self.policy.timeout.as_millis() as u64,
                    "Execution did not settle before the deadline"
                );
                return Err(ClientError::Timeout(self.policy.timeout));
            }

            sleep(self.policy.interval).await;
            polls += 1;
            execution = self
                .api
                .get_execution(function_id, &execution.id, jwt)
                .await?;
        }
    }
}
