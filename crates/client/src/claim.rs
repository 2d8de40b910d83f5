//! Claim exchange client.
//!
//! Trades a claim token for the member's session credential and applies it
//! to the [`Session`]. When the exchange cannot be confirmed in time the
//! client asks the API whether the member got linked anyway before giving up.

use std::sync::Arc;

use domain::models::{ClaimExchangeRequest, ClaimExchangeResponse, Member};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::account::AppwriteAccount;
use crate::config::ClientConfig;
use crate::error::{check_status, ClientError, Result};
use crate::execution::{AppwriteExecutionApi, ExecutionApi, ExecutionPoller};
use crate::session::Session;

const EXCHANGE_PATH: &str = "/api/v1/claims/exchange";
const ME_PATH: &str = "/api/v1/members/me";
const JWT_HEADER: &str = "X-Appwrite-JWT";

/// How the exchange reaches the server.
#[derive(Clone)]
pub enum ClaimTransport {
    /// One blocking call to the API, bounded by the request timeout.
    DirectRpc,
    /// Run the exchange as a hosted function and poll the execution.
    FunctionExecution {
        function_id: String,
        poller: ExecutionPoller,
    },
}

/// Result of a claim exchange that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// The server answered; any credential has been applied to the session.
    Exchanged(ClaimExchangeResponse),
    /// The exchange timed out but the scanning identity is linked.
    LinkedAfterTimeout(Member),
}

impl ClaimOutcome {
    pub fn member_id(&self) -> Option<&str> {
        match self {
            Self::Exchanged(response) => response.member_id.as_deref(),
            Self::LinkedAfterTimeout(member) => Some(&member.id),
        }
    }
}

#[derive(Clone)]
pub struct ClaimClient {
    config: ClientConfig,
    session: Session,
    http: Client,
    account: Option<AppwriteAccount>,
    transport: ClaimTransport,
}

impl ClaimClient {
    /// Build a client using the function transport when a function id is
    /// configured, otherwise the direct call.
    pub fn new(config: ClientConfig, session: Session) -> Result<Self> {
        if config.function_id().is_some() {
            Self::with_function(config, session)
        } else {
            Self::direct(config, session)
        }
    }

    pub fn direct(config: ClientConfig, session: Session) -> Result<Self> {
        Self::with_transport(config, session, ClaimTransport::DirectRpc)
    }

    /// Use the configured Appwrite function.
    pub fn with_function(config: ClientConfig, session: Session) -> Result<Self> {
        let (Some(endpoint), Some(project_id)) = (config.appwrite_endpoint(), config.project_id())
        else {
            return Err(ClientError::Config(
                "function execution needs appwrite_endpoint and project_id".into(),
            ));
        };
        let api = AppwriteExecutionApi::new(endpoint, project_id, config.request_timeout())?;
        Self::with_execution_api(config, session, Arc::new(api))
    }

    /// Use the function transport over a caller-supplied execution API.
    pub fn with_execution_api(
        config: ClientConfig,
        session: Session,
        api: Arc<dyn ExecutionApi>,
    ) -> Result<Self> {
        let function_id = config
            .function_id()
            .ok_or_else(|| ClientError::Config("function_id is required".into()))?
            .to_string();
        let poller = ExecutionPoller::new(api, config.poll());
        Self::with_transport(
            config,
            session,
            ClaimTransport::FunctionExecution {
                function_id,
                poller,
            },
        )
    }

    fn with_transport(
        config: ClientConfig,
        session: Session,
        transport: ClaimTransport,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let account = match (config.appwrite_endpoint(), config.project_id()) {
            (Some(endpoint), Some(project_id)) => Some(AppwriteAccount::new(
                endpoint,
                project_id,
                config.request_timeout(),
            )?),
            _ => None,
        };
        Ok(Self {
            config,
            session,
            http,
            account,
            transport,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &ClaimTransport {
        &self.transport
    }

    /// Give the session a working identity, creating an anonymous one when
    /// it has none. Returns the identity's user id.
    pub async fn init_session(&self) -> Result<String> {
        let account = self.account.as_ref().ok_or_else(|| {
            ClientError::Config("sessions need appwrite_endpoint and project_id".into())
        })?;
        account.init_session(&self.session).await
    }

    /// Exchange a scanned `token` and link the device identity to the member.
    pub async fn scan(&self, token: &str) -> Result<ClaimOutcome> {
        let user_id = self.init_session().await?;
        self.exchange(token, Some(&user_id)).await
    }

    /// Exchange `token`, optionally linking the scanning identity.
    ///
    /// # Errors
    ///
    /// Server rejections come back as `ClientError::Status` with the server's
    /// message. When no answer arrives in time and the member is not linked,
    /// returns `ClientError::Timeout`; the claim may still be pending.
    pub async fn exchange(&self, token: &str, scanner_uid: Option<&str>) -> Result<ClaimOutcome> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::MissingToken);
        }

        let request = ClaimExchangeRequest::new(token, scanner_uid.map(str::to_string));
        let jwt = self.session.jwt().await;

        let result = match &self.transport {
            ClaimTransport::DirectRpc => self.exchange_direct(&request, jwt.as_deref()).await,
            ClaimTransport::FunctionExecution {
                function_id,
                poller,
            } => {
                let body = serde_json::to_string(&request)?;
                poller
                    .run(function_id, &body, jwt.as_deref())
                    .await
                    .and_then(|execution| execution.decode::<ClaimExchangeResponse>())
            }
        };

        match result {
            Ok(response) => {
                match (&response.jwt, &response.appwrite_uid) {
                    (Some(jwt), Some(uid)) => {
                        self.session.set_identity(uid.clone(), jwt.clone()).await
                    }
                    (Some(jwt), None) => self.session.set_jwt(jwt.clone()).await,
                    (None, _) => {
                        warn!("Claim exchanged without a credential; session unchanged")
                    }
                }
                info!(member_id = ?response.member_id, linked = ?response.linked, "Claim exchanged");
                Ok(ClaimOutcome::Exchanged(response))
            }
            Err(err) if err.is_ambiguous() => self.recover_after_timeout(err, scanner_uid).await,
            Err(err) => Err(err),
        }
    }

    async fn exchange_direct(
        &self,
        request: &ClaimExchangeRequest,
        jwt: Option<&str>,
    ) -> Result<ClaimExchangeResponse> {
        let mut builder = self
            .http
            .post(format!("{}{}", self.config.api_base_url(), EXCHANGE_PATH))
            .json(request);
        if let Some(jwt) = jwt {
            builder = builder.header(JWT_HEADER, jwt);
        }
        let response = check_status(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The member linked to the current session, if any.
    pub async fn current_member(&self) -> Result<Option<Member>> {
        let Some(jwt) = self.session.jwt().await else {
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}{}", self.config.api_base_url(), ME_PATH))
            .header(JWT_HEADER, jwt)
            .send()
            .await?;
        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED
        ) {
            return Ok(None);
        }

        let bytes = check_status(response).await?.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Only a member linked to the identity that scanned proves the exchange
    /// went through; without a scanner identity nothing can be confirmed.
    async fn recover_after_timeout(
        &self,
        err: ClientError,
        scanner_uid: Option<&str>,
    ) -> Result<ClaimOutcome> {
        let waited = match &self.transport {
            ClaimTransport::DirectRpc => self.config.request_timeout(),
            ClaimTransport::FunctionExecution { poller, .. } => poller.policy().timeout,
        };
        let Some(scanner_uid) = scanner_uid else {
            debug!(error = %err, "Claim exchange timed out");
            return Err(ClientError::Timeout(waited));
        };
        debug!(error = %err, "Claim exchange timed out; checking member link");

        match self.current_member().await {
            Ok(Some(member)) if member.is_linked_to(scanner_uid) => {
                info!(member_id = %member.id, "Member linked despite exchange timeout");
                Ok(ClaimOutcome::LinkedAfterTimeout(member))
            }
            Ok(Some(member)) => {
                debug!(member_id = %member.id, "Session member is not linked to this scanner");
                Err(ClientError::Timeout(waited))
            }
            Ok(None) => Err(ClientError::Timeout(waited)),
            Err(check_err) => {
                warn!(error = %check_err, "Member link check failed");
                Err(ClientError::Timeout(waited))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollPolicy;
    use crate::execution::tests::FakeExecutionApi;
    use crate::test_server::{serve, Route};
    use serde_json::json;
    use std::time::Duration;

    fn member_json(uid: Option<&str>) -> String {
        json!({
            "id": "M1",
            "name": "Ada",
            "balance": 2.5,
            "total_coffees": 4,
            "appwrite_uid": uid,
            "surcharge_total": 0.0
        })
        .to_string()
    }

    fn function_config(api_base_url: &str) -> ClientConfig {
        ClientConfig::builder()
            .with_api_base_url(api_base_url)
            .with_appwrite_endpoint("http://127.0.0.1:1/v1")
            .with_project_id("coffee")
            .with_function_id("claim-exchange")
            .with_poll_policy(PollPolicy {
                interval: Duration::from_millis(500),
                timeout: Duration::from_secs(15),
            })
            .build()
            .unwrap()
    }

    fn timeout_config(base: &str) -> ClientConfig {
        ClientConfig::builder()
            .with_api_base_url(base)
            .with_request_timeout(Duration::from_millis(200))
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_function_exchange_applies_credential() {
        let api = Arc::new(FakeExecutionApi::completing(
            2,
            200,
            r#"{"jwt":"member-jwt","linked":true,"memberId":"M1","appwrite_uid":"U1"}"#,
        ));
        let session = Session::with_jwt("device-jwt");
        let client = ClaimClient::with_execution_api(
            function_config("http://127.0.0.1:1"),
            session.clone(),
            api.clone(),
        )
        .unwrap();

        let outcome = client.exchange(" T1 ", Some("U1")).await.unwrap();

        assert_eq!(outcome.member_id(), Some("M1"));
        assert_eq!(session.jwt().await.as_deref(), Some("member-jwt"));
        assert_eq!(session.user_id().await.as_deref(), Some("U1"));
        let bodies = api.bodies.lock().unwrap().clone();
        assert_eq!(bodies, vec![r#"{"token":"T1","scannerUid":"U1"}"#.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_function_rejection_keeps_session() {
        let api = Arc::new(FakeExecutionApi::completing(
            1,
            400,
            r#"{"error":"invalid token"}"#,
        ));
        let session = Session::with_jwt("device-jwt");
        let client =
            ClaimClient::with_execution_api(function_config("http://127.0.0.1:1"), session.clone(), api)
                .unwrap();

        let err = client.exchange("T1", None).await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Status { status: 400, ref message } if message == "invalid token"
        ));
        assert_eq!(session.jwt().await.as_deref(), Some("device-jwt"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_function_timeout_without_session_reports_timeout() {
        let api = Arc::new(FakeExecutionApi::never_settling());
        let client =
            ClaimClient::with_execution_api(function_config("http://127.0.0.1:1"), Session::new(), api)
                .unwrap();

        let err = client.exchange("T1", Some("U1")).await.unwrap_err();

        assert!(matches!(err, ClientError::Timeout(t) if t == Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn test_blank_token_is_rejected_locally() {
        let config = ClientConfig::builder()
            .with_api_base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        let client = ClaimClient::direct(config, Session::new()).unwrap();

        let err = client.exchange("  ", None).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));
    }

    #[tokio::test]
    async fn test_direct_exchange() {
        let base = serve(vec![Route::json(
            "POST /api/v1/claims/exchange",
            200,
            r#"{"jwt":"member-jwt","memberId":"M1"}"#,
        )])
        .await;
        let config = ClientConfig::builder().with_api_base_url(&base).build().unwrap();
        let session = Session::new();
        let client = ClaimClient::new(config, session.clone()).unwrap();
        assert!(matches!(client.transport(), ClaimTransport::DirectRpc));

        let outcome = client.exchange("T1", None).await.unwrap();

        match outcome {
            ClaimOutcome::Exchanged(response) => {
                assert_eq!(response.member_id.as_deref(), Some("M1"));
                assert_eq!(response.linked, None);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(session.jwt().await.as_deref(), Some("member-jwt"));
        assert_eq!(session.user_id().await, None);
    }

    #[tokio::test]
    async fn test_direct_rejection() {
        let base = serve(vec![Route::json(
            "POST /api/v1/claims/exchange",
            400,
            r#"{"error":"token expired"}"#,
        )])
        .await;
        let config = ClientConfig::builder().with_api_base_url(&base).build().unwrap();
        let client = ClaimClient::direct(config, Session::new()).unwrap();

        let err = client.exchange("T1", Some("U1")).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_ambiguous());
    }

    #[tokio::test]
    async fn test_direct_timeout_recovers_linked_member() {
        let base = serve(vec![
            Route::hang("POST /api/v1/claims/exchange"),
            Route::json("GET /api/v1/members/me", 200, member_json(Some("U1"))),
        ])
        .await;
        let session = Session::with_jwt("device-jwt");
        let client = ClaimClient::direct(timeout_config(&base), session.clone()).unwrap();

        let outcome = client.exchange("T1", Some("U1")).await.unwrap();

        match outcome {
            ClaimOutcome::LinkedAfterTimeout(member) => {
                assert_eq!(member.id, "M1");
                assert_eq!(member.appwrite_uid.as_deref(), Some("U1"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // The device session already belongs to the member.
        assert_eq!(session.jwt().await.as_deref(), Some("device-jwt"));
    }

    #[tokio::test]
    async fn test_direct_timeout_with_member_linked_elsewhere() {
        let base = serve(vec![
            Route::hang("POST /api/v1/claims/exchange"),
            Route::json("GET /api/v1/members/me", 200, member_json(Some("U-other"))),
        ])
        .await;
        let client =
            ClaimClient::direct(timeout_config(&base), Session::with_jwt("device-jwt")).unwrap();

        let err = client.exchange("T1", Some("U1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_direct_timeout_without_scanner_is_not_confirmed() {
        let base = serve(vec![
            Route::hang("POST /api/v1/claims/exchange"),
            Route::json("GET /api/v1/members/me", 200, member_json(Some("U1"))),
        ])
        .await;
        let client =
            ClaimClient::direct(timeout_config(&base), Session::with_jwt("device-jwt")).unwrap();

        let err = client.exchange("T1", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_direct_timeout_without_link() {
        let base = serve(vec![
            Route::hang("POST /api/v1/claims/exchange"),
            Route::json(
                "GET /api/v1/members/me",
                404,
                r#"{"error":"No member is linked to this session"}"#,
            ),
        ])
        .await;
        let client =
            ClaimClient::direct(timeout_config(&base), Session::with_jwt("device-jwt")).unwrap();

        let err = client.exchange("T1", Some("U1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(t) if t == Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn test_scan_links_anonymous_identity() {
        let base = serve(vec![
            Route::json(
                "POST /v1/account/sessions/anonymous",
                201,
                r#"{"$id":"s1","userId":"anon-1"}"#,
            )
            .with_header("x-fallback-cookies", r#"{"a_session_coffee":"secret"}"#),
            Route::json("POST /v1/account/jwts", 201, r#"{"jwt":"anon-jwt"}"#),
            Route::json(
                "POST /api/v1/claims/exchange",
                200,
                r#"{"jwt":"member-jwt","linked":true,"memberId":"M1","appwrite_uid":"anon-1"}"#,
            )
            .requiring(r#""scanneruid":"anon-1""#),
        ])
        .await;
        let config = ClientConfig::builder()
            .with_api_base_url(&base)
            .with_appwrite_endpoint(format!("{}/v1", base))
            .with_project_id("coffee")
            .build()
            .unwrap();
        let session = Session::new();
        let client = ClaimClient::direct(config, session.clone()).unwrap();

        let outcome = client.scan("T1").await.unwrap();

        assert_eq!(outcome.member_id(), Some("M1"));
        assert_eq!(session.jwt().await.as_deref(), Some("member-jwt"));
        assert_eq!(session.user_id().await.as_deref(), Some("anon-1"));
    }

    #[tokio::test]
    async fn test_init_session_needs_appwrite_config() {
        let config = ClientConfig::builder()
            .with_api_base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        let client = ClaimClient::direct(config, Session::new()).unwrap();

        let err = client.init_session().await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
