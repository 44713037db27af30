//! Attendance server HTTP client
//!
//! Provides a typed HTTP client for the attendance server. Handles the client
//! id header, replay/idempotency headers, per-request timeouts and the mapping
//! of transport failures onto [`RemoteError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use rollcall_core::domain::ClientId;
//! use rollcall_remote::client::KioskClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = KioskClient::new("http://10.0.0.5:5000", ClientId::new(), Duration::from_secs(10))?;
//! client.health(Duration::from_secs(3)).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use reqwest_eventsource::{retry::Never, EventSource};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use rollcall_core::config::ServerConfig;
use rollcall_core::domain::ClientId;
use rollcall_core::ports::{RemoteError, Submission};

use crate::{ClientSetupError, CLIENT_ID_HEADER, IDEMPOTENCY_KEY_HEADER, REPLAY_HEADER};

/// Upper bound for establishing a TCP connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Response types
// ============================================================================

/// Body the server returns for every action endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ActionResponse {
    #[allow(dead_code)]
    pub status: Option<String>,
    pub message: Option<String>,
    pub log_id: Option<i64>,
    /// `check_in` or `check_out` for scanner toggles
    pub action: Option<String>,
}

/// Error body shape: `{"status": "error", "message": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

/// Routes that vary between server deployments
///
/// Action and snapshot routes are fixed by the server; the reachability
/// check and the push stream are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRoutes {
    pub health: String,
    pub events: String,
}

impl Default for ServerRoutes {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl ServerRoutes {
    pub fn from_config(server: &ServerConfig) -> Self {
        Self {
            health: server.health_path.clone(),
            events: server.events_path.clone(),
        }
    }
}

// ============================================================================
// KioskClient
// ============================================================================

/// HTTP client for the attendance server
///
/// Wraps `reqwest::Client` with base URL construction and the headers every
/// request must carry. The underlying client has no global timeout so the
/// same connection pool can serve the long-lived event stream; bounded calls
/// set their own deadline.
#[derive(Debug, Clone)]
pub struct KioskClient {
    client: Client,
    base_url: Url,
    client_id: ClientId,
    request_timeout: Duration,
    routes: ServerRoutes,
}

impl KioskClient {
    /// Creates a client for the server at `base_url`
    ///
    /// # Errors
    /// Returns [`ClientSetupError`] if the URL is invalid or the TLS backend
    /// cannot be initialised.
    pub fn new(
        base_url: &str,
        client_id: ClientId,
        request_timeout: Duration,
    ) -> Result<Self, ClientSetupError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientSetupError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClientSetupError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            client_id,
            request_timeout,
            routes: ServerRoutes::default(),
        })
    }

    /// Replaces the health and push-stream routes
    #[must_use]
    pub fn with_routes(mut self, routes: ServerRoutes) -> Self {
        self.routes = routes;
        self
    }

    pub fn routes(&self) -> &ServerRoutes {
        &self.routes
    }

    /// Returns the per-installation client id
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Returns the base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the deadline applied to action and snapshot calls
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Resolves `path` against the base URL
    pub fn url(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::Transport(format!("invalid path {path}: {e}")))
    }

    /// Creates a request builder for the given method and path
    ///
    /// Adds the client id header. No timeout is set.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let url = self.url(path)?;
        Ok(self
            .client
            .request(method, url)
            .header(CLIENT_ID_HEADER, self.client_id.to_string()))
    }

    /// Posts an action body and decodes the acknowledgement
    ///
    /// Replays carry the replay flag header; every submission carries the
    /// action id as idempotency key.
    pub(crate) async fn post_action<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        submission: Submission,
    ) -> Result<ActionResponse, RemoteError> {
        let mut request = self
            .request(Method::POST, path)?
            .timeout(self.request_timeout)
            .header(IDEMPOTENCY_KEY_HEADER, submission.action_id.to_string())
            .json(body);
        if submission.replay {
            request = request.header(REPLAY_HEADER, "1");
        }

        debug!(path, action_id = %submission.action_id, replay = submission.replay, "Submitting action");
        let response = request.send().await.map_err(map_transport_error)?;
        let response = check_status(response).await?;

        let text = response.text().await.map_err(map_transport_error)?;
        match serde_json::from_str::<ActionResponse>(&text) {
            Ok(body) => Ok(body),
            Err(e) => {
                // The action was applied; only the echo is unreadable.
                warn!(path, error = %e, "Undecodable success body, treating as applied");
                Ok(ActionResponse::default())
            }
        }
    }

    /// Issues a bounded GET and decodes a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let response = self
            .request(Method::GET, path)?
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// Checks backend reachability within `timeout`
    pub async fn health(&self, timeout: Duration) -> Result<(), RemoteError> {
        let response = self
            .request(Method::GET, &self.routes.health)?
            .timeout(timeout)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    /// Prepares a subscription to the server push stream
    ///
    /// The request has no deadline. The source never retries on its own;
    /// reconnecting is left to the caller.
    pub fn event_source(&self) -> Result<EventSource, RemoteError> {
        let client_id = self.client_id.to_string();
        let request = self
            .request(Method::GET, &self.routes.events)?
            .query(&[("client_id", client_id.as_str())]);
        let mut source = EventSource::new(request)
            .map_err(|e| RemoteError::Transport(format!("event stream request: {e}")))?;
        source.set_retry_policy(Box::new(Never));
        Ok(source)
    }
}

// ============================================================================
// Error mapping
// ============================================================================

/// Maps a reqwest failure onto the transport taxonomy
pub(crate) fn map_transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout
    } else if error.is_connect() {
        RemoteError::Connect(error.to_string())
    } else if error.is_decode() {
        RemoteError::Decode(error.to_string())
    } else {
        RemoteError::Transport(error.to_string())
    }
}

/// Passes success responses through; converts the rest to [`RemoteError::Status`]
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| fallback_message(status, &text));

    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

fn fallback_message(status: StatusCode, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        text.to_string()
    }
}
