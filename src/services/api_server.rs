// src/services/api_server.rs
//! API Server for the credential registry
//!
//! REST interface built on Axum. Mutating endpoints take a signed
//! [`Authorization`] envelope; the recovered signer is the caller principal
//! checked by the registry's issuer gate. Each signed request is accepted at
//! most once. Verification and read endpoints are open to anyone.
//!
//! The server never receives identity fields or salts. Callers derive the
//! commitment themselves and submit only the resulting hash.

use crate::contracts::credential_registry::RegistryService;
use crate::error::{AuthError, RegistryError};
use crate::ledger::replay_guard::ReplayGuard;
use crate::models::credential::{Commitment, CredentialId, VerificationResult};
use crate::models::event::LoggedEvent;
use crate::models::operation::{Authorization, Operation};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;

/// Errors returned by API handlers, rendered as
/// `{"error": {"code": <status>, "message": <text>}}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Registry(e) => match e {
                RegistryError::Unauthorized(_) => StatusCode::FORBIDDEN,
                RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
                RegistryError::MalformedIdentifier(_) => StatusCode::BAD_REQUEST,
                RegistryError::AlreadyIssued(_) => StatusCode::CONFLICT,
                RegistryError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("request failed: {}", self);
        } else {
            log::warn!("request rejected: {}", self);
        }
        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

// API request and response structures

/// Request payload for issuing a credential
#[derive(Serialize, Deserialize)]
pub struct IssueCredentialRequest {
    pub id: String,
    pub commitment: String,
    pub title: String,
    pub issuer: String,
    #[serde(default)]
    pub expires_at: u64,
    pub auth: Authorization,
}

/// Request payload for revoking a credential
#[derive(Serialize, Deserialize)]
pub struct RevokeCredentialRequest {
    pub id: String,
    pub auth: Authorization,
}

/// Request payload for granting or withdrawing the issuer capability
#[derive(Serialize, Deserialize)]
pub struct IssuerRequest {
    pub principal: Address,
    pub auth: Authorization,
}

/// Response for every accepted mutation
#[derive(Serialize, Deserialize, Debug)]
pub struct MutationResponse {
    /// Authenticated principal that performed the call
    pub caller: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CredentialId>,
}

#[derive(Serialize, Deserialize)]
pub struct VerifyQuery {
    pub commitment: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct IssuerStatusResponse {
    pub principal: Address,
    pub is_issuer: bool,
}

#[derive(Serialize, Deserialize, Default)]
pub struct EventsQuery {
    pub credential_id: Option<String>,
    /// Only return events with a larger sequence number
    #[serde(default)]
    pub after: u64,
}

/// API server state
pub struct ApiServer {
    registry: Arc<RegistryService>,
    /// Freshness window for signed requests
    max_request_age_secs: u64,
    /// Signed requests already accepted inside the window
    replays: ReplayGuard,
}

impl ApiServer {
    pub fn new(registry: Arc<RegistryService>, max_request_age_secs: u64) -> Self {
        ApiServer {
            registry,
            max_request_age_secs,
            replays: ReplayGuard::new(max_request_age_secs),
        }
    }

    /// Builds the router with all endpoints.
    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/credentials/issue", post(Self::issue_credential_handler))
            .route("/credentials/revoke", post(Self::revoke_credential_handler))
            .route("/credentials/:id/verify", get(Self::verify_credential_handler))
            .route("/issuers", get(Self::list_issuers_handler))
            .route("/issuers/grant", post(Self::grant_issuer_handler))
            .route("/issuers/revoke", post(Self::revoke_issuer_handler))
            .route("/issuers/:principal", get(Self::issuer_status_handler))
            .route("/events", get(Self::events_handler))
            .layer(CorsLayer::permissive())
            .with_state(self)
    }

    /// Serves requests on `addr` until Ctrl-C.
    pub async fn run(self: Arc<Self>, addr: SocketAddr) -> std::io::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("API server listening on http://{}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("failed to install Ctrl-C handler: {}", e);
                }
                log::info!("shutting down");
            })
            .await
    }

    /// Authenticates `auth` for `operation` and applies it.
    ///
    /// The request is consumed before it is applied, so a rejected request
    /// has to be signed again to be retried.
    fn execute(&self, auth: &Authorization, operation: Operation) -> Result<Address, ApiError> {
        let now = self.registry.now();
        let caller = auth.authenticate(&operation, now, self.max_request_age_secs)?;
        self.replays
            .admit(caller, operation.digest(auth.timestamp), auth.timestamp, now)?;
        self.registry.apply(&caller, operation)?;
        Ok(caller)
    }

    // =====================
    // Credential Handlers
    // =====================

    /// Issues a credential
    ///
    /// # Endpoint
    /// POST /credentials/issue
    ///
    /// # Responses
    /// - 200 OK: credential recorded
    /// - 400 Bad Request: malformed id or commitment
    /// - 401 Unauthorized: bad, stale or reused signature
    /// - 403 Forbidden: signer is not an issuer
    /// - 409 Conflict: id already issued under strict uniqueness
    async fn issue_credential_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<IssueCredentialRequest>,
    ) -> Result<Json<MutationResponse>, ApiError> {
        let id: CredentialId = payload.id.parse()?;
        let commitment: Commitment = payload
            .commitment
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("commitment: {}", e)))?;

        let caller = state.execute(
            &payload.auth,
            Operation::Issue {
                id,
                commitment,
                title: payload.title,
                issuer: payload.issuer,
                expires_at: payload.expires_at,
            },
        )?;
        Ok(Json(MutationResponse {
            caller,
            id: Some(id),
        }))
    }

    /// Revokes a credential
    ///
    /// # Endpoint
    /// POST /credentials/revoke
    ///
    /// # Responses
    /// - 200 OK: credential is revoked
    /// - 404 Not Found: id was never issued
    async fn revoke_credential_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<RevokeCredentialRequest>,
    ) -> Result<Json<MutationResponse>, ApiError> {
        let id: CredentialId = payload.id.parse()?;
        let caller = state.execute(&payload.auth, Operation::Revoke { id })?;
        Ok(Json(MutationResponse {
            caller,
            id: Some(id),
        }))
    }

    /// Verifies a commitment against a credential
    ///
    /// # Endpoint
    /// GET /credentials/:id/verify?commitment=0x…
    ///
    /// An unknown id answers 200 with `valid: false` and empty metadata.
    async fn verify_credential_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<String>,
        Query(query): Query<VerifyQuery>,
    ) -> Result<Json<VerificationResult>, ApiError> {
        let id: CredentialId = id.parse()?;
        let commitment: Commitment = query
            .commitment
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("commitment: {}", e)))?;
        Ok(Json(state.registry.verify(&id, &commitment)?))
    }

    // =====================
    // Issuer Handlers
    // =====================

    async fn list_issuers_handler(
        State(state): State<Arc<ApiServer>>,
    ) -> Result<Json<Vec<Address>>, ApiError> {
        Ok(Json(state.registry.issuers()?))
    }

    async fn grant_issuer_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<IssuerRequest>,
    ) -> Result<Json<MutationResponse>, ApiError> {
        let caller = state.execute(
            &payload.auth,
            Operation::GrantIssuer {
                principal: payload.principal,
            },
        )?;
        Ok(Json(MutationResponse { caller, id: None }))
    }

    async fn revoke_issuer_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<IssuerRequest>,
    ) -> Result<Json<MutationResponse>, ApiError> {
        let caller = state.execute(
            &payload.auth,
            Operation::RevokeIssuer {
                principal: payload.principal,
            },
        )?;
        Ok(Json(MutationResponse { caller, id: None }))
    }

    async fn issuer_status_handler(
        State(state): State<Arc<ApiServer>>,
        Path(principal): Path<String>,
    ) -> Result<Json<IssuerStatusResponse>, ApiError> {
        let principal: Address = principal
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid principal address: {}", principal)))?;
        Ok(Json(IssuerStatusResponse {
            principal,
            is_issuer: state.registry.is_issuer(&principal)?,
        }))
    }

    // =====================
    // Audit Log
    // =====================

    /// Returns the event log, optionally for a single credential
    ///
    /// # Endpoint
    /// GET /events?credential_id=…&after=…
    async fn events_handler(
        State(state): State<Arc<ApiServer>>,
        Query(query): Query<EventsQuery>,
    ) -> Result<Json<Vec<LoggedEvent>>, ApiError> {
        let events = match query.credential_id {
            Some(id) => {
                let id: CredentialId = id.parse()?;
                state.registry.history(&id)?
            }
            None => state.registry.events().since(query.after),
        };
        Ok(Json(
            events
                .into_iter()
                .filter(|e| e.sequence > query.after)
                .collect(),
        ))
    }
}
