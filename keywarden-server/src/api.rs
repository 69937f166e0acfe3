//! HTTP API for the verification service.
//!
//! Two routes:
//! - `POST /api/v1/verify` runs a verification check. The client origin is
//!   taken from the first `x-forwarded-for` entry when it parses as an IP
//!   (the server is expected to sit behind a trusted proxy), otherwise from
//!   the transport peer address.
//! - `POST /api/v1/licenses` provisions a new license (admin only).

use crate::service::{VerificationService, VerifyError};
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use chrono::{DateTime, Months, Utc};
use keywarden_core::{Decision, LicenseRecord};
use keywarden_store::{LicenseStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VerificationService>,
    pub store: Arc<dyn LicenseStore>,
    /// Secret gating the provisioning route; `None` disables it.
    pub admin_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    license_key: String,
    software: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLicenseRequest {
    holder: String,
    months: u32,
    #[serde(default)]
    allowed_software: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateLicenseResponse {
    license_key: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

fn message(status: StatusCode, text: &str) -> Response {
    (
        status,
        Json(MessageResponse {
            message: text.to_string(),
        }),
    )
        .into_response()
}

/// Builds the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/verify", post(verify_handler))
        .route("/api/v1/licenses", post(create_license_handler))
        .with_state(state)
}

/// Resolves the client origin: trusted forwarded-for header first, then the
/// transport peer address.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .unwrap_or_else(|| peer.ip())
}

async fn verify_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<VerifyRequest>,
) -> Response {
    let origin = client_ip(&headers, peer);
    let decision = state
        .service
        .verify(&request.license_key, origin, request.software.as_deref())
        .await;

    let (status, body) = match decision {
        Ok(Decision::Allowed) => (
            StatusCode::OK,
            VerifyResponse {
                message: "license verified".to_string(),
                blocked_until: None,
            },
        ),
        Ok(Decision::NotFound) => (
            StatusCode::NOT_FOUND,
            VerifyResponse {
                message: "license not found".to_string(),
                blocked_until: None,
            },
        ),
        Ok(Decision::SoftwareDenied) => (
            StatusCode::FORBIDDEN,
            VerifyResponse {
                message: "software not covered by this license".to_string(),
                blocked_until: None,
            },
        ),
        Ok(Decision::Blocked { until }) => (
            StatusCode::FORBIDDEN,
            VerifyResponse {
                message: "license temporarily blocked after repeated sharing attempts"
                    .to_string(),
                blocked_until: Some(until),
            },
        ),
        Ok(Decision::Expired) => (
            StatusCode::FORBIDDEN,
            VerifyResponse {
                message: "license expired".to_string(),
                blocked_until: None,
            },
        ),
        Ok(Decision::DeniedIpMismatch) => (
            StatusCode::FORBIDDEN,
            VerifyResponse {
                message: "license is already in use from another location".to_string(),
                blocked_until: None,
            },
        ),
        Err(e @ VerifyError::RetryExhausted { .. }) => {
            error!("verification failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                VerifyResponse {
                    message: "verification temporarily unavailable, please retry".to_string(),
                    blocked_until: None,
                },
            )
        }
        Err(VerifyError::Store(e)) => {
            error!("license store failure during verification: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                VerifyResponse {
                    message: "verification temporarily unavailable, please retry".to_string(),
                    blocked_until: None,
                },
            )
        }
    };

    (status, Json(body)).into_response()
}

async fn create_license_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateLicenseRequest>,
) -> Response {
    let Some(expected) = state.admin_secret.as_deref() else {
        return message(
            StatusCode::SERVICE_UNAVAILABLE,
            "license provisioning is not enabled on this server",
        );
    };

    let presented = headers
        .get("x-admin-secret")
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected) {
        return message(StatusCode::UNAUTHORIZED, "invalid admin secret");
    }

    if request.months == 0 {
        return message(
            StatusCode::BAD_REQUEST,
            "issuance period must be at least one month",
        );
    }

    let now = Utc::now();
    let Some(expires_at) = now.checked_add_months(Months::new(request.months)) else {
        return message(StatusCode::BAD_REQUEST, "issuance period out of range");
    };

    let license_key = Uuid::new_v4().to_string();
    let record = LicenseRecord::new(
        license_key.clone(),
        request.holder.clone(),
        request.allowed_software,
        expires_at,
    );

    match state.store.insert(&record).await {
        Ok(()) => {
            info!(holder = %record.holder, %expires_at, "license issued");
            (
                StatusCode::CREATED,
                Json(CreateLicenseResponse { license_key }),
            )
                .into_response()
        }
        Err(StoreError::DuplicateHolder(holder)) => message(
            StatusCode::CONFLICT,
            &format!("a license for {holder} already exists"),
        ),
        Err(e) => {
            error!("license store failure during provisioning: {e}");
            message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "license provisioning temporarily unavailable",
            )
        }
    }
}
