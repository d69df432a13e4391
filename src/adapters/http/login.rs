//! HTTP handler for the login endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::dto::{ErrorResponse, LoginRequest, LoginResponse};
use super::AppState;

// The credential check is a stand-in external collaborator; real identity
// lives outside this service.
const FIXED_USERNAME: &str = "test";
const FIXED_PASSWORD: &str = "test";

/// POST /login - Exchange credentials for a one-time password.
///
/// On success the response carries a freshly issued OTP; the client has
/// the retention window to present it on the `/ws` upgrade before it is
/// swept.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if req.username != FIXED_USERNAME || req.password != FIXED_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("UNAUTHORIZED", "Invalid credentials")),
        )
            .into_response();
    }

    let otp = state.otp_store.issue().await;
    tracing::debug!("issued otp for login");

    (StatusCode::OK, Json(LoginResponse { otp: otp.key })).into_response()
}
