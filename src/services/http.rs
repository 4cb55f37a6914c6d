use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use super::{ServiceChannels, ServiceError};

mod auth;
mod qr;
mod users;

#[derive(Clone)]
pub struct AppState {
    channels: ServiceChannels,
}

type JsonResponse = (StatusCode, Json<Value>);

fn error_response(error: ServiceError) -> JsonResponse {
    let status = match &error {
        ServiceError::Validation(_) | ServiceError::MalformedQrCode(_) => StatusCode::BAD_REQUEST,
        ServiceError::InvalidOrExpiredOtp => StatusCode::UNAUTHORIZED,
        ServiceError::InactiveQrCode => StatusCode::FORBIDDEN,
        ServiceError::UnknownQrCode | ServiceError::UnknownUser => StatusCode::NOT_FOUND,
        ServiceError::AlreadyRedeemed => StatusCode::CONFLICT,
        ServiceError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Communication(..) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(json!({
            "error": error.kind(),
            "description": error.to_string(),
            "retryable": error.retryable(),
        })),
    )
}

/// Bodies that fail to parse are input errors like any other, not a
/// framework-specific 415/422.
fn rejection_response(rejection: JsonRejection) -> JsonResponse {
    error_response(ServiceError::Validation(rejection.body_text()))
}

pub fn router(channels: ServiceChannels) -> Router {
    let app_state = AppState { channels };

    Router::new()
        .route("/api/auth/otp-request", post(auth::request_otp))
        .route("/api/auth/otp-verify", post(auth::verify_otp))
        .route("/api/user/{id}", get(users::get_user_details))
        .route("/api/qr/validate", post(qr::validate_qr_code))
        .route("/api/qr/preview/{code}", get(qr::preview_qr_code))
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(
    listen: &str,
    channels: ServiceChannels,
) -> Result<(), anyhow::Error> {
    let app = router(channels);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
