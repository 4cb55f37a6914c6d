use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use super::{error_response, rejection_response, AppState, JsonResponse};
use crate::models::qr_codes::NewRedemption;
use crate::services::{call, redemption::RedemptionRequest};

pub async fn validate_qr_code(
    State(state): State<AppState>,
    payload: Result<Json<NewRedemption>, JsonRejection>,
) -> JsonResponse {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    let result = call(&state.channels.redemption, "Redemption", |response| {
        RedemptionRequest::ValidateAndRedeem {
            qr_code: req.qr_code,
            user_id: req.user_id,
            response,
        }
    })
    .await;

    match result {
        Ok(redemption) => (StatusCode::OK, Json(json!(redemption))),
        Err(e) => error_response(e),
    }
}

pub async fn preview_qr_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> JsonResponse {
    let result = call(&state.channels.redemption, "Redemption", |response| {
        RedemptionRequest::PreviewPoints {
            qr_code: code,
            response,
        }
    })
    .await;

    match result {
        Ok(points) => (StatusCode::OK, Json(json!({ "points": points }))),
        Err(e) => error_response(e),
    }
}
