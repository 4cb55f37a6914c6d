use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde_json::json;

use super::{error_response, rejection_response, AppState, JsonResponse};
use crate::models::users::{OtpRequest, OtpVerification};
use crate::services::{auth::AuthRequest, call};

pub async fn request_otp(
    State(state): State<AppState>,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> JsonResponse {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    let result = call(&state.channels.auth, "Auth", |response| {
        AuthRequest::RequestOtp {
            mobile: req.mobile,
            response,
        }
    })
    .await;

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"ok": true, "message": "OTP sent successfully"})),
        ),
        Err(e) => error_response(e),
    }
}

pub async fn verify_otp(
    State(state): State<AppState>,
    payload: Result<Json<OtpVerification>, JsonRejection>,
) -> JsonResponse {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    let result = call(&state.channels.auth, "Auth", |response| {
        AuthRequest::VerifyOtp {
            mobile: req.mobile,
            otp: req.otp,
            response,
        }
    })
    .await;

    match result {
        Ok(user) => (StatusCode::OK, Json(json!({ "user": user }))),
        Err(e) => error_response(e),
    }
}
