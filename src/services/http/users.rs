use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use super::{error_response, AppState, JsonResponse};
use crate::services::{call, users::UserRequest};

pub async fn get_user_details(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> JsonResponse {
    let result = call(&state.channels.users, "User", |response| {
        UserRequest::GetUser {
            id: user_id,
            response,
        }
    })
    .await;

    match result {
        Ok(user) => (StatusCode::OK, Json(json!({ "user": user }))),
        Err(e) => error_response(e),
    }
}
