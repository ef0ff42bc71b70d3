use std::sync::Arc;

use axum::{Json, extract::State};
use models::payloads::{LoginRequest, LoginResponse, MeResponse};

use crate::{
    auth::{CurrentUser, login},
    error::AppError,
    state::AppState,
    utils::Payload,
};

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Payload(request): Payload<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = login(&state, &request.username, &request.password).await?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        user,
    }))
}

pub async fn me_handler(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user,
    })
}
