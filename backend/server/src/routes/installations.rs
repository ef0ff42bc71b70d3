use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use models::{
    Installation, Role,
    payloads::{
        DataResponse, InstallationInput, InstallationResponse, ListResponse, StatusUpdate,
        SyncResponse,
    },
};

use crate::{
    auth::{CurrentUser, authorize},
    error::AppError,
    installations::{
        InstallationFilter, InstallationQuery, list_installations, record_installation,
        sync_all, sync_message, update_status,
    },
    state::AppState,
    utils::{Payload, created},
};

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Query(query): Query<InstallationQuery>,
) -> Result<Json<ListResponse<Installation>>, AppError> {
    let filter = InstallationFilter::try_from(query)?;
    let installations = list_installations(&state.database, &filter).await?;

    Ok(Json(ListResponse::new(installations)))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Installation>>, AppError> {
    let installation = state
        .database
        .get::<Installation>(&id)
        .await?
        .ok_or(AppError::NotFound("Installation"))?;

    Ok(Json(DataResponse::new(installation)))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Payload(input): Payload<InstallationInput>,
) -> Result<(StatusCode, Json<InstallationResponse>), AppError> {
    let draft = input.validate()?;
    let (installation, meter_synced) = record_installation(&state.database, &user, draft).await?;

    let message = (!meter_synced).then(|| {
        format!(
            "Installation saved, no meter found with serial number {}",
            installation.meter_serial_number
        )
    });

    Ok(created(InstallationResponse {
        success: true,
        data: installation,
        meter_synced,
        message,
    }))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Payload(update): Payload<StatusUpdate>,
) -> Result<Json<InstallationResponse>, AppError> {
    let status = update
        .status
        .ok_or_else(|| AppError::Validation("Status is required".to_string()))?;

    let (installation, meter_synced) = update_status(&state.database, &user, &id, status).await?;

    Ok(Json(InstallationResponse {
        success: true,
        data: installation,
        meter_synced,
        message: Some("Installation updated successfully".to_string()),
    }))
}

pub async fn sync_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SyncResponse>, AppError> {
    authorize(&user, &[Role::Admin])?;

    let stats = sync_all(&state.database).await?;

    Ok(Json(SyncResponse {
        success: true,
        message: sync_message(&stats),
        stats,
    }))
}
