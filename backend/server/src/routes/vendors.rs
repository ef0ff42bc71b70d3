use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use models::{
    Role, Vendor,
    payloads::{DataResponse, ListResponse, VendorInput},
};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{CurrentUser, authorize},
    error::AppError,
    state::AppState,
    utils::{Payload, created, on_duplicate},
};

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_deref().map(|value| value.trim().to_string())
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
) -> Result<Json<ListResponse<Vendor>>, AppError> {
    let mut vendors = state.database.list::<Vendor>().await?;
    vendors.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(ListResponse::new(vendors)))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Vendor>>, AppError> {
    let vendor = state
        .database
        .get::<Vendor>(&id)
        .await?
        .ok_or(AppError::NotFound("Vendor"))?;

    Ok(Json(DataResponse::new(vendor)))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Payload(input): Payload<VendorInput>,
) -> Result<(StatusCode, Json<DataResponse<Vendor>>), AppError> {
    authorize(&admin, &[Role::Admin])?;

    let name = input.validate_new()?;
    let vendor = Vendor {
        id: Uuid::new_v4().to_string(),
        contact_number: trimmed(&input.contact_number).unwrap_or_default(),
        email: trimmed(&input.email).unwrap_or_default(),
        assigned_meters_count: 0,
        created_at: Utc::now(),
        name,
    };

    state
        .database
        .insert(&vendor)
        .await
        .map_err(on_duplicate(format!(
            "Vendor \"{}\" already exists. Please choose a different name.",
            vendor.name
        )))?;
    info!(vendor = %vendor.name, "Vendor created");

    Ok(created(DataResponse::new(vendor)))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
    Payload(input): Payload<VendorInput>,
) -> Result<Json<DataResponse<Vendor>>, AppError> {
    authorize(&admin, &[Role::Admin])?;
    input.validate_update()?;

    let mut next = state
        .database
        .get::<Vendor>(&id)
        .await?
        .ok_or(AppError::NotFound("Vendor"))?;

    if let Some(name) = input.name() {
        next.name = name;
    }
    if let Some(contact_number) = trimmed(&input.contact_number) {
        next.contact_number = contact_number;
    }
    if let Some(email) = trimmed(&input.email) {
        next.email = email;
    }

    state
        .database
        .replace(&next)
        .await
        .map_err(on_duplicate(format!(
            "Vendor name \"{}\" is already taken. Please choose a different name.",
            next.name
        )))?;
    info!(vendor = %next.name, "Vendor updated");

    Ok(Json(DataResponse::new(next)))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Map<String, Value>>>, AppError> {
    authorize(&admin, &[Role::Admin])?;

    let vendor = state
        .database
        .get::<Vendor>(&id)
        .await?
        .ok_or(AppError::NotFound("Vendor"))?;

    if !state.database.remove(&vendor).await? {
        return Err(AppError::NotFound("Vendor"));
    }
    info!(vendor = %vendor.name, "Vendor deleted");

    Ok(Json(DataResponse::new(Map::new())))
}
