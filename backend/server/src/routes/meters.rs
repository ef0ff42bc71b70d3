use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use models::{
    Meter, MeterStats, Role, Vendor,
    payloads::{AssignRequest, Assignment, DataResponse, ListResponse},
};

use crate::{
    auth::{CurrentUser, authorize},
    error::AppError,
    meters::{MeterFilter, MeterQuery, assign_meters, list_meters, meter_stats},
    state::AppState,
    utils::{Payload, created},
};

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Query(query): Query<MeterQuery>,
) -> Result<Json<ListResponse<Meter>>, AppError> {
    let filter = MeterFilter::try_from(query)?;
    let meters = list_meters(&state.database, &filter).await?;

    Ok(Json(ListResponse::new(meters)))
}

pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DataResponse<MeterStats>>, AppError> {
    authorize(&user, &[Role::Admin])?;

    Ok(Json(DataResponse::new(meter_stats(&state.database).await?)))
}

pub async fn assign_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Payload(request): Payload<AssignRequest>,
) -> Result<(StatusCode, Json<DataResponse<Assignment>>), AppError> {
    authorize(&admin, &[Role::Admin])?;

    let (vendor_id, quantity) = request.validate()?;
    let assignment = assign_meters(&state.database, &admin, &vendor_id, quantity).await?;

    Ok(created(DataResponse::new(assignment)))
}

/// Vendor accounts only see their own stock.
pub async fn vendor_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(vendor_id): Path<String>,
) -> Result<Json<ListResponse<Meter>>, AppError> {
    if user.role == Role::Vendor && user.vendor_id.as_deref() != Some(vendor_id.as_str()) {
        return Err(AppError::Forbidden(
            "Vendors can only view their own meters".to_string(),
        ));
    }

    if state.database.get::<Vendor>(&vendor_id).await?.is_none() {
        return Err(AppError::NotFound("Vendor"));
    }

    let filter = MeterFilter {
        vendor_id: Some(vendor_id),
        ..MeterFilter::default()
    };
    let meters = list_meters(&state.database, &filter).await?;

    Ok(Json(ListResponse::new(meters)))
}
