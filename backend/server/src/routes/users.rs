use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use models::{
    Role, User, Vendor,
    payloads::{DataResponse, ListResponse, UserInput, UserResponse, vendor_for_role},
};
use serde_json::{Map, Value};
use tracing::info;

use crate::{
    auth::{CurrentUser, authorize, create_account, hash_password},
    database::{Database, UserRecord},
    error::AppError,
    mail::send_credentials,
    state::AppState,
    utils::{Payload, created, on_duplicate},
};

async fn require_vendor(database: &Database, vendor_id: Option<&str>) -> Result<(), AppError> {
    let Some(vendor_id) = vendor_id else {
        return Ok(());
    };

    match database.get::<Vendor>(vendor_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!(
            "Vendor {vendor_id} does not exist"
        ))),
    }
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ListResponse<User>>, AppError> {
    authorize(&user, &[Role::Admin])?;

    let mut users: Vec<User> = state
        .database
        .list::<UserRecord>()
        .await?
        .into_iter()
        .map(|record| record.user)
        .collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(ListResponse::new(users)))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<User>>, AppError> {
    authorize(&user, &[Role::Admin])?;

    let record = state
        .database
        .get::<UserRecord>(&id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(Json(DataResponse::new(record.user)))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Payload(input): Payload<UserInput>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    authorize(&admin, &[Role::Admin])?;

    let draft = input.validate_new()?;
    require_vendor(&state.database, draft.vendor_id.as_deref()).await?;

    // Mailed in plain text, so captured before hashing.
    let password = draft.password.clone();
    let user = create_account(&state, draft).await?;

    let email_sent =
        send_credentials(&state, input.email(), &user.username, &password, user.role).await;

    Ok(created(UserResponse {
        success: true,
        data: user,
        email_sent,
    }))
}

pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
    Payload(input): Payload<UserInput>,
) -> Result<Json<UserResponse>, AppError> {
    authorize(&admin, &[Role::Admin])?;
    input.validate_update()?;

    let mut next = state
        .database
        .get::<UserRecord>(&id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if let Some(username) = input.username() {
        next.user.username = username;
    }
    if let Some(name) = input.name() {
        next.user.name = name;
    }
    if let Some(role) = input.role {
        next.user.role = role;
    }

    let vendor_id = input.vendor_id().or_else(|| next.user.vendor_id.take());
    next.user.vendor_id = vendor_for_role(next.user.role, vendor_id)?;
    require_vendor(&state.database, next.user.vendor_id.as_deref()).await?;

    if let Some(password) = &input.password {
        next.password_hash = hash_password(password.clone(), state.config.bcrypt_cost).await?;
    }
    next.user.updated_at = Utc::now();

    state
        .database
        .replace(&next)
        .await
        .map_err(on_duplicate(format!(
            "Username \"{}\" is already taken. Please choose a different username.",
            next.user.username
        )))?;
    info!(username = %next.user.username, "User updated");

    let email_sent = match &input.password {
        Some(password) => {
            send_credentials(
                &state,
                input.email(),
                &next.user.username,
                password,
                next.user.role,
            )
            .await
        }
        None => false,
    };

    Ok(Json(UserResponse {
        success: true,
        data: next.user,
        email_sent,
    }))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Map<String, Value>>>, AppError> {
    authorize(&admin, &[Role::Admin])?;

    let record = state
        .database
        .get::<UserRecord>(&id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if !state.database.remove(&record).await? {
        return Err(AppError::NotFound("User"));
    }
    info!(username = %record.user.username, "User deleted");

    Ok(Json(DataResponse::new(Map::new())))
}
