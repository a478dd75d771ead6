//! User administration handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::extract::{Path, ValidatedJson, ValidatedQuery};
use crate::error::ApiError;
use crate::middleware::AdminScope;
use crate::models::{Document, Resource};
use crate::state::AppState;
use crate::user::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserAttributes};

type UserDocument = Json<Document<Resource<UserAttributes>>>;

/// GET /v1/users
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> Result<Json<Document<Vec<Resource<UserAttributes>>>>, ApiError> {
    let users = state.user_service.list_users(&query).await?;
    let data = users
        .into_iter()
        .map(|u| u.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/users"))))
}

/// GET /v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(user_id): Path<i64>,
) -> Result<UserDocument, ApiError> {
    let user = state.user_service.get_user_with_relations(user_id).await?;
    let link = state.url(&format!("/v1/users/{}", user_id));
    Ok(Json(Document::new(user.into_resource(&state.base_url), link)))
}

/// POST /v1/users
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, UserDocument), ApiError> {
    let user = state.user_service.create_user(req).await?;
    let link = state.url(&format!("/v1/users/{}", user.id));
    Ok((
        StatusCode::CREATED,
        Json(Document::new(user.into_resource(&state.base_url), link)),
    ))
}

/// PATCH /v1/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(user_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<UserDocument, ApiError> {
    let user = state.user_service.update_user(user_id, req).await?;
    let link = state.url(&format!("/v1/users/{}", user.id));
    Ok(Json(Document::new(user.into_resource(&state.base_url), link)))
}

/// DELETE /v1/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
