//! Admin account handlers

use axum::{extract::State, Json};

use super::extract::ValidatedQuery;
use crate::admin::{AdminAttributes, ListAdminsQuery};
use crate::error::ApiError;
use crate::middleware::AdminScope;
use crate::models::{Document, Resource};
use crate::state::AppState;

/// GET /v1/admin - The calling admin's own record
pub async fn get_my_admin(
    State(state): State<AppState>,
    AdminScope(caller): AdminScope,
) -> Result<Json<Document<Resource<AdminAttributes>>>, ApiError> {
    let admin = state.admin_service.get_admin(caller.subject_id).await?;
    Ok(Json(Document::new(admin.into_resource(), state.url("/v1/admin"))))
}

/// GET /v1/admin/all
pub async fn list_admins(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedQuery(query): ValidatedQuery<ListAdminsQuery>,
) -> Result<Json<Document<Vec<Resource<AdminAttributes>>>>, ApiError> {
    let admins = state.admin_service.list_admins(&query).await?;
    let data = admins.into_iter().map(|a| a.into_resource()).collect();
    Ok(Json(Document::new(data, state.url("/v1/admin/all"))))
}
