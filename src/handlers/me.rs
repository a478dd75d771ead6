//! Handlers for the authenticated user's own data

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::extract::{Path, ValidatedJson, ValidatedQuery};
use crate::error::ApiError;
use crate::middleware::UserScope;
use crate::models::{Document, Resource};
use crate::state::AppState;
use crate::transaction::{ListTransactionsQuery, TransactionAttributes};
use crate::trip::{ListTripsQuery, TripAttributes, TripError};
use crate::user::{UpdateUserRequest, UserAttributes};

/// GET /v1/me
pub async fn get_me(
    State(state): State<AppState>,
    scope: UserScope,
) -> Result<Json<Document<Resource<UserAttributes>>>, ApiError> {
    let user = state
        .user_service
        .get_user_with_relations(scope.user_id)
        .await?;
    Ok(Json(Document::new(
        user.into_resource(&state.base_url),
        state.url("/v1/me"),
    )))
}

/// PATCH /v1/me
pub async fn update_me(
    State(state): State<AppState>,
    scope: UserScope,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<Document<Resource<UserAttributes>>>, ApiError> {
    let user = state.user_service.update_user(scope.user_id, req).await?;
    Ok(Json(Document::new(
        user.into_resource(&state.base_url),
        state.url("/v1/me"),
    )))
}

/// DELETE /v1/me
pub async fn delete_me(
    State(state): State<AppState>,
    scope: UserScope,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete_user(scope.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/me/trips
pub async fn my_trips(
    State(state): State<AppState>,
    scope: UserScope,
    ValidatedQuery(mut query): ValidatedQuery<ListTripsQuery>,
) -> Result<Json<Document<Vec<Resource<TripAttributes>>>>, ApiError> {
    query.user_id = Some(scope.user_id);
    let trips = state.trip_service.list_trips(&query).await?;
    let data = trips
        .into_iter()
        .map(|t| t.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/me/trips"))))
}

/// GET /v1/me/trips/:id
pub async fn my_trip(
    State(state): State<AppState>,
    scope: UserScope,
    Path(trip_id): Path<i64>,
) -> Result<Json<Document<Resource<TripAttributes>>>, ApiError> {
    let trip = state.trip_service.get_trip(trip_id).await?;
    if trip.user_id != scope.user_id {
        return Err(TripError::UnauthorizedTripAccess(
            "Trip belongs to another user".to_string(),
        )
        .into());
    }
    let link = state.url(&format!("/v1/me/trips/{}", trip.id));
    Ok(Json(Document::new(trip.into_resource(&state.base_url), link)))
}

/// GET /v1/me/transactions
pub async fn my_transactions(
    State(state): State<AppState>,
    scope: UserScope,
    ValidatedQuery(mut query): ValidatedQuery<ListTransactionsQuery>,
) -> Result<Json<Document<Vec<Resource<TransactionAttributes>>>>, ApiError> {
    query.user_id = Some(scope.user_id);
    let transactions = state.transaction_service.list_transactions(&query).await?;
    let data = transactions
        .into_iter()
        .map(|t| t.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/me/transactions"))))
}
