//! Trip handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::extract::{Path, ValidatedJson, ValidatedQuery};
use crate::error::ApiError;
use crate::middleware::{AdminScope, UserScope};
use crate::models::{Document, Resource};
use crate::state::AppState;
use crate::trip::{
    EndTripParams, EndTripRequest, ListTripsQuery, StartTripRequest, TripAttributes, TripError,
};

type TripDocument = Json<Document<Resource<TripAttributes>>>;

/// A body `user_id` must match the token subject
fn acting_user(scope: &UserScope, requested: Option<i64>) -> Result<i64, TripError> {
    match requested {
        Some(user_id) if user_id != scope.user_id => Err(TripError::UnauthorizedTripAccess(
            "user_id does not match the authenticated user".to_string(),
        )),
        _ => Ok(scope.user_id),
    }
}

/// GET /v1/trips
pub async fn list_trips(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedQuery(query): ValidatedQuery<ListTripsQuery>,
) -> Result<Json<Document<Vec<Resource<TripAttributes>>>>, ApiError> {
    let trips = state.trip_service.list_trips(&query).await?;
    let data = trips
        .into_iter()
        .map(|t| t.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/trips"))))
}

/// GET /v1/trips/:id
pub async fn get_trip(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(trip_id): Path<i64>,
) -> Result<TripDocument, ApiError> {
    let trip = state.trip_service.get_trip(trip_id).await?;
    let link = state.url(&format!("/v1/trips/{}", trip.id));
    Ok(Json(Document::new(trip.into_resource(&state.base_url), link)))
}

/// POST /v1/trips - Start a trip
pub async fn start_trip(
    State(state): State<AppState>,
    scope: UserScope,
    ValidatedJson(req): ValidatedJson<StartTripRequest>,
) -> Result<(StatusCode, TripDocument), ApiError> {
    let user_id = acting_user(&scope, req.user_id)?;
    let trip = state.trip_service.start_trip(user_id, req.bike_id).await?;
    let link = state.url(&format!("/v1/trips/{}", trip.id));
    Ok((
        StatusCode::CREATED,
        Json(Document::new(trip.into_resource(&state.base_url), link)),
    ))
}

/// PATCH /v1/trips/:id - End a trip
pub async fn end_trip(
    State(state): State<AppState>,
    scope: UserScope,
    Path(trip_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<EndTripRequest>,
) -> Result<TripDocument, ApiError> {
    let user_id = acting_user(&scope, req.user_id)?;
    let trip = state
        .trip_service
        .end_trip(EndTripParams {
            trip_id,
            user_id,
            bike_id: req.bike_id,
            maintenance: req.maintenance,
            ignore_zone: req.ignore_zone,
        })
        .await?;
    let link = state.url(&format!("/v1/trips/{}", trip.id));
    Ok(Json(Document::new(trip.into_resource(&state.base_url), link)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acting_user() {
        let scope = UserScope { user_id: 5 };
        assert_eq!(acting_user(&scope, None).unwrap(), 5);
        assert_eq!(acting_user(&scope, Some(5)).unwrap(), 5);
        assert!(matches!(
            acting_user(&scope, Some(6)),
            Err(TripError::UnauthorizedTripAccess(_))
        ));
    }
}
