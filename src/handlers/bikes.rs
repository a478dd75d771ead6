//! Bike handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::extract::{Path, ValidatedJson, ValidatedQuery};
use crate::bike::{
    BikeAttributes, BikesInZoneQuery, CreateBikeRequest, ListBikesQuery, UpdateBikeRequest,
};
use crate::error::ApiError;
use crate::middleware::AdminScope;
use crate::models::{Document, Resource};
use crate::state::AppState;

type BikeDocument = Json<Document<Resource<BikeAttributes>>>;
type BikeListDocument = Json<Document<Vec<Resource<BikeAttributes>>>>;

/// GET /v1/bikes
pub async fn list_bikes(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedQuery(query): ValidatedQuery<ListBikesQuery>,
) -> Result<BikeListDocument, ApiError> {
    let bikes = state.bike_service.list_bikes(&query).await?;
    let data = bikes
        .into_iter()
        .map(|b| b.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/bikes"))))
}

/// GET /v1/bikes/available - Public listing of rentable bikes
pub async fn list_available_bikes(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListBikesQuery>,
) -> Result<BikeListDocument, ApiError> {
    let bikes = state.bike_service.list_available_bikes(&query).await?;
    let data = bikes
        .into_iter()
        .map(|b| b.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/bikes/available"))))
}

/// GET /v1/bikes/bikes_in_zone
pub async fn bikes_in_zone(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedQuery(query): ValidatedQuery<BikesInZoneQuery>,
) -> Result<BikeListDocument, ApiError> {
    let bikes = state.bike_service.bikes_in_zone(&query).await?;
    let data = bikes
        .into_iter()
        .map(|b| b.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/bikes/bikes_in_zone"))))
}

/// GET /v1/bikes/:id
pub async fn get_bike(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(bike_id): Path<i64>,
) -> Result<BikeDocument, ApiError> {
    let bike = state.bike_service.get_bike(bike_id).await?;
    let link = state.url(&format!("/v1/bikes/{}", bike.id));
    Ok(Json(Document::new(bike.into_resource(&state.base_url), link)))
}

/// POST /v1/bikes
pub async fn create_bike(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedJson(req): ValidatedJson<CreateBikeRequest>,
) -> Result<(StatusCode, BikeDocument), ApiError> {
    let bike = state.bike_service.create_bike(req).await?;
    let link = state.url(&format!("/v1/bikes/{}", bike.id));
    Ok((
        StatusCode::CREATED,
        Json(Document::new(bike.into_resource(&state.base_url), link)),
    ))
}

/// PATCH /v1/bikes/:id
pub async fn update_bike(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(bike_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateBikeRequest>,
) -> Result<BikeDocument, ApiError> {
    let bike = state.bike_service.update_bike(bike_id, req).await?;
    let link = state.url(&format!("/v1/bikes/{}", bike.id));
    Ok(Json(Document::new(bike.into_resource(&state.base_url), link)))
}

/// DELETE /v1/bikes/:id
pub async fn delete_bike(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(bike_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.bike_service.delete_bike(bike_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
