//! Zone type and map zone handlers

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
use crate::zone::{
    CreateMapZoneRequest, CreateZoneTypeRequest, ListMapZonesQuery, MapZoneAttributes,
    UpdateMapZoneRequest, UpdateZoneTypeRequest, ZoneLookupQuery, ZoneTypeAttributes,
};

type MapZoneDocument = Json<Document<Resource<MapZoneAttributes>>>;
type ZoneTypeDocument = Json<Document<Resource<ZoneTypeAttributes>>>;

// Map zones

/// GET /v1/zones
pub async fn list_map_zones(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListMapZonesQuery>,
) -> Result<Json<Document<Vec<Resource<MapZoneAttributes>>>>, ApiError> {
    let zones = state.zone_service.list_map_zones(&query).await?;
    let data = zones
        .into_iter()
        .map(|z| z.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/zones"))))
}

/// GET /v1/zones/lookup - Zone containing a point
pub async fn lookup_zone(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ZoneLookupQuery>,
) -> Result<MapZoneDocument, ApiError> {
    let zone = state
        .zone_service
        .zone_for_point(&query.position, query.city_id)
        .await?;
    let link = state.url(&format!("/v1/zones/{}", zone.id));
    Ok(Json(Document::new(zone.into_resource(&state.base_url), link)))
}

/// GET /v1/zones/:id
pub async fn get_map_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<i32>,
) -> Result<MapZoneDocument, ApiError> {
    let zone = state.zone_service.get_map_zone(zone_id).await?;
    let link = state.url(&format!("/v1/zones/{}", zone.id));
    Ok(Json(Document::new(zone.into_resource(&state.base_url), link)))
}

/// POST /v1/zones
pub async fn create_map_zone(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedJson(req): ValidatedJson<CreateMapZoneRequest>,
) -> Result<(StatusCode, MapZoneDocument), ApiError> {
    let zone = state.zone_service.create_map_zone(req).await?;
    let link = state.url(&format!("/v1/zones/{}", zone.id));
    Ok((
        StatusCode::CREATED,
        Json(Document::new(zone.into_resource(&state.base_url), link)),
    ))
}

/// PATCH /v1/zones/:id
pub async fn update_map_zone(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(zone_id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateMapZoneRequest>,
) -> Result<MapZoneDocument, ApiError> {
    let zone = state.zone_service.update_map_zone(zone_id, req).await?;
    let link = state.url(&format!("/v1/zones/{}", zone.id));
    Ok(Json(Document::new(zone.into_resource(&state.base_url), link)))
}

/// DELETE /v1/zones/:id
pub async fn delete_map_zone(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(zone_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.zone_service.delete_map_zone(zone_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Zone types

/// GET /v1/zone-types
pub async fn list_zone_types(
    State(state): State<AppState>,
) -> Result<Json<Document<Vec<Resource<ZoneTypeAttributes>>>>, ApiError> {
    let zone_types = state.zone_service.list_zone_types().await?;
    let data = zone_types
        .into_iter()
        .map(|z| z.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/zone-types"))))
}

/// GET /v1/zone-types/:id
pub async fn get_zone_type(
    State(state): State<AppState>,
    Path(zone_type_id): Path<i32>,
) -> Result<ZoneTypeDocument, ApiError> {
    let zone_type = state.zone_service.get_zone_type(zone_type_id).await?;
    let link = state.url(&format!("/v1/zone-types/{}", zone_type.id));
    Ok(Json(Document::new(
        zone_type.into_resource(&state.base_url),
        link,
    )))
}

/// POST /v1/zone-types
pub async fn create_zone_type(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedJson(req): ValidatedJson<CreateZoneTypeRequest>,
) -> Result<(StatusCode, ZoneTypeDocument), ApiError> {
    let zone_type = state.zone_service.create_zone_type(req).await?;
    let link = state.url(&format!("/v1/zone-types/{}", zone_type.id));
    Ok((
        StatusCode::CREATED,
        Json(Document::new(zone_type.into_resource(&state.base_url), link)),
    ))
}

/// PATCH /v1/zone-types/:id
pub async fn update_zone_type(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(zone_type_id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateZoneTypeRequest>,
) -> Result<ZoneTypeDocument, ApiError> {
    let zone_type = state
        .zone_service
        .update_zone_type(zone_type_id, req)
        .await?;
    let link = state.url(&format!("/v1/zone-types/{}", zone_type.id));
    Ok(Json(Document::new(
        zone_type.into_resource(&state.base_url),
        link,
    )))
}

/// DELETE /v1/zone-types/:id
pub async fn delete_zone_type(
    State(state): State<AppState>,
    _admin: AdminScope,
    Path(zone_type_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.zone_service.delete_zone_type(zone_type_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
