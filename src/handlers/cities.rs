//! City handlers

use axum::{extract::State, Json};

use super::extract::Path;
use crate::city::CityAttributes;
use crate::error::ApiError;
use crate::models::{Document, Resource};
use crate::state::AppState;

/// GET /v1/cities
pub async fn list_cities(
    State(state): State<AppState>,
) -> Result<Json<Document<Vec<Resource<CityAttributes>>>>, ApiError> {
    let cities = state.city_service.list_cities().await?;
    let data = cities
        .into_iter()
        .map(|c| c.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/cities"))))
}

/// GET /v1/cities/:id
pub async fn get_city(
    State(state): State<AppState>,
    Path(city_id): Path<i32>,
) -> Result<Json<Document<Resource<CityAttributes>>>, ApiError> {
    let city = state.city_service.get_city(city_id).await?;
    let link = state.url(&format!("/v1/cities/{}", city.id));
    Ok(Json(Document::new(city.into_resource(&state.base_url), link)))
}
