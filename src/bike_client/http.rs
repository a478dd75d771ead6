//! HTTP client for the bike service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{BikeClientError, BikeEndData, BikeHardware, BikeStartData};
use crate::config::Config;

/// Response envelope of the bike service: `{"message": ..., "data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct StartTripBody {
    user_id: i64,
    trip_id: i64,
}

#[derive(Debug, Serialize)]
struct EndTripBody {
    user_id: i64,
    trip_id: i64,
    maintenance: bool,
    ignore_zone: bool,
}

/// Bike service client
#[derive(Debug, Clone)]
pub struct HttpBikeClient {
    client: Client,
    base_url: String,
}

impl HttpBikeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BikeClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BikeClientError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BikeClientError> {
        Self::new(
            config.bike_service_url.clone(),
            Duration::from_secs(config.bike_service_timeout_seconds),
        )
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, BikeClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Calling bike service");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BikeClientError::Unavailable(format!("Bike service request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(BikeClientError::Rejected(rejection_message(status, &text)));
        }
        if !status.is_success() {
            return Err(BikeClientError::Unavailable(format!(
                "Bike service returned {}",
                status
            )));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            BikeClientError::Unavailable(format!("Invalid bike service response: {}", e))
        })?;

        Ok(envelope.data)
    }
}

/// Best human-readable reason from a 4xx body
fn rejection_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<String>,
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail.or(b.message))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("Bike service returned {}", status))
}

#[async_trait]
impl BikeHardware for HttpBikeClient {
    async fn authorize_start(
        &self,
        bike_id: i64,
        user_id: i64,
        trip_id: i64,
    ) -> Result<BikeStartData, BikeClientError> {
        let data: BikeStartData = self
            .post(
                &format!("/v1/bikes/{}/start_trip", bike_id),
                &StartTripBody { user_id, trip_id },
            )
            .await?;
        data.check_geometry()?;
        Ok(data)
    }

    async fn authorize_end(
        &self,
        bike_id: i64,
        user_id: i64,
        trip_id: i64,
        maintenance: bool,
        ignore_zone: bool,
    ) -> Result<BikeEndData, BikeClientError> {
        let data: BikeEndData = self
            .post(
                &format!("/v1/bikes/{}/end_trip", bike_id),
                &EndTripBody {
                    user_id,
                    trip_id,
                    maintenance,
                    ignore_zone,
                },
            )
            .await?;
        data.check_geometry()?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serve a fake bike service on an ephemeral port
    async fn spawn_bike_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(url: &str) -> HttpBikeClient {
        HttpBikeClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(
            rejection_message(StatusCode::BAD_REQUEST, r#"{"detail": "Battery too low"}"#),
            "Battery too low"
        );
        assert_eq!(
            rejection_message(StatusCode::CONFLICT, r#"{"message": "Bike in use"}"#),
            "Bike in use"
        );
        assert_eq!(rejection_message(StatusCode::BAD_REQUEST, "locked"), "locked");
        assert_eq!(
            rejection_message(StatusCode::NOT_FOUND, ""),
            "Bike service returned 404 Not Found"
        );
    }

    #[tokio::test]
    async fn test_start_trip_success() {
        let router = Router::new().route(
            "/v1/bikes/:id/start_trip",
            post(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                assert_eq!(id, 7);
                assert_eq!(body["trip_id"], 42);
                Json(json!({
                    "message": "Trip started",
                    "data": {
                        "report": {
                            "id": "7",
                            "city_id": 1,
                            "battery_lvl": 85.5,
                            "last_position": "POINT(13.06782 55.577859)",
                            "is_available": false
                        },
                        "log": {
                            "start_time": "2024-02-17T04:35:18.719376Z",
                            "start_position": "POINT(13.06782 55.577859)"
                        }
                    }
                }))
            }),
        );
        let url = spawn_bike_service(router).await;

        let data = client(&url).authorize_start(7, 1, 42).await.unwrap();
        assert_eq!(data.report.battery_percent(), 86);
        assert_eq!(data.log.start_position, "POINT(13.06782 55.577859)");
    }

    #[tokio::test]
    async fn test_client_error_is_rejection() {
        let router = Router::new().route(
            "/v1/bikes/:id/start_trip",
            post(|| async {
                (
                    AxumStatus::BAD_REQUEST,
                    Json(json!({"detail": "Battery too low"})),
                )
            }),
        );
        let url = spawn_bike_service(router).await;

        let err = client(&url).authorize_start(7, 1, 42).await.unwrap_err();
        assert_eq!(err, BikeClientError::Rejected("Battery too low".to_string()));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let router = Router::new().route(
            "/v1/bikes/:id/end_trip",
            post(|| async { AxumStatus::SERVICE_UNAVAILABLE }),
        );
        let url = spawn_bike_service(router).await;

        let err = client(&url)
            .authorize_end(7, 1, 42, false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, BikeClientError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_bad_body_is_unavailable() {
        let router = Router::new().route(
            "/v1/bikes/:id/end_trip",
            post(|| async { Json(json!({"message": "ok", "data": {"unexpected": true}})) }),
        );
        let url = spawn_bike_service(router).await;

        let err = client(&url)
            .authorize_end(7, 1, 42, true, false)
            .await
            .unwrap_err();
        assert!(matches!(err, BikeClientError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .authorize_start(7, 1, 42)
            .await
            .unwrap_err();
        assert!(matches!(err, BikeClientError::Unavailable(_)));
    }
}
