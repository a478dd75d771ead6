//! Bike hardware integration
//!
//! The trip lifecycle asks the bike itself to unlock and lock. The bike
//! answers with a status report and a log carrying the authoritative trip
//! timestamps and positions.
//!
//! Two implementations share the [`BikeHardware`] trait: [`HttpBikeClient`]
//! talks to the bike service over HTTP, [`MockBikeClient`] is an in-process
//! fake selected with `USE_MOCKED_BIKE_CALL`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::models::geometry;

mod http;
mod mock;

pub use http::HttpBikeClient;
pub use mock::{MockBikeClient, MockMode};

/// Bike hardware errors
///
/// `Rejected` means the bike refused (pick another bike), `Unavailable` means
/// the service could not be reached or answered garbage (retry later).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BikeClientError {
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Current state of a bike as reported by its hardware
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BikeReport {
    pub battery_lvl: f64,
    pub last_position: String,
    pub is_available: bool,
}

impl BikeReport {
    /// Battery level as stored on the bike row (0-100)
    pub fn battery_percent(&self) -> i32 {
        self.battery_lvl.round().clamp(0.0, 100.0) as i32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartLog {
    pub start_time: DateTime<Utc>,
    pub start_position: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndLog {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_position: String,
    pub end_position: String,
    pub path_taken: String,
}

/// Answer to an unlock request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BikeStartData {
    pub report: BikeReport,
    pub log: StartLog,
}

/// Answer to a lock request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BikeEndData {
    pub report: BikeReport,
    pub log: EndLog,
}

impl BikeStartData {
    /// Reject answers whose geometry would not fit the trip columns
    pub fn check_geometry(&self) -> Result<(), BikeClientError> {
        check(geometry::validate_point(&self.report.last_position))?;
        check(geometry::validate_point(&self.log.start_position))
    }
}

impl BikeEndData {
    pub fn check_geometry(&self) -> Result<(), BikeClientError> {
        check(geometry::validate_point(&self.report.last_position))?;
        check(geometry::validate_point(&self.log.end_position))?;
        check(geometry::validate_linestring(&self.log.path_taken))
    }
}

fn check<T>(result: Result<T, geometry::WktError>) -> Result<(), BikeClientError> {
    result
        .map(|_| ())
        .map_err(|e| BikeClientError::Unavailable(format!("Bike service sent invalid geometry: {}", e)))
}

/// Unlock/lock operations against a physical bike
#[async_trait]
pub trait BikeHardware: Send + Sync {
    /// Ask the bike to unlock for a trip
    async fn authorize_start(
        &self,
        bike_id: i64,
        user_id: i64,
        trip_id: i64,
    ) -> Result<BikeStartData, BikeClientError>;

    /// Ask the bike to lock and close out a trip
    async fn authorize_end(
        &self,
        bike_id: i64,
        user_id: i64,
        trip_id: i64,
        maintenance: bool,
        ignore_zone: bool,
    ) -> Result<BikeEndData, BikeClientError>;
}

/// Pick the bike hardware implementation from configuration
pub fn from_config(config: &Config) -> Result<Arc<dyn BikeHardware>, BikeClientError> {
    if config.use_mocked_bike_call {
        tracing::warn!("USE_MOCKED_BIKE_CALL is set, bike hardware calls are simulated");
        return Ok(Arc::new(MockBikeClient::new()));
    }

    tracing::info!(url = %config.bike_service_url, "Using bike service");
    Ok(Arc::new(HttpBikeClient::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(battery_lvl: f64) -> BikeReport {
        BikeReport {
            battery_lvl,
            last_position: "POINT(13.10005 55.55034)".to_string(),
            is_available: true,
        }
    }

    #[test]
    fn test_battery_percent() {
        assert_eq!(report(85.5).battery_percent(), 86);
        assert_eq!(report(-3.0).battery_percent(), 0);
        assert_eq!(report(140.0).battery_percent(), 100);
    }

    #[test]
    fn test_end_data_geometry_check() {
        let now = Utc::now();
        let mut data = BikeEndData {
            report: report(50.0),
            log: EndLog {
                start_time: now,
                end_time: now,
                start_position: "POINT(13.06782 55.577859)".to_string(),
                end_position: "POINT(13.100047 55.55034)".to_string(),
                path_taken: "LINESTRING(13.06782 55.57786, 13.100047 55.55034)".to_string(),
            },
        };
        assert!(data.check_geometry().is_ok());

        data.log.path_taken = "POINT(1 1)".to_string();
        assert!(matches!(
            data.check_geometry(),
            Err(BikeClientError::Unavailable(_))
        ));
    }
}
