//! Trip lifecycle errors

use thiserror::Error;

use crate::bike_client::BikeClientError;
use crate::error::ApiError;

#[derive(Error, Debug)]
pub enum TripError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("User {0} is not eligible to start a trip: prepaid balance must be positive")]
    UserNotEligible(i64),

    #[error("Bike {0} not found")]
    BikeNotFound(i64),

    #[error("Bike {0} is not available")]
    BikeUnavailable(i64),

    #[error("Trip {0} not found")]
    TripNotFound(i64),

    #[error("User {0} already has an active trip")]
    ActiveTripExists(i64),

    #[error("Trip {0} has already ended")]
    TripAlreadyEnded(i64),

    #[error("{0}")]
    UnauthorizedTripAccess(String),

    #[error("Bike rejected the operation: {0}")]
    BikeRejected(String),

    #[error("Bike service unavailable: {0}")]
    BikeServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<BikeClientError> for TripError {
    fn from(err: BikeClientError) -> Self {
        match err {
            BikeClientError::Rejected(msg) => TripError::BikeRejected(msg),
            BikeClientError::Unavailable(msg) => TripError::BikeServiceUnavailable(msg),
        }
    }
}

impl From<TripError> for ApiError {
    fn from(err: TripError) -> Self {
        match err {
            TripError::UserNotFound(_) | TripError::BikeNotFound(_) | TripError::TripNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            TripError::ActiveTripExists(_)
            | TripError::TripAlreadyEnded(_)
            | TripError::BikeUnavailable(_) => ApiError::Conflict(err.to_string()),
            TripError::UserNotEligible(_) | TripError::UnauthorizedTripAccess(_) => {
                ApiError::Forbidden(err.to_string())
            }
            TripError::BikeRejected(_) => ApiError::BadRequest(err.to_string()),
            TripError::BikeServiceUnavailable(_) => ApiError::ExternalServiceError(err.to_string()),
            TripError::Database(e) => ApiError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TripError::UserNotFound(1), StatusCode::NOT_FOUND),
            (TripError::TripNotFound(1), StatusCode::NOT_FOUND),
            (TripError::ActiveTripExists(1), StatusCode::CONFLICT),
            (TripError::TripAlreadyEnded(1), StatusCode::CONFLICT),
            (TripError::BikeUnavailable(1), StatusCode::CONFLICT),
            (TripError::UserNotEligible(1), StatusCode::FORBIDDEN),
            (
                TripError::UnauthorizedTripAccess("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                TripError::BikeRejected("battery low".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                TripError::BikeServiceUnavailable("timeout".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_bike_client_errors_stay_distinct() {
        assert!(matches!(
            TripError::from(BikeClientError::Rejected("low battery".to_string())),
            TripError::BikeRejected(_)
        ));
        assert!(matches!(
            TripError::from(BikeClientError::Unavailable("connection refused".to_string())),
            TripError::BikeServiceUnavailable(_)
        ));
    }
}
