use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

/// Failure taxonomy of the reservation pipeline. Every variant is caught by
/// the component that detects it and turned into a user-facing state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReservationError {
    #[error("check-out ({check_out}) must be after check-in ({check_in})")]
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("invalid guest count {requested}")]
    InvalidGuestCount { requested: u32, max: Option<u32> },

    #[error("property unavailable: {0}")]
    PropertyUnavailable(String),

    #[error("booking creation failed: {0}")]
    BookingCreationFailed(String),

    #[error("payment registration failed: {0}")]
    PaymentRegistrationFailed(String),

    #[error("gateway redirect is missing required parameters: {}", .0.join(", "))]
    MissingCallbackParameters(Vec<&'static str>),

    #[error("gateway redirect has invalid parameters: {0}")]
    InvalidCallbackParameters(ValidationError),

    #[error("payment not succeeded (gateway status: {})", .status.as_deref().unwrap_or("<absent>"))]
    PaymentNotSucceeded { status: Option<String> },

    #[error("could not reach backend to record payment: {0}")]
    ReconciliationTransportFailure(String),
}

impl ReservationError {
    /// Text shown to the guest for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ReservationError::InvalidDateRange { .. } => {
                "The check-out date must be after the check-in date.".to_string()
            }
            ReservationError::InvalidGuestCount { max: Some(max), .. } => {
                format!("This property accepts up to {} guests.", max)
            }
            ReservationError::InvalidGuestCount { max: None, .. } => {
                "At least one guest is required.".to_string()
            }
            ReservationError::PropertyUnavailable(_) => {
                "This property is not available for booking right now.".to_string()
            }
            ReservationError::BookingCreationFailed(_) => {
                "We could not create your reservation. Please try again.".to_string()
            }
            ReservationError::PaymentRegistrationFailed(_) => {
                "Your reservation was created, but we could not register the payment. \
                 Please contact the host to complete it."
                    .to_string()
            }
            ReservationError::MissingCallbackParameters(_)
            | ReservationError::InvalidCallbackParameters(_) => {
                "We could not read the payment result returned by the payment provider.".to_string()
            }
            ReservationError::PaymentNotSucceeded { .. } => {
                "The payment was not completed.".to_string()
            }
            ReservationError::ReconciliationTransportFailure(_) => {
                "Your payment was received. Updating its status may take a few minutes.".to_string()
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let message = err.user_message();
        match err {
            ReservationError::InvalidDateRange { .. } | ReservationError::InvalidGuestCount { .. } => {
                AppError::Validation(message)
            }
            ReservationError::PropertyUnavailable(_) => AppError::NotFound(message),
            ReservationError::BookingCreationFailed(_) => AppError::BadGateway(message),
            _ => AppError::BadRequest(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
