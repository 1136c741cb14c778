use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::domain::{Booking, Payment};
use crate::error::AppError;
use crate::services::{CheckoutOutcome, CheckoutRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub status: &'static str,
    pub message: String,
    /// Order id to hand to the payment gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
}

impl From<CheckoutOutcome> for CheckoutResponse {
    fn from(outcome: CheckoutOutcome) -> Self {
        let status = outcome.status();
        let message = outcome.message();
        let order_id = outcome.order_id().map(str::to_string);
        match outcome {
            CheckoutOutcome::Confirmed { booking, payment } => Self {
                status,
                message,
                order_id,
                booking,
                payment,
            },
            CheckoutOutcome::PaymentNotRegistered { booking, .. } => Self {
                status,
                message,
                order_id,
                booking,
                payment: None,
            },
        }
    }
}

pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.checkout.checkout(request).await?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(outcome))))
}
