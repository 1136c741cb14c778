use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only gateway status literal treated as a successful payment.
pub const GATEWAY_SUCCESS_STATUS: &str = "SUCCEEDED";

/// Normalized form of a gateway redirect, forwarded once to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWebhookEvent {
    pub order_id: String,
    pub amount: BigDecimal,
    pub provider_status: String,
    /// The gateway reuses the order id as its transaction reference.
    pub provider_transaction_id: String,
    pub received_at: DateTime<Utc>,
}

impl PaymentWebhookEvent {
    pub fn new(order_id: String, amount: BigDecimal, provider_status: String) -> Self {
        Self {
            provider_transaction_id: order_id.clone(),
            order_id,
            amount,
            provider_status,
            received_at: Utc::now(),
        }
    }
}
