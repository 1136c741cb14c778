use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::quote::Quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    Created,
}

/// Durable reservation as acknowledged by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub property_id: String,
    pub guest_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: u32,
    pub subtotal: BigDecimal,
    pub cleaning_fee: BigDecimal,
    pub service_fee: BigDecimal,
    pub taxes: BigDecimal,
    pub total: BigDecimal,
    #[serde(default = "default_state")]
    pub state: BookingState,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_state() -> BookingState {
    BookingState::Created
}

/// Body of `POST /bookings`, built from a quote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub property_id: String,
    pub guest_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: u32,
    pub subtotal: BigDecimal,
    pub cleaning_fee: BigDecimal,
    pub service_fee: BigDecimal,
    pub taxes: BigDecimal,
    pub total: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewBooking {
    pub fn from_quote(quote: &Quote, guest_id: String, notes: Option<String>) -> Self {
        Self {
            property_id: quote.property_id.clone(),
            guest_id,
            check_in: quote.check_in,
            check_out: quote.check_out,
            guest_count: quote.guest_count,
            subtotal: quote.subtotal.clone(),
            cleaning_fee: quote.cleaning_fee.clone(),
            service_fee: quote.service_fee.clone(),
            taxes: quote.taxes.clone(),
            total: quote.total.clone(),
            notes: notes.filter(|n| !n.trim().is_empty()),
        }
    }
}
