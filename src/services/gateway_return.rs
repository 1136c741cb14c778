//! Parsing of the payment gateway's browser redirect.
//!
//! The query string is untrusted: anyone can craft a redirect. Parsing is
//! strict and only the exact success literal is accepted; everything else
//! is a terminal error with nothing to reconcile.

use crate::domain::{PaymentWebhookEvent, GATEWAY_SUCCESS_STATUS};
use crate::error::ReservationError;
use crate::validation::{
    parse_amount, sanitize_string, validate_order_id, ValidationError, PROVIDER_STATUS_MAX_LEN,
};

pub const ORDER_ID_PARAM: &str = "orderId";
pub const AMOUNT_PARAM: &str = "amount";
pub const STATUS_PARAM: &str = "status";

#[derive(Default)]
struct ReturnParams {
    order_id: Option<String>,
    amount: Option<String>,
    status: Option<String>,
}

impl ReturnParams {
    fn slot(&mut self, key: &str) -> Option<(&'static str, &mut Option<String>)> {
        match key {
            ORDER_ID_PARAM => Some((ORDER_ID_PARAM, &mut self.order_id)),
            AMOUNT_PARAM => Some((AMOUNT_PARAM, &mut self.amount)),
            STATUS_PARAM => Some((STATUS_PARAM, &mut self.status)),
            _ => None,
        }
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ReservationError {
    ReservationError::InvalidCallbackParameters(ValidationError::new(field, message))
}

/// Turns the redirect query string into a normalized payment event.
///
/// A leading `?` is ignored. Empty values count as missing.
pub fn parse_return(query: &str) -> Result<PaymentWebhookEvent, ReservationError> {
    let query = query.trim_start_matches('?');
    let mut params = ReturnParams::default();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let Some((field, slot)) = params.slot(&key) else {
            return Err(invalid(
                "query",
                format!("unexpected parameter '{}'", sanitize_string(&key)),
            ));
        };

        if slot.is_some() {
            return Err(invalid(field, "must appear only once"));
        }

        let value = sanitize_string(&value);
        if !value.is_empty() {
            *slot = Some(value);
        }
    }

    let mut missing = Vec::new();
    if params.order_id.is_none() {
        missing.push(ORDER_ID_PARAM);
    }
    if params.amount.is_none() {
        missing.push(AMOUNT_PARAM);
    }

    let (Some(order_id), Some(raw_amount)) = (params.order_id, params.amount) else {
        return Err(ReservationError::MissingCallbackParameters(missing));
    };

    match params.status {
        Some(status) if status == GATEWAY_SUCCESS_STATUS => {
            validate_order_id(&order_id).map_err(ReservationError::InvalidCallbackParameters)?;
            let amount = parse_amount(&raw_amount).map_err(ReservationError::InvalidCallbackParameters)?;

            Ok(PaymentWebhookEvent::new(order_id, amount, status))
        }
        other => {
            let status = other.map(|s| s.chars().take(PROVIDER_STATUS_MAX_LEN).collect());
            Err(ReservationError::PaymentNotSucceeded { status })
        }
    }
}
