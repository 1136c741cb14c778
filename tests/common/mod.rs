#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reservation_core::backend::BackendError;
use reservation_core::config::Config;
use reservation_core::domain::{
    Booking, BookingState, NewBooking, NewPayment, Payment, PaymentStatus, PaymentWebhookEvent,
    Property,
};
use reservation_core::ports::ReservationBackend;
use reservation_core::{create_app, AppState};

/// In-memory backend with switchable failures and call counters.
#[derive(Default)]
pub struct StubBackend {
    pub fail_booking: bool,
    pub fail_payment: bool,
    pub fail_confirmation: bool,
    pub property_calls: AtomicUsize,
    pub bookings: Mutex<Vec<NewBooking>>,
    pub payments: Mutex<Vec<NewPayment>>,
    pub confirmations: Mutex<Vec<(String, PaymentWebhookEvent)>>,
}

impl StubBackend {
    pub fn property_calls(&self) -> usize {
        self.property_calls.load(Ordering::SeqCst)
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.lock().unwrap().len()
    }

    pub fn confirmation_count(&self) -> usize {
        self.confirmations.lock().unwrap().len()
    }
}

#[async_trait]
impl ReservationBackend for StubBackend {
    async fn get_property(&self, property_id: &str) -> Result<Property, BackendError> {
        self.property_calls.fetch_add(1, Ordering::SeqCst);
        if property_id == "missing" {
            return Err(BackendError::NotFound(format!("unit {}", property_id)));
        }
        Ok(Property {
            id: property_id.to_string(),
            title: "Depa frente al mar".to_string(),
            address: Some("Av. Costanera 123, Lima".to_string()),
            nightly_rate: BigDecimal::from_str("100.00").unwrap(),
            currency: "PEN".to_string(),
            max_guests: Some(4),
        })
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError> {
        if self.fail_booking {
            return Err(BackendError::Rejected {
                status: 503,
                body: "maintenance".to_string(),
            });
        }
        let mut bookings = self.bookings.lock().unwrap();
        bookings.push(booking.clone());
        Ok(Booking {
            id: format!("bk-{}", bookings.len()),
            property_id: booking.property_id.clone(),
            guest_id: booking.guest_id.clone(),
            check_in: booking.check_in,
            check_out: booking.check_out,
            guest_count: booking.guest_count,
            subtotal: booking.subtotal.clone(),
            cleaning_fee: booking.cleaning_fee.clone(),
            service_fee: booking.service_fee.clone(),
            taxes: booking.taxes.clone(),
            total: booking.total.clone(),
            state: BookingState::Created,
            notes: booking.notes.clone(),
            created_at: None,
        })
    }

    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, BackendError> {
        self.payments.lock().unwrap().push(payment.clone());
        if self.fail_payment {
            return Err(BackendError::Rejected {
                status: 500,
                body: "payments table locked".to_string(),
            });
        }
        Ok(Payment {
            id: "pay-1".to_string(),
            booking_id: payment.booking_id.clone(),
            amount: payment.amount.clone(),
            method: payment.method.clone(),
            status: PaymentStatus::Pending,
            provider_transaction_id: None,
            created_at: None,
            updated_at: None,
        })
    }

    async fn confirm_payment_event(
        &self,
        provider: &str,
        event: &PaymentWebhookEvent,
    ) -> Result<(), BackendError> {
        self.confirmations
            .lock()
            .unwrap()
            .push((provider.to_string(), event.clone()));
        if self.fail_confirmation {
            return Err(BackendError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    let mut config = Config::new("http://backend.invalid");
    config.payment_provider = "izipay".to_string();
    config.return_redirect_delay_ms = 1500;
    config
}

pub fn app_with(backend: Arc<StubBackend>) -> axum::Router {
    create_app(AppState::new(backend, &test_config()))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
