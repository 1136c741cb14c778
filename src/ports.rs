//! Seams between the reservation services and the backend of record.

use async_trait::async_trait;

use crate::backend::BackendError;
use crate::domain::{Booking, NewBooking, NewPayment, Payment, PaymentWebhookEvent, Property};

/// Operations the pipeline consumes from the backend. Bookings and payments
/// are owned there; this side only creates and reads them.
#[async_trait]
pub trait ReservationBackend: Send + Sync {
    async fn get_property(&self, property_id: &str) -> Result<Property, BackendError>;

    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError>;

    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, BackendError>;

    /// Must be idempotent on `event.order_id`.
    async fn confirm_payment_event(
        &self,
        provider: &str,
        event: &PaymentWebhookEvent,
    ) -> Result<(), BackendError>;
}
