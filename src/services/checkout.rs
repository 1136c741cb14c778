//! Booking orchestration.
//!
//! A checkout is two dependent backend mutations with no transaction
//! spanning them: the booking is created first and is never rolled back;
//! the payment record is best effort. A failed payment registration leaves
//! the booking standing and is reported as a split outcome.
//!
//! The booking id is the order id handed to the payment gateway; it comes
//! back on the gateway redirect and keys the flow's return location.

use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::backend::BackendError;
use crate::domain::{
    compute_quote, validate_stay, Booking, FeeSchedule, NewBooking, NewPayment, Payment,
    PaymentMethod, PaymentStatus, Quote,
};
use crate::error::ReservationError;
use crate::ports::ReservationBackend;
use crate::services::return_slot::ReturnSlots;
use crate::validation::{normalize_notes, validate_return_location};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub property_id: String,
    pub guest_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: u32,
    pub method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
    /// Where to send the guest once the payment flow ends.
    #[serde(default)]
    pub return_to: Option<String>,
}

#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Booking created; payment registered when the method needs one.
    Confirmed {
        booking: Booking,
        payment: Option<Payment>,
    },
    /// Booking created but the payment record could not be registered.
    PaymentNotRegistered {
        booking: Booking,
        reason: ReservationError,
    },
}

impl CheckoutOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            CheckoutOutcome::Confirmed { booking, .. }
            | CheckoutOutcome::PaymentNotRegistered { booking, .. } => booking,
        }
    }

    pub fn payment(&self) -> Option<&Payment> {
        match self {
            CheckoutOutcome::Confirmed { payment, .. } => payment.as_ref(),
            CheckoutOutcome::PaymentNotRegistered { .. } => None,
        }
    }

    /// Order id to send to the gateway. Only a registered payment enters
    /// the gateway flow.
    pub fn order_id(&self) -> Option<&str> {
        self.payment().map(|_| self.booking().id.as_str())
    }

    pub fn status(&self) -> &'static str {
        match self {
            CheckoutOutcome::Confirmed { .. } => "confirmed",
            CheckoutOutcome::PaymentNotRegistered { .. } => "payment_not_registered",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CheckoutOutcome::Confirmed { payment: None, .. } => {
                "Your reservation is confirmed. You will pay at the property.".to_string()
            }
            CheckoutOutcome::Confirmed { payment: Some(_), .. } => {
                "Your reservation is confirmed and your payment has been registered.".to_string()
            }
            CheckoutOutcome::PaymentNotRegistered { reason, .. } => reason.user_message(),
        }
    }
}

pub struct CheckoutService {
    backend: Arc<dyn ReservationBackend>,
    fees: FeeSchedule,
    return_slots: ReturnSlots,
}

impl CheckoutService {
    pub fn new(backend: Arc<dyn ReservationBackend>, fees: FeeSchedule, return_slots: ReturnSlots) -> Self {
        Self {
            backend,
            fees,
            return_slots,
        }
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Prices a stay. Dates and guest count are checked before the property
    /// is fetched, so an invalid range never reaches the backend.
    pub async fn quote_stay(
        &self,
        property_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guest_count: u32,
    ) -> Result<Quote, ReservationError> {
        validate_stay(check_in, check_out, guest_count)?;

        let property = self
            .backend
            .get_property(property_id)
            .await
            .map_err(|e| {
                tracing::warn!(property_id = %property_id, error = %e, "Failed to load property for quote");
                match e {
                    BackendError::NotFound(what) => {
                        ReservationError::PropertyUnavailable(format!("{} not found", what))
                    }
                    other => ReservationError::PropertyUnavailable(other.to_string()),
                }
            })?;

        compute_quote(&property, check_in, check_out, guest_count, &self.fees)
    }

    pub async fn create_booking(
        &self,
        quote: &Quote,
        guest_id: &str,
        notes: Option<&str>,
    ) -> Result<Booking, ReservationError> {
        let new_booking = NewBooking::from_quote(quote, guest_id.to_string(), normalize_notes(notes));

        let booking = self
            .backend
            .create_booking(&new_booking)
            .await
            .map_err(|e| {
                tracing::error!(
                    property_id = %quote.property_id,
                    transport = e.is_transport(),
                    error = %e,
                    "Booking creation failed"
                );
                ReservationError::BookingCreationFailed(e.to_string())
            })?;

        if booking.id.trim().is_empty() {
            return Err(ReservationError::BookingCreationFailed(
                "backend returned a booking without an id".to_string(),
            ));
        }

        tracing::info!(
            booking_id = %booking.id,
            property_id = %booking.property_id,
            total = %booking.total,
            "Booking created"
        );

        Ok(booking)
    }

    /// Registers a pending payment for the full booking total.
    pub async fn create_payment(
        &self,
        booking: &Booking,
        method: PaymentMethod,
    ) -> Result<Payment, ReservationError> {
        let new_payment = NewPayment {
            booking_id: booking.id.clone(),
            amount: booking.total.clone(),
            method,
            status: PaymentStatus::Pending,
        };

        let payment = self
            .backend
            .create_payment(&new_payment)
            .await
            .map_err(|e| ReservationError::PaymentRegistrationFailed(e.to_string()))?;

        tracing::info!(
            booking_id = %booking.id,
            payment_id = %payment.id,
            method = %payment.method,
            "Payment registered"
        );

        Ok(payment)
    }

    /// Full checkout: quote, booking, then payment when the method needs one.
    ///
    /// Only a failure before or during booking creation is returned as `Err`.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, ReservationError> {
        let quote = self
            .quote_stay(
                &request.property_id,
                request.check_in,
                request.check_out,
                request.guest_count,
            )
            .await?;

        let booking = self
            .create_booking(&quote, &request.guest_id, request.notes.as_deref())
            .await?;

        if !request.method.requires_payment_record() {
            return Ok(CheckoutOutcome::Confirmed {
                booking,
                payment: None,
            });
        }

        match self.create_payment(&booking, request.method).await {
            Ok(payment) => {
                if let Some(return_to) = request.return_to {
                    self.remember_return_location(&booking.id, return_to);
                }
                Ok(CheckoutOutcome::Confirmed {
                    booking,
                    payment: Some(payment),
                })
            }
            Err(reason) => {
                tracing::warn!(
                    booking_id = %booking.id,
                    error = %reason,
                    "Booking stands without a payment record"
                );
                Ok(CheckoutOutcome::PaymentNotRegistered { booking, reason })
            }
        }
    }

    fn remember_return_location(&self, order_id: &str, return_to: String) {
        match validate_return_location(&return_to) {
            Ok(()) => self.return_slots.store(order_id, return_to),
            Err(e) => tracing::warn!(order_id = %order_id, error = %e, "Ignoring return location"),
        }
    }
}
