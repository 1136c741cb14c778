//! Domain types for the reservation pipeline.
//! Framework-agnostic: nothing in here performs I/O.

pub mod booking;
pub mod payment;
pub mod property;
pub mod quote;
pub mod webhook_event;

pub use booking::{Booking, BookingState, NewBooking};
pub use payment::{NewPayment, Payment, PaymentMethod, PaymentStatus};
pub use property::Property;
pub use quote::{compute_quote, nights_between, validate_stay, FeeSchedule, Quote};
pub use webhook_event::{PaymentWebhookEvent, GATEWAY_SUCCESS_STATUS};
