mod bounded_map;
pub mod checkout;
pub mod gateway_return;
pub mod reconciliation;
pub mod return_slot;

pub use checkout::{CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use gateway_return::parse_return;
pub use reconciliation::{ReconciliationOutcome, ReconciliationReporter, ReturnAction, ReturnScreen};
pub use return_slot::ReturnSlots;
