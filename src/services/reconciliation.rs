//! Reconciliation of gateway redirects with the backend of record.
//!
//! Outcomes per return screen:
//!
//! * `success`: gateway reported success and the backend recorded it.
//! * `success_with_warning`: gateway reported success but the backend call
//!   failed or timed out. The payer still sees a success state.
//! * `error`: the redirect was malformed or not a success. Nothing is sent.
//!
//! Concurrent loads of the same return URL share one backend call. Once the
//! backend has recorded an order, later loads answer `success` without
//! posting again. A failed post is not remembered: the next load posts again
//! under the same idempotency key. Only a bounded number of orders is
//! tracked; forgetting one costs at most a replay the backend deduplicates.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::PaymentWebhookEvent;
use crate::error::ReservationError;
use crate::ports::ReservationBackend;
use crate::services::gateway_return::parse_return;
use crate::services::bounded_map::BoundedMap;
use crate::services::return_slot::ReturnSlots;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_MAX_TRACKED_ORDERS: usize = 4096;

/// Per-order guard; `true` once the backend has recorded the event.
type OrderGuard = Arc<tokio::sync::Mutex<bool>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Success,
    SuccessWithWarning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnAction {
    /// Re-run parse and reconcile on the same query string.
    Retry,
    /// Go back to the flow's stored location without contacting the
    /// backend.
    Abandon,
}

/// What the return screen shows once processing finishes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnScreen {
    pub state: ReconciliationOutcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_after_ms: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ReturnAction>,
}

impl ReturnScreen {
    fn error(err: &ReservationError) -> Self {
        Self {
            state: ReconciliationOutcome::Error,
            message: err.user_message(),
            order_id: None,
            redirect_to: None,
            redirect_after_ms: None,
            actions: vec![ReturnAction::Retry, ReturnAction::Abandon],
        }
    }
}

pub struct ReconciliationReporter {
    backend: Arc<dyn ReservationBackend>,
    provider: String,
    return_slots: ReturnSlots,
    redirect_delay: Duration,
    call_timeout: Duration,
    guards: Mutex<BoundedMap<OrderGuard>>,
}

impl ReconciliationReporter {
    pub fn new(
        backend: Arc<dyn ReservationBackend>,
        provider: impl Into<String>,
        return_slots: ReturnSlots,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            backend,
            provider: provider.into(),
            return_slots,
            redirect_delay,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            guards: Mutex::new(BoundedMap::new(DEFAULT_MAX_TRACKED_ORDERS)),
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_max_tracked_orders(mut self, max_tracked_orders: usize) -> Self {
        self.guards = Mutex::new(BoundedMap::new(max_tracked_orders));
        self
    }

    /// Orders currently held in the dedup table.
    pub fn tracked_orders(&self) -> usize {
        self.guards
            .lock()
            .map(|guards| guards.len())
            .unwrap_or(0)
    }

    fn guard_for(&self, order_id: &str) -> OrderGuard {
        let mut guards = self.guards.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(guard) = guards.get(order_id) {
            return guard.clone();
        }

        let guard = OrderGuard::default();
        guards.insert(order_id.to_string(), guard.clone());
        guard
    }

    fn forget(&self, order_id: &str, guard: &OrderGuard) {
        let mut guards = self.guards.lock().unwrap_or_else(|p| p.into_inner());
        if guards.get(order_id).is_some_and(|current| Arc::ptr_eq(current, guard)) {
            guards.remove(order_id);
        }
    }

    /// Forwards a gateway-confirmed event to the backend. Never yields
    /// `Error`: a failed post is downgraded to `SuccessWithWarning`.
    pub async fn reconcile(&self, event: &PaymentWebhookEvent) -> ReconciliationOutcome {
        let guard = self.guard_for(&event.order_id);
        let mut recorded = guard.lock().await;
        if *recorded {
            return ReconciliationOutcome::Success;
        }

        let outcome = self.post(event).await;
        *recorded = outcome == ReconciliationOutcome::Success;
        drop(recorded);

        if outcome != ReconciliationOutcome::Success {
            self.forget(&event.order_id, &guard);
        }
        outcome
    }

    async fn post(&self, event: &PaymentWebhookEvent) -> ReconciliationOutcome {
        let call = self.backend.confirm_payment_event(&self.provider, event);

        let failure = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(())) => {
                tracing::info!(
                    order_id = %event.order_id,
                    amount = %event.amount,
                    provider = %self.provider,
                    "Payment event reconciled"
                );
                return ReconciliationOutcome::Success;
            }
            Ok(Err(e)) => ReservationError::ReconciliationTransportFailure(e.to_string()),
            Err(_) => ReservationError::ReconciliationTransportFailure(format!(
                "no response within {}s",
                self.call_timeout.as_secs()
            )),
        };

        tracing::warn!(
            order_id = %event.order_id,
            provider = %self.provider,
            error = %failure,
            "Gateway reported success but the backend update failed"
        );
        ReconciliationOutcome::SuccessWithWarning
    }

    /// Runs the whole return screen for one redirect: parse, reconcile,
    /// then either a redirect directive or the retry/abandon choice.
    pub async fn handle_return(&self, query: &str) -> ReturnScreen {
        let event = match parse_return(query) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "Rejected gateway redirect");
                return ReturnScreen::error(&err);
            }
        };

        let outcome = self.reconcile(&event).await;
        let message = match outcome {
            ReconciliationOutcome::Success => "Your payment was confirmed. Thank you!".to_string(),
            _ => ReservationError::ReconciliationTransportFailure(String::new()).user_message(),
        };

        ReturnScreen {
            state: outcome,
            message,
            redirect_to: Some(self.return_slots.take(Some(event.order_id.as_str()))),
            order_id: Some(event.order_id),
            redirect_after_ms: Some(self.redirect_delay.as_millis() as u64),
            actions: Vec::new(),
        }
    }

    /// Leaves an errored return screen for the flow of `order_id`. The
    /// backend is not contacted.
    pub fn abandon(&self, order_id: Option<&str>) -> String {
        self.return_slots.take(order_id)
    }
}
