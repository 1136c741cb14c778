//! Single-slot handoff for "where to go after the payment flow".
//!
//! Each payment flow owns one slot, keyed by the order id that goes out to
//! the gateway and comes back on the redirect. The slot is written once the
//! payment record exists and is read once, then cleared, when the flow ends.
//! Flows never see each other's location.

use std::sync::{Arc, Mutex};

use crate::services::bounded_map::BoundedMap;

const DEFAULT_MAX_PENDING: usize = 10_000;

#[derive(Clone, Debug)]
pub struct ReturnSlots {
    pending: Arc<Mutex<BoundedMap<String>>>,
    default_location: String,
}

impl ReturnSlots {
    pub fn new(default_location: impl Into<String>) -> Self {
        Self::with_capacity(default_location, DEFAULT_MAX_PENDING)
    }

    /// At most `capacity` flows are pending at once; the oldest is dropped
    /// first and falls back to the default location.
    pub fn with_capacity(default_location: impl Into<String>, capacity: usize) -> Self {
        Self {
            pending: Arc::new(Mutex::new(BoundedMap::new(capacity))),
            default_location: default_location.into(),
        }
    }

    /// Fills the slot of one flow. Storing again for the same order replaces
    /// the earlier location.
    pub fn store(&self, order_id: &str, location: impl Into<String>) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(evicted) = pending.insert(order_id.to_string(), location.into()) {
            tracing::debug!(order_id = %evicted, "Dropped oldest pending return location");
        }
    }

    /// Consumes the slot of one flow, falling back to the default when the
    /// flow stored nothing or the order is unknown.
    pub fn take(&self, order_id: Option<&str>) -> String {
        order_id
            .and_then(|id| {
                self.pending
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .remove(id)
            })
            .unwrap_or_else(|| self.default_location.clone())
    }

    pub fn is_pending(&self, order_id: &str) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.get(order_id).is_some())
            .unwrap_or(false)
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }
}
