pub mod backend;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::health::DependencyChecker;
use crate::ports::ReservationBackend;
use crate::services::{CheckoutService, ReconciliationReporter, ReturnSlots};

#[derive(Clone)]
pub struct AppState {
    pub checkout: Arc<CheckoutService>,
    pub reconciliation: Arc<ReconciliationReporter>,
    pub health_checkers: Arc<Vec<Arc<dyn DependencyChecker>>>,
    pub started_at: Instant,
}

impl AppState {
    /// Wires both services to one backend. Checkout fills the per-order
    /// return slots and the return screen drains them.
    pub fn new(backend: Arc<dyn ReservationBackend>, config: &Config) -> Self {
        let return_slots = ReturnSlots::new(config.default_return_location.clone());

        let checkout = CheckoutService::new(backend.clone(), config.fees.clone(), return_slots.clone());
        let reconciliation = ReconciliationReporter::new(
            backend,
            config.payment_provider.clone(),
            return_slots,
            config.return_redirect_delay(),
        )
        .with_call_timeout(config.backend_timeout());

        Self {
            checkout: Arc::new(checkout),
            reconciliation: Arc::new(reconciliation),
            health_checkers: Arc::new(Vec::new()),
            started_at: Instant::now(),
        }
    }

    pub fn with_health_checker(mut self, checker: Arc<dyn DependencyChecker>) -> Self {
        let mut checkers = self.health_checkers.as_ref().clone();
        checkers.push(checker);
        self.health_checkers = Arc::new(checkers);
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/units/:id/quote", get(handlers::quote::get_quote))
        .route("/checkout", post(handlers::checkout::create_checkout))
        .route("/payments/return", get(handlers::payment_return::payment_return))
        .route(
            "/payments/return/abandon",
            post(handlers::payment_return::abandon_return),
        )
        .layer(axum::middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
