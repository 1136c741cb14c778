use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config as BreakerConfig, Error as FailsafeError, StateMachine};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::domain::{Booking, NewBooking, NewPayment, Payment, PaymentWebhookEvent, Property};
use crate::ports::ReservationBackend;

pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Backend rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Network errors, timeouts, 5xx and an open breaker. A 4xx means the
    /// backend is up and answered.
    pub fn is_transport(&self) -> bool {
        match self {
            BackendError::RequestError(_) | BackendError::CircuitBreakerOpen(_) => true,
            BackendError::Rejected { status, .. } => *status >= 500,
            BackendError::NotFound(_)
            | BackendError::InvalidResponse(_)
            | BackendError::InvalidUrl(_) => false,
        }
    }
}

fn counts_against_breaker(err: &BackendError) -> bool {
    err.is_transport()
}

/// HTTP client for the property-rental backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl BackendClient {
    /// Creates a client with the default timeout and breaker settings.
    pub fn new(base_url: String) -> Result<Self, BackendError> {
        Self::with_circuit_breaker(base_url, DEFAULT_TIMEOUT, 3, 60)
    }

    pub fn with_circuit_breaker(
        base_url: String,
        timeout: Duration,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = BreakerConfig::new().failure_policy(policy).build();

        Ok(BackendClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
            circuit_breaker,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let client = Self::with_circuit_breaker(
            config.backend_base_url.clone(),
            config.backend_timeout(),
            config.breaker_failure_threshold,
            config.breaker_reset_secs,
        )?;
        Ok(client.with_api_token(config.backend_api_token.clone()))
    }

    /// Session token issued by the auth layer, sent as a bearer token.
    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    /// Reachability probe. Any answer below 500 counts as reachable.
    pub async fn probe(&self) -> Result<(), BackendError> {
        if !self.circuit_breaker.is_call_permitted() {
            return Err(BackendError::CircuitBreakerOpen(
                "backend circuit breaker is open".to_string(),
            ));
        }

        let response = self.authorized(self.client.get(&self.base_url)).send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(())
    }

    /// Builds `{base}/units/{id}`. The id is one percent-encoded path
    /// segment, so it can never climb to another endpoint.
    pub fn unit_url(&self, property_id: &str) -> Result<Url, BackendError> {
        if matches!(property_id, "" | "." | "..") {
            return Err(BackendError::NotFound(format!("unit {}", property_id)));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("units")
            .push(property_id);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let result = self
            .circuit_breaker
            .call_with(counts_against_breaker as fn(&BackendError) -> bool, call)
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(FailsafeError::Rejected) => Err(BackendError::CircuitBreakerOpen(
                "backend circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

async fn read_json<T: DeserializeOwned>(
    request: RequestBuilder,
    not_found: String,
) -> Result<T, BackendError> {
    let response = request.send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound(not_found));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl ReservationBackend for BackendClient {
    async fn get_property(&self, property_id: &str) -> Result<Property, BackendError> {
        let url = self.unit_url(property_id)?;
        let request = self.authorized(self.client.get(url));

        self.guarded(read_json(request, format!("unit {}", property_id)))
            .await
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError> {
        let url = format!("{}/bookings", self.base_url);
        let request = self.authorized(self.client.post(&url).json(booking));

        self.guarded(read_json(request, "bookings endpoint".to_string()))
            .await
    }

    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, BackendError> {
        let url = format!("{}/payments", self.base_url);
        let request = self.authorized(self.client.post(&url).json(payment));

        self.guarded(read_json(request, "payments endpoint".to_string()))
            .await
    }

    async fn confirm_payment_event(
        &self,
        provider: &str,
        event: &PaymentWebhookEvent,
    ) -> Result<(), BackendError> {
        let url = format!("{}/webhooks/{}", self.base_url, provider);
        let request = self.authorized(
            self.client
                .post(&url)
                .header(IDEMPOTENCY_HEADER, event.order_id.as_str())
                .json(event),
        );

        self.guarded(async move {
            let response = request.send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            let body = response.text().await.unwrap_or_default();
            Err(BackendError::Rejected {
                status: status.as_u16(),
                body,
            })
        })
        .await
    }
}
