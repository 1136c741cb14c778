use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::backend::BackendClient;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status != "unhealthy"
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a failure of this dependency makes the whole service unhealthy.
    fn critical(&self) -> bool {
        true
    }

    async fn check(&self) -> DependencyStatus;
}

pub struct BackendChecker {
    client: BackendClient,
}

impl BackendChecker {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DependencyChecker for BackendChecker {
    fn name(&self) -> &str {
        "backend"
    }

    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match self.client.probe().await {
            Ok(()) => DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => DependencyStatus::Unhealthy {
                status: "unhealthy".to_string(),
                error: e.to_string(),
            },
        }
    }
}

pub async fn check_health(
    checkers: &[Arc<dyn DependencyChecker>],
    start_time: Instant,
) -> HealthResponse {
    let timeout_duration = Duration::from_secs(5);

    let results = futures::future::join_all(
        checkers
            .iter()
            .map(|checker| timeout(timeout_duration, checker.check())),
    )
    .await;

    let mut dependencies = HashMap::new();
    let mut has_critical_failure = false;
    let mut has_non_critical_failure = false;

    for (checker, result) in checkers.iter().zip(results) {
        let status = result.unwrap_or_else(|_| DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: "timeout".to_string(),
        });

        if matches!(status, DependencyStatus::Unhealthy { .. }) {
            if checker.critical() {
                has_critical_failure = true;
            } else {
                has_non_critical_failure = true;
            }
        }

        dependencies.insert(checker.name().to_string(), status);
    }

    let status = if has_critical_failure {
        "unhealthy"
    } else if has_non_critical_failure {
        "degraded"
    } else {
        "healthy"
    };

    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}
