//! Liveness and readiness probes
//!
//! The service has a single dependency worth probing: the control plane.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::kubernetes::ClusterApi;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

/// Liveness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub alive: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: i64,
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub reason: Option<String>,
    pub components: Vec<ComponentHealth>,
    pub timestamp: i64,
}

pub struct HealthChecker {
    start_time: Instant,
    version: String,
}

impl HealthChecker {
    pub fn new(version: &str) -> Self {
        Self {
            start_time: Instant::now(),
            version: version.to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Simple liveness check - is the service running?
    pub fn liveness(&self) -> LivenessResponse {
        LivenessResponse {
            alive: true,
            version: self.version.clone(),
            uptime_seconds: self.uptime_seconds(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Round trip to the control plane
    pub async fn check_cluster(&self, cluster: &dyn ClusterApi) -> ComponentHealth {
        let start = Instant::now();

        match cluster.ping().await {
            Ok(()) => ComponentHealth {
                name: "kubernetes".to_string(),
                status: HealthStatus::Healthy,
                message: Some(format!("Namespace {}", cluster.namespace())),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            },
            Err(e) => ComponentHealth {
                name: "kubernetes".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(format!("API server unreachable: {}", e)),
                latency_ms: Some(start.elapsed().as_millis() as u64),
            },
        }
    }

    /// Ready when every component is healthy
    pub fn readiness(&self, components: Vec<ComponentHealth>) -> ReadinessResponse {
        let failing: Vec<&str> = components
            .iter()
            .filter(|c| c.status != HealthStatus::Healthy)
            .map(|c| c.name.as_str())
            .collect();

        let reason = if failing.is_empty() {
            None
        } else {
            Some(format!("{} not ready", failing.join(", ")))
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
            components,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::memory::{FailPoint, InMemoryCluster};

    #[test]
    fn test_liveness() {
        let checker = HealthChecker::new("0.1.0");
        let response = checker.liveness();

        assert!(response.alive);
        assert_eq!(response.version, "0.1.0");
        assert!(response.timestamp > 0);
    }

    #[tokio::test]
    async fn test_readiness_follows_cluster() {
        let checker = HealthChecker::new("0.1.0");
        let cluster = InMemoryCluster::new("default");

        let component = checker.check_cluster(&cluster).await;
        assert!(checker.readiness(vec![component]).ready);

        cluster.fail(FailPoint::Ping).await;
        let component = checker.check_cluster(&cluster).await;
        let response = checker.readiness(vec![component]);
        assert!(!response.ready);
        assert_eq!(response.reason.as_deref(), Some("kubernetes not ready"));
    }
}
