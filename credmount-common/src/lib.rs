//! Common types shared between credmount-api and its clients

use serde::{Deserialize, Serialize};

/// Severity tag attached to a status message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message shown at the top of the page after a submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Severity::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Replica counts reported by the control plane for one workload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReadinessSnapshot {
    pub ready_replicas: i32,
    pub total_replicas: i32,
}

impl ReadinessSnapshot {
    pub fn is_ready(&self) -> bool {
        self.total_replicas > 0 && self.ready_replicas >= self.total_replicas
    }
}

/// One row of the status table: a credential and the readiness of its workload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentStatus {
    pub name: String,
    pub ready_replicas: i32,
    pub total_replicas: i32,
}

impl DeploymentStatus {
    pub fn new(name: impl Into<String>, readiness: ReadinessSnapshot) -> Self {
        Self {
            name: name.into(),
            ready_replicas: readiness.ready_replicas,
            total_replicas: readiness.total_replicas,
        }
    }

    pub fn readiness(&self) -> ReadinessSnapshot {
        ReadinessSnapshot {
            ready_replicas: self.ready_replicas,
            total_replicas: self.total_replicas,
        }
    }
}

/// Errors raised while checking user input
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_validation_error_message() {
        let err = Error::Validation("Database name cannot be empty".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: Database name cannot be empty"
        );
    }

    #[test]
    fn test_readiness_requires_all_replicas() {
        let partial = ReadinessSnapshot {
            ready_replicas: 0,
            total_replicas: 1,
        };
        assert!(!partial.is_ready());

        let full = ReadinessSnapshot {
            ready_replicas: 1,
            total_replicas: 1,
        };
        assert!(full.is_ready());
        assert!(!ReadinessSnapshot::default().is_ready());
    }

    #[test]
    fn test_deployment_status_from_snapshot() {
        let row = DeploymentStatus::new(
            "db-secret-orders",
            ReadinessSnapshot {
                ready_replicas: 1,
                total_replicas: 1,
            },
        );
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["name"], "db-secret-orders");
        assert_eq!(json["ready_replicas"], 1);
        assert_eq!(json["total_replicas"], 1);
    }
}
