//! Kubernetes integration for credmount
//!
//! Everything the service asks of the control plane goes through the
//! [`ClusterApi`] trait:
//! - Secret read/create/replace/list for database credentials
//! - Deployment create/replace/read for the workloads mounting them
//!
//! [`client::KubeCluster`] talks to a real API server through kube-rs.
//! [`memory::InMemoryCluster`] keeps objects in process and is what the test
//! suites run against.
//!
//! The upsert logic built on top of the trait lives in [`secrets`] and
//! [`deployments`].

pub mod client;
pub mod deployments;
pub mod error;
pub mod memory;
pub mod secrets;

use async_trait::async_trait;
use error::K8sResult;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;

/// Raw object operations against one namespace of the control plane
///
/// Implementations report a missing object as [`error::K8sError::NotFound`]
/// and an already-existing or stale object as [`error::K8sError::Conflict`];
/// the managers rely on that to pick their create/update branch.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Namespace every call operates in
    fn namespace(&self) -> &str;

    async fn get_secret(&self, name: &str) -> K8sResult<Secret>;

    async fn create_secret(&self, secret: &Secret) -> K8sResult<Secret>;

    async fn replace_secret(&self, name: &str, secret: &Secret) -> K8sResult<Secret>;

    /// All Secrets in the namespace, in the order the control plane returns them
    async fn list_secrets(&self) -> K8sResult<Vec<Secret>>;

    async fn get_deployment(&self, name: &str) -> K8sResult<Deployment>;

    async fn create_deployment(&self, deployment: &Deployment) -> K8sResult<Deployment>;

    async fn replace_deployment(&self, name: &str, deployment: &Deployment)
        -> K8sResult<Deployment>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> K8sResult<()>;
}

/// Which branch an upsert took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
        }
    }
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the object an upsert touched and the branch it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub name: String,
    pub outcome: UpsertOutcome,
}

impl Upserted {
    pub fn created(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: UpsertOutcome::Created,
        }
    }

    pub fn updated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: UpsertOutcome::Updated,
        }
    }
}
