//! In-process stand-in for the control plane
//!
//! Behaves like an API server for the few calls [`ClusterApi`] makes:
//! creates conflict on existing names, replaces require the object to exist
//! and honor `resourceVersion` when one is supplied. Nothing reconciles
//! Deployments, so their status stays empty unless a test sets it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tokio::sync::RwLock;

use super::error::{K8sError, K8sResult};
use super::ClusterApi;

/// Calls that can be made to fail on purpose
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailPoint {
    ListSecrets,
    GetSecret,
    WriteSecret,
    GetDeployment,
    /// Only reads of the Deployment with this name
    GetDeploymentNamed(String),
    WriteDeployment,
    Ping,
}

#[derive(Default)]
struct Objects {
    secrets: BTreeMap<String, Secret>,
    deployments: BTreeMap<String, Deployment>,
    next_version: u64,
    failing: Vec<FailPoint>,
}

impl Objects {
    fn bump(&mut self, meta: &mut ObjectMeta) {
        self.next_version += 1;
        meta.resource_version = Some(self.next_version.to_string());
    }

    fn check(&self, point: FailPoint) -> K8sResult<()> {
        if self.failing.contains(&point) {
            return Err(K8sError::Internal(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

/// [`ClusterApi`] keeping every object in memory
#[derive(Default)]
pub struct InMemoryCluster {
    namespace: String,
    objects: RwLock<Objects>,
    secret_writes: AtomicUsize,
    deployment_writes: AtomicUsize,
}

impl InMemoryCluster {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Make every later call of this kind fail with an internal error
    pub async fn fail(&self, point: FailPoint) {
        self.objects.write().await.failing.push(point);
    }

    pub async fn clear_failures(&self) {
        self.objects.write().await.failing.clear();
    }

    /// Stores a Secret directly, bypassing create/replace accounting
    pub async fn insert_secret(&self, mut secret: Secret) {
        let mut objects = self.objects.write().await;
        let name = secret.metadata.name.clone().unwrap_or_default();
        secret.metadata.namespace = Some(self.namespace.clone());
        objects.bump(&mut secret.metadata);
        objects.secrets.insert(name, secret);
    }

    /// Overwrites the replica counts a Deployment reports
    pub async fn set_deployment_status(&self, name: &str, ready: Option<i32>, total: Option<i32>) {
        let mut objects = self.objects.write().await;
        if let Some(deployment) = objects.deployments.get_mut(name) {
            deployment.status = Some(DeploymentStatus {
                ready_replicas: ready,
                replicas: total,
                ..Default::default()
            });
        }
    }

    pub async fn secret(&self, name: &str) -> Option<Secret> {
        self.objects.read().await.secrets.get(name).cloned()
    }

    pub async fn deployment(&self, name: &str) -> Option<Deployment> {
        self.objects.read().await.deployments.get(name).cloned()
    }

    pub async fn secret_count(&self) -> usize {
        self.objects.read().await.secrets.len()
    }

    pub async fn deployment_count(&self) -> usize {
        self.objects.read().await.deployments.len()
    }

    /// Number of successful Secret creates and replaces
    pub fn secret_writes(&self) -> usize {
        self.secret_writes.load(Ordering::SeqCst)
    }

    /// Number of successful Deployment creates and replaces
    pub fn deployment_writes(&self) -> usize {
        self.deployment_writes.load(Ordering::SeqCst)
    }

    fn name_of(meta: &ObjectMeta) -> K8sResult<String> {
        meta.name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| K8sError::Internal("object has no metadata.name".to_string()))
    }

    fn check_version(current: &ObjectMeta, incoming: &ObjectMeta, name: &str) -> K8sResult<()> {
        match &incoming.resource_version {
            Some(version) if Some(version) != current.resource_version.as_ref() => {
                Err(K8sError::Conflict(format!(
                    "the object {} has been modified; please apply your changes to the latest version",
                    name
                )))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterApi for InMemoryCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_secret(&self, name: &str) -> K8sResult<Secret> {
        let objects = self.objects.read().await;
        objects.check(FailPoint::GetSecret)?;
        objects
            .secrets
            .get(name)
            .cloned()
            .ok_or_else(|| K8sError::not_found("Secret", name, &self.namespace))
    }

    async fn create_secret(&self, secret: &Secret) -> K8sResult<Secret> {
        let mut objects = self.objects.write().await;
        objects.check(FailPoint::WriteSecret)?;

        let name = Self::name_of(&secret.metadata)?;
        if objects.secrets.contains_key(&name) {
            return Err(K8sError::Conflict(format!(
                "secrets \"{}\" already exists",
                name
            )));
        }

        let mut stored = secret.clone();
        stored.metadata.namespace = Some(self.namespace.clone());
        objects.bump(&mut stored.metadata);
        objects.secrets.insert(name, stored.clone());
        self.secret_writes.fetch_add(1, Ordering::SeqCst);

        Ok(stored)
    }

    async fn replace_secret(&self, name: &str, secret: &Secret) -> K8sResult<Secret> {
        let mut objects = self.objects.write().await;
        objects.check(FailPoint::WriteSecret)?;

        let current = objects
            .secrets
            .get(name)
            .ok_or_else(|| K8sError::not_found("Secret", name, &self.namespace))?;
        Self::check_version(&current.metadata, &secret.metadata, name)?;

        let mut stored = secret.clone();
        stored.metadata.namespace = Some(self.namespace.clone());
        objects.bump(&mut stored.metadata);
        objects.secrets.insert(name.to_string(), stored.clone());
        self.secret_writes.fetch_add(1, Ordering::SeqCst);

        Ok(stored)
    }

    async fn list_secrets(&self) -> K8sResult<Vec<Secret>> {
        let objects = self.objects.read().await;
        objects.check(FailPoint::ListSecrets)?;
        Ok(objects.secrets.values().cloned().collect())
    }

    async fn get_deployment(&self, name: &str) -> K8sResult<Deployment> {
        let objects = self.objects.read().await;
        objects.check(FailPoint::GetDeployment)?;
        objects.check(FailPoint::GetDeploymentNamed(name.to_string()))?;
        objects
            .deployments
            .get(name)
            .cloned()
            .ok_or_else(|| K8sError::not_found("Deployment", name, &self.namespace))
    }

    async fn create_deployment(&self, deployment: &Deployment) -> K8sResult<Deployment> {
        let mut objects = self.objects.write().await;
        objects.check(FailPoint::WriteDeployment)?;

        let name = Self::name_of(&deployment.metadata)?;
        if objects.deployments.contains_key(&name) {
            return Err(K8sError::Conflict(format!(
                "deployments.apps \"{}\" already exists",
                name
            )));
        }

        let mut stored = deployment.clone();
        stored.metadata.namespace = Some(self.namespace.clone());
        stored.status = None;
        objects.bump(&mut stored.metadata);
        objects.deployments.insert(name, stored.clone());
        self.deployment_writes.fetch_add(1, Ordering::SeqCst);

        Ok(stored)
    }

    async fn replace_deployment(
        &self,
        name: &str,
        deployment: &Deployment,
    ) -> K8sResult<Deployment> {
        let mut objects = self.objects.write().await;
        objects.check(FailPoint::WriteDeployment)?;

        let current = objects
            .deployments
            .get(name)
            .ok_or_else(|| K8sError::not_found("Deployment", name, &self.namespace))?;
        Self::check_version(&current.metadata, &deployment.metadata, name)?;

        // Status is owned by the controller, a spec replace never touches it
        let status = current.status.clone();
        let mut stored = deployment.clone();
        stored.metadata.namespace = Some(self.namespace.clone());
        stored.status = status;
        objects.bump(&mut stored.metadata);
        objects.deployments.insert(name.to_string(), stored.clone());
        self.deployment_writes.fetch_add(1, Ordering::SeqCst);

        Ok(stored)
    }

    async fn ping(&self) -> K8sResult<()> {
        self.objects.read().await.check(FailPoint::Ping)
    }
}
