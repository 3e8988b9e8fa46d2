//! Kubernetes client wrapper
//!
//! Wraps the kube-rs Client with the credential source it was built from, and
//! implements [`ClusterApi`] on top of it.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams, PostParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use tracing::{info, warn};

use super::error::{K8sError, K8sResult};
use super::ClusterApi;

/// Where the control-plane credentials came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `~/.kube/config` or `$KUBECONFIG`
    Kubeconfig,
    /// Service account token mounted into the pod
    InCluster,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Kubeconfig => write!(f, "local kubeconfig"),
            CredentialSource::InCluster => write!(f, "in-cluster service account"),
        }
    }
}

/// Wrapper around kube-rs Client with connection context
#[derive(Clone)]
pub struct K8sClient {
    inner: Client,
    source: CredentialSource,
    api_server: String,
}

impl K8sClient {
    /// Try the local kubeconfig first, then the in-cluster identity.
    ///
    /// Fails only when neither source yields a client.
    pub async fn connect() -> K8sResult<Self> {
        match Self::from_kubeconfig().await {
            Ok(client) => {
                info!("Loaded local Kubernetes configuration");
                Ok(client)
            }
            Err(local_err) => {
                warn!("Failed to load local Kubernetes config: {}", local_err);
                match Self::from_incluster() {
                    Ok(client) => {
                        info!("Loaded in-cluster Kubernetes configuration");
                        Ok(client)
                    }
                    Err(cluster_err) => {
                        tracing::error!(
                            "Failed to load any Kubernetes configuration: {}",
                            cluster_err
                        );
                        Err(K8sError::InvalidKubeconfig(format!(
                            "Could not configure Kubernetes client (local: {}; in-cluster: {})",
                            local_err, cluster_err
                        )))
                    }
                }
            }
        }
    }

    /// Create client from the default kubeconfig location and current context
    pub async fn from_kubeconfig() -> K8sResult<Self> {
        let config = Config::from_kubeconfig(&KubeConfigOptions::default())
            .await
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to load kubeconfig: {}", e)))?;

        Self::from_config(config, CredentialSource::Kubeconfig)
    }

    /// Create client from in-cluster configuration (for running inside K8s)
    pub fn from_incluster() -> K8sResult<Self> {
        let config = Config::incluster().map_err(|e| {
            K8sError::InvalidKubeconfig(format!("Failed to get in-cluster config: {}", e))
        })?;

        Self::from_config(config, CredentialSource::InCluster)
    }

    fn from_config(config: Config, source: CredentialSource) -> K8sResult<Self> {
        let api_server = config.cluster_url.to_string();

        let client = Client::try_from(config)
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            inner: client,
            source,
            api_server,
        })
    }

    /// Get the inner kube-rs Client
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Get API server URL
    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    /// Get the API server's git version, e.g. `v1.32.1`
    pub async fn get_version(&self) -> K8sResult<String> {
        let version = self.inner.apiserver_version().await?;
        Ok(version.git_version)
    }
}

impl std::fmt::Debug for K8sClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("K8sClient")
            .field("source", &self.source)
            .field("api_server", &self.api_server)
            .finish()
    }
}

/// [`ClusterApi`] backed by a live API server
#[derive(Debug, Clone)]
pub struct KubeCluster {
    client: K8sClient,
    namespace: String,
}

impl KubeCluster {
    pub fn new(client: K8sClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    fn secrets(&self) -> Api<Secret> {
        Api::namespaced(self.client.inner().clone(), &self.namespace)
    }

    fn deployments(&self) -> Api<Deployment> {
        Api::namespaced(self.client.inner().clone(), &self.namespace)
    }

    fn classify(&self, err: kube::Error, kind: &str, name: &str) -> K8sError {
        K8sError::from_kube(err, kind, name, &self.namespace)
    }
}

fn object_name(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> &str {
    meta.name.as_deref().unwrap_or_default()
}

#[async_trait]
impl ClusterApi for KubeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_secret(&self, name: &str) -> K8sResult<Secret> {
        self.secrets()
            .get(name)
            .await
            .map_err(|e| self.classify(e, "Secret", name))
    }

    async fn create_secret(&self, secret: &Secret) -> K8sResult<Secret> {
        self.secrets()
            .create(&PostParams::default(), secret)
            .await
            .map_err(|e| self.classify(e, "Secret", object_name(&secret.metadata)))
    }

    async fn replace_secret(&self, name: &str, secret: &Secret) -> K8sResult<Secret> {
        self.secrets()
            .replace(name, &PostParams::default(), secret)
            .await
            .map_err(|e| self.classify(e, "Secret", name))
    }

    async fn list_secrets(&self) -> K8sResult<Vec<Secret>> {
        let list = self
            .secrets()
            .list(&ListParams::default())
            .await
            .map_err(|e| self.classify(e, "Secret", ""))?;

        Ok(list.items)
    }

    async fn get_deployment(&self, name: &str) -> K8sResult<Deployment> {
        self.deployments()
            .get(name)
            .await
            .map_err(|e| self.classify(e, "Deployment", name))
    }

    async fn create_deployment(&self, deployment: &Deployment) -> K8sResult<Deployment> {
        self.deployments()
            .create(&PostParams::default(), deployment)
            .await
            .map_err(|e| self.classify(e, "Deployment", object_name(&deployment.metadata)))
    }

    async fn replace_deployment(
        &self,
        name: &str,
        deployment: &Deployment,
    ) -> K8sResult<Deployment> {
        self.deployments()
            .replace(name, &PostParams::default(), deployment)
            .await
            .map_err(|e| self.classify(e, "Deployment", name))
    }

    async fn ping(&self) -> K8sResult<()> {
        self.client.get_version().await.map(|_| ())
    }
}
