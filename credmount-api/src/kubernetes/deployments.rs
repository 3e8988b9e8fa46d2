//! Workload Deployments mounting a credential Secret
//!
//! One Deployment per credential, named `app-<secret name>`, running a single
//! replica with the Secret mounted read-only.

use std::collections::BTreeMap;

use credmount_common::ReadinessSnapshot;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, PodSpec, PodTemplateSpec, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use tracing::{debug, info};

use super::error::K8sResult;
use super::{ClusterApi, UpsertOutcome, Upserted};

/// Image every workload runs
pub const WORKLOAD_IMAGE: &str = "nginx:latest";

pub const WORKLOAD_PREFIX: &str = "app-";
pub const CONTAINER_NAME: &str = "application";
pub const SECRET_VOLUME: &str = "secret-volume";
pub const SECRET_MOUNT_PATH: &str = "/mnt/secrets";

pub fn workload_name_for(secret_name: &str) -> String {
    format!("{}{}", WORKLOAD_PREFIX, secret_name)
}

/// Desired state of the workload for `secret_name`
pub fn build_deployment(secret_name: &str, namespace: &str) -> Deployment {
    let name = workload_name_for(secret_name);
    let labels = BTreeMap::from([("app".to_string(), name.clone())]);

    Deployment {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: CONTAINER_NAME.to_string(),
                        image: Some(WORKLOAD_IMAGE.to_string()),
                        volume_mounts: Some(vec![VolumeMount {
                            name: SECRET_VOLUME.to_string(),
                            mount_path: SECRET_MOUNT_PATH.to_string(),
                            read_only: Some(true),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: SECRET_VOLUME.to_string(),
                        secret: Some(SecretVolumeSource {
                            secret_name: Some(secret_name.to_string()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create the workload for `secret_name`, replacing it wholesale if it exists
pub async fn upsert_workload(cluster: &dyn ClusterApi, secret_name: &str) -> K8sResult<Upserted> {
    let mut deployment = build_deployment(secret_name, cluster.namespace());
    let name = workload_name_for(secret_name);

    match cluster.create_deployment(&deployment).await {
        Ok(_) => {
            info!(deployment = %name, secret = %secret_name, "Created workload");
            Ok(Upserted::created(name))
        }
        Err(e) if e.is_conflict() => {
            let live = cluster.get_deployment(&name).await?;
            deployment.metadata.resource_version = live.metadata.resource_version;
            cluster.replace_deployment(&name, &deployment).await?;
            info!(deployment = %name, secret = %secret_name, "Replaced workload");
            Ok(Upserted::updated(name))
        }
        Err(e) => Err(e),
    }
}

/// User-facing summary of a workload upsert
pub fn describe(outcome: UpsertOutcome, secret_name: &str) -> String {
    format!("Deployment {} with secret {} mounted", outcome, secret_name)
}

/// Replica counts of a workload, or `None` if it does not exist yet
pub async fn get_readiness(
    cluster: &dyn ClusterApi,
    workload_name: &str,
) -> K8sResult<Option<ReadinessSnapshot>> {
    match cluster.get_deployment(workload_name).await {
        Ok(deployment) => {
            let status = deployment.status.unwrap_or_default();
            Ok(Some(ReadinessSnapshot {
                ready_replicas: status.ready_replicas.unwrap_or(0),
                total_replicas: status.replicas.unwrap_or(0),
            }))
        }
        Err(e) if e.is_not_found() => {
            debug!(deployment = %workload_name, "No workload yet");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
