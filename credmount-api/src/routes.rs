//! HTTP routes
//!
//! `/` serves the credential form. A GET renders the current workload
//! status, a POST additionally upserts the submitted credential and its
//! workload. Status is always gathered before the submission is applied.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Form, Json, Router,
};
use credmount_common::{DeploymentStatus, StatusMessage};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::health::ReadinessResponse;
use crate::kubernetes::deployments::{self, get_readiness, upsert_workload, workload_name_for};
use crate::kubernetes::error::K8sResult;
use crate::kubernetes::secrets::{list_credentials, upsert_credential, SECRET_PREFIX};
use crate::kubernetes::ClusterApi;
use crate::page::IndexPage;
use crate::state::AppState;
use crate::validation::{validate_credential, CredentialInput};

/// Body of a form submission; absent fields count as empty
#[derive(Debug, Default, Deserialize)]
pub struct CredentialForm {
    #[serde(default)]
    pub db_name: String,
    #[serde(default)]
    pub db_password: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/api/deployments", get(list_deployments))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let deployments = gather_status(state.cluster.as_ref()).await;
    Html(IndexPage::new(StatusMessage::default(), deployments).render())
}

async fn submit(
    State(state): State<Arc<AppState>>,
    form: Result<Form<CredentialForm>, FormRejection>,
) -> Html<String> {
    let cluster = state.cluster.as_ref();
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!("Unreadable form body, treating fields as empty: {}", rejection);
            CredentialForm::default()
        }
    };

    let deployments = gather_status(cluster).await;
    let message = submit_credential(cluster, &form.db_name, &form.db_password).await;

    Html(IndexPage::new(message, deployments).render())
}

async fn list_deployments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DeploymentStatus>>, ApiError> {
    let mut rows = Vec::new();
    collect_status(state.cluster.as_ref(), &mut rows).await?;
    Ok(Json(rows))
}

async fn liveness_probe(State(state): State<Arc<AppState>>) -> Json<crate::health::LivenessResponse> {
    Json(state.health.liveness())
}

async fn readiness_probe(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let component = state.health.check_cluster(state.cluster.as_ref()).await;
    let response = state.health.readiness(vec![component]);

    let status = if response.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Rows for every credential whose workload exists.
///
/// Failures are logged and end the scan early; rows already gathered are
/// still returned.
pub async fn gather_status(cluster: &dyn ClusterApi) -> Vec<DeploymentStatus> {
    let mut rows = Vec::new();
    if let Err(e) = collect_status(cluster, &mut rows).await {
        error!("Error getting deployments: {}", e);
    }
    rows
}

async fn collect_status(cluster: &dyn ClusterApi, rows: &mut Vec<DeploymentStatus>) -> K8sResult<()> {
    for name in list_credentials(cluster, SECRET_PREFIX).await? {
        if let Some(snapshot) = get_readiness(cluster, &workload_name_for(&name)).await? {
            rows.push(DeploymentStatus::new(name, snapshot));
        }
    }
    Ok(())
}

/// Validate and apply one submission, turning every outcome into a message
pub async fn submit_credential(
    cluster: &dyn ClusterApi,
    name: &str,
    password: &str,
) -> StatusMessage {
    let input = match validate_credential(name, password) {
        Ok(input) => input,
        Err(e) => {
            let message = e.to_string();
            warn!("{}", message);
            return StatusMessage::warning(message);
        }
    };

    match apply_credential(cluster, &input).await {
        Ok(message) => {
            info!("{}", message);
            StatusMessage::success(message)
        }
        Err(e) => {
            error!(error = ?e, "Unexpected exception");
            StatusMessage::error(format!("An unexpected error occurred: {}", e))
        }
    }
}

/// Secret first, then the workload mounting it. A workload failure leaves
/// the Secret as written.
async fn apply_credential(cluster: &dyn ClusterApi, input: &CredentialInput) -> K8sResult<String> {
    let secret = upsert_credential(cluster, &input.name, &input.password).await?;
    let workload = upsert_workload(cluster, &secret.name).await?;

    Ok(format!(
        "Secret '{}' successfully {} and {}",
        secret.name,
        secret.outcome,
        deployments::describe(workload.outcome, &secret.name)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::memory::{FailPoint, InMemoryCluster};
    use credmount_common::Severity;

    #[tokio::test]
    async fn test_submission_creates_then_updates() {
        let cluster = InMemoryCluster::new("default");

        let first = submit_credential(&cluster, "Orders_DB", "secret123").await;
        assert_eq!(first.severity, Severity::Success);
        assert_eq!(
            first.text,
            "Secret 'db-secret-orders-db' successfully created and Deployment created with secret db-secret-orders-db mounted"
        );

        let second = submit_credential(&cluster, "orders-db", "secret456").await;
        assert_eq!(second.severity, Severity::Success);
        assert_eq!(
            second.text,
            "Secret 'db-secret-orders-db' successfully updated and Deployment updated with secret db-secret-orders-db mounted"
        );
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let cluster = InMemoryCluster::new("default");

        let message = submit_credential(&cluster, "db", "  ").await;
        assert_eq!(message.severity, Severity::Warning);
        assert_eq!(message.text, "Validation error: Database password cannot be empty");
        assert_eq!(cluster.secret_writes(), 0);
        assert_eq!(cluster.deployment_writes(), 0);
    }

    #[tokio::test]
    async fn test_gather_skips_credentials_without_workload() {
        let cluster = InMemoryCluster::new("default");
        submit_credential(&cluster, "alpha", "pw").await;
        upsert_credential(&cluster, "beta", "pw").await.unwrap();

        let rows = gather_status(&cluster).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "db-secret-alpha");
    }

    #[tokio::test]
    async fn test_gather_keeps_rows_before_failure() {
        let cluster = InMemoryCluster::new("default");
        submit_credential(&cluster, "alpha", "pw").await;
        submit_credential(&cluster, "beta", "pw").await;
        submit_credential(&cluster, "gamma", "pw").await;
        cluster
            .fail(FailPoint::GetDeploymentNamed("app-db-secret-beta".to_string()))
            .await;

        let rows = gather_status(&cluster).await;
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["db-secret-alpha"]);
    }

    #[tokio::test]
    async fn test_gather_listing_failure_is_empty() {
        let cluster = InMemoryCluster::new("default");
        submit_credential(&cluster, "alpha", "pw").await;
        cluster.fail(FailPoint::ListSecrets).await;

        assert!(gather_status(&cluster).await.is_empty());
    }
}
