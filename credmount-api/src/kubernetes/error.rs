//! Kubernetes error types and ApiError mapping
//!
//! Maps kube-rs errors onto the handful of outcomes the service branches on.

use crate::error::ApiError;
use thiserror::Error;

/// Kubernetes-specific errors
#[derive(Debug, Error)]
pub enum K8sError {
    /// Kubernetes resource not found
    #[error("Resource not found: {kind}/{name} in namespace {namespace}")]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    /// Resource already exists or the write lost an optimistic-concurrency race
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error from kube-rs client
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// No usable control-plane credentials
    #[error("Invalid kubeconfig: {0}")]
    InvalidKubeconfig(String),

    /// Internal system error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl K8sError {
    pub fn not_found(kind: &str, name: &str, namespace: &str) -> Self {
        K8sError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    /// Classifies a raw kube-rs error, pulling 404 and 409 responses out into
    /// their own variants.
    pub fn from_kube(err: kube::Error, kind: &str, name: &str, namespace: &str) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => Self::not_found(kind, name, namespace),
            kube::Error::Api(ae) if ae.code == 409 => Self::Conflict(ae.message),
            e => Self::Kube(e),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, K8sError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, K8sError::Conflict(_))
    }
}

impl From<K8sError> for ApiError {
    fn from(err: K8sError) -> Self {
        match err {
            K8sError::NotFound {
                kind,
                name,
                namespace,
            } => ApiError::NotFound(format!(
                "{}/{} not found in namespace {}",
                kind, name, namespace
            )),
            K8sError::Conflict(msg) => ApiError::Conflict(msg),
            K8sError::Kube(e) => ApiError::Internal(format!("Kubernetes error: {}", e)),
            K8sError::InvalidKubeconfig(msg) => ApiError::ServiceUnavailable(msg),
            K8sError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Result type alias for Kubernetes operations
pub type K8sResult<T> = std::result::Result<T, K8sError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{} happened", reason),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_classifies_not_found() {
        let err = K8sError::from_kube(api_error(404, "NotFound"), "Secret", "db-secret-x", "default");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Resource not found: Secret/db-secret-x in namespace default"
        );
    }

    #[test]
    fn test_classifies_conflict() {
        let err = K8sError::from_kube(
            api_error(409, "AlreadyExists"),
            "Deployment",
            "app-db-secret-x",
            "default",
        );
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_other_codes_stay_kube_errors() {
        let err = K8sError::from_kube(api_error(403, "Forbidden"), "Secret", "s", "default");
        assert!(matches!(err, K8sError::Kube(_)));
        assert!(err.to_string().starts_with("Kubernetes API error"));
    }

    #[test]
    fn test_maps_to_api_error() {
        let api: ApiError = K8sError::not_found("Deployment", "app-x", "default").into();
        assert_eq!(api.to_error_response().status, 404);

        let api: ApiError = K8sError::Internal("boom".to_string()).into();
        assert_eq!(api.to_error_response().status, 500);
    }
}
