//! Application State
//!
//! Shared state for the credmount HTTP server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::health::HealthChecker;
use crate::kubernetes::ClusterApi;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub cluster: Arc<dyn ClusterApi>,
    pub config: Arc<AppConfig>,
    pub health: Arc<HealthChecker>,
}

impl AppState {
    pub fn new(cluster: Arc<dyn ClusterApi>, config: AppConfig) -> Self {
        Self {
            cluster,
            config: Arc::new(config),
            health: Arc::new(HealthChecker::new(env!("CARGO_PKG_VERSION"))),
        }
    }
}
