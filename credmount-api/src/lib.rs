//! credmount API library
//!
//! Stores database credentials as Kubernetes Secrets and keeps a Deployment
//! mounting each of them. Exposed as a library so the binary and the
//! integration tests build the same router.

pub mod config;
pub mod error;
pub mod health;
pub mod kubernetes;
pub mod logging;
pub mod page;
pub mod routes;
pub mod shutdown;
pub mod state;
pub mod validation;

pub use routes::router;
pub use state::AppState;
