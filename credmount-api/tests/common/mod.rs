//! Common test utilities and helpers

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use credmount_api::config::AppConfig;
use credmount_api::kubernetes::memory::InMemoryCluster;
use credmount_api::{router, AppState};
use tower::ServiceExt;

/// Router wired to an in-memory cluster the test can inspect
pub struct TestEnv {
    pub cluster: Arc<InMemoryCluster>,
    app: Router,
}

impl TestEnv {
    pub fn new() -> Self {
        let cluster = Arc::new(InMemoryCluster::new("default"));
        let state = Arc::new(AppState::new(cluster.clone(), AppConfig::default()));

        TestEnv {
            cluster,
            app: router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, fields: &[(&str, &str)]) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encode_form(fields)))
            .unwrap();
        self.send(request).await
    }

    /// POST to `/` with an arbitrary body and optional content type
    pub async fn post_raw(&self, content_type: Option<&str>, body: &str) -> (StatusCode, String) {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Shorthand for a submission carrying both fields
    pub async fn submit(&self, name: &str, password: &str) -> (StatusCode, String) {
        self.post_form(&[("db_name", name), ("db_password", password)])
            .await
    }
}

pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Severity class of the message block, if the page shows one
pub fn message_severity(html: &str) -> Option<&str> {
    let start = html.find("data-severity=\"")? + "data-severity=\"".len();
    let end = html[start..].find('"')? + start;
    Some(&html[start..end])
}
