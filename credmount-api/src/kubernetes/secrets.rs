//! Database credential Secrets
//!
//! Each credential is an Opaque Secret named `db-secret-<normalized name>`
//! holding `DB_NAME` and `DB_PASSWORD`.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use tracing::{debug, info};

use super::error::K8sResult;
use super::{ClusterApi, Upserted};

/// Name prefix reserved for credential Secrets
pub const SECRET_PREFIX: &str = "db-secret-";

pub const DB_NAME_KEY: &str = "DB_NAME";
pub const DB_PASSWORD_KEY: &str = "DB_PASSWORD";

const SECRET_TYPE: &str = "Opaque";

/// Lowercases and turns underscores into hyphens, so `My_DB` and `my-db`
/// land on the same Secret.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

pub fn secret_name_for(name: &str) -> String {
    format!("{}{}", SECRET_PREFIX, normalize_name(name))
}

/// `DB_NAME` keeps the name as submitted, not the normalized form
pub fn credential_payload(name: &str, password: &str) -> BTreeMap<String, ByteString> {
    BTreeMap::from([
        (DB_NAME_KEY.to_string(), ByteString(name.as_bytes().to_vec())),
        (
            DB_PASSWORD_KEY.to_string(),
            ByteString(password.as_bytes().to_vec()),
        ),
    ])
}

fn build_secret(secret_name: &str, namespace: &str, data: BTreeMap<String, ByteString>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(secret_name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        type_: Some(SECRET_TYPE.to_string()),
        data: Some(data),
        ..Default::default()
    }
}

/// Create the credential Secret, or replace its payload if it already exists
pub async fn upsert_credential(
    cluster: &dyn ClusterApi,
    name: &str,
    password: &str,
) -> K8sResult<Upserted> {
    let secret_name = secret_name_for(name);
    let data = credential_payload(name, password);

    match cluster.get_secret(&secret_name).await {
        Ok(mut existing) => {
            // Keep the fetched metadata so the replace carries its resourceVersion
            existing.data = Some(data);
            existing.string_data = None;
            cluster.replace_secret(&secret_name, &existing).await?;
            info!(secret = %secret_name, "Updated credential secret");
            Ok(Upserted::updated(secret_name))
        }
        Err(e) if e.is_not_found() => {
            let secret = build_secret(&secret_name, cluster.namespace(), data);
            cluster.create_secret(&secret).await?;
            info!(secret = %secret_name, "Created credential secret");
            Ok(Upserted::created(secret_name))
        }
        Err(e) => Err(e),
    }
}

/// Names of the Secrets starting with `prefix`, in listing order
pub async fn list_credentials(cluster: &dyn ClusterApi, prefix: &str) -> K8sResult<Vec<String>> {
    let names: Vec<String> = cluster
        .list_secrets()
        .await?
        .into_iter()
        .filter_map(|s| s.metadata.name)
        .filter(|name| name.starts_with(prefix))
        .collect();

    debug!(count = names.len(), prefix, "Listed credential secrets");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::memory::{FailPoint, InMemoryCluster};
    use crate::kubernetes::UpsertOutcome;
    use base64::Engine;

    #[test]
    fn test_normalizes_case_and_underscores() {
        assert_eq!(normalize_name("My_DB"), "my-db");
        assert_eq!(normalize_name("my-db"), "my-db");
        assert_eq!(secret_name_for("Orders_DB"), "db-secret-orders-db");
    }

    #[test]
    fn test_payload_is_base64_on_the_wire() {
        let secret = build_secret(
            "db-secret-orders-db",
            "default",
            credential_payload("Orders_DB", "secret123"),
        );
        let json = serde_json::to_value(&secret).unwrap();

        let engine = base64::engine::general_purpose::STANDARD;
        assert_eq!(json["type"], "Opaque");
        assert_eq!(json["data"]["DB_NAME"], engine.encode("Orders_DB"));
        assert_eq!(json["data"]["DB_PASSWORD"], engine.encode("secret123"));
    }

    #[tokio::test]
    async fn test_first_upsert_creates_then_updates() {
        let cluster = InMemoryCluster::new("default");

        let first = upsert_credential(&cluster, "Orders_DB", "secret123").await.unwrap();
        assert_eq!(first.name, "db-secret-orders-db");
        assert_eq!(first.outcome, UpsertOutcome::Created);

        let second = upsert_credential(&cluster, "orders-db", "other").await.unwrap();
        assert_eq!(second.outcome, UpsertOutcome::Updated);
        assert_eq!(cluster.secret_count().await, 1);

        let stored = cluster.secret("db-secret-orders-db").await.unwrap();
        let data = stored.data.unwrap();
        assert_eq!(data[DB_NAME_KEY].0, b"orders-db".to_vec());
        assert_eq!(data[DB_PASSWORD_KEY].0, b"other".to_vec());
    }

    #[tokio::test]
    async fn test_read_failure_propagates_without_writing() {
        let cluster = InMemoryCluster::new("default");
        cluster.fail(FailPoint::GetSecret).await;

        assert!(upsert_credential(&cluster, "x", "y").await.is_err());
        assert_eq!(cluster.secret_writes(), 0);
    }

    #[tokio::test]
    async fn test_lists_only_prefixed_names() {
        let cluster = InMemoryCluster::new("default");
        upsert_credential(&cluster, "alpha", "pw").await.unwrap();
        cluster
            .insert_secret(build_secret("unrelated", "default", BTreeMap::new()))
            .await;
        upsert_credential(&cluster, "beta", "pw").await.unwrap();

        let names = list_credentials(&cluster, SECRET_PREFIX).await.unwrap();
        assert_eq!(names, vec!["db-secret-alpha", "db-secret-beta"]);
    }
}
