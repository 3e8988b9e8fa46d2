//! Input validation and sanitization for the credential form

use std::sync::LazyLock;

use credmount_common::Error;
use regex::Regex;

use crate::kubernetes::deployments::workload_name_for;
use crate::kubernetes::secrets::secret_name_for;

/// Longest value Kubernetes accepts for a label, and so for the `app` label
/// the workload carries its own name in
pub const MAX_LABEL_LENGTH: usize = 63;

static LABEL_VALUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").unwrap());

pub type ValidationResult<T> = Result<T, Error>;

/// Trimmed form input that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialInput {
    pub name: String,
    pub password: String,
}

/// Trims both fields and rejects anything the control plane would refuse
/// to name after.
pub fn validate_credential(name: &str, password: &str) -> ValidationResult<CredentialInput> {
    let name = name.trim();
    let password = password.trim();

    if name.is_empty() {
        return Err(Error::Validation("Database name cannot be empty".to_string()));
    }
    if password.is_empty() {
        return Err(Error::Validation(
            "Database password cannot be empty".to_string(),
        ));
    }

    validate_workload_name(&workload_name_for(&secret_name_for(name)))?;

    Ok(CredentialInput {
        name: name.to_string(),
        password: password.to_string(),
    })
}

pub fn validate_workload_name(name: &str) -> ValidationResult<()> {
    if name.len() > MAX_LABEL_LENGTH {
        return Err(Error::Validation(format!(
            "Database name too long, derived workload name '{}' exceeds {} characters",
            name, MAX_LABEL_LENGTH
        )));
    }

    if !LABEL_VALUE_REGEX.is_match(name) {
        return Err(Error::Validation(format!(
            "Database name can only contain letters, digits, '-', '_' and '.', and must end in a letter or digit (got workload name '{}')",
            name
        )));
    }

    Ok(())
}

/// Escapes text for inclusion in HTML element content or attribute values
pub fn sanitize_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
