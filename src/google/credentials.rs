//! Service account key loading and validation

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PipelineError;

/// Table name holding the key in a TOML secrets file
pub const SECRETS_TABLE: &str = "gcp_service_account";

/// Where the service account key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// JSON key file as downloaded from the cloud console
    KeyFile(PathBuf),
    /// TOML secrets file with a `[gcp_service_account]` table
    SecretsFile(PathBuf),
}

impl CredentialSource {
    pub fn path(&self) -> &Path {
        match self {
            CredentialSource::KeyFile(path) | CredentialSource::SecretsFile(path) => path,
        }
    }
}

/// Every field optional so missing ones can all be reported at once
#[derive(Debug, Default, Deserialize)]
struct RawServiceAccount {
    #[serde(rename = "type")]
    account_type: Option<String>,
    project_id: Option<String>,
    private_key_id: Option<String>,
    private_key: Option<String>,
    client_email: Option<String>,
    client_id: Option<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
    auth_provider_x509_cert_url: Option<String>,
    client_x509_cert_url: Option<String>,
    universe_domain: Option<String>,
}

#[derive(Deserialize)]
struct SecretsFile {
    gcp_service_account: Option<RawServiceAccount>,
}

/// A validated service account key
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub account_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
    pub universe_domain: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Read and validate a key from `source`. No network access happens here.
    pub fn load(source: &CredentialSource) -> Result<Self, PipelineError> {
        let path = source.path();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::configuration(format!(
                "cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;

        match source {
            CredentialSource::KeyFile(_) => Self::from_json_str(&text),
            CredentialSource::SecretsFile(_) => Self::from_secrets_toml(&text),
        }
    }

    /// Parse a JSON key document
    pub fn from_json_str(input: &str) -> Result<Self, PipelineError> {
        let raw: RawServiceAccount = serde_json::from_str(input).map_err(|e| {
            PipelineError::configuration(format!("malformed service account key: {}", e))
        })?;
        Self::validate(raw)
    }

    /// Parse a TOML secrets document holding a `[gcp_service_account]` table
    pub fn from_secrets_toml(input: &str) -> Result<Self, PipelineError> {
        let secrets: SecretsFile = toml::from_str(input).map_err(|e| {
            PipelineError::configuration(format!("malformed secrets file: {}", e))
        })?;
        let raw = secrets.gcp_service_account.ok_or_else(|| {
            PipelineError::configuration(format!(
                "secrets file has no [{}] table",
                SECRETS_TABLE
            ))
        })?;
        Self::validate(raw)
    }

    fn validate(raw: RawServiceAccount) -> Result<Self, PipelineError> {
        let mut missing = Vec::new();
        let mut take = |value: Option<String>, name: &'static str| -> String {
            match value {
                Some(v) if !v.trim().is_empty() => v,
                _ => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let key = Self {
            account_type: take(raw.account_type, "type"),
            project_id: take(raw.project_id, "project_id"),
            private_key_id: take(raw.private_key_id, "private_key_id"),
            private_key: take(raw.private_key, "private_key"),
            client_email: take(raw.client_email, "client_email"),
            client_id: take(raw.client_id, "client_id"),
            auth_uri: take(raw.auth_uri, "auth_uri"),
            token_uri: take(raw.token_uri, "token_uri"),
            auth_provider_x509_cert_url: take(
                raw.auth_provider_x509_cert_url,
                "auth_provider_x509_cert_url",
            ),
            client_x509_cert_url: take(raw.client_x509_cert_url, "client_x509_cert_url"),
            universe_domain: take(raw.universe_domain, "universe_domain"),
        };

        if !missing.is_empty() {
            return Err(PipelineError::configuration(format!(
                "service account key is missing required fields: {}",
                missing.join(", ")
            )));
        }
        if key.account_type != "service_account" {
            return Err(PipelineError::configuration(format!(
                "expected a key of type 'service_account', got '{}'",
                key.account_type
            )));
        }
        url::Url::parse(&key.token_uri).map_err(|e| {
            PipelineError::configuration(format!("token_uri is not a valid URL: {}", e))
        })?;

        Ok(key)
    }
}
