//! Service account session: signed JWT exchanged for a memoized access token

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use ring::signature::RsaKeyPair;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::credentials::ServiceAccountKey;
use super::http::check_status;
use crate::error::RemoteError;

/// Read the roster, create the export and place it in a folder
const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";

const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    kid: &'a str,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Authenticated handle shared by the Sheets and Drive clients.
///
/// The access token is requested on first use and reused for the rest of
/// the process.
pub struct GoogleSession {
    key: ServiceAccountKey,
    http: Client,
    token: OnceCell<AccessToken>,
}

impl GoogleSession {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self::with_client(key, Client::new())
    }

    pub fn with_client(key: ServiceAccountKey, http: Client) -> Self {
        Self {
            key,
            http,
            token: OnceCell::new(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Bearer token, fetched once
    pub fn access_token(&self) -> Result<&str, RemoteError> {
        self.token
            .get_or_try_init(|| self.fetch_access_token())
            .map(|token| token.access_token.as_str())
    }

    fn fetch_access_token(&self) -> Result<AccessToken, RemoteError> {
        let assertion = self.signed_assertion()?;
        debug!(token_uri = %self.key.token_uri, "Requesting access token");

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()?;
        let token: AccessToken = check_status(response)?.json()?;

        info!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Authenticated service account"
        );
        Ok(token)
    }

    /// RS256-signed JWT asserting the service account identity
    fn signed_assertion(&self) -> Result<String, RemoteError> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: SCOPES,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
            kid: &self.key.private_key_id,
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&header).map_err(|e| RemoteError::Credentials(e.to_string()))?,
        );
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims).map_err(|e| RemoteError::Credentials(e.to_string()))?,
        );
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let key_pair = rsa_key_pair(&self.key.private_key)?;
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| RemoteError::Credentials("failed to sign token request".to_string()))?;

        Ok(format!(
            "{}.{}",
            signing_input,
            BASE64_URL_SAFE_NO_PAD.encode(&signature)
        ))
    }
}

fn rsa_key_pair(pem: &str) -> Result<RsaKeyPair, RemoteError> {
    let mut reader = std::io::Cursor::new(pem.as_bytes());
    let item = rustls_pemfile::read_one(&mut reader)
        .map_err(|e| RemoteError::Credentials(format!("invalid PEM private key: {}", e)))?;

    match item {
        Some(rustls_pemfile::Item::Pkcs8Key(der)) => {
            RsaKeyPair::from_pkcs8(der.secret_pkcs8_der()).map_err(|e| {
                RemoteError::Credentials(format!("unusable pkcs8 private key: {}", e))
            })
        }
        Some(rustls_pemfile::Item::Pkcs1Key(der)) => RsaKeyPair::from_der(der.secret_pkcs1_der())
            .map_err(|e| RemoteError::Credentials(format!("unusable pkcs1 private key: {}", e))),
        _ => Err(RemoteError::Credentials(
            "no RSA private key found in private_key".to_string(),
        )),
    }
}
