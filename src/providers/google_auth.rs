//! Google service-account authentication
//!
//! Two-legged OAuth2: sign a JWT with the service account's RSA key, trade
//! it at the token endpoint for a bearer token, reuse that token until it is
//! about to expire.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{
    GOOGLE_SCOPES, GOOGLE_TOKEN_URI, JWT_LIFETIME_SECS, TOKEN_REFRESH_MARGIN_SECS,
};

/// The fields we need from a service-account JSON key file
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"***HIDDEN***")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            AppError::with_source(
                ErrorCode::GoogleAuthCredentials,
                "Credentials file is not a service-account key",
                e,
            )
        })
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                ErrorCode::GoogleAuthCredentials,
                format!("Cannot read credentials file {}", path.display()),
                e,
            )
        })?;
        Self::from_json(&json)
    }
}

/// JWT claims for the token exchange
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    /// Unix seconds
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now + TOKEN_REFRESH_MARGIN_SECS < self.expires_at
    }
}

/// Hands out bearer tokens for Google APIs
pub struct GoogleAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleAuth {
    pub fn new(key: ServiceAccountKey, client: reqwest::Client) -> AppResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            AppError::with_source(
                ErrorCode::GoogleAuthCredentials,
                "Service-account private key is not a valid RSA PEM",
                e,
            )
        })?;

        info!("🔑 Google service account: {}", key.client_email);

        Ok(Self {
            key,
            encoding_key,
            client,
            cached: Mutex::new(None),
        })
    }

    /// Signed RS256 assertion valid from `now`
    fn sign_assertion(&self, now: i64) -> AppResult<String> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: GOOGLE_SCOPES,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + JWT_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Current bearer token, refreshed when close to expiry
    pub async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        debug!("🔄 Requesting a new Google access token");
        let assertion = self.sign_assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::new(
                ErrorCode::GoogleAuthTokenExchange,
                format!("Token endpoint returned {}: {}", status, body),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::new(
                ErrorCode::GoogleAuthTokenExchange,
                format!("Failed to parse token response: {}", e),
            )
        })?;

        let fresh = CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in,
        };
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}
