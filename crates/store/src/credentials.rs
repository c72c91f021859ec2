//! Service-account credentials and OAuth access tokens.
//!
//! Credentials come from a local key file when one exists, otherwise from
//! the [`SERVICE_ACCOUNT_ENV`] environment variable (how hosted deployments
//! expose their secret store). Access tokens are obtained with the OAuth2
//! JWT-bearer grant: an RS256-signed assertion is exchanged at the token
//! endpoint, and the resulting token is cached until shortly before expiry.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::{SheetsConfig, SERVICE_ACCOUNT_ENV, SHEETS_SCOPE};
use crate::error::StoreError;

/// Lifetime requested for each signed assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh the cached token this long before it actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a Google service-account key file that we use.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Where a key was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    File,
    Environment,
}

impl ServiceAccountKey {
    fn parse(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Credentials(e.to_string()))
    }

    /// Look for credentials: the key file first, then `env_value`.
    ///
    /// `env_value` is the content of [`SERVICE_ACCOUNT_ENV`]; it is passed in
    /// rather than read here so callers (and tests) control the lookup.
    pub fn locate(
        path: &Path,
        env_value: Option<String>,
    ) -> Result<(Self, CredentialSource), StoreError> {
        if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                StoreError::Credentials(format!("cannot read {}: {e}", path.display()))
            })?;
            return Ok((Self::parse(&raw)?, CredentialSource::File));
        }

        match env_value.filter(|v| !v.trim().is_empty()) {
            Some(raw) => Ok((Self::parse(&raw)?, CredentialSource::Environment)),
            None => Err(StoreError::MissingCredentials {
                path: path.display().to_string(),
                env_var: SERVICE_ACCOUNT_ENV,
            }),
        }
    }

    /// [`Self::locate`] using the configured file and the real environment.
    pub fn from_config(config: &SheetsConfig) -> Result<(Self, CredentialSource), StoreError> {
        Self::locate(
            &config.credentials_file,
            std::env::var(SERVICE_ACCOUNT_ENV).ok(),
        )
    }
}

/// Claims of the signed assertion sent to the token endpoint.
#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct TokenState {
    key: Option<ServiceAccountKey>,
    token: Option<CachedToken>,
}

/// Build the RS256 assertion for `key`, issued at `now`.
fn sign_assertion(
    key: &ServiceAccountKey,
    audience: &str,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: SHEETS_SCOPE.to_string(),
        aud: audience.to_string(),
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| StoreError::Credentials(format!("bad private key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| StoreError::Credentials(format!("cannot sign assertion: {e}")))
}

/// Hands out bearer tokens for the Sheets API.
///
/// Credentials are located lazily on first use and re-located after a
/// failure, so a key file dropped in while the server runs is picked up on
/// the next request.
pub struct TokenProvider {
    client: reqwest::Client,
    config: SheetsConfig,
    state: Mutex<TokenState>,
}

impl TokenProvider {
    pub fn new(client: reqwest::Client, config: SheetsConfig) -> Self {
        Self {
            client,
            config,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// A token valid for at least [`EXPIRY_MARGIN_SECS`] more seconds.
    pub async fn access_token(&self) -> Result<String, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(token) = &state.token {
            if token.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now {
                return Ok(token.access_token.clone());
            }
        }

        let key = match state.key.clone() {
            Some(key) => key,
            None => {
                let (key, source) = ServiceAccountKey::from_config(&self.config)?;
                tracing::info!(
                    client_email = %key.client_email,
                    ?source,
                    "Loaded service-account credentials"
                );
                state.key = Some(key.clone());
                key
            }
        };

        let token = self.exchange(&key, now).await?;
        let access_token = token.access_token.clone();
        state.token = Some(token);
        Ok(access_token)
    }

    /// Forget the cached token, e.g. after the API answered 401.
    pub async fn invalidate(&self) {
        self.state.lock().await.token = None;
    }

    async fn exchange(
        &self,
        key: &ServiceAccountKey,
        now: DateTime<Utc>,
    ) -> Result<CachedToken, StoreError> {
        let token_url = self.config.token_url.as_deref().unwrap_or(&key.token_uri);
        let assertion = sign_assertion(key, token_url, now)?;

        let response = self
            .client
            .post(token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = token.expires_in, "Obtained access token");
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: token_expiry(now, token.expires_in),
        })
    }
}

/// When a token issued at `now` with the given `expires_in` stops being
/// valid. Non-positive or out-of-range lifetimes fall back to the assertion
/// lifetime.
fn token_expiry(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    Duration::try_seconds(expires_in)
        .filter(|lifetime| *lifetime > Duration::zero())
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or_else(|| now + Duration::seconds(ASSERTION_LIFETIME_SECS))
}
