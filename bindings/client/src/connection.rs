use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

pub const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";
pub const DEFAULT_GATEWAY_URL: &str = "https://api.integration.openshift.com";

/// Client id used when exchanging an offline token for an access token.
const OFFLINE_TOKEN_CLIENT_ID: &str = "cloud-services";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Refresh the access token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub enum Credentials {
    /// A bearer token that is used as-is and never refreshed.
    AccessToken(String),
    /// An offline token, exchanged for short lived access tokens with the refresh token grant.
    OfflineToken(String),
    /// A service account, exchanged for access tokens with the client credentials grant.
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(..)"),
            Self::OfflineToken(_) => f.write_str("OfflineToken(..)"),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub gateway_url: String,
    pub token_url: String,
    pub credentials: Credentials,
}

/// An authenticated connection to the API under test.
///
/// Cheap to clone, every clone shares the same HTTP client and access token. The connection is
/// never modified by the scenarios that use it, token refreshes happen behind the scenes.
#[derive(Debug, Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

#[derive(Debug)]
struct ConnectionInner {
    http: reqwest::Client,
    base_url: Url,
    token_url: Url,
    credentials: Credentials,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at
            .map_or(true, |expires_at| Instant::now() + TOKEN_EXPIRY_MARGIN < expires_at)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl Connection {
    /// Build a connection without contacting the API or the token endpoint.
    pub fn new(options: ConnectionOptions) -> anyhow::Result<Self> {
        let base_url = Url::parse(&options.gateway_url)
            .with_context(|| format!("Invalid gateway URL: {}", options.gateway_url))?;
        let token_url = Url::parse(&options.token_url)
            .with_context(|| format!("Invalid token URL: {}", options.token_url))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner: Arc::new(ConnectionInner {
                http,
                base_url,
                token_url,
                credentials: options.credentials,
                token: Mutex::new(None),
            }),
        })
    }

    /// Build a connection that sends a fixed bearer token to `gateway_url`.
    pub fn with_access_token(gateway_url: &str, access_token: &str) -> anyhow::Result<Self> {
        Self::new(ConnectionOptions {
            gateway_url: gateway_url.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            credentials: Credentials::AccessToken(access_token.to_string()),
        })
    }

    /// Build a connection and acquire an access token, so that bad credentials are reported
    /// before any load is generated.
    pub async fn connect(options: ConnectionOptions) -> anyhow::Result<Self> {
        let connection = Self::new(options)?;
        connection
            .access_token()
            .await
            .context("Failed to authenticate with the token endpoint")?;

        log::info!("Connected to {}", connection.base_url());

        Ok(connection)
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve a request path, which may include a query string, against the gateway URL.
    pub fn url(&self, path: &str) -> anyhow::Result<Url> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}")).with_context(|| format!("Invalid request path: {path}"))
    }

    /// A valid access token, fetching a new one if the cached token is missing or about to expire.
    pub async fn access_token(&self) -> anyhow::Result<String> {
        let mut cached = self.inner.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);

        Ok(access_token)
    }

    /// Start an authenticated request for `path` on the API under test.
    pub async fn request(&self, method: Method, path: &str) -> anyhow::Result<RequestBuilder> {
        let url = self.url(path)?;
        let token = self.access_token().await?;

        Ok(self.inner.http.request(method, url).bearer_auth(token))
    }

    async fn fetch_token(&self) -> anyhow::Result<CachedToken> {
        let form = match &self.inner.credentials {
            Credentials::AccessToken(access_token) => {
                return Ok(CachedToken {
                    access_token: access_token.clone(),
                    expires_at: None,
                });
            }
            Credentials::OfflineToken(offline_token) => vec![
                ("grant_type", "refresh_token"),
                ("client_id", OFFLINE_TOKEN_CLIENT_ID),
                ("refresh_token", offline_token.as_str()),
            ],
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => vec![
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ],
        };

        log::debug!("Requesting access token from {}", self.inner.token_url);

        let response = self
            .inner
            .http
            .post(self.inner.token_url.clone())
            .form(&form)
            .send()
            .await
            .context("Token request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Token endpoint returned {status}: {body}");
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token endpoint response")?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: token
                .expires_in
                .map(|expires_in| Instant::now() + Duration::from_secs(expires_in)),
        })
    }
}
