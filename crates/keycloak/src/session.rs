use keycloak::KeycloakError;
use keycloak::KeycloakTokenSupplier;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Request(Arc<reqwest::Error>),
    #[error("keycloak token endpoint responded with {status}: {text}")]
    HttpFailure { status: u16, text: Arc<str> },
    #[error(transparent)]
    Decode(Arc<serde_json::Error>),
}

impl From<reqwest::Error> for SessionError {
    fn from(value: reqwest::Error) -> Self {
        SessionError::Request(Arc::new(value))
    }
}

async fn error(response: reqwest::Response) -> Result<reqwest::Response, SessionError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await?;
        return Err(SessionError::HttpFailure {
            status: status.as_u16(),
            text: Arc::from(text),
        });
    }

    Ok(response)
}

#[derive(Debug, serde::Deserialize)]
pub struct SessionToken {
    access_token: Arc<str>,
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<Arc<str>>,
    #[serde(skip, default = "Instant::now")]
    acquired_at: Instant,
}

impl SessionToken {
    /// The margin is capped at half the token lifetime, so tokens issued with
    /// a lifetime shorter than the margin are still used for a while.
    fn expires_within(&self, margin: Duration) -> bool {
        let lifetime = Duration::from_secs(self.expires_in);
        self.acquired_at.elapsed() + margin.min(lifetime / 2) >= lifetime
    }
}

struct SessionClientInner {
    url: Arc<str>,
    realm: Arc<str>,
    client_id: Arc<str>,
    client: reqwest::Client,
}

/// Talks to the OpenID Connect token endpoint of the login realm.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<SessionClientInner>,
}

impl SessionClient {
    pub fn new<T>(url: T, realm: T, client_id: T, client: reqwest::Client) -> Self
    where
        T: Into<String>,
    {
        Self {
            inner: Arc::new(SessionClientInner {
                url: Arc::from(url.into()),
                realm: Arc::from(realm.into()),
                client_id: Arc::from(client_id.into()),
                client,
            }),
        }
    }

    async fn token(&self, form: &[(&str, &str)]) -> Result<SessionToken, SessionError> {
        let url = self.inner.url.as_ref();
        let realm = self.inner.realm.as_ref();
        let result = error(
            self.inner
                .client
                .post(format!("{url}/realms/{realm}/protocol/openid-connect/token"))
                .form(form)
                .send()
                .await?,
        )
        .await?
        .json::<serde_json::Value>()
        .await?;
        serde_json::from_value(result).map_err(|err| SessionError::Decode(Arc::new(err)))
    }

    async fn acquire(&self, username: &str, password: &str) -> Result<SessionToken, SessionError> {
        tracing::debug!("acquire admin token for user {username}");
        self.token(&[
            ("grant_type", "password"),
            ("client_id", self.inner.client_id.as_ref()),
            ("username", username),
            ("password", password),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionToken, SessionError> {
        self.token(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.inner.client_id.as_ref()),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

struct SessionInner {
    keycloak: SessionClient,
    username: Arc<str>,
    password: Arc<str>,
    refresh_margin: Duration,
    token: RwLock<SessionToken>,
}

/// Admin session whose access token is refreshed on demand.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub async fn new(
        keycloak: SessionClient,
        username: &str,
        password: &str,
        refresh_margin: Duration,
    ) -> Result<Self, SessionError> {
        let token = keycloak.acquire(username, password).await?;
        Ok(Session {
            inner: Arc::new(SessionInner {
                keycloak,
                username: Arc::from(username),
                password: Arc::from(password),
                refresh_margin,
                token: RwLock::new(token),
            }),
        })
    }

    async fn try_refresh(&self, refresh_token: Option<&str>) -> Result<SessionToken, SessionError> {
        let inner = &self.inner;
        let Some(refresh_token) = refresh_token else {
            return inner.keycloak.acquire(&inner.username, &inner.password).await;
        };
        tracing::debug!("refresh session for user {}", inner.username);
        match inner.keycloak.refresh(refresh_token).await {
            Err(SessionError::HttpFailure { status: 400, .. }) => {
                tracing::warn!("refresh token expired, acquiring new token with credentials");
                inner.keycloak.acquire(&inner.username, &inner.password).await
            }
            result => result,
        }
    }

    pub async fn access_token(&self) -> Result<Arc<str>, SessionError> {
        {
            let token = self.inner.token.read().await;
            if !token.expires_within(self.inner.refresh_margin) {
                return Ok(token.access_token.clone());
            }
        }
        let mut token = self.inner.token.write().await;
        if token.expires_within(self.inner.refresh_margin) {
            let next = self.try_refresh(token.refresh_token.as_deref()).await?;
            *token = next;
        }
        Ok(token.access_token.clone())
    }
}

#[async_trait::async_trait]
impl KeycloakTokenSupplier for Session {
    async fn get(&self, _url: &str) -> Result<String, KeycloakError> {
        self.access_token()
            .await
            .map(|token| token.to_string())
            .map_err(|err| KeycloakError::HttpFailure {
                status: 401,
                body: None,
                text: err.to_string(),
            })
    }
}
