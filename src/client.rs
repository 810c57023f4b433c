//! Session state for client code.
//!
//! [`SessionClient`] holds the session read from the auth endpoint so that
//! any number of consumers can ask "who is signed in?" without each issuing
//! its own request. Periodic and on-focus refetching are both off by default:
//! sessions last 30 days and change rarely.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::COOKIE;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::Error;
use crate::session::Session;

/// What a consumer currently knows about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Not fetched yet.
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl SessionStatus {
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionClientOptions {
    /// Must match the server's auth mount point.
    pub base_path: String,
    /// Zero disables background refetching.
    pub refetch_interval: Duration,
    pub refetch_on_window_focus: bool,
}

impl Default for SessionClientOptions {
    fn default() -> Self {
        Self {
            base_path: "/api/auth".into(),
            refetch_interval: Duration::ZERO,
            refetch_on_window_focus: false,
        }
    }
}

#[derive(Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    session_url: Url,
    cookie: Option<String>,
    options: SessionClientOptions,
    status: Arc<Mutex<SessionStatus>>,
}

impl SessionClient {
    /// Create a client for the site at `origin` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the session URL cannot be built from
    /// `origin` and the base path.
    pub fn new(origin: &Url) -> Result<Self, Error> {
        Self::with_options(origin, SessionClientOptions::default())
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] if the session URL cannot be built.
    pub fn with_options(origin: &Url, options: SessionClientOptions) -> Result<Self, Error> {
        let session_url = origin
            .join(&format!("{}/session", options.base_path.trim_end_matches('/')))
            .map_err(|e| Error::Config(format!("session URL: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            session_url,
            cookie: None,
            options,
            status: Arc::new(Mutex::new(SessionStatus::Loading)),
        })
    }

    /// Use a custom HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Forward this `Cookie` header value with every session request.
    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Options this client was built with.
    #[must_use]
    pub fn options(&self) -> &SessionClientOptions {
        &self.options
    }

    /// Current session status, fetching it on first use only.
    ///
    /// Concurrent first calls share a single request.
    ///
    /// # Errors
    ///
    /// Returns an error if the first fetch fails; the status stays `Loading`.
    pub async fn status(&self) -> Result<SessionStatus, Error> {
        let mut status = self.status.lock().await;
        if *status == SessionStatus::Loading {
            *status = self.fetch().await?;
        }
        Ok(status.clone())
    }

    /// Cached status without touching the network.
    pub async fn cached(&self) -> SessionStatus {
        self.status.lock().await.clone()
    }

    /// Force a fetch and replace the cached status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the cached status is kept.
    pub async fn refresh(&self) -> Result<SessionStatus, Error> {
        let mut status = self.status.lock().await;
        *status = self.fetch().await?;
        Ok(status.clone())
    }

    /// Hook for the host regaining focus. Refetches only when enabled.
    ///
    /// # Errors
    ///
    /// Propagates [`refresh`](Self::refresh) failures.
    pub async fn on_focus(&self) -> Result<SessionStatus, Error> {
        if self.options.refetch_on_window_focus {
            self.refresh().await
        } else {
            Ok(self.cached().await)
        }
    }

    /// Spawn background refetching, if an interval is configured.
    ///
    /// Returns `None` when `refetch_interval` is zero.
    #[must_use]
    pub fn spawn_refetch(&self) -> Option<JoinHandle<()>> {
        if self.options.refetch_interval.is_zero() {
            return None;
        }
        let client = self.clone();
        let period = self.options.refetch_interval;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = client.refresh().await {
                    tracing::warn!(error = %e, "Background session refetch failed");
                }
            }
        }))
    }

    async fn fetch(&self) -> Result<SessionStatus, Error> {
        let mut request = self.http.get(self.session_url.clone());
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::SessionRequest(response.status().as_u16()));
        }
        let session: Option<Session> = response.json().await?;
        tracing::debug!(authenticated = session.is_some(), "Session fetched");
        Ok(session.map_or(SessionStatus::Unauthenticated, SessionStatus::Authenticated))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::routing::get;

    use super::*;
    use crate::auth::{AllowAll, AuthConfig, auth_routes};
    use crate::token::Token;
    use crate::types::UserId;

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}").parse().unwrap()
    }

    fn auth_config() -> AuthConfig {
        AuthConfig::new("client-test-secret")
            .with_secure_cookies(false)
            .with_credentials(BTreeMap::new())
    }

    #[test]
    fn defaults_disable_refetching() {
        let options = SessionClientOptions::default();
        assert_eq!(options.base_path, "/api/auth");
        assert!(options.refetch_interval.is_zero());
        assert!(!options.refetch_on_window_focus);
    }

    #[tokio::test]
    async fn starts_loading_and_resolves_unauthenticated() {
        let origin = serve(auth_routes(auth_config(), AllowAll)).await;
        let client = SessionClient::new(&origin).unwrap();

        assert_eq!(client.cached().await, SessionStatus::Loading);
        assert_eq!(client.status().await.unwrap(), SessionStatus::Unauthenticated);
        assert_eq!(client.cached().await, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn resolves_authenticated_session_from_cookie() {
        let config = auth_config();
        let sealed = config
            .codec()
            .encode(&Token {
                id: Some(UserId("sub-1".into())),
                access_token: Some("at".into()),
                refresh_token: Some("rt".into()),
                ..Token::default()
            })
            .unwrap();
        let cookie = format!("{}={sealed}", config.session_cookie_name());
        let origin = serve(auth_routes(config, AllowAll)).await;

        let client = SessionClient::new(&origin).unwrap().with_cookie(cookie);
        let status = client.status().await.unwrap();
        let session = status.session().unwrap();
        assert_eq!(session.user.id, UserId("sub-1".into()));
        assert_eq!(session.access_token.as_deref(), Some("at"));
    }

    #[tokio::test]
    async fn consumers_share_one_fetch() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/api/auth/session",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    axum::Json(serde_json::Value::Null)
                }
            }),
        );
        let origin = serve(router).await;
        let client = SessionClient::new(&origin).unwrap();

        let (a, b) = tokio::join!(client.status(), client.status());
        assert_eq!(a.unwrap(), SessionStatus::Unauthenticated);
        assert_eq!(b.unwrap(), SessionStatus::Unauthenticated);
        client.clone().status().await.unwrap();
        client.on_focus().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        client.refresh().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(client.spawn_refetch().is_none());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_loading() {
        let origin = serve(Router::new()).await;
        let client = SessionClient::new(&origin).unwrap();
        assert!(matches!(
            client.status().await,
            Err(Error::SessionRequest(404))
        ));
        assert_eq!(client.cached().await, SessionStatus::Loading);
    }
}
