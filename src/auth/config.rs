use std::collections::BTreeMap;
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use super::error::AuthError;
use crate::config::{AppConfig, ProviderCredentials};
use crate::oauth::{OAuthClient, OAuthConfig};
use crate::token::SessionCodec;
use crate::types::ProviderId;

/// Sessions expire this long after sign-in.
pub const SESSION_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Shared auth settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) cookie_key: Key,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    /// Sign-in and error flows both land here.
    pub(crate) auth_page: String,
    pub(crate) home_redirect: String,
    pub(crate) debug: bool,
}

impl AuthSettings {
    fn derived_from(secret: &str) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(b"cookie-key:");
        hasher.update(secret.as_bytes());
        Self {
            cookie_key: Key::from(hasher.finalize().as_slice()),
            secure_cookies: true,
            auth_path: "/api/auth".into(),
            auth_page: "/en/login".into(),
            home_redirect: "/".into(),
            debug: false,
        }
    }

    pub(crate) fn session_cookie_name(&self) -> &'static str {
        if self.secure_cookies {
            "__Secure-session-token"
        } else {
            "session-token"
        }
    }
}

/// Identity configuration: providers, session policy and designated pages.
///
/// The signing secret is the only required value and is a constructor
/// parameter. Use [`from_app_config()`](AuthConfig::from_app_config) for
/// convention-based setup, or [`new()`](AuthConfig::new) with `with_*`
/// methods for full control.
pub struct AuthConfig {
    pub(super) clients: BTreeMap<ProviderId, OAuthClient>,
    pub(super) credentials: BTreeMap<ProviderId, ProviderCredentials>,
    pub(super) codec: SessionCodec,
    pub(super) settings: AuthSettings,
}

impl AuthConfig {
    /// Create config with no sign-in providers registered.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            clients: BTreeMap::new(),
            credentials: BTreeMap::new(),
            codec: SessionCodec::new(secret, SESSION_MAX_AGE),
            settings: AuthSettings::derived_from(secret),
        }
    }

    /// Build from the process configuration.
    ///
    /// Google is always registered, even with empty credentials; Kakao is
    /// listed for availability only.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if no signing secret is configured or the
    /// callback URL cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AuthError> {
        let secret = config.auth_secret.as_deref().ok_or_else(|| {
            AuthError::Config("AUTH_SECRET or NEXTAUTH_SECRET is required".into())
        })?;

        let auth = Self::new(secret)
            .with_credentials(config.providers.clone())
            .with_secure_cookies(config.public_url.scheme() == "https")
            .with_auth_page(config.auth_page.clone())
            .with_debug(config.debug);

        let redirect_uri = config
            .public_url
            .join(&format!("{}/callback/google", auth.settings.auth_path))
            .map_err(|e| AuthError::Config(format!("PUBLIC_URL: {e}")))?;

        let google = config.credentials(ProviderId::Google);
        let client = OAuthClient::new(OAuthConfig::google(
            google.client_id.unwrap_or_default(),
            google.client_secret.unwrap_or_default(),
            redirect_uri,
        ));

        Ok(auth.with_provider(client))
    }

    /// Register a provider for sign-in.
    #[must_use]
    pub fn with_provider(mut self, client: OAuthClient) -> Self {
        self.clients.insert(client.config().provider(), client);
        self
    }

    /// Credentials consulted by the provider availability listing.
    #[must_use]
    pub fn with_credentials(mut self, credentials: BTreeMap<ProviderId, ProviderCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Override the 30-day session lifetime.
    #[must_use]
    pub fn with_session_max_age(mut self, max_age: Duration) -> Self {
        self.codec = self.codec.with_max_age(max_age);
        self
    }

    /// Set the `Secure` flag and `__Secure-` cookie prefix (default: on).
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// Override the mount point (default: `/api/auth`).
    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    /// Override the sign-in and error page (default: `/en/login`).
    #[must_use]
    pub fn with_auth_page(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_page = path.into();
        self
    }

    /// Override where sign-in and sign-out land by default (default: `/`).
    #[must_use]
    pub fn with_home_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.home_redirect = path.into();
        self
    }

    /// Enable detailed sign-in logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.settings.debug = debug;
        self
    }

    /// Path the auth routes are mounted under.
    #[must_use]
    pub fn auth_path(&self) -> &str {
        &self.settings.auth_path
    }

    /// Codec sealing and opening session tokens.
    #[must_use]
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// Session cookie name for the current security setting.
    #[must_use]
    pub fn session_cookie_name(&self) -> &'static str {
        self.settings.session_cookie_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_config(pairs: &[(&str, &str)]) -> AppConfig {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(move |key| {
            pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn missing_secret_is_a_config_error() {
        let result = AuthConfig::from_app_config(&app_config(&[]));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn google_registered_even_with_empty_credentials() {
        let auth = AuthConfig::from_app_config(&app_config(&[("AUTH_SECRET", "s")])).unwrap();
        let google = &auth.clients[&ProviderId::Google];
        assert_eq!(google.config().client_id(), "");
        assert_eq!(
            google.config().redirect_uri().as_str(),
            "http://localhost:3000/api/auth/callback/google"
        );
        assert!(!auth.clients.contains_key(&ProviderId::Kakao));
    }

    #[test]
    fn cookie_security_follows_public_url_scheme() {
        let auth = AuthConfig::from_app_config(&app_config(&[("AUTH_SECRET", "s")])).unwrap();
        assert_eq!(auth.session_cookie_name(), "session-token");

        let auth = AuthConfig::from_app_config(&app_config(&[
            ("AUTH_SECRET", "s"),
            ("PUBLIC_URL", "https://example.org"),
        ]))
        .unwrap();
        assert_eq!(auth.session_cookie_name(), "__Secure-session-token");
    }

    #[test]
    fn session_window_is_thirty_days() {
        let auth = AuthConfig::new("s");
        assert_eq!(auth.codec().max_age(), Duration::from_secs(2_592_000));
    }

    #[test]
    fn pages_come_from_app_config() {
        let auth = AuthConfig::from_app_config(&app_config(&[
            ("AUTH_SECRET", "s"),
            ("AUTH_PAGE", "/ko/login"),
        ]))
        .unwrap();
        assert_eq!(auth.settings.auth_page, "/ko/login");
    }
}
