use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::error::Error;
use crate::types::ProviderId;

/// Client credentials for one OAuth provider, exactly as configured.
///
/// Values are kept raw (possibly empty) so the availability check can tell
/// "configured" apart from "registered".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl ProviderCredentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
        }
    }

    /// Both halves present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.client_id) && filled(&self.client_secret)
    }
}

/// Process configuration, read once at startup and passed explicitly into
/// every component that needs it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    /// Externally visible origin, used to build OAuth redirect URIs.
    pub public_url: Url,
    /// Session signing secret, if any was configured.
    pub auth_secret: Option<String>,
    pub providers: BTreeMap<ProviderId, ProviderCredentials>,
    /// Development mode: verbose diagnostics, non-secure cookies on plain HTTP.
    pub debug: bool,
    /// Localized page used for both sign-in and auth errors.
    pub auth_page: String,
    /// Artificial latency applied to report submissions.
    pub report_delay: Duration,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a present value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|e| Error::Config(format!("BIND_ADDRESS: {e}")))?;

        let public_url = lookup("PUBLIC_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .parse()
            .map_err(|e| Error::Config(format!("PUBLIC_URL: {e}")))?;

        // First non-empty wins.
        let auth_secret = ["AUTH_SECRET", "NEXTAUTH_SECRET"]
            .into_iter()
            .filter_map(&lookup)
            .find(|s| !s.is_empty());

        let mut providers = BTreeMap::new();
        for provider in ProviderId::ALL {
            let prefix = provider.as_str().to_ascii_uppercase();
            providers.insert(
                provider,
                ProviderCredentials {
                    client_id: lookup(format!("{prefix}_CLIENT_ID").as_str()),
                    client_secret: lookup(format!("{prefix}_CLIENT_SECRET").as_str()),
                },
            );
        }

        let debug = lookup("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("development"));

        let auth_page = lookup("AUTH_PAGE")
            .filter(|p| p.starts_with('/'))
            .unwrap_or_else(|| "/en/login".to_string());

        let report_delay = match lookup("REPORT_DELAY_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse()
                    .map_err(|e| Error::Config(format!("REPORT_DELAY_MS: {e}")))?,
            ),
            None => Duration::from_millis(1000),
        };

        Ok(Self {
            bind_address,
            public_url,
            auth_secret,
            providers,
            debug,
            auth_page,
            report_delay,
        })
    }

    /// Credentials for `provider`; unconfigured providers get empty credentials.
    #[must_use]
    pub fn credentials(&self, provider: ProviderId) -> ProviderCredentials {
        self.providers.get(&provider).cloned().unwrap_or_default()
    }
}
