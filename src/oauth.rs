use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::Error;
use crate::types::{ProviderId, UserId};

/// `OAuth2` client configuration for one identity provider.
///
/// Credentials may be empty: the provider is still registered and the
/// failure surfaces at the identity server, not locally.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) provider: ProviderId,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) userinfo_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
}

impl OAuthConfig {
    /// Google OpenID Connect endpoints with `openid email profile` scopes.
    #[must_use]
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            provider: ProviderId::Google,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            auth_url: Url::parse("https://accounts.google.com/o/oauth2/v2/auth")
                .expect("valid default URL"),
            token_url: Url::parse("https://oauth2.googleapis.com/token")
                .expect("valid default URL"),
            userinfo_url: Url::parse("https://openidconnect.googleapis.com/v1/userinfo")
                .expect("valid default URL"),
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
        }
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the userinfo endpoint.
    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    /// Replace the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Provider this configuration signs in with.
    #[must_use]
    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    /// `OAuth2` client ID, possibly empty.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Callback URL registered with the provider.
    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Scopes requested at authorization.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Authorization URL plus the PKCE verifier and `state` to remember until the callback.
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub code_verifier: String,
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Upstream account: the credentials a provider issued for this sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub provider: ProviderId,
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: Option<i64>,
}

impl Account {
    /// Convert a token response, turning `expires_in` into an absolute time.
    #[must_use]
    pub fn from_token_response(provider: ProviderId, response: TokenResponse) -> Self {
        let expires_at = response.expires_in.and_then(|secs| {
            let secs = i64::try_from(secs).ok()?;
            Some(time::OffsetDateTime::now_utc().unix_timestamp() + secs)
        });
        Self {
            provider,
            access_token: response.access_token,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at,
        }
    }
}

/// OpenID Connect userinfo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Profile {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl Profile {
    /// Profile with only a subject identifier.
    #[must_use]
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            email: None,
            name: None,
            picture: None,
        }
    }

    /// Set the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the avatar URL.
    #[must_use]
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }
}

/// Local identity for a signed-in person, derived from their profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl From<&Profile> for User {
    fn from(profile: &Profile) -> Self {
        Self {
            id: UserId(profile.sub.clone()),
            name: profile.name.clone(),
            email: profile.email.clone(),
            image: profile.picture.clone(),
        }
    }
}

/// `OAuth2` authorization-code client (PKCE S256) for one provider.
pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Create a client with a default HTTP client.
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the provider's authorization URL with fresh `state` and PKCE values.
    #[must_use]
    pub fn authorization_url(&self) -> AuthorizationRequest {
        let state = random_urlsafe::<16>();
        let code_verifier = random_urlsafe::<48>();
        let code_challenge = code_challenge(&code_verifier);

        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("code_challenge", &code_challenge)
            .append_pair("code_challenge_method", "S256");

        AuthorizationRequest {
            url: url.into(),
            state,
            code_verifier,
        }
    }

    /// Exchange an authorization code for the provider's tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the token endpoint rejects the request.
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Account, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await?;

        let response = ensure_success(response, "token exchange").await?;
        let tokens = response.json::<TokenResponse>().await?;
        Ok(Account::from_token_response(self.config.provider, tokens))
    }

    /// Fetch the signed-in person's profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::OAuth`] if the userinfo endpoint rejects the token.
    pub async fn get_profile(&self, access_token: &str) -> Result<Profile, Error> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = ensure_success(response, "userinfo request").await?;
        response.json::<Profile>().await.map_err(Into::into)
    }
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let detail = response.text().await.unwrap_or_default();
    Err(Error::OAuth {
        operation,
        status: Some(status),
        detail,
    })
}

/// `N` random bytes, base64url without padding.
fn random_urlsafe<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 challenge: `BASE64URL(SHA256(verifier))`.
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OAuthConfig {
        OAuthConfig::google(
            "test-client",
            "test-secret",
            "https://example.com/api/auth/callback/google".parse().unwrap(),
        )
    }

    fn query_value(url: &str, key: &str) -> Option<String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn authorization_url_carries_pkce_and_state() {
        let client = OAuthClient::new(test_config());
        let req = client.authorization_url();

        assert!(req.url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert_eq!(query_value(&req.url, "response_type").as_deref(), Some("code"));
        assert_eq!(query_value(&req.url, "client_id").as_deref(), Some("test-client"));
        assert_eq!(query_value(&req.url, "state"), Some(req.state.clone()));
        assert_eq!(
            query_value(&req.url, "code_challenge"),
            Some(code_challenge(&req.code_verifier))
        );
        assert_eq!(
            query_value(&req.url, "scope").as_deref(),
            Some("openid email profile")
        );
        assert!(query_value(&req.url, "client_secret").is_none());
    }

    #[test]
    fn authorization_requests_are_unique() {
        let client = OAuthClient::new(test_config());
        let a = client.authorization_url();
        let b = client.authorization_url();
        assert_ne!(a.state, b.state);
        assert_ne!(a.code_verifier, b.code_verifier);
    }

    #[test]
    fn verifier_length_is_rfc7636_compliant() {
        let verifier = random_urlsafe::<48>();
        assert_eq!(verifier.len(), 64);
        assert!(
            verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn challenge_is_deterministic() {
        assert_eq!(code_challenge("abc"), code_challenge("abc"));
        assert_ne!(code_challenge("abc"), code_challenge("abd"));
        // RFC 7636 appendix B
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t2URULJNp7mFZk5w"
        );
    }

    #[test]
    fn token_response_becomes_account() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "id_token": "it",
        }))
        .unwrap();
        let account = Account::from_token_response(ProviderId::Google, response);
        assert_eq!(account.access_token, "at");
        assert_eq!(account.id_token.as_deref(), Some("it"));
        assert_eq!(account.refresh_token.as_deref(), Some("rt"));
        assert!(account.expires_at.is_some());
    }

    #[test]
    fn user_is_derived_from_profile() {
        let profile = Profile::new("sub-1")
            .with_email("a@example.com")
            .with_picture("https://example.com/a.png");
        let user = User::from(&profile);
        assert_eq!(user.id, UserId("sub-1".into()));
        assert_eq!(user.email.as_deref(), Some("a@example.com"));
        assert_eq!(user.image.as_deref(), Some("https://example.com/a.png"));
        assert!(user.name.is_none());
    }

    #[test]
    fn config_overrides() {
        let config = test_config()
            .with_auth_url("https://idp.example.com/authorize".parse().unwrap())
            .with_scopes(vec!["openid".into()]);
        let req = OAuthClient::new(config).authorization_url();
        assert!(req.url.starts_with("https://idp.example.com/authorize?"));
        assert_eq!(query_value(&req.url, "scope").as_deref(), Some("openid"));
    }
}
