use std::time::Duration;

use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::version4::V4;
use pasetors::{Local, local};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::oauth::{Account, Profile, User};
use crate::types::UserId;

/// Claim that carries the serialized [`Token`] inside the PASETO payload.
const TOKEN_CLAIM: &str = "tok";

/// Server-side token carried inside the encrypted session cookie.
///
/// Never handed to the browser in readable form; see
/// [`Session::from_token`](crate::session::Session::from_token) for what is exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl Token {
    /// Merge sign-in inputs into the token.
    ///
    /// - `account`: copies access, ID and refresh tokens. Values the account
    ///   lacks leave the existing ones in place.
    /// - `user`: copies the local identifier.
    /// - `profile`: copies email, name and picture; absent or empty fields
    ///   become unset.
    ///
    /// With every input absent (a plain session read) the token is returned unchanged.
    #[must_use]
    pub fn enrich(
        mut self,
        account: Option<&Account>,
        user: Option<&User>,
        profile: Option<&Profile>,
    ) -> Self {
        if let Some(account) = account {
            self.access_token = Some(account.access_token.clone());
            self.id_token = account.id_token.clone().or(self.id_token);
            self.refresh_token = account.refresh_token.clone().or(self.refresh_token);
        }
        if let Some(user) = user {
            self.id = Some(user.id.clone());
        }
        if let Some(profile) = profile {
            self.email = non_empty(profile.email.as_deref());
            self.name = non_empty(profile.name.as_deref());
            self.picture = non_empty(profile.picture.as_deref());
        }
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Seals and opens session tokens as PASETO v4.local.
///
/// The symmetric key is derived from the configured auth secret; expiry is
/// fixed at issuance and checked on every decode.
#[derive(Clone)]
pub struct SessionCodec {
    key: [u8; 32],
    max_age: Duration,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    #[must_use]
    pub fn new(secret: &str, max_age: Duration) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"session-token:");
        hasher.update(secret.as_bytes());
        Self {
            key: hasher.finalize().into(),
            max_age,
        }
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Encrypt `token` into a compact string valid for `max_age` from now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Token`] if claims cannot be built or encryption fails.
    pub fn encode(&self, token: &Token) -> Result<String, Error> {
        let key = self.symmetric_key()?;

        let mut claims =
            Claims::new_expires_in(&self.max_age).map_err(|e| Error::Token(e.to_string()))?;
        let payload = serde_json::to_value(token).map_err(|e| Error::Token(e.to_string()))?;
        claims
            .add_additional(TOKEN_CLAIM, payload)
            .map_err(|e| Error::Token(e.to_string()))?;

        local::encrypt(&key, &claims, None, None).map_err(|e| Error::Token(e.to_string()))
    }

    /// Decrypt and validate a session string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Token`] if the string is malformed, was sealed with a
    /// different secret, or has expired.
    pub fn decode(&self, sealed: &str) -> Result<Token, Error> {
        if !sealed.starts_with("v4.local.") {
            return Err(Error::Token("invalid token format".into()));
        }
        let key = self.symmetric_key()?;

        // Validates exp, nbf and iat.
        let rules = ClaimsValidationRules::new();

        let untrusted = UntrustedToken::<Local, V4>::try_from(sealed)
            .map_err(|e| Error::Token(e.to_string()))?;
        let trusted = local::decrypt(&key, &untrusted, &rules, None, None)
            .map_err(|e| Error::Token(e.to_string()))?;

        let payload = trusted
            .payload_claims()
            .and_then(|claims| claims.get_claim(TOKEN_CLAIM))
            .cloned()
            .ok_or_else(|| Error::Token("missing claim: tok".into()))?;

        serde_json::from_value(payload).map_err(|e| Error::Token(e.to_string()))
    }

    fn symmetric_key(&self) -> Result<SymmetricKey<V4>, Error> {
        SymmetricKey::<V4>::from(&self.key).map_err(|e| Error::Token(e.to_string()))
    }
}
