use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::AuthSettings;
use super::extractor::SessionReader;
use super::traits::SignInGate;
use crate::config::ProviderCredentials;
use crate::oauth::OAuthClient;
use crate::types::ProviderId;

/// Shared state for auth route handlers.
pub(super) struct AuthState<G> {
    pub(super) clients: Arc<BTreeMap<ProviderId, OAuthClient>>,
    pub(super) credentials: Arc<BTreeMap<ProviderId, ProviderCredentials>>,
    pub(super) gate: Arc<G>,
    pub(super) reader: SessionReader,
    pub(super) settings: AuthSettings,
}

// Manual Clone: avoid derive adding a `G: Clone` bound.
impl<G> Clone for AuthState<G> {
    fn clone(&self) -> Self {
        Self {
            clients: self.clients.clone(),
            credentials: self.credentials.clone(),
            gate: self.gate.clone(),
            reader: self.reader.clone(),
            settings: self.settings.clone(),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl<G: SignInGate> FromRef<AuthState<G>> for Key {
    fn from_ref(state: &AuthState<G>) -> Self {
        state.settings.cookie_key.clone()
    }
}

impl<G: SignInGate> FromRef<AuthState<G>> for SessionReader {
    fn from_ref(state: &AuthState<G>) -> Self {
        state.reader.clone()
    }
}
