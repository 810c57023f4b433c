use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header::USER_AGENT};
use axum::middleware::from_fn;
use axum::response::Redirect;
use axum::routing::get;
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use serde::Deserialize;

use super::config::AuthConfig;
use super::cookies;
use super::error::AuthError;
use super::extractor::{CurrentSession, SessionReader};
use super::no_cache::no_store;
use super::state::AuthState;
use super::traits::SignInGate;
use super::types::SignInAttempt;
use crate::oauth::User;
use crate::providers::{self, ProviderStatus};
use crate::session::Session;
use crate::token::Token;
use crate::types::ProviderId;

/// Create the authentication router, mounted at the configured auth path.
///
/// Every response it produces, errors and unknown paths included, carries
/// the no-cache header set.
pub fn auth_routes<G: SignInGate>(config: AuthConfig, gate: G) -> Router {
    let auth_path = config.settings.auth_path.clone();
    let reader = SessionReader::from_config(&config);

    let state = AuthState {
        clients: Arc::new(config.clients),
        credentials: Arc::new(config.credentials),
        gate: Arc::new(gate),
        reader,
        settings: config.settings,
    };

    let routes = Router::new()
        .route("/providers", get(list_providers::<G>))
        .route("/signin/{provider}", get(signin::<G>).post(signin::<G>))
        .route("/callback/{provider}", get(callback::<G>).post(callback::<G>))
        .route("/session", get(session).post(session))
        .route("/signout", get(signout::<G>).post(signout::<G>))
        .fallback(not_found)
        .layer(from_fn(no_store))
        .with_state(state);

    Router::new().nest(&auth_path, routes)
}

// ── Providers ──────────────────────────────────────────────────────

async fn list_providers<G: SignInGate>(
    State(state): State<AuthState<G>>,
) -> Json<std::collections::BTreeMap<ProviderId, ProviderStatus>> {
    Json(providers::availability(&state.credentials))
}

// ── Sign-in ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SignInParams {
    #[serde(rename = "callbackUrl")]
    callback_url: Option<String>,
}

impl SignInParams {
    /// Fields from a posted form body take precedence over the query string.
    fn merge_form(mut self, body: &[u8]) -> Self {
        for (key, value) in url::form_urlencoded::parse(body) {
            if key == "callbackUrl" {
                self.callback_url = Some(value.into_owned());
            }
        }
        self
    }
}

/// `GET` or `POST`; a `POST` may carry `callbackUrl` in a form body.
async fn signin<G: SignInGate>(
    State(state): State<AuthState<G>>,
    jar: PrivateCookieJar,
    Path(provider): Path<String>,
    Query(params): Query<SignInParams>,
    body: Bytes,
) -> Result<(PrivateCookieJar, Redirect), Redirect> {
    let page = &state.settings.auth_page;
    let params = params.merge_form(&body);

    let client = provider
        .parse::<ProviderId>()
        .ok()
        .and_then(|id| state.clients.get(&id))
        .ok_or_else(|| {
            tracing::warn!(provider = %provider, "Sign-in requested for unregistered provider");
            login_error(page, "OAuthSignin")
        })?;

    let auth_req = client.authorization_url();
    let callback_url = params
        .callback_url
        .filter(|url| cookies::is_safe_callback_url(url));

    let jar = cookies::flow_cookies(
        &auth_req.code_verifier,
        &auth_req.state,
        callback_url.as_deref(),
        state.settings.secure_cookies,
        &state.settings.auth_path,
    )
    .into_iter()
    .fold(jar, PrivateCookieJar::add);

    Ok((jar, Redirect::to(&auth_req.url)))
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    /// Providers using `response_mode=form_post` send these in the body.
    fn merge_form(mut self, body: &[u8]) -> Self {
        for (key, value) in url::form_urlencoded::parse(body) {
            let slot = match key.as_ref() {
                "code" => &mut self.code,
                "state" => &mut self.state,
                "error" => &mut self.error,
                "error_description" => &mut self.error_description,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        self
    }
}

/// Sealed session token and post-sign-in destination.
struct Completed {
    sealed: String,
    destination: String,
}

/// `GET` or `POST`. Flow cookies are cleared whatever the outcome.
async fn callback<G: SignInGate>(
    State(state): State<AuthState<G>>,
    flow_jar: PrivateCookieJar,
    session_jar: CookieJar,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
    body: Bytes,
) -> (PrivateCookieJar, CookieJar, Redirect) {
    let params = params.merge_form(&body);
    let outcome = complete_sign_in(&state, &flow_jar, &provider, params, &headers).await;

    let flow_jar = cookies::clear_flow_cookies(&state.settings.auth_path)
        .into_iter()
        .fold(flow_jar, PrivateCookieJar::remove);

    match outcome {
        Ok(Completed {
            sealed,
            destination,
        }) => {
            let session_jar = session_jar.add(cookies::session_cookie(
                state.reader.cookie_name(),
                sealed,
                state.reader.codec().max_age(),
                state.settings.secure_cookies,
            ));
            (flow_jar, session_jar, Redirect::to(&destination))
        }
        Err(code) => (
            flow_jar,
            session_jar,
            login_error(&state.settings.auth_page, code),
        ),
    }
}

/// Run the code exchange and gate. Errors are auth page error codes.
async fn complete_sign_in<G: SignInGate>(
    state: &AuthState<G>,
    flow_jar: &PrivateCookieJar,
    provider: &str,
    params: CallbackParams,
    headers: &HeaderMap,
) -> Result<Completed, &'static str> {
    let (provider, client) = provider
        .parse::<ProviderId>()
        .ok()
        .and_then(|id| state.clients.get(&id).map(|client| (id, client)))
        .ok_or("OAuthCallback")?;

    if let Some(error) = &params.error {
        let desc = params.error_description.as_deref().unwrap_or("Unknown error");
        tracing::warn!(%provider, error = %error, description = %desc, "OAuth2 error from provider");
        return Err(if error == "access_denied" {
            "AccessDenied"
        } else {
            "OAuthCallback"
        });
    }

    let code = params.code.ok_or("OAuthCallback")?;
    let received_state = params.state.ok_or("OAuthCallback")?;
    let stored_state = cookies::get_state(flow_jar).ok_or("OAuthCallback")?;

    if received_state != stored_state {
        tracing::warn!(%provider, "OAuth state mismatch");
        return Err("OAuthCallback");
    }

    let code_verifier = cookies::get_pkce_verifier(flow_jar).ok_or("OAuthCallback")?;

    let account = client
        .exchange_code(&code, &code_verifier)
        .await
        .map_err(|e| {
            tracing::error!(%provider, error = %e, "Token exchange failed");
            "OAuthCallback"
        })?;

    let profile = client
        .get_profile(&account.access_token)
        .await
        .map_err(|e| {
            tracing::error!(%provider, error = %e, "Userinfo request failed");
            "OAuthCallback"
        })?;

    let attempt = SignInAttempt {
        provider,
        user: User::from(&profile),
        account,
        profile,
        user_agent: extract_user_agent(headers),
        ip_address: extract_client_ip(headers),
    };

    if !state.gate.allow(&attempt).await {
        tracing::info!(%provider, user_id = %attempt.user.id, "Sign-in refused");
        return Err("AccessDenied");
    }

    let token = Token::default().enrich(
        Some(&attempt.account),
        Some(&attempt.user),
        Some(&attempt.profile),
    );
    if state.settings.debug {
        tracing::debug!(
            %provider,
            user_id = %attempt.user.id,
            has_refresh_token = token.refresh_token.is_some(),
            has_id_token = token.id_token.is_some(),
            user_agent = ?attempt.user_agent,
            ip = ?attempt.ip_address,
            "Token enriched from sign-in"
        );
    }

    let sealed = state.reader.codec().encode(&token).map_err(|e| {
        tracing::error!(error = %e, "Session token sealing failed");
        "Callback"
    })?;

    let destination = cookies::get_callback_url(flow_jar)
        .filter(|url| cookies::is_safe_callback_url(url))
        .unwrap_or_else(|| state.settings.home_redirect.clone());

    tracing::info!(%provider, user_id = %attempt.user.id, "OAuth2 sign-in successful");

    Ok(Completed {
        sealed,
        destination,
    })
}

// ── Session ────────────────────────────────────────────────────────

async fn session(CurrentSession(session): CurrentSession) -> Json<Option<Session>> {
    Json(session)
}

// ── Sign-out ───────────────────────────────────────────────────────

async fn signout<G: SignInGate>(
    State(state): State<AuthState<G>>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(session) = session {
        tracing::info!(user_id = %session.user.id, "Signed out");
    }
    let clear = cookies::clear_session_cookie(state.reader.cookie_name());
    (jar.remove(clear), Redirect::to(&state.settings.home_redirect))
}

async fn not_found() -> AuthError {
    AuthError::NotFound
}

// ── Helpers ────────────────────────────────────────────────────────

fn login_error(auth_page: &str, code: &str) -> Redirect {
    let encoded = urlencoding::encode(code);
    Redirect::to(&format!("{auth_page}?error={encoded}"))
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}
