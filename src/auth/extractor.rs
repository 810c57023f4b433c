use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use super::config::AuthConfig;
use super::cookies;
use crate::session::Session;
use crate::token::SessionCodec;

/// Opens the session cookie of a request.
///
/// Cheap to clone; hand it to any router that needs to know who is signed in.
#[derive(Debug, Clone)]
pub struct SessionReader {
    codec: SessionCodec,
    cookie_name: &'static str,
}

impl SessionReader {
    #[must_use]
    pub fn new(codec: SessionCodec, cookie_name: &'static str) -> Self {
        Self { codec, cookie_name }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.codec().clone(), config.session_cookie_name())
    }

    pub(super) fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub(super) fn cookie_name(&self) -> &'static str {
        self.cookie_name
    }
}

/// Resolve the session carried by `jar`, if any.
///
/// The stored token is run back through enrichment with no sign-in inputs
/// and projected; expired, tampered or foreign tokens read as signed out.
#[must_use]
pub fn resolve_session(reader: &SessionReader, jar: &CookieJar) -> Option<Session> {
    let sealed = cookies::get_session_token(jar, reader.cookie_name)?;
    match reader.codec.decode(sealed) {
        Ok(token) => Session::from_token(&token.enrich(None, None, None)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unreadable session token");
            None
        }
    }
}

/// Current session, if the request carries a valid one.
///
/// Never rejects: anonymous requests extract as `CurrentSession(None)`.
///
/// ```rust,ignore
/// async fn greet(CurrentSession(session): CurrentSession) -> String {
///     match session {
///         Some(s) => format!("Hello, {}", s.user.id),
///         None => "Hello, guest".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionReader: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let reader = SessionReader::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Self(resolve_session(&reader, &jar)))
    }
}
