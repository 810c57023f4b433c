use std::time::Duration as StdDuration;

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::{CookieJar, PrivateCookieJar};
use time::Duration;

const PKCE_COOKIE_NAME: &str = "oauth.pkce";
const STATE_COOKIE_NAME: &str = "oauth.state";
const CALLBACK_COOKIE_NAME: &str = "oauth.callback-url";

/// Sign-in round trip must finish within this window.
const FLOW_TTL: Duration = Duration::minutes(15);

/// Short-lived cookies remembered between sign-in and callback.
pub(super) fn flow_cookies(
    code_verifier: &str,
    state: &str,
    callback_url: Option<&str>,
    secure: bool,
    auth_path: &str,
) -> Vec<Cookie<'static>> {
    let build = |name: &'static str, value: &str| {
        Cookie::build((name, value.to_string()))
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .path(auth_path.to_string())
            .max_age(FLOW_TTL)
            .build()
    };

    let mut cookies = vec![
        build(PKCE_COOKIE_NAME, code_verifier),
        build(STATE_COOKIE_NAME, state),
    ];
    if let Some(url) = callback_url {
        cookies.push(build(CALLBACK_COOKIE_NAME, url));
    }
    cookies
}

/// Removal cookies for everything [`flow_cookies`] sets.
pub(super) fn clear_flow_cookies(auth_path: &str) -> Vec<Cookie<'static>> {
    [PKCE_COOKIE_NAME, STATE_COOKIE_NAME, CALLBACK_COOKIE_NAME]
        .into_iter()
        .map(|name| Cookie::build(name).path(auth_path.to_string()).build())
        .collect()
}

pub(super) fn get_pkce_verifier(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(PKCE_COOKIE_NAME).map(|c| c.value().to_string())
}

pub(super) fn get_state(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string())
}

pub(super) fn get_callback_url(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(CALLBACK_COOKIE_NAME).map(|c| c.value().to_string())
}

/// Session cookie holding the sealed token. `max_age` matches the token expiry.
pub(super) fn session_cookie(
    name: &'static str,
    sealed: String,
    max_age: StdDuration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, sealed))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::try_from(max_age).unwrap_or(Duration::MAX))
        .build()
}

pub(super) fn clear_session_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Sealed session token from a request's cookies.
pub(super) fn get_session_token<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(Cookie::value)
}

/// Only same-site relative paths are honored as post-sign-in destinations.
pub(super) fn is_safe_callback_url(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}
