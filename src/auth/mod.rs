//! OAuth sign-in and signed-session handling for Axum.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scam_shield::auth::{AllowAll, AuthConfig, auth_routes};
//!
//! let config = AuthConfig::from_app_config(&app_config)?;
//! let app = axum::Router::new().merge(auth_routes(config, AllowAll));
//! ```
//!
//! Routes (under `/api/auth` by default): `providers`, `signin/{provider}`,
//! `callback/{provider}`, `session`, `signout`. All responses are marked
//! uncacheable.

mod config;
mod cookies;
mod error;
mod extractor;
mod no_cache;
mod routes;
mod state;
mod traits;
mod types;

pub use config::{AuthConfig, SESSION_MAX_AGE};
pub use error::AuthError;
pub use extractor::{CurrentSession, SessionReader, resolve_session};
pub use no_cache::{NO_CACHE_DIRECTIVES, add_no_cache_headers, no_store};
pub use routes::auth_routes;
pub use traits::{AllowAll, SignInGate};
pub use types::SignInAttempt;
