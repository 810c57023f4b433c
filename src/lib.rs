#![doc = include_str!("../README.md")]

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod providers;
pub mod report;
pub mod session;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use config::{AppConfig, ProviderCredentials};
pub use error::Error;
pub use oauth::{Account, OAuthClient, OAuthConfig, Profile, User};
pub use providers::{ProviderStatus, availability};
pub use session::{Session, SessionUser};
pub use token::{SessionCodec, Token};
pub use types::{ProviderId, ReportId, UserId};
