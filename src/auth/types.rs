use crate::oauth::{Account, Profile, User};
use crate::types::ProviderId;

/// Everything known about a sign-in once the provider has answered.
///
/// Passed to [`SignInGate::allow`](super::SignInGate::allow) before any
/// session is issued.
#[derive(Debug, Clone)]
pub struct SignInAttempt {
    pub provider: ProviderId,
    pub user: User,
    pub account: Account,
    pub profile: Profile,
    /// Client `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
}
