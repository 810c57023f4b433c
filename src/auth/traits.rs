use std::future::Future;

use super::types::SignInAttempt;

/// Decides whether a completed OAuth sign-in may receive a session.
///
/// Consent or terms checks live outside the auth layer, so the stock
/// implementation is [`AllowAll`].
///
/// # Example
///
/// ```rust,ignore
/// struct VerifiedEmailOnly;
///
/// impl SignInGate for VerifiedEmailOnly {
///     async fn allow(&self, attempt: &SignInAttempt) -> bool {
///         attempt.profile.email.is_some()
///     }
/// }
/// ```
pub trait SignInGate: Send + Sync + 'static {
    fn allow(&self, attempt: &SignInAttempt) -> impl Future<Output = bool> + Send;
}

/// Accepts every sign-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SignInGate for AllowAll {
    async fn allow(&self, _attempt: &SignInAttempt) -> bool {
        true
    }
}
