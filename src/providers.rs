//! Which "sign in with X" buttons the site may offer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ProviderCredentials;
use crate::types::ProviderId;

/// Availability of one provider, as reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub enabled: bool,
}

/// Report availability for every known provider.
///
/// A provider is enabled iff both client id and secret are non-blank and it
/// is not administratively disabled. Missing configuration yields `false`,
/// never an error.
#[must_use]
pub fn availability(
    credentials: &BTreeMap<ProviderId, ProviderCredentials>,
) -> BTreeMap<ProviderId, ProviderStatus> {
    ProviderId::ALL
        .into_iter()
        .map(|provider| {
            let enabled = !provider.is_administratively_disabled()
                && credentials
                    .get(&provider)
                    .is_some_and(ProviderCredentials::is_complete);
            (provider, ProviderStatus { enabled })
        })
        .collect()
}
