use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::Error;

/// Identity provider known to the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Google,
    Kakao,
}

impl ProviderId {
    /// Every provider the site knows about, in display order.
    pub const ALL: [ProviderId; 2] = [ProviderId::Google, ProviderId::Kakao];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Kakao => "kakao",
        }
    }

    /// Turned off by site administrators; never offered regardless of credentials.
    #[must_use]
    pub fn is_administratively_disabled(self) -> bool {
        matches!(self, Self::Kakao)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown provider: {s}")))
    }
}

/// Local user identifier (the upstream `sub` claim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Acknowledgment identifier handed back for a submitted report.
///
/// Time-ordered: the ULID's leading bits are the submission timestamp, the
/// trailing bits are random so concurrent submissions never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("RPT-{}", Ulid::new()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_and_display() {
        assert_eq!("google".parse::<ProviderId>().unwrap(), ProviderId::Google);
        assert_eq!("kakao".parse::<ProviderId>().unwrap(), ProviderId::Kakao);
        assert!("Google".parse::<ProviderId>().is_err());
        assert!("github".parse::<ProviderId>().is_err());
        assert_eq!(ProviderId::Google.to_string(), "google");
    }

    #[test]
    fn provider_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderId::Kakao).unwrap();
        assert_eq!(json, "\"kakao\"");
    }

    #[test]
    fn only_kakao_is_administratively_disabled() {
        assert!(ProviderId::Kakao.is_administratively_disabled());
        assert!(!ProviderId::Google.is_administratively_disabled());
    }

    #[test]
    fn report_ids_are_unique_and_prefixed() {
        let a = ReportId::generate();
        let b = ReportId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("RPT-"));
        assert_eq!(a.as_str().len(), 4 + 26);
    }

    #[test]
    fn user_id_from_string() {
        let id = UserId::from("1234567890".to_string());
        assert_eq!(id.to_string(), "1234567890");
    }
}
