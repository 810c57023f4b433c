use serde::{Deserialize, Serialize};

use crate::token::Token;
use crate::types::UserId;

/// Externally visible session, returned by `GET /api/auth/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Session {
    /// Project a token onto the client-visible shape.
    ///
    /// ID and refresh tokens never leave the server. A token without an
    /// identifier has no session.
    #[must_use]
    pub fn from_token(token: &Token) -> Option<Self> {
        let id = token.id.clone()?;
        Some(Self {
            user: SessionUser {
                id,
                name: token.name.clone(),
                email: token.email.clone(),
                image: token.picture.clone(),
            },
            access_token: token.access_token.clone(),
        })
    }
}
