use serde::{Deserialize, Serialize};

use crate::api::models::UserInfo;

/// Broadcast whenever the signed-in identity changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum AuthEvent {
    SignedIn(UserInfo),
    SignedOut,
    ProfileUpdated(UserInfo),
}

impl AuthEvent {
    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            AuthEvent::SignedIn(user) | AuthEvent::ProfileUpdated(user) => Some(user),
            AuthEvent::SignedOut => None,
        }
    }
}
