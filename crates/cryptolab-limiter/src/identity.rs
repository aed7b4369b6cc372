use std::fmt;

use serde::{Deserialize, Serialize};

/// Who is attempting a decryption. Anonymous users share one local counter
/// per browser profile; signed-in users are counted by uid.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Identity {
    #[default]
    Anonymous,
    User {
        uid: String,
        /// Bearer token presented to the remote counter.
        #[serde(default)]
        token: String,
    },
}

impl Identity {
    pub fn user(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Identity::User {
            uid: uid.into(),
            token: token.into(),
        }
    }

    /// Key of the local record: `attempts_anonymous` or `attempts_<uid>`.
    pub fn storage_key(&self) -> String {
        match self {
            Identity::Anonymous => "attempts_anonymous".to_string(),
            Identity::User { uid, .. } => format!("attempts_{uid}"),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Identity::User { token, .. } if !token.is_empty() => Some(token),
            _ => None,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous => f.write_str("Anonymous"),
            Identity::User { uid, .. } => f
                .debug_struct("User")
                .field("uid", uid)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys() {
        assert_eq!(Identity::Anonymous.storage_key(), "attempts_anonymous");
        assert_eq!(Identity::user("u42", "t").storage_key(), "attempts_u42");
    }

    #[test]
    fn debug_hides_token() {
        let printed = format!("{:?}", Identity::user("u1", "super-secret-token"));
        assert!(printed.contains("u1"));
        assert!(!printed.contains("super-secret-token"));
    }

    #[test]
    fn token_is_none_when_blank() {
        assert_eq!(Identity::user("u1", "").token(), None);
        assert_eq!(Identity::user("u1", "abc").token(), Some("abc"));
        assert_eq!(Identity::Anonymous.token(), None);
    }

    #[test]
    fn deserializes_tagged() {
        let id: Identity = serde_json::from_str(r#"{"kind":"user","uid":"u7","token":"t"}"#).unwrap();
        assert_eq!(id, Identity::user("u7", "t"));
        let anon: Identity = serde_json::from_str(r#"{"kind":"anonymous"}"#).unwrap();
        assert_eq!(anon, Identity::Anonymous);
    }
}
