//! Session credential presented by page clients.

use sha2::{Digest, Sha256};
use std::fmt;

/// Stable, non-reversible label for a credential, used to keep cached
/// responses apart per user.
pub fn credential_scope(credential: &str) -> String {
    let digest = Sha256::digest(credential.as_bytes());
    hex::encode(&digest[..12])
}

/// Opaque session token read from a cookie.
///
/// Only presence matters to the gateway; validity is the backend's call.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a cookie value. Empty values count as no session.
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn scope(&self) -> String {
        credential_scope(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cookie_is_no_session() {
        assert!(SessionToken::from_cookie_value("").is_none());
        let token = SessionToken::from_cookie_value("abc").unwrap();
        assert_eq!(token.expose(), "abc");
    }

    #[test]
    fn test_debug_masks_value() {
        let token = SessionToken::from_cookie_value("secret-value").unwrap();
        assert_eq!(format!("{:?}", token), "SessionToken(***)");
    }

    #[test]
    fn test_scope_is_stable_and_opaque() {
        let ana = SessionToken::from_cookie_value("ana-token").unwrap();
        let bob = SessionToken::from_cookie_value("bob-token").unwrap();

        assert_eq!(ana.scope(), credential_scope("ana-token"));
        assert_eq!(ana.scope().len(), 24);
        assert_ne!(ana.scope(), bob.scope());
        assert!(!ana.scope().contains("ana"));
    }
}
