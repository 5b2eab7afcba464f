//! Strongly-typed identifiers for domain entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }
    };
}

define_id!(ClientId, "clt");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_display_and_parse() {
        let id = ClientId::new();
        let rendered = id.to_string();
        assert!(rendered.starts_with("clt_"));

        let parsed: ClientId = rendered.parse().unwrap();
        assert_eq!(parsed, id);

        let bare: ClientId = id.as_uuid().to_string().parse().unwrap();
        assert_eq!(bare, id);
    }

    #[test]
    fn test_client_id_rejects_garbage() {
        assert!("clt_not-a-uuid".parse::<ClientId>().is_err());
    }
}
