use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares an opaque, string-backed record identifier.
///
/// Identifiers minted locally are UUID v7 strings, so they sort by creation
/// time. Identifiers handed back by a collaborator are kept verbatim.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a new time-ordered identifier (UUID v7).
            pub fn generate() -> Self {
                Self(uuid::Uuid::now_v7().to_string())
            }

            /// Wrap an identifier produced elsewhere.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Short representation (first 8 characters).
            pub fn short_id(&self) -> &str {
                short(&self.0)
            }

            /// Returns `true` if `prefix` is a non-empty prefix of this id.
            pub fn matches_prefix(&self, prefix: &str) -> bool {
                !prefix.is_empty() && self.0.starts_with(prefix)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

record_id!(
    /// Identifier of a [`Debtor`](crate::Debtor).
    DebtorId
);

record_id!(
    /// Identifier of a [`Debt`](crate::Debt).
    DebtId
);

record_id!(
    /// Identifier of a [`Payment`](crate::Payment).
    PaymentId
);

/// Tenant reference attached to debtors when the collaborator is shared
/// between several users.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerRef(String);

impl OwnerRef {
    pub fn new(owner: impl Into<String>) -> Self {
        Self(owner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn short(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = DebtorId::generate();
        let b = DebtorId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_ids_are_uuid_text() {
        let id = PaymentId::generate();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn short_id_takes_eight_chars() {
        let id = DebtId::new("0192f0c4-aaaa-7bbb-8ccc-ddddeeeeffff");
        assert_eq!(id.short_id(), "0192f0c4");
    }

    #[test]
    fn short_id_of_short_value_is_whole_value() {
        let id = DebtId::new("abc");
        assert_eq!(id.short_id(), "abc");
    }

    #[test]
    fn prefix_matching() {
        let id = DebtorId::new("0192f0c4-aaaa");
        assert!(id.matches_prefix("0192"));
        assert!(id.matches_prefix("0192f0c4-aaaa"));
        assert!(!id.matches_prefix("0193"));
        assert!(!id.matches_prefix(""));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DebtorId::new("d-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"d-1\"");
        let parsed: DebtorId = serde_json::from_str("\"d-1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn debug_uses_type_name() {
        let id = PaymentId::new("0123456789");
        assert_eq!(format!("{id:?}"), "PaymentId(01234567)");
        assert_eq!(format!("{id}"), "0123456789");
    }
}
