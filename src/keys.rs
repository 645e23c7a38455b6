//! Key naming for user records.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tracing::instrument;

use crate::UserId;

/// A per-user attribute stored under its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Attribute {
    /// Display name (string).
    Name,
    /// Score (integer).
    Score,
    /// Earned badge ids (set).
    Badges,
}

/// Naming scheme for every key a user record touches.
///
/// Attribute keys render as `<prefix>:<id>:<attribute>`. The leaderboard is
/// one global ranking key shared by all users.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySpace {
    /// Prefix for per-user keys.
    prefix: String,
    /// Key of the global ranking structure.
    leaderboard: String,
}

impl KeySpace {
    /// Creates a key space with the given prefix and leaderboard key.
    #[instrument(skip(prefix, leaderboard))]
    pub fn new(prefix: impl Into<String>, leaderboard: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            leaderboard: leaderboard.into(),
        }
    }

    /// Renders the key holding `attribute` for user `id`.
    pub fn attribute(&self, id: &UserId, attribute: Attribute) -> String {
        format!("{}:{}:{}", self.prefix, id, attribute)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("user", "leaderboard")
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_default_key_layout() {
        let keys = KeySpace::default();
        let id = UserId::new("1234").unwrap();
        assert_eq!(keys.attribute(&id, Attribute::Name), "user:1234:name");
        assert_eq!(keys.attribute(&id, Attribute::Score), "user:1234:score");
        assert_eq!(keys.attribute(&id, Attribute::Badges), "user:1234:badges");
        assert_eq!(keys.leaderboard(), "leaderboard");
    }

    #[test]
    fn test_custom_prefix_keeps_users_apart() {
        let keys = KeySpace::new("staging:user", "staging:leaderboard");
        let a = UserId::new("a").unwrap();
        let b = UserId::new("b").unwrap();
        let a_keys: Vec<_> = Attribute::iter().map(|attr| keys.attribute(&a, attr)).collect();
        let b_keys: Vec<_> = Attribute::iter().map(|attr| keys.attribute(&b, attr)).collect();
        assert!(a_keys.iter().all(|k| k.starts_with("staging:user:a:")));
        assert!(a_keys.iter().all(|k| !b_keys.contains(k)));
    }
}
