//! Typed access to one user's persisted record.

use std::sync::Arc;

use derive_getters::Getters;
use derive_more::Display;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::keys::{Attribute, KeySpace};
use crate::store::KeyValueStore;
use crate::UserError;

/// Identifier of an earned badge.
pub type BadgeId = i64;

/// Opaque, non-empty user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validates and wraps a user identifier.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` [`UserError`] if `id` is empty.
    #[track_caller]
    pub fn new(id: impl Into<String>) -> Result<Self, UserError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserError::invalid_argument("User id is required"));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Amount to add to a score, as received from a caller.
///
/// Integers are used as-is. Strings are parsed as base-10 integers, so
/// `"-1"` is accepted and `"?"` is not. [`ScoreDelta::Missing`] stands for an
/// absent argument and is always rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreDelta {
    /// No delta was supplied.
    Missing,
    /// An integer delta.
    Amount(i64),
    /// A delta still in textual form.
    Text(String),
}

impl ScoreDelta {
    /// Resolves the delta to an integer.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` [`UserError`] if the delta is missing or
    /// not an integer.
    #[track_caller]
    pub fn resolve(&self) -> Result<i64, UserError> {
        match self {
            Self::Missing => Err(UserError::invalid_argument("Score delta is required")),
            Self::Amount(delta) => Ok(*delta),
            Self::Text(raw) => raw.trim().parse().map_err(|_| {
                UserError::invalid_argument(format!("Score delta '{}' is not an integer", raw))
            }),
        }
    }
}

impl From<i64> for ScoreDelta {
    fn from(delta: i64) -> Self {
        Self::Amount(delta)
    }
}

impl From<i32> for ScoreDelta {
    fn from(delta: i32) -> Self {
        Self::Amount(i64::from(delta))
    }
}

impl From<&str> for ScoreDelta {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<String> for ScoreDelta {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

impl<T: Into<ScoreDelta>> From<Option<T>> for ScoreDelta {
    fn from(delta: Option<T>) -> Self {
        delta.map_or(Self::Missing, Into::into)
    }
}

/// Point-in-time view of a user record.
///
/// Each field is read with its own round trip, so concurrent writers may
/// leave the fields from slightly different moments.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct UserProfile {
    /// User identifier.
    id: UserId,
    /// Display name, empty if unset.
    name: String,
    /// Score, zero if unset.
    score: i64,
    /// Earned badges.
    badges: Vec<BadgeId>,
    /// Zero-based leaderboard position, `-1` if unranked.
    leaderboard_index: i64,
}

/// Accessor for one user's name, score, badges and leaderboard rank.
///
/// A `User` holds no data of its own: every call is a round trip to the
/// backing store. Records come into existence on first write and reads of
/// a missing record return defaults.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    store: Arc<dyn KeyValueStore>,
    keys: KeySpace,
}

impl User {
    /// Binds an accessor to user `id`. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` [`UserError`] if `id` is empty.
    #[track_caller]
    pub fn new(
        id: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        keys: KeySpace,
    ) -> Result<Self, UserError> {
        let id = UserId::new(id)?;
        debug!(user_id = %id, "Binding user accessor");
        Ok(Self { id, store, keys })
    }

    /// Returns the bound user id.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    fn key(&self, attribute: Attribute) -> String {
        self.keys.attribute(&self.id, attribute)
    }

    /// Returns the display name, or `""` if none is stored.
    #[instrument(skip(self), fields(user_id = %self.id))]
    pub async fn get_name(&self) -> Result<String, UserError> {
        let name = self.store.get(&self.key(Attribute::Name)).await?;
        Ok(name.unwrap_or_default())
    }

    /// Overwrites the display name. Any string is accepted, including `""`.
    #[instrument(skip(self, name), fields(user_id = %self.id))]
    pub async fn set_name(&self, name: impl AsRef<str>) -> Result<(), UserError> {
        self.store
            .set(&self.key(Attribute::Name), name.as_ref())
            .await?;
        debug!("Name updated");
        Ok(())
    }

    /// Returns the score, or `0` if none is stored.
    #[instrument(skip(self), fields(user_id = %self.id))]
    pub async fn get_score(&self) -> Result<i64, UserError> {
        let key = self.key(Attribute::Score);
        match self.store.get(&key).await? {
            None => Ok(0),
            Some(raw) => raw.parse().map_err(|_| {
                warn!(key = %key, value = %raw, "Stored score is not an integer");
                UserError::store_unavailable(format!("Stored score at '{}' is not an integer", key))
            }),
        }
    }

    /// Overwrites the score and its leaderboard entry together.
    #[instrument(skip(self), fields(user_id = %self.id))]
    pub async fn set_score(&self, value: i64) -> Result<(), UserError> {
        self.store
            .set_ranked(
                &self.key(Attribute::Score),
                self.keys.leaderboard(),
                self.id.as_str(),
                value,
            )
            .await?;
        info!(score = value, "Score set");
        Ok(())
    }

    /// Atomically adds `delta` to the score and returns the new score.
    ///
    /// The increment happens inside the store, so concurrent calls never
    /// lose updates. The leaderboard entry moves in the same step.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` [`UserError`] if `delta` is missing or
    /// not an integer; no I/O happens in that case.
    #[instrument(skip(self, delta), fields(user_id = %self.id))]
    pub async fn add_score(&self, delta: impl Into<ScoreDelta>) -> Result<i64, UserError> {
        let delta = delta.into().resolve()?;
        let score = self
            .store
            .incr_ranked(
                &self.key(Attribute::Score),
                self.keys.leaderboard(),
                self.id.as_str(),
                delta,
            )
            .await?;
        info!(delta, score, "Score incremented");
        Ok(score)
    }

    /// Returns every badge the user holds, empty if none.
    #[instrument(skip(self), fields(user_id = %self.id))]
    pub async fn get_badges(&self) -> Result<Vec<BadgeId>, UserError> {
        let badges = self.store.set_members(&self.key(Attribute::Badges)).await?;
        debug!(count = badges.len(), "Badges loaded");
        Ok(badges)
    }

    /// Gives one or more badges. Pass a single badge as `[id]`.
    ///
    /// Badges already held are left alone.
    #[instrument(skip(self, badges), fields(user_id = %self.id))]
    pub async fn give_badge(
        &self,
        badges: impl IntoIterator<Item = BadgeId>,
    ) -> Result<(), UserError> {
        let badges: Vec<BadgeId> = badges.into_iter().collect();
        if badges.is_empty() {
            debug!("No badges to give");
            return Ok(());
        }
        self.store
            .set_add(&self.key(Attribute::Badges), &badges)
            .await?;
        info!(badges = ?badges, "Badges given");
        Ok(())
    }

    /// Takes a badge away. Taking a badge the user lacks does nothing.
    #[instrument(skip(self), fields(user_id = %self.id))]
    pub async fn take_badge(&self, badge: BadgeId) -> Result<(), UserError> {
        self.store
            .set_remove(&self.key(Attribute::Badges), badge)
            .await?;
        info!(badge, "Badge taken");
        Ok(())
    }

    /// Reports whether the user holds `badge`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` [`UserError`] if `badge` is `None`.
    #[instrument(skip(self, badge), fields(user_id = %self.id))]
    pub async fn has_badge(&self, badge: impl Into<Option<BadgeId>>) -> Result<bool, UserError> {
        let badge = badge
            .into()
            .ok_or_else(|| UserError::invalid_argument("Badge id is required"))?;
        let held = self
            .store
            .set_contains(&self.key(Attribute::Badges), badge)
            .await?;
        debug!(badge, held, "Badge membership checked");
        Ok(held)
    }

    /// Returns the zero-based leaderboard position by descending score, or
    /// `-1` if the user has never scored.
    ///
    /// Ties are ordered by the backing store. Redis ranks by a double, so
    /// scores beyond 2^53 in magnitude may tie with neighbours that differ
    /// only in the low bits.
    #[instrument(skip(self), fields(user_id = %self.id))]
    pub async fn get_leaderboard_index(&self) -> Result<i64, UserError> {
        let rank = self
            .store
            .rank_desc(self.keys.leaderboard(), self.id.as_str())
            .await?;
        let index = match rank {
            Some(rank) => i64::try_from(rank).map_err(|_| {
                UserError::store_unavailable(format!("Leaderboard rank {} out of range", rank))
            })?,
            None => -1,
        };
        debug!(index, "Leaderboard index resolved");
        Ok(index)
    }

    /// Reads the whole record into a [`UserProfile`].
    #[instrument(skip(self), fields(user_id = %self.id))]
    pub async fn snapshot(&self) -> Result<UserProfile, UserError> {
        let (name, score, badges, leaderboard_index) = tokio::try_join!(
            self.get_name(),
            self.get_score(),
            self.get_badges(),
            self.get_leaderboard_index(),
        )?;
        Ok(UserProfile::new(
            self.id.clone(),
            name,
            score,
            badges,
            leaderboard_index,
        ))
    }

    /// Removes the name, score, badges and leaderboard entry.
    ///
    /// Deleting a user with no stored record succeeds.
    #[instrument(skip(self), fields(user_id = %self.id))]
    pub async fn delete(&self) -> Result<(), UserError> {
        let keys = [
            self.key(Attribute::Name),
            self.key(Attribute::Score),
            self.key(Attribute::Badges),
        ];
        self.store
            .delete_ranked(&keys, self.keys.leaderboard(), self.id.as_str())
            .await?;
        info!("User record deleted");
        Ok(())
    }
}
