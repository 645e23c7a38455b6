//! Leaderboard Store library - user profiles, badges and ranks
//!
//! Persists each user's display name, score and earned badges in a
//! key-value store and derives a leaderboard rank from a store-side sorted
//! set.
//!
//! # Architecture
//!
//! - **User**: typed accessor over one user's keys
//! - **UserDirectory**: shares one store connection across accessors
//! - **Store**: the [`KeyValueStore`] contract, with in-memory and Redis backends
//! - **Health**: single-route HTTP liveness check
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use leaderboard_store::{KeySpace, MemoryStore, UserDirectory};
//!
//! # async fn example() -> Result<(), leaderboard_store::UserError> {
//! let directory = UserDirectory::new(Arc::new(MemoryStore::new()), KeySpace::default());
//!
//! let user = directory.user("1234")?;
//! user.set_name("George Costanza").await?;
//! user.add_score(10).await?;
//! user.give_badge([4, 8, 9]).await?;
//! let rank = user.get_leaderboard_index().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod directory;
mod error;
mod keys;
mod store;
mod user;

pub mod health;

// Crate-level exports - Configuration
pub use config::{AppConfig, Backend, ConfigError};

// Crate-level exports - Errors
pub use error::{StoreError, UserError, UserErrorKind};

// Crate-level exports - Key naming
pub use keys::{Attribute, KeySpace};

// Crate-level exports - Backing stores
pub use store::{KeyValueStore, MemoryStore};
#[cfg(feature = "redis")]
pub use store::RedisStore;

// Crate-level exports - User records
pub use directory::UserDirectory;
pub use user::{BadgeId, ScoreDelta, User, UserId, UserProfile};
