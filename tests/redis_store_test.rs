//! Integration tests against a live Redis server.
//!
//! Run with `--features redis-tests` and `REDIS_URL` pointing at a
//! disposable database.

#![cfg(feature = "redis")]

use std::sync::Arc;

use leaderboard_store::{KeySpace, RedisStore, UserDirectory};
use tracing::instrument;

/// Connects to `REDIS_URL` with a key space unique to this test run.
async fn setup_directory(test: &str) -> UserDirectory {
    dotenvy::dotenv().ok();
    let url = std::env::var("REDIS_URL").expect("REDIS_URL not set");
    let store = RedisStore::connect(&url).await.expect("Failed to connect");
    let namespace = format!("test:{}:{}", test, std::process::id());
    UserDirectory::new(
        Arc::new(store),
        KeySpace::new(format!("{namespace}:user"), format!("{namespace}:leaderboard")),
    )
}

#[tokio::test]
#[cfg_attr(not(feature = "redis-tests"), ignore)]
#[instrument]
async fn test_redis_record_lifecycle() {
    let directory = setup_directory("lifecycle").await;
    let user = directory.user("1234").expect("Valid id rejected");
    user.delete().await.expect("Cleanup failed");

    assert_eq!(user.get_name().await.unwrap(), "");
    user.set_name("George Costanza").await.unwrap();
    assert_eq!(user.get_name().await.unwrap(), "George Costanza");

    assert_eq!(user.add_score(10).await.unwrap(), 10);
    assert_eq!(user.add_score("-1").await.unwrap(), 9);
    assert_eq!(user.get_leaderboard_index().await.unwrap(), 0);

    user.give_badge([4, 8, 9]).await.unwrap();
    user.take_badge(4).await.unwrap();
    assert_eq!(user.get_badges().await.unwrap(), vec![8, 9]);
    assert!(user.has_badge(8).await.unwrap());

    user.delete().await.unwrap();
    assert_eq!(user.get_score().await.unwrap(), 0);
    assert_eq!(user.get_leaderboard_index().await.unwrap(), -1);
    assert!(user.get_badges().await.unwrap().is_empty());
}

#[tokio::test]
#[cfg_attr(not(feature = "redis-tests"), ignore)]
#[instrument]
async fn test_redis_concurrent_increments() {
    let directory = setup_directory("concurrent").await;
    let user = directory.user("counter").expect("Valid id rejected");
    user.delete().await.expect("Cleanup failed");

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let user = user.clone();
            tokio::spawn(async move { user.add_score(10).await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("Task panicked").expect("Increment failed");
    }

    assert_eq!(user.get_score().await.unwrap(), 200);
    user.delete().await.unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "redis-tests"), ignore)]
#[instrument]
async fn test_redis_overflow_keeps_score_and_rank_in_step() {
    let directory = setup_directory("overflow").await;
    let user = directory.user("top").expect("Valid id rejected");
    let rival = directory.user("rival").expect("Valid id rejected");
    user.delete().await.expect("Cleanup failed");
    rival.delete().await.expect("Cleanup failed");

    rival.set_score(1).await.unwrap();
    user.set_score(i64::MAX).await.unwrap();
    assert!(user.add_score(1).await.is_err());

    assert_eq!(user.get_score().await.unwrap(), i64::MAX);
    assert_eq!(user.get_leaderboard_index().await.unwrap(), 0);
    assert_eq!(rival.get_leaderboard_index().await.unwrap(), 1);

    // A rejected increment must not shift the ranking either.
    assert_eq!(user.add_score(-1).await.unwrap(), i64::MAX - 1);
    assert_eq!(user.get_leaderboard_index().await.unwrap(), 0);

    user.delete().await.unwrap();
    rival.delete().await.unwrap();
}
