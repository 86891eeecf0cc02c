//! Identity resolver tests

mod helpers;

use helpers::TestEnv;

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let env = TestEnv::new().await.unwrap();
    let identities = env.identities();

    let first = identities.resolve(100, 200).await.unwrap();
    let second = identities.resolve(100, 200).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.guild_id, 100);
    assert_eq!(first.member_id, 200);
}

#[tokio::test]
async fn test_same_member_in_other_guild_is_distinct() {
    let env = TestEnv::new().await.unwrap();
    let identities = env.identities();

    let a = identities.resolve(1, 42).await.unwrap();
    let b = identities.resolve(2, 42).await.unwrap();

    assert_ne!(a.id, b.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_resolves_agree() {
    let env = TestEnv::new().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let identities = env.identities();
        handles.push(tokio::spawn(async move { identities.resolve(7, 9).await }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1, "Concurrent resolves produced different identities");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM identities WHERE guild_id = 7 AND member_id = 9")
        .fetch_one(&env.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_find_does_not_create() {
    let env = TestEnv::new().await.unwrap();
    let identities = env.identities();

    assert!(identities.find(5, 6).await.unwrap().is_none());
    let created = identities.resolve(5, 6).await.unwrap();
    assert_eq!(identities.find(5, 6).await.unwrap(), Some(created.clone()));
    assert_eq!(identities.get(&created.id).await.unwrap(), created);
}

#[tokio::test]
async fn test_get_unknown_identity() {
    let env = TestEnv::new().await.unwrap();

    let result = env.identities().get("missing").await;
    assert!(matches!(result, Err(jsnd_common::Error::NotFound(_))));
}
