//! Integration tests for the depot storage core.

use chrono::{Duration, Utc};
use tempfile::TempDir;

use store::{
    AccessGrants, AccessLog, ContentHash, ContentStore, Database, FileRegistry, FileSource,
    StoreError, StoreRequest,
};

struct Depot {
    registry: FileRegistry,
    grants: AccessGrants,
    log: AccessLog,
    _dir: TempDir,
}

async fn setup() -> Depot {
    let dir = TempDir::new().unwrap();
    let db = Database::in_memory().await.unwrap();
    let content = ContentStore::new(db.clone(), dir.path().join("objects"))
        .await
        .unwrap();
    Depot {
        registry: FileRegistry::new(db.clone(), content),
        grants: AccessGrants::new(db.clone()),
        log: AccessLog::new(db),
        _dir: dir,
    }
}

#[tokio::test]
async fn test_duplicate_content_shares_one_record() {
    let depot = setup().await;

    let first = depot
        .registry
        .store(StoreRequest::from_bytes("first.txt", b"same bytes".to_vec()))
        .await
        .unwrap();
    let second = depot
        .registry
        .store(StoreRequest::from_bytes("second.txt", b"same bytes".to_vec()))
        .await
        .unwrap();

    assert_ne!(first, second, "each submission gets its own entry");

    let entry1 = depot.registry.get(first).await.unwrap();
    let entry2 = depot.registry.get(second).await.unwrap();
    assert_eq!(
        entry1.content_id, entry2.content_id,
        "identical bytes deduplicate to one content record"
    );
    assert_eq!(entry1.name, "first.txt");
    assert_eq!(entry2.name, "second.txt");
}

#[tokio::test]
async fn test_stored_hash_matches_retrieved_bytes() {
    let depot = setup().await;

    let id = depot
        .registry
        .store(StoreRequest::from_bytes("hashed.bin", vec![7u8; 300]))
        .await
        .unwrap();
    let entry = depot.registry.get(id).await.unwrap();
    let record = depot.registry.content().record(entry.content_id).await.unwrap();
    let bytes = depot.registry.content().get(entry.content_id).await.unwrap();

    assert_eq!(ContentHash::from_data(&bytes), record.hash);
    assert_eq!(record.size as usize, bytes.len());
}

#[tokio::test]
async fn test_roundtrip_including_empty_content() {
    let depot = setup().await;

    for payload in [&b""[..], &b"x"[..], &b"some longer payload\n"[..]] {
        let id = depot
            .registry
            .store(StoreRequest::from_bytes("payload.dat", payload.to_vec()))
            .await
            .unwrap();
        let entry = depot.registry.get(id).await.unwrap();
        let bytes = depot.registry.content().get(entry.content_id).await.unwrap();
        assert_eq!(bytes, payload);
    }
}

#[tokio::test]
async fn test_link_uniqueness_and_no_reuse_after_unlink() {
    let depot = setup().await;

    let id = depot
        .registry
        .store(StoreRequest::from_bytes("a.txt", b"a".to_vec()).with_link("docs/a"))
        .await
        .unwrap();

    let duplicate = depot
        .registry
        .store(StoreRequest::from_bytes("b.txt", b"b".to_vec()).with_link("docs/a"))
        .await;
    assert!(matches!(duplicate, Err(StoreError::LinkDuplicate(_))));

    // after unlink the alias stays reserved - soft-deleted rows keep their
    // link so an old alias can never silently resolve to a new file
    depot.registry.unlink("docs/a").await.unwrap();
    let reuse = depot
        .registry
        .store(StoreRequest::from_bytes("c.txt", b"c".to_vec()).with_link("docs/a"))
        .await;
    assert!(matches!(reuse, Err(StoreError::LinkDuplicate(_))));

    // the soft-deleted entry satisfies no fresh lookup
    assert!(matches!(
        depot.registry.get(id).await,
        Err(StoreError::EntryNotFound(_))
    ));
    assert!(matches!(
        depot.registry.retrieve("docs/a").await,
        Err(StoreError::LinkNotFound(_))
    ));
}

#[tokio::test]
async fn test_grant_lifecycle() {
    let depot = setup().await;

    let file_id = depot
        .registry
        .store(StoreRequest::from_bytes("shared.pdf", b"pdf bytes".to_vec()))
        .await
        .unwrap();

    let grant = depot.grants.grant(file_id, None, Some(1)).await.unwrap();
    assert!(depot.grants.check(file_id, &grant.token).await);

    depot.grants.revoke(grant.id).await.unwrap();
    assert!(!depot.grants.check(file_id, &grant.token).await);

    // expiry via simulated clock
    let now = Utc::now();
    let short = depot
        .grants
        .grant_at(file_id, Some(Duration::seconds(30)), None, now)
        .await
        .unwrap();
    assert!(depot.grants.check_at(file_id, &short.token, now).await);
    assert!(
        !depot
            .grants
            .check_at(file_id, &short.token, now + Duration::seconds(31))
            .await
    );
}

#[tokio::test]
async fn test_exists_detects_storage_corruption() {
    let depot = setup().await;

    let id = depot
        .registry
        .store(StoreRequest::from_bytes("fragile.txt", b"fragile".to_vec()))
        .await
        .unwrap();
    let id_str = id.to_string();
    assert!(depot.registry.exists(&id_str).await);

    // remove the physical object out from under the record
    let entry = depot.registry.get(id).await.unwrap();
    let path = depot
        .registry
        .content()
        .path_for(entry.content_id)
        .await
        .unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(!depot.registry.exists(&id_str).await);
    assert!(matches!(
        depot.registry.content().get(entry.content_id).await,
        Err(StoreError::ContentNotFound(_))
    ));
}

#[tokio::test]
async fn test_store_many_sorts_and_retags() {
    let depot = setup().await;

    let existing = depot
        .registry
        .store(StoreRequest::from_bytes("old.txt", b"old".to_vec()).with_backref("order/1"))
        .await
        .unwrap();

    let ids = depot
        .registry
        .store_many(
            vec![
                FileSource::Data {
                    name: "new-b.txt".into(),
                    bytes: b"bee".to_vec(),
                },
                FileSource::Existing(existing),
                FileSource::Data {
                    name: "new-a.txt".into(),
                    bytes: b"ay".to_vec(),
                },
            ],
            Some("order/2"),
        )
        .await
        .unwrap();

    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted, "ids come back in ascending order");
    assert!(ids.contains(&existing));

    // the existing entry was re-tagged, not re-stored
    let entry = depot.registry.get(existing).await.unwrap();
    assert_eq!(entry.backref.as_deref(), Some("order/2"));
    assert_eq!(entry.name, "old.txt");
}

#[tokio::test]
async fn test_numeric_links_resolve_as_ids() {
    let depot = setup().await;

    let id = depot
        .registry
        .store(StoreRequest::from_bytes("n.txt", b"n".to_vec()))
        .await
        .unwrap();

    assert_eq!(
        depot.registry.resolve_link(&id.to_string()).await.unwrap(),
        Some(id)
    );
    // numeric strings pass through even when no such entry exists
    assert_eq!(depot.registry.resolve_link("123456").await.unwrap(), Some(123456));
}

#[tokio::test]
async fn test_access_log_counts_per_file() {
    let depot = setup().await;

    let a = depot
        .registry
        .store(StoreRequest::from_bytes("a.txt", b"a".to_vec()))
        .await
        .unwrap();
    let b = depot
        .registry
        .store(StoreRequest::from_bytes("b.txt", b"b".to_vec()))
        .await
        .unwrap();

    for _ in 0..3 {
        depot
            .log
            .record(a, store::AccessAction::Download, Some(1), "127.0.0.1", "local", None)
            .await
            .unwrap();
    }

    assert_eq!(depot.log.count_for(a).await.unwrap(), 3);
    assert_eq!(depot.log.count_for(b).await.unwrap(), 0);
}

// The concrete scenario from the design discussion, end to end.
#[tokio::test]
async fn test_hello_world_scenario() {
    let depot = setup().await;

    let id = depot
        .registry
        .store(
            StoreRequest::from_bytes("test.txt", b"hello world".to_vec()).with_link("t/1"),
        )
        .await
        .unwrap();

    let entry = depot.registry.retrieve(&id.to_string()).await.unwrap();
    assert_eq!(entry.name, "test.txt");

    let record = depot.registry.content().record(entry.content_id).await.unwrap();
    assert_eq!(record.size, 11);
    assert_eq!(record.hash, ContentHash::from_data(b"hello world"));

    let bytes = depot.registry.content().get(entry.content_id).await.unwrap();
    assert_eq!(bytes, b"hello world");

    let by_link = depot.registry.retrieve("t/1").await.unwrap();
    assert_eq!(by_link.id, entry.id);

    let now = Utc::now();
    let grant = depot
        .grants
        .grant_at(entry.id, Some(Duration::seconds(1)), None, now)
        .await
        .unwrap();
    assert!(depot.grants.check_at(entry.id, &grant.token, now).await);
    assert!(
        !depot
            .grants
            .check_at(entry.id, &grant.token, now + Duration::seconds(2))
            .await
    );
}
