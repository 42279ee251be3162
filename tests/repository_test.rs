//! Integration tests for the SQLite model store and decision log.

use cadence::adapters::sqlite::{
    create_migrated_test_pool, SqliteDecisionLog, SqliteModelStore,
};
use cadence::domain::models::{
    ArmModel, DecisionRecord, PersistedModel, ARM_COUNT, FEATURE_COUNT, MODEL_VERSION,
};
use cadence::domain::ports::{DecisionLog, ModelStore};
use cadence::services::LinUcbPolicy;
use chrono::{Duration, TimeZone, Utc};

#[tokio::test]
async fn test_model_store_round_trip() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let store = SqliteModelStore::new(pool);

    assert!(store.load("user-1").await.expect("load").is_none());

    let mut model = PersistedModel::fresh(Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
    model.arms[3].a[0] = 2.5;
    model.arms[3].b[1] = -0.75;
    store.save("user-1", &model).await.expect("save");

    let loaded = store.load("user-1").await.expect("load").expect("present");
    assert_eq!(loaded, model);
}

#[tokio::test]
async fn test_model_store_last_write_wins() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let store = SqliteModelStore::new(pool);

    let now = Utc::now();
    store
        .save("user-1", &PersistedModel::fresh(now))
        .await
        .expect("first save");

    let mut updated = PersistedModel::fresh(now + Duration::minutes(5));
    updated.arms[0].b[0] = 9.0;
    store.save("user-1", &updated).await.expect("second save");

    let loaded = store.load("user-1").await.expect("load").expect("present");
    assert_eq!(loaded.arms[0].b[0], 9.0);
}

#[tokio::test]
async fn test_dimension_mismatch_recovers_to_cold_start() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let store = SqliteModelStore::new(pool);

    // A snapshot trained under an older, smaller feature layout
    let stale = PersistedModel {
        version: MODEL_VERSION,
        feature_count: 7,
        arms: (0..ARM_COUNT).map(|_| ArmModel::identity(7)).collect(),
        updated_at: Utc::now(),
    };
    store.save("user-1", &stale).await.expect("save");

    let loaded = store.load("user-1").await.expect("load");
    let restored = LinUcbPolicy::restore(0.5, loaded);
    let fresh = LinUcbPolicy::new(0.5);

    let mut x = vec![0.0; FEATURE_COUNT];
    x[0] = 1.0;
    let all: Vec<usize> = (0..ARM_COUNT).collect();
    assert_eq!(
        restored.predict(&x, &all).expect("predict"),
        fresh.predict(&x, &all).expect("predict")
    );
    for index in 0..ARM_COUNT {
        assert_eq!(restored.arm(index), fresh.arm(index));
    }
}

#[tokio::test]
async fn test_fewer_stored_arms_are_padded() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let store = SqliteModelStore::new(pool);

    let mut trained = LinUcbPolicy::new(0.5);
    let mut x = vec![0.0; FEATURE_COUNT];
    x[0] = 1.0;
    trained.update(&x, 2, 1.0).expect("update");

    // Persist a snapshot from a build that only knew 6 arms
    let mut snapshot = trained.snapshot(Utc::now());
    snapshot.arms.truncate(6);
    store.save("user-1", &snapshot).await.expect("save");

    let restored = LinUcbPolicy::restore(0.5, store.load("user-1").await.expect("load"));
    assert_eq!(restored.arm(2), trained.arm(2));
    for index in 6..ARM_COUNT {
        assert_eq!(
            restored.arm(index).expect("padded arm"),
            &ArmModel::identity(FEATURE_COUNT)
        );
    }
}

#[tokio::test]
async fn test_decision_log_window_ordering_and_cap() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let log = SqliteDecisionLog::new(pool);

    let now = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap();
    for day in 0..40 {
        let record = DecisionRecord::new(
            "user-1",
            "work",
            now - Duration::days(day),
            70,
            30,
            day % 2 == 0,
        );
        log.append(&record).await.expect("append");
    }

    // 30-day window, capped at 10, newest first
    let recent = log
        .recent("user-1", now - Duration::days(30), 10)
        .await
        .expect("recent");
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].decided_at, now);
    assert!(recent
        .windows(2)
        .all(|w| w[0].decided_at >= w[1].decided_at));
    assert!(recent
        .iter()
        .all(|r| r.decided_at >= now - Duration::days(30)));
}

#[tokio::test]
async fn test_decision_log_is_per_user() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let log = SqliteDecisionLog::new(pool);

    let now = Utc::now();
    log.append(&DecisionRecord::new("alice", "writing", now, 80, 25, true))
        .await
        .expect("append alice");
    log.append(&DecisionRecord::new("bob", "chores", now, 40, 10, false))
        .await
        .expect("append bob");

    let alice = log
        .recent("alice", now - Duration::days(1), 100)
        .await
        .expect("recent");
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].category, "writing");
}
