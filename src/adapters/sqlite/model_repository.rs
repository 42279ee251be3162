//! SQLite implementation of the ModelStore.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ArmModel, PersistedModel};
use crate::domain::ports::ModelStore;

use super::parse_datetime;

#[derive(Clone)]
pub struct SqliteModelStore {
    pool: SqlitePool,
}

impl SqliteModelStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModelStore for SqliteModelStore {
    async fn load(&self, user_id: &str) -> DomainResult<Option<PersistedModel>> {
        let row: Option<ModelRow> = sqlx::query_as(
            "SELECT version, feature_count, arms, updated_at
             FROM bandit_models WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn save(&self, user_id: &str, model: &PersistedModel) -> DomainResult<()> {
        let arms_json = serde_json::to_string(&model.arms)?;

        sqlx::query(
            r#"INSERT INTO bandit_models (user_id, version, feature_count, arms, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   version = excluded.version,
                   feature_count = excluded.feature_count,
                   arms = excluded.arms,
                   updated_at = excluded.updated_at"#,
        )
        .bind(user_id)
        .bind(model.version)
        .bind(model.feature_count as i64)
        .bind(&arms_json)
        .bind(model.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ModelRow {
    version: i32,
    feature_count: i64,
    arms: String,
    updated_at: String,
}

impl TryFrom<ModelRow> for PersistedModel {
    type Error = DomainError;

    fn try_from(row: ModelRow) -> DomainResult<Self> {
        let arms: Vec<ArmModel> = serde_json::from_str(&row.arms)?;
        Ok(Self {
            version: row.version,
            feature_count: row.feature_count as usize,
            arms,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use chrono::Utc;

    #[tokio::test]
    async fn test_load_absent_user_is_none() {
        let pool = create_migrated_test_pool().await.expect("pool");
        let store = SqliteModelStore::new(pool);

        let loaded = store.load("nobody").await.expect("load");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let pool = create_migrated_test_pool().await.expect("pool");
        let store = SqliteModelStore::new(pool);

        let model = PersistedModel::fresh(Utc::now());
        store.save("user-1", &model).await.expect("save");

        let loaded = store.load("user-1").await.expect("load").expect("present");
        assert_eq!(loaded.version, model.version);
        assert_eq!(loaded.feature_count, model.feature_count);
        assert_eq!(loaded.arms, model.arms);
    }

    #[tokio::test]
    async fn test_save_overwrites_wholesale() {
        let pool = create_migrated_test_pool().await.expect("pool");
        let store = SqliteModelStore::new(pool);

        let first = PersistedModel::fresh(Utc::now());
        store.save("user-1", &first).await.expect("save");

        let mut second = PersistedModel::fresh(Utc::now());
        second.arms[0].b[0] = 42.0;
        store.save("user-1", &second).await.expect("overwrite");

        let loaded = store.load("user-1").await.expect("load").expect("present");
        assert_eq!(loaded.arms[0].b[0], 42.0);
    }

    #[tokio::test]
    async fn test_models_are_isolated_per_user() {
        let pool = create_migrated_test_pool().await.expect("pool");
        let store = SqliteModelStore::new(pool);

        let mut a = PersistedModel::fresh(Utc::now());
        a.arms[1].b[2] = 7.0;
        store.save("alice", &a).await.expect("save alice");
        store
            .save("bob", &PersistedModel::fresh(Utc::now()))
            .await
            .expect("save bob");

        let bob = store.load("bob").await.expect("load").expect("present");
        assert_eq!(bob.arms[1].b[2], 0.0);
    }
}
