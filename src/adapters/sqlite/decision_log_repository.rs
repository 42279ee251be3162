//! SQLite implementation of the DecisionLog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DecisionRecord, TimeOfDay};
use crate::domain::ports::DecisionLog;

use super::{parse_datetime, parse_uuid};

#[derive(Clone)]
pub struct SqliteDecisionLog {
    pool: SqlitePool,
}

impl SqliteDecisionLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DecisionLog for SqliteDecisionLog {
    async fn append(&self, record: &DecisionRecord) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO decision_log (id, user_id, category, time_of_day, day_of_week,
               energy_level, duration_minutes, completed, decided_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(&record.user_id)
        .bind(&record.category)
        .bind(record.time_of_day.as_str())
        .bind(i64::from(record.day_of_week))
        .bind(i64::from(record.energy_level))
        .bind(i64::from(record.duration_minutes))
        .bind(record.completed)
        .bind(record.decided_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<DecisionRecord>> {
        let rows: Vec<DecisionRow> = sqlx::query_as(
            r#"SELECT id, user_id, category, time_of_day, day_of_week,
               energy_level, duration_minutes, completed, decided_at
               FROM decision_log
               WHERE user_id = ? AND decided_at >= ?
               ORDER BY decided_at DESC
               LIMIT ?"#,
        )
        .bind(user_id)
        .bind(since.to_rfc3339())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct DecisionRow {
    id: String,
    user_id: String,
    category: String,
    time_of_day: String,
    day_of_week: i64,
    energy_level: i64,
    duration_minutes: i64,
    completed: bool,
    decided_at: String,
}

impl TryFrom<DecisionRow> for DecisionRecord {
    type Error = DomainError;

    fn try_from(row: DecisionRow) -> DomainResult<Self> {
        let time_of_day = TimeOfDay::from_str(&row.time_of_day).ok_or_else(|| {
            DomainError::SerializationError(format!("unknown time of day: {}", row.time_of_day))
        })?;
        Ok(Self {
            id: parse_uuid(&row.id)?,
            user_id: row.user_id,
            category: row.category,
            time_of_day,
            day_of_week: row.day_of_week as u8,
            energy_level: row.energy_level as u8,
            duration_minutes: row.duration_minutes as u32,
            completed: row.completed,
            decided_at: parse_datetime(&row.decided_at)?,
        })
    }
}
