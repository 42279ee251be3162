use crate::domain::errors::DomainResult;
use crate::domain::models::DecisionRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository port for the decision log.
///
/// The orchestrator appends one record per resolved decision; the pattern
/// miner later reads a bounded, newest-first window of them.
#[async_trait]
pub trait DecisionLog: Send + Sync {
    /// Append a resolved decision.
    async fn append(&self, record: &DecisionRecord) -> DomainResult<()>;

    /// Records for `user_id` decided at or after `since`, newest first,
    /// capped at `limit`.
    async fn recent(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<DecisionRecord>>;
}
