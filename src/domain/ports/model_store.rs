use crate::domain::errors::DomainResult;
use crate::domain::models::PersistedModel;
use async_trait::async_trait;

/// Repository port for per-user bandit model persistence.
///
/// The model is saved wholesale on every update; there is no partial or
/// delta persistence. Absence of a record is the normal cold-start case
/// and is represented by `Ok(None)`.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Load the stored model for a user, if one exists.
    async fn load(&self, user_id: &str) -> DomainResult<Option<PersistedModel>>;

    /// Overwrite the stored model for a user.
    async fn save(&self, user_id: &str, model: &PersistedModel) -> DomainResult<()>;
}
