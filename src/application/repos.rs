//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::PostRecord;
use crate::domain::posts::PostSearch;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Persistence(_) => "persistence",
            Self::Integrity { .. } => "integrity",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub content: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// All posts matching `search`, newest id first.
    async fn list_posts(&self, search: &PostSearch) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Inserts a post and returns its generated id.
    async fn create_post(&self, params: CreatePostParams) -> Result<i64, RepoError>;

    /// Overwrites the editable columns and refreshes `updated_at`.
    /// Returns the number of affected rows.
    async fn update_post(&self, params: UpdatePostParams) -> Result<u64, RepoError>;

    /// Returns the number of affected rows.
    async fn delete_post(&self, id: i64) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    /// Cheap round trip proving the store is reachable.
    async fn health_check(&self) -> Result<(), RepoError>;
}
