//! The pooled post store.

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::model::{BlogPost, NewPost, PostId, PostUpdate};
use crate::pool::create_pool;
use crate::posts;
use chrono::{DateTime, SubsecRound, Utc};
use deadpool_postgres::Pool;

/// Data-access handle for `blog_posts`.
///
/// Cloning is cheap: clones share the same pool. Every operation checks a connection
/// out of the pool, issues one statement, and returns the connection when done. When
/// all connections are busy the call waits for one to be returned.
///
/// Concurrent writes to the same id are not ordered by the store; the last statement to
/// reach the database wins.
#[derive(Clone)]
pub struct PostStore {
    pool: Pool,
}

impl std::fmt::Debug for PostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("PostStore")
            .field("max_size", &status.max_size)
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl PostStore {
    /// Wrap an already-built pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build the pool described by `config` and wrap it.
    pub fn connect(config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self::new(create_pool(config)?))
    }

    /// Handle to the pool, for the idle-connection [`FaultMonitor`](crate::FaultMonitor).
    pub(crate) fn pool(&self) -> &Pool {
        &self.pool
    }

    /// All posts, ascending by id.
    pub async fn list_posts(&self) -> StoreResult<Vec<BlogPost>> {
        let conn = self.pool.get().await?;
        posts::list_posts(&conn).await
    }

    /// The post with `id`; `Ok(None)` when it does not exist.
    pub async fn get_post(&self, id: PostId) -> StoreResult<Option<BlogPost>> {
        let conn = self.pool.get().await?;
        posts::get_post(&conn, id).await
    }

    /// The post with the latest `created_on`; `Ok(None)` when there are no posts.
    pub async fn get_most_recent_post(&self) -> StoreResult<Option<BlogPost>> {
        let conn = self.pool.get().await?;
        posts::get_most_recent_post(&conn).await
    }

    /// Insert a post stamped with the current time and return its new id.
    pub async fn create_post(&self, post: &NewPost) -> StoreResult<PostId> {
        let created_on = now();
        let conn = self.pool.get().await?;
        let id = posts::create_post(&conn, post, created_on).await?;
        tracing::info!(id, %created_on, "post created");
        Ok(id)
    }

    /// Overwrite every non-id field of post `id`; returns rows affected.
    pub async fn update_post(&self, id: PostId, update: &PostUpdate) -> StoreResult<u64> {
        let conn = self.pool.get().await?;
        posts::update_post(&conn, id, update).await
    }

    /// Delete post `id`; returns rows affected.
    pub async fn delete_post(&self, id: PostId) -> StoreResult<u64> {
        let conn = self.pool.get().await?;
        posts::delete_post(&conn, id).await
    }

    /// Each author name once.
    pub async fn list_distinct_authors(&self) -> StoreResult<Vec<String>> {
        let conn = self.pool.get().await?;
        posts::list_distinct_authors(&conn).await
    }
}

/// Current time at the precision `TIMESTAMPTZ` stores (microseconds), so the value
/// handed to storage is the value read back.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscreteSettings;
    use chrono::Timelike;

    #[test]
    fn now_is_truncated_to_microseconds() {
        let t = now();
        assert_eq!(t.nanosecond() % 1_000, 0);
    }

    #[tokio::test]
    async fn debug_reports_pool_status() {
        let store = PostStore::connect(&StoreConfig::discrete(DiscreteSettings::default())).unwrap();
        let rendered = format!("{store:?}");
        assert!(rendered.starts_with("PostStore {"));
        assert!(rendered.contains("max_size: 10"));
    }
}
