//! Statements against `blog_posts`.
//!
//! Each function issues exactly one statement through a [`GenericClient`]. Statement text
//! is fixed; caller-supplied values are only ever bound as parameters.

use crate::client::GenericClient;
use crate::error::{StoreError, StoreResult};
use crate::model::{BlogPost, NewPost, PostId, PostUpdate};
use crate::row::{FromRow, RowExt};
use chrono::{DateTime, Utc};

pub const LIST_POSTS: &str = "SELECT * FROM blog_posts ORDER BY id ASC";
pub const GET_POST: &str = "SELECT * FROM blog_posts WHERE id = $1";
pub const GET_MOST_RECENT_POST: &str =
    "SELECT * FROM blog_posts ORDER BY created_on DESC LIMIT 1";
pub const CREATE_POST: &str = "INSERT INTO blog_posts (title, author, created_on, body, tags) \
     VALUES ($1, $2, $3, $4, $5) RETURNING *";
pub const UPDATE_POST: &str = "UPDATE blog_posts \
     SET title = $1, author = $2, created_on = $3, body = $4, tags = $5 \
     WHERE id = $6";
pub const DELETE_POST: &str = "DELETE FROM blog_posts WHERE id = $1";
pub const LIST_DISTINCT_AUTHORS: &str = "SELECT DISTINCT author FROM blog_posts";

/// All posts, ascending by id.
pub async fn list_posts(conn: &impl GenericClient) -> StoreResult<Vec<BlogPost>> {
    conn.query_tagged("posts.list", LIST_POSTS, &[])
        .await?
        .iter()
        .map(BlogPost::from_row)
        .collect()
}

/// The post with `id`, or `None` when no row matches.
pub async fn get_post(conn: &impl GenericClient, id: PostId) -> StoreResult<Option<BlogPost>> {
    conn.query_opt_tagged("posts.get", GET_POST, &[&id])
        .await?
        .as_ref()
        .map(BlogPost::from_row)
        .transpose()
}

/// The post with the latest `created_on`, or `None` when the table is empty.
pub async fn get_most_recent_post(conn: &impl GenericClient) -> StoreResult<Option<BlogPost>> {
    conn.query_opt_tagged("posts.most_recent", GET_MOST_RECENT_POST, &[])
        .await?
        .as_ref()
        .map(BlogPost::from_row)
        .transpose()
}

/// Insert `post` stamped with `created_on` and return the storage-assigned id.
pub async fn create_post(
    conn: &impl GenericClient,
    post: &NewPost,
    created_on: DateTime<Utc>,
) -> StoreResult<PostId> {
    let row = conn
        .query_opt_tagged(
            "posts.create",
            CREATE_POST,
            &[
                &post.title,
                &post.author,
                &created_on,
                &post.body,
                &post.tags,
            ],
        )
        .await?;
    let row = row.ok_or(StoreError::NoRow("posts.create"))?;
    row.try_get_column("id")
}

/// Overwrite every non-id field of post `id`. Returns the number of rows affected
/// (0 when `id` does not exist; no row is created).
pub async fn update_post(
    conn: &impl GenericClient,
    id: PostId,
    update: &PostUpdate,
) -> StoreResult<u64> {
    conn.execute_tagged(
        "posts.update",
        UPDATE_POST,
        &[
            &update.title,
            &update.author,
            &update.created_on,
            &update.body,
            &update.tags,
            &id,
        ],
    )
    .await
}

/// Delete post `id`. Returns the number of rows affected (0 when `id` does not exist).
pub async fn delete_post(conn: &impl GenericClient, id: PostId) -> StoreResult<u64> {
    conn.execute_tagged("posts.delete", DELETE_POST, &[&id]).await
}

/// Each author name once, in whatever order storage returns them.
pub async fn list_distinct_authors(conn: &impl GenericClient) -> StoreResult<Vec<String>> {
    conn.query_tagged("posts.authors", LIST_DISTINCT_AUTHORS, &[])
        .await?
        .iter()
        .map(|row| row.try_get_column("author"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [&str; 7] = [
        LIST_POSTS,
        GET_POST,
        GET_MOST_RECENT_POST,
        CREATE_POST,
        UPDATE_POST,
        DELETE_POST,
        LIST_DISTINCT_AUTHORS,
    ];

    fn placeholders(sql: &str) -> usize {
        (1..=9).filter(|n| sql.contains(&format!("${n}"))).count()
    }

    #[test]
    fn every_statement_targets_blog_posts() {
        for sql in ALL {
            assert!(sql.contains("blog_posts"), "{sql}");
        }
    }

    #[test]
    fn placeholder_counts_match_bound_values() {
        assert_eq!(placeholders(LIST_POSTS), 0);
        assert_eq!(placeholders(GET_POST), 1);
        assert_eq!(placeholders(GET_MOST_RECENT_POST), 0);
        assert_eq!(placeholders(CREATE_POST), 5);
        assert_eq!(placeholders(UPDATE_POST), 6);
        assert_eq!(placeholders(DELETE_POST), 1);
        assert_eq!(placeholders(LIST_DISTINCT_AUTHORS), 0);
    }

    #[test]
    fn mutations_are_keyed_by_id() {
        assert!(UPDATE_POST.ends_with("WHERE id = $6"));
        assert!(DELETE_POST.ends_with("WHERE id = $1"));
        assert!(CREATE_POST.ends_with("RETURNING *"));
    }

    #[test]
    fn statement_text_is_well_spaced() {
        for sql in ALL {
            assert!(!sql.contains("  "), "double space in {sql:?}");
        }
    }
}
