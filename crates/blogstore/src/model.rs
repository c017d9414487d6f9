//! Blog post types

use crate::error::StoreResult;
use crate::row::{FromRow, RowExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Storage-assigned post identifier (`SERIAL`).
pub type PostId = i32;

/// A row of `blog_posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: PostId,
    pub title: String,
    pub author: String,
    pub created_on: DateTime<Utc>,
    pub body: String,
    pub tags: Vec<String>,
}

impl FromRow for BlogPost {
    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            author: row.try_get_column("author")?,
            created_on: row.try_get_column("created_on")?,
            body: row.try_get_column("body")?,
            tags: row.try_get_column("tags")?,
        })
    }
}

/// Fields supplied by the caller when creating a post.
///
/// `created_on` is not part of the input; the store stamps it at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Replacement values for every non-id field of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    pub title: String,
    pub author: String,
    pub created_on: DateTime<Utc>,
    pub body: String,
    pub tags: Vec<String>,
}

impl NewPost {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        body: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            body: body.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// The post this input becomes once storage assigns `id`.
    pub fn into_post(self, id: PostId, created_on: DateTime<Utc>) -> BlogPost {
        BlogPost {
            id,
            title: self.title,
            author: self.author,
            created_on,
            body: self.body,
            tags: self.tags,
        }
    }
}

impl From<BlogPost> for PostUpdate {
    fn from(post: BlogPost) -> Self {
        Self {
            title: post.title,
            author: post.author,
            created_on: post.created_on,
            body: post.body,
            tags: post.tags,
        }
    }
}
