//! # blogstore
//!
//! A typed, connection-pooled PostgreSQL store for blog posts.
//!
//! ## Features
//!
//! - **Seven operations, seven statements**: list, get, most recent, create, update,
//!   delete and distinct authors, each a single parameterized round trip
//! - **Absent is not an error**: reads of a missing row return `Ok(None)`
//! - **Injected pool**: build one `deadpool-postgres` pool at startup and hand it in
//! - **Fatal idle faults**: [`FaultMonitor`] reports a dead idle connection so the
//!   process can exit and be restarted by its supervisor
//!
//! ```ignore
//! let config = blogstore::StoreConfig::from_env()?;
//! let store = blogstore::PostStore::connect(&config)?;
//!
//! let id = store
//!     .create_post(&NewPost::new("Hello", "Ada", "First post", ["intro"]))
//!     .await?;
//! let post = store.get_post(id).await?;
//! ```
//!
//! The `blog_posts` table must already exist; `sql/blog_posts.sql` holds the schema the
//! store expects.

pub mod client;
pub mod config;
pub mod error;
pub mod fault;
pub mod model;
pub mod pool;
pub mod posts;
pub mod row;
pub mod store;

pub use client::GenericClient;
pub use config::{ConnectionSettings, DiscreteSettings, PoolSettings, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use fault::{FaultMonitor, FaultMonitorConfig, POOL_FAULT_EXIT_CODE, PoolFault};
pub use model::{BlogPost, NewPost, PostId, PostUpdate};
pub use pool::create_pool;
pub use row::{FromRow, RowExt};
pub use store::PostStore;

/// Reference DDL for the `blog_posts` table.
pub const SCHEMA_SQL: &str = include_str!("../sql/blog_posts.sql");
