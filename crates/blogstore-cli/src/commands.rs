use crate::cli::{Operation, OutputFormat};
use crate::render;
use blogstore::PostStore;

/// Run one store operation and produce the single response for it.
///
/// Reads of an absent row are a success with an empty value, never an error.
pub async fn execute(
    store: &PostStore,
    operation: Operation,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match operation {
        Operation::List => {
            let posts = store.list_posts().await?;
            render::posts(&posts, format)
        }
        Operation::Get(id) => {
            let post = store.get_post(id).await?;
            render::optional_post(post.as_ref(), format)
        }
        Operation::Latest => {
            let post = store.get_most_recent_post().await?;
            render::optional_post(post.as_ref(), format)
        }
        Operation::Create(post) => {
            let id = store.create_post(&post).await?;
            Ok(created_message(id))
        }
        Operation::Update { id, update } => {
            let affected = store.update_post(id, &update).await?;
            if affected == 0 {
                tracing::warn!(id, "update matched no post");
            }
            Ok(modified_message(id))
        }
        Operation::Delete(id) => {
            let affected = store.delete_post(id).await?;
            if affected == 0 {
                tracing::warn!(id, "delete matched no post");
            }
            Ok(deleted_message(id))
        }
        Operation::Authors => {
            let authors = store.list_distinct_authors().await?;
            render::authors(&authors, format)
        }
    }
}

fn created_message(id: blogstore::PostId) -> String {
    format!("Post added with ID: {id}")
}

fn modified_message(id: blogstore::PostId) -> String {
    format!("Post modified with ID: {id}")
}

fn deleted_message(id: blogstore::PostId) -> String {
    format!("Blog Post deleted with ID: {id}")
}
