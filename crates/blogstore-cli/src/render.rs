use crate::cli::OutputFormat;
use blogstore::BlogPost;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

pub fn posts(posts: &[BlogPost], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(posts)?),
        OutputFormat::Table => Ok(post_table(posts).to_string()),
    }
}

/// An absent post renders as JSON `null`, in either format.
pub fn optional_post(post: Option<&BlogPost>, format: OutputFormat) -> anyhow::Result<String> {
    match (post, format) {
        (None, _) => Ok("null".to_string()),
        (Some(post), OutputFormat::Json) => Ok(serde_json::to_string_pretty(post)?),
        (Some(post), OutputFormat::Table) => Ok(post_table(std::slice::from_ref(post)).to_string()),
    }
}

pub fn authors(authors: &[String], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(authors)?),
        OutputFormat::Table => {
            let mut table = styled_table(&["Author"]);
            for author in authors {
                table.add_row(vec![Cell::new(author)]);
            }
            Ok(table.to_string())
        }
    }
}

fn post_table(posts: &[BlogPost]) -> Table {
    let mut table = styled_table(&["ID", "Title", "Author", "Created On", "Tags", "Body"]);
    for post in posts {
        table.add_row(vec![
            Cell::new(post.id),
            Cell::new(&post.title),
            Cell::new(&post.author),
            Cell::new(post.created_on.to_rfc3339()),
            Cell::new(post.tags.join(", ")),
            Cell::new(&post.body),
        ]);
    }
    table
}

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    table
}
