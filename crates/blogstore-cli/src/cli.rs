use anyhow::Context;
use blogstore::{NewPost, PostId, PostUpdate};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Create,
    Update,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Run(Invocation),
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub operation: Operation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            other => anyhow::bail!("unknown format: {other} (expected json or table)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    List,
    Get(PostId),
    Latest,
    Create(NewPost),
    Update { id: PostId, update: PostUpdate },
    Delete(PostId),
    Authors,
}

/// Post field options collected for `create` / `update`.
#[derive(Debug, Default)]
struct PostFields {
    title: Option<String>,
    author: Option<String>,
    body: Option<String>,
    created_on: Option<DateTime<Utc>>,
    tags: Vec<String>,
    any: bool,
}

impl PostFields {
    fn require(value: Option<String>, flag: &str, command: &str) -> anyhow::Result<String> {
        value.with_context(|| format!("`{command}` requires {flag}"))
    }
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(|s| s.as_str());

    let mut config: Option<PathBuf> = None;
    let mut format = OutputFormat::Json;
    let mut command: Option<&str> = None;
    let mut positionals: Vec<&str> = Vec::new();
    let mut fields = PostFields::default();
    let mut help = false;

    while let Some(token) = it.next() {
        if matches!(token, "-h" | "--help") {
            help = true;
            continue;
        }
        if let Some(v) = take_value(token, "--config", &mut it)? {
            config = Some(PathBuf::from(v));
            continue;
        }
        if let Some(v) = take_value(token, "--format", &mut it)? {
            format = v.parse()?;
            continue;
        }
        if let Some(v) = take_value(token, "--title", &mut it)? {
            fields.title = Some(v);
            fields.any = true;
            continue;
        }
        if let Some(v) = take_value(token, "--author", &mut it)? {
            fields.author = Some(v);
            fields.any = true;
            continue;
        }
        if let Some(v) = take_value(token, "--body", &mut it)? {
            fields.body = Some(v);
            fields.any = true;
            continue;
        }
        if let Some(v) = take_value(token, "--created-on", &mut it)? {
            let parsed = DateTime::parse_from_rfc3339(&v)
                .with_context(|| format!("--created-on must be an RFC 3339 timestamp, got {v:?}"))?;
            fields.created_on = Some(parsed.with_timezone(&Utc));
            fields.any = true;
            continue;
        }
        if let Some(v) = take_value(token, "--tag", &mut it)? {
            fields.tags.push(v);
            fields.any = true;
            continue;
        }
        if let Some(v) = take_value(token, "--tags", &mut it)? {
            fields.tags.extend(split_csv(&v));
            fields.any = true;
            continue;
        }
        match token {
            other if other.starts_with('-') && other.len() > 1 => {
                anyhow::bail!("unknown argument: {other}")
            }
            other if command.is_none() => command = Some(other),
            other => positionals.push(other),
        }
    }

    let Some(command) = command else {
        return Ok(Command::Help(HelpTopic::Root));
    };
    if help {
        return Ok(Command::Help(match command {
            "create" => HelpTopic::Create,
            "update" => HelpTopic::Update,
            _ => HelpTopic::Root,
        }));
    }

    let operation = match command {
        "list" => simple(Operation::List, command, &positionals, &fields)?,
        "latest" => simple(Operation::Latest, command, &positionals, &fields)?,
        "authors" => simple(Operation::Authors, command, &positionals, &fields)?,
        "get" => {
            let id = single_id(command, &positionals)?;
            simple(Operation::Get(id), command, &[], &fields)?
        }
        "delete" => {
            let id = single_id(command, &positionals)?;
            simple(Operation::Delete(id), command, &[], &fields)?
        }
        "create" => {
            if !positionals.is_empty() {
                anyhow::bail!("`create` takes no positional arguments");
            }
            if fields.created_on.is_some() {
                anyhow::bail!("`create` stamps created_on itself; --created-on is not accepted");
            }
            Operation::Create(NewPost {
                title: PostFields::require(fields.title, "--title", command)?,
                author: PostFields::require(fields.author, "--author", command)?,
                body: PostFields::require(fields.body, "--body", command)?,
                tags: fields.tags,
            })
        }
        "update" => {
            let id = single_id(command, &positionals)?;
            let created_on = fields
                .created_on
                .context("`update` requires --created-on")?;
            Operation::Update {
                id,
                update: PostUpdate {
                    title: PostFields::require(fields.title, "--title", command)?,
                    author: PostFields::require(fields.author, "--author", command)?,
                    created_on,
                    body: PostFields::require(fields.body, "--body", command)?,
                    tags: fields.tags,
                },
            }
        }
        other => anyhow::bail!("unknown command: {other}"),
    };

    Ok(Command::Run(Invocation {
        config,
        format,
        operation,
    }))
}

/// Match `--name value` or `--name=value`.
fn take_value<'a>(
    token: &str,
    name: &str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<String>> {
    if token == name {
        let Some(v) = it.next() else {
            anyhow::bail!("{name} requires a value");
        };
        return Ok(Some(v.to_string()));
    }
    Ok(token
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('='))
        .map(str::to_string))
}

fn simple(
    operation: Operation,
    command: &str,
    positionals: &[&str],
    fields: &PostFields,
) -> anyhow::Result<Operation> {
    if let Some(extra) = positionals.first() {
        anyhow::bail!("unexpected argument for `{command}`: {extra}");
    }
    if fields.any {
        anyhow::bail!("post field options are only accepted by `create` and `update`");
    }
    Ok(operation)
}

fn single_id(command: &str, positionals: &[&str]) -> anyhow::Result<PostId> {
    match positionals {
        [id] => id
            .parse()
            .with_context(|| format!("invalid post id: {id}")),
        [] => anyhow::bail!("`{command}` requires a post id"),
        [_, extra, ..] => anyhow::bail!("unexpected argument for `{command}`: {extra}"),
    }
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
USAGE:
  blogctl [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
  list                  List all posts, ascending by id
  get <ID>              Show one post (prints null when absent)
  latest                Show the most recently created post
  create                Create a post (see `blogctl create --help`)
  update <ID>           Overwrite a post (see `blogctl update --help`)
  delete <ID>           Delete a post
  authors               List each author once

OPTIONS:
  --config <FILE>       Config file (default: read DATABASE_URL / DB_* from the environment)
  --format <FORMAT>     Output format: json or table (default: json)
  -h, --help            Print help"
            );
        }
        HelpTopic::Create => {
            println!(
                "\
USAGE:
  blogctl create --title <TITLE> --author <AUTHOR> --body <BODY> [OPTIONS]

OPTIONS:
  --tag <TAG>           Add a tag (repeatable)
  --tags <CSV>          Add comma-separated tags
  -h, --help            Print help

created_on is set to the current time."
            );
        }
        HelpTopic::Update => {
            println!(
                "\
USAGE:
  blogctl update <ID> --title <TITLE> --author <AUTHOR> --created-on <RFC3339> --body <BODY> [OPTIONS]

OPTIONS:
  --tag <TAG>           Add a tag (repeatable)
  --tags <CSV>          Add comma-separated tags
  -h, --help            Print help

Every field is overwritten; omitted tags leave the post with none."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("blogctl")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    fn operation(list: &[&str]) -> Operation {
        let Command::Run(invocation) = parse_args(&args(list)).unwrap() else {
            panic!("expected a runnable command");
        };
        invocation.operation
    }

    #[test]
    fn no_arguments_prints_root_help() {
        let cmd = parse_args(&args(&[])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Root)));
    }

    #[test]
    fn parse_reads_with_global_options() {
        let cmd = parse_args(&args(&["--format=table", "get", "7", "--config", "blog.toml"]))
            .unwrap();
        let Command::Run(invocation) = cmd else {
            panic!("expected get");
        };
        assert_eq!(invocation.operation, Operation::Get(7));
        assert_eq!(invocation.format, OutputFormat::Table);
        assert_eq!(invocation.config, Some(PathBuf::from("blog.toml")));

        assert_eq!(operation(&["list"]), Operation::List);
        assert_eq!(operation(&["latest"]), Operation::Latest);
        assert_eq!(operation(&["authors"]), Operation::Authors);
        assert_eq!(operation(&["delete", "3"]), Operation::Delete(3));
    }

    #[test]
    fn parse_create_collects_tags() {
        let op = operation(&[
            "create", "--title", "T", "--author=A", "--body", "B", "--tag", "x", "--tags", "y, z",
        ]);
        assert_eq!(op, Operation::Create(NewPost::new("T", "A", "B", ["x", "y", "z"])));
    }

    #[test]
    fn parse_update_requires_every_field() {
        let op = operation(&[
            "update",
            "5",
            "--title",
            "T",
            "--author",
            "A",
            "--created-on",
            "2024-03-01T12:00:00+02:00",
            "--body",
            "B",
        ]);
        assert_eq!(
            op,
            Operation::Update {
                id: 5,
                update: PostUpdate {
                    title: "T".to_string(),
                    author: "A".to_string(),
                    created_on: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
                    body: "B".to_string(),
                    tags: Vec::new(),
                },
            }
        );

        let err = parse_args(&args(&["update", "5", "--title", "T", "--author", "A", "--body", "B"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "`update` requires --created-on");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(parse_args(&args(&["get"])).is_err());
        assert!(parse_args(&args(&["get", "abc"])).is_err());
        assert!(parse_args(&args(&["get", "1", "2"])).is_err());
        assert!(parse_args(&args(&["list", "--title", "T"])).is_err());
        assert!(parse_args(&args(&["create", "--title", "T"])).is_err());
        assert!(parse_args(&args(&["publish"])).is_err());
        assert!(parse_args(&args(&["list", "--format", "xml"])).is_err());
        assert!(parse_args(&args(&["list", "--verbose"])).is_err());
        assert!(parse_args(&args(&["list", "--config"])).is_err());
    }

    #[test]
    fn help_flag_selects_topic() {
        let cmd = parse_args(&args(&["create", "--help"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Create)));
        let cmd = parse_args(&args(&["update", "-h"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Update)));
        let cmd = parse_args(&args(&["--help"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Root)));
    }
}
