use blogstore::{DiscreteSettings, PoolSettings, StoreConfig};
use serde::Deserialize;
use std::path::PathBuf;

/// A `blogctl` config file, e.g.
///
/// ```toml
/// [database]
/// production = true
/// connection_string = "${DATABASE_URL}"
///
/// [pool]
/// max_size = 10
/// ```
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    #[allow(dead_code)]
    pub config_path: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let file = ConfigFile::parse(&raw, |key| std::env::var(key).ok()).map_err(|e| {
            anyhow::anyhow!(
                "failed to load config file {}: {e:#}",
                config_path.display()
            )
        })?;

        Ok(Self { config_path, file })
    }

    pub fn store_config(&self) -> StoreConfig {
        self.file.store_config()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseConfig,

    #[serde(default)]
    pub pool: PoolSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Use `connection_string` with TLS instead of the discrete fields.
    #[serde(default)]
    pub production: bool,
    pub connection_string: Option<String>,
    #[serde(flatten)]
    pub discrete: DiscreteSettings,
}

impl ConfigFile {
    pub fn parse(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.expand_env(&lookup)?;
        file.validate()?;
        Ok(file)
    }

    fn expand_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let db = &mut self.database;
        if let Some(url) = db.connection_string.as_mut() {
            *url = expand_env_vars(url, lookup)?;
        }
        for field in [
            &mut db.discrete.user,
            &mut db.discrete.host,
            &mut db.discrete.database,
            &mut db.discrete.password,
        ] {
            if let Some(v) = field.as_mut() {
                *v = expand_env_vars(v, lookup)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database.production
            && self
                .database
                .connection_string
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            anyhow::bail!("database.connection_string is required when database.production = true");
        }
        if self.pool.max_size == 0 {
            anyhow::bail!("pool.max_size must be at least 1");
        }
        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        let config = match (self.database.production, &self.database.connection_string) {
            (true, Some(url)) => StoreConfig::production(url.clone()),
            _ => StoreConfig::discrete(self.database.discrete.clone()),
        };
        config.with_pool(self.pool)
    }
}

fn expand_env_vars(
    input: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = lookup(&key)
                .ok_or_else(|| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogstore::ConnectionSettings;

    fn env(key: &str) -> Option<String> {
        match key {
            "DATABASE_URL" => Some("postgres://blog@db/blog".to_string()),
            "DB_PSWD" => Some("s3cret".to_string()),
            _ => None,
        }
    }

    #[test]
    fn production_file_expands_connection_string() {
        let file = ConfigFile::parse(
            r#"
[database]
production = true
connection_string = "${DATABASE_URL}?application_name=blogctl"

[pool]
max_size = 4
"#,
            env,
        )
        .unwrap();

        let config = file.store_config();
        assert!(config.is_production());
        assert_eq!(config.pool.max_size, 4);
        assert_eq!(
            config.connection,
            ConnectionSettings::Production {
                connection_string: "postgres://blog@db/blog?application_name=blogctl".to_string()
            }
        );
    }

    #[test]
    fn discrete_file_reads_flat_fields() {
        let file = ConfigFile::parse(
            r#"
[database]
user = "blog"
host = "localhost"
database = "blog_dev"
password = "${DB_PSWD}"
port = 5433
"#,
            env,
        )
        .unwrap();

        let config = file.store_config();
        assert!(!config.is_production());
        assert_eq!(config.pool, PoolSettings::default());
        assert_eq!(
            config.connection,
            ConnectionSettings::Discrete(DiscreteSettings {
                user: Some("blog".to_string()),
                host: Some("localhost".to_string()),
                database: Some("blog_dev".to_string()),
                password: Some("s3cret".to_string()),
                port: Some(5433),
            })
        );
    }

    #[test]
    fn production_without_connection_string_is_rejected() {
        let err = ConfigFile::parse("[database]\nproduction = true\n", env).unwrap_err();
        assert!(err.to_string().contains("connection_string is required"));
    }

    #[test]
    fn missing_env_var_is_reported() {
        let err = ConfigFile::parse("[database]\npassword = \"${NOPE}\"\n", env).unwrap_err();
        assert_eq!(err.to_string(), "missing env var for config expansion: NOPE");
    }

    #[test]
    fn expand_env_vars_rejects_malformed_references() {
        assert!(expand_env_vars("${", &env).is_err());
        assert!(expand_env_vars("${}", &env).is_err());
        assert_eq!(expand_env_vars("plain $value", &env).unwrap(), "plain $value");
    }
}
