use anyhow::{Result, anyhow};

use crate::config::types::{Config, ConfigInput};

/// Layers configuration sources in precedence order: explicit CLI flags
/// override the config file, which overrides the environment.
pub struct ConfigBuilder {
    input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.input = self.input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.input = self.input.merge(cli_input);
        self
    }

    /// Fill remaining gaps from the environment. Both the database URL and
    /// the migration directory must resolve or the process refuses to start.
    pub fn resolve(self) -> Result<Config> {
        let database_url = self
            .input
            .database_url
            .or_else(|| env_non_empty("DATABASE_URL"))
            .ok_or_else(|| {
                anyhow!(
                    "no database URL configured: pass --database-url, set database_url \
                     in the config file, or export DATABASE_URL"
                )
            })?;

        let migrations_dir = self
            .input
            .migrations_dir
            .or_else(|| env_non_empty("MIGRATIONS_DIR"))
            .ok_or_else(|| {
                anyhow!(
                    "no migration directory configured: pass --migrations-dir, set \
                     migrations_dir in the config file, or export MIGRATIONS_DIR"
                )
            })?;

        Ok(Config {
            database_url,
            migrations_dir,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
