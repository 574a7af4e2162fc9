use clap::Args;
use serde::{Deserialize, Serialize};

/// Raw configuration input - all fields optional for merging.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub database_url: Option<String>,
    pub migrations_dir: Option<String>,
}

impl ConfigInput {
    /// Overlay `other` on top of `self`; the later layer wins per field.
    pub fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            database_url: other.database_url.or(self.database_url),
            migrations_dir: other.migrations_dir.or(self.migrations_dir),
        }
    }
}

/// Resolved configuration with every required value present.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub migrations_dir: String,
}

/// CLI argument group shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    #[arg(long, global = true, help = "PostgreSQL connection URL")]
    pub database_url: Option<String>,

    #[arg(long, global = true, help = "Path to the migration directory")]
    pub migrations_dir: Option<String>,
}

impl From<ConnectionArgs> for ConfigInput {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            database_url: args.database_url,
            migrations_dir: args.migrations_dir,
        }
    }
}
