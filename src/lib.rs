pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod ledger;
pub mod migration;
pub mod migrator;

pub use error::MigrateError;
pub use migrator::Migrator;
