use super::*;
use crate::config::types::ConfigInput;

#[test]
fn cli_args_override_config_file() {
    let file_input = ConfigInput {
        database_url: Some("postgres://localhost/from_file".to_string()),
        migrations_dir: Some("file_migrations".to_string()),
    };

    let cli_input = ConfigInput {
        database_url: Some("postgres://localhost/from_cli".to_string()),
        migrations_dir: None,
    };

    let config = ConfigBuilder::new()
        .with_file(file_input)
        .with_cli_args(cli_input)
        .resolve()
        .unwrap();

    assert_eq!(config.database_url, "postgres://localhost/from_cli");
    assert_eq!(config.migrations_dir, "file_migrations");
}

#[test]
fn file_fills_gaps_left_by_cli() {
    let file_input = ConfigInput {
        database_url: Some("postgres://localhost/db".to_string()),
        migrations_dir: Some("migrations".to_string()),
    };

    let config = ConfigBuilder::new()
        .with_file(file_input)
        .with_cli_args(ConfigInput::default())
        .resolve()
        .unwrap();

    assert_eq!(config.database_url, "postgres://localhost/db");
    assert_eq!(config.migrations_dir, "migrations");
}

#[test]
fn missing_values_refuse_to_resolve() {
    // Clear the environment fallbacks so the test is deterministic even
    // when the host shell exports them.
    unsafe {
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("MIGRATIONS_DIR");
    }

    let err = ConfigBuilder::new()
        .resolve()
        .expect_err("empty config must not resolve");
    assert!(err.to_string().contains("database URL"));

    let err = ConfigBuilder::new()
        .with_cli_args(ConfigInput {
            database_url: Some("postgres://localhost/db".to_string()),
            migrations_dir: None,
        })
        .resolve()
        .expect_err("missing migrations dir must not resolve");
    assert!(err.to_string().contains("migration directory"));
}

#[test]
fn merge_prefers_the_later_layer() {
    let base = ConfigInput {
        database_url: Some("a".to_string()),
        migrations_dir: None,
    };
    let overlay = ConfigInput {
        database_url: Some("b".to_string()),
        migrations_dir: Some("dir".to_string()),
    };

    let merged = base.merge(overlay);
    assert_eq!(merged.database_url.as_deref(), Some("b"));
    assert_eq!(merged.migrations_dir.as_deref(), Some("dir"));
}

#[test]
fn load_config_parses_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pgshift.yaml");
    std::fs::write(
        &path,
        "database_url: postgres://localhost/yaml\nmigrations_dir: db/migrations\n",
    )
    .unwrap();

    let input = load_config(path.to_str().unwrap()).unwrap();
    assert_eq!(
        input.database_url.as_deref(),
        Some("postgres://localhost/yaml")
    );
    assert_eq!(input.migrations_dir.as_deref(), Some("db/migrations"));
}

#[test]
fn load_config_missing_file_is_empty_input() {
    let input = load_config("does_not_exist.yaml").unwrap();
    assert!(input.database_url.is_none());
    assert!(input.migrations_dir.is_none());
}
