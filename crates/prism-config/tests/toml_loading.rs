//! Integration tests for TOML and environment configuration loading.
//!
//! Uses `figment::Jail` for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use prism_config::{ConfigError, PrismConfig};

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "/var/lib/prism/research.db"

[polling]
interval_ms = 250
max_attempts = 8

[general]
default_limit = 100
default_project = 4
"#,
        )?;

        let config: PrismConfig = Figment::from(Serialized::defaults(PrismConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.database.path, "/var/lib/prism/research.db");
        assert_eq!(config.polling.interval_ms, 250);
        assert_eq!(config.polling.max_attempts, 8);
        assert_eq!(config.general.default_limit, 100);
        assert_eq!(config.general.default_project, Some(4));
        Ok(())
    });
}

#[test]
fn partial_sections_keep_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[polling]\nmax_attempts = 3\n")?;

        let config: PrismConfig = Figment::from(Serialized::defaults(PrismConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.polling.max_attempts, 3);
        assert_eq!(config.polling.interval_ms, 500);
        assert_eq!(config.database.path, ".prism/prism.db");
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".prism")?;
        jail.create_file(".prism/config.toml", "[general]\ndefault_project = 2\n")?;

        let config = PrismConfig::load().expect("config loads");
        assert_eq!(config.general.default_project, Some(2));
        Ok(())
    });
}

#[test]
fn env_beats_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[database]\npath = \"from-toml.db\"\n")?;
        jail.set_env("PRISM_DATABASE__PATH", "from-env.db");

        let config: PrismConfig = Figment::from(Serialized::defaults(PrismConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("PRISM_").split("__"))
            .extract()?;

        assert_eq!(config.database.path, "from-env.db");
        Ok(())
    });
}

#[test]
fn env_numbers_are_parsed() {
    Jail::expect_with(|jail| {
        jail.set_env("PRISM_POLLING__INTERVAL_MS", "20");
        jail.set_env("PRISM_GENERAL__DEFAULT_LIMIT", "7");

        let config = PrismConfig::load().expect("config loads");
        assert_eq!(config.polling.interval_ms, 20);
        assert_eq!(config.general.default_limit, 7);
        Ok(())
    });
}

#[test]
fn zero_attempts_fail_validation() {
    Jail::expect_with(|jail| {
        jail.set_env("PRISM_POLLING__MAX_ATTEMPTS", "0");

        let err = PrismConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "polling.max_attempts"));
        Ok(())
    });
}

#[test]
fn malformed_toml_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[polling\nmax_attempts = ")?;

        let result: Result<PrismConfig, _> =
            Figment::from(Serialized::defaults(PrismConfig::default()))
                .merge(Toml::file("config.toml"))
                .extract();
        assert!(result.is_err());
        Ok(())
    });
}
