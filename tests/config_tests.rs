use std::fs;

use dcabot::error::{ConfigError, Error};
use dcabot::infrastructure::config::Config;

fn write_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
database = "bot.db"

[chain]
lcd_url = "https://lcd.example.org"
dca_address = "terra1dca"
signer_url = "http://127.0.0.1:9000/sign"

[scheduler]
reconcile_interval_secs = 30
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.chain.lcd_url, "https://lcd.example.org");
    assert_eq!(config.scheduler.reconcile_interval_secs, 30);
    assert!(!config.chain.dry_run);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = Config::parse_toml("[chain\ndca_address = 1").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}

#[test]
fn config_rejects_zero_intervals_and_hops() {
    let base = "[chain]\ndca_address = \"terra1dca\"\ndry_run = true\n";
    for (extra, field) in [
        ("[scheduler]\nreconcile_interval_secs = 0\n", "scheduler.reconcile_interval_secs"),
        ("[scheduler]\nbackoff_base_secs = 0\n", "scheduler.backoff_base_secs"),
        ("[routing]\nmax_hops = 0\n", "routing.max_hops"),
        ("[prices]\nmax_age_secs = 0\n", "prices.max_age_secs"),
        ("[chain.http]\ntimeout_ms = 0\n", "chain.http.timeout_ms"),
    ] {
        let err = Config::parse_toml(&format!("{base}{extra}")).unwrap_err();
        assert!(
            err.to_string().contains(field),
            "expected {field} in error, got: {err}"
        );
    }
}

#[test]
fn config_requires_contract_address() {
    let err = Config::parse_toml("[chain]\ndry_run = true\n").unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingField {
            field: "chain.dca_address"
        })
    ));
}

#[test]
fn config_rejects_unparseable_lcd_url() {
    let err = Config::parse_toml(
        "[chain]\nlcd_url = \"not a url\"\ndca_address = \"terra1dca\"\ndry_run = true\n",
    )
    .unwrap_err();
    assert!(err.to_string().contains("chain.lcd_url"));
}
