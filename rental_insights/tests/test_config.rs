use chrono::NaiveDate;
use config::{Environment, Map};
use pretty_assertions::assert_eq;
use rental_insights::config::load_config_from;
use rental_insights::AppError;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn no_env() -> Environment {
    Environment::with_prefix("RENTAL")
        .separator("__")
        .source(Some(Map::new()))
}

fn env(pairs: &[(&str, &str)]) -> Environment {
    let vars: Map<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Environment::with_prefix("RENTAL")
        .separator("__")
        .source(Some(vars))
}

#[test]
fn test_defaults_without_files() {
    let dir = tempdir().unwrap();

    let config = load_config_from(&dir.path().join("config"), None, no_env()).unwrap();

    assert_eq!(config.data_dir, PathBuf::from("data"));
    assert_eq!(config.forecast.horizon, 2);
    assert_eq!(config.prep.top_amenities, 10);
}

#[test]
fn test_file_layers_then_environment() {
    let dir = tempdir().unwrap();
    let config_dir = dir.path().join("config");
    fs::create_dir(&config_dir).unwrap();
    fs::write(
        config_dir.join("default.toml"),
        r#"
            data_dir = "/srv/exports"
            cities = ["rome", "milan"]

            [forecast]
            horizon = 3
            train_start = "2023-10-01"

            [forecast.search.p]
            min = 0
            max = 2
        "#,
    )
    .unwrap();
    let explicit = dir.path().join("local.toml");
    fs::write(&explicit, "log_level = \"debug\"\n").unwrap();

    let config = load_config_from(
        &config_dir,
        Some(&explicit),
        env(&[("RENTAL__FORECAST__HORIZON", "4")]),
    )
    .unwrap();

    assert_eq!(config.data_dir, PathBuf::from("/srv/exports"));
    assert_eq!(config.cities, vec!["rome", "milan"]);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.forecast.horizon, 4);
    assert_eq!(
        config.forecast.train_start,
        NaiveDate::from_ymd_opt(2023, 10, 1).unwrap()
    );
    assert_eq!(config.forecast.search.p.max, 2);
    assert_eq!(config.forecast.search.q.max, 3);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempdir().unwrap();
    let explicit = dir.path().join("bad.toml");
    fs::write(&explicit, "[forecast]\nhorizon = 0\n").unwrap();

    let result = load_config_from(&dir.path().join("config"), Some(&explicit), no_env());

    assert!(matches!(result, Err(AppError::Forecast(_))));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempdir().unwrap();

    let result = load_config_from(
        &dir.path().join("config"),
        Some(&dir.path().join("absent.toml")),
        no_env(),
    );

    assert!(matches!(result, Err(AppError::Config(_))));
}
