use std::time::Duration;

use tempfile::tempdir;

use super::{load_config_file, parse_duration_value, types::EngineConfig};
use crate::error::{AppError, AppResult, ConfigError};
use crate::statistics::MetricName;
use crate::summary::{DurationUnit, SummaryDimension, SummaryStatisticName};

fn write_config(name: &str, content: &str) -> AppResult<(tempfile::TempDir, std::path::PathBuf)> {
    let dir = tempdir().map_err(|err| unexpected(format!("tempdir failed: {}", err)))?;
    let path = dir.path().join(name);
    std::fs::write(&path, content).map_err(|err| unexpected(format!("write failed: {}", err)))?;
    Ok((dir, path))
}

fn unexpected(message: String) -> AppError {
    AppError::config(ConfigError::from(message))
}

#[test]
fn parse_toml_config_with_summary_section() -> AppResult<()> {
    let (_dir, path) = write_config(
        "skillstat.toml",
        r#"
metrics = ["MEAN_ERROR", "ROOT_MEAN_SQUARE_ERROR"]

[engine]
worker_threads = 2
task_timeout = "30s"

[summary]
duration_unit = "MINUTES"
minimum_sample_size = 3
allow = ["MEAN_ERROR"]

[[summary.statistics]]
name = "MEAN"

[[summary.statistics]]
name = "QUANTILE"
probability = 0.9
dimension = "RESAMPLED"

[[summary.statistics]]
name = "HISTOGRAM"
bins = 10
"#,
    )?;

    let config = load_config_file(&path)?;
    if config.metric_names() != [MetricName::MeanError, MetricName::RootMeanSquareError] {
        return Err(unexpected(format!("Unexpected metrics {:?}", config.metrics)));
    }
    if config.task_timeout()? != Some(Duration::from_secs(30)) {
        return Err(AppError::config(ConfigError::from("Unexpected timeout")));
    }

    let statistics = config.summary_statistics()?;
    let names: Vec<SummaryStatisticName> = statistics.iter().map(|s| s.statistic).collect();
    if names
        != [
            SummaryStatisticName::Mean,
            SummaryStatisticName::Quantile,
            SummaryStatisticName::Histogram,
        ]
    {
        return Err(unexpected(format!("Unexpected statistics {names:?}")));
    }
    let quantile = statistics
        .get(1)
        .ok_or_else(|| AppError::config(ConfigError::from("Missing quantile")))?;
    if quantile.probability != Some(0.9) || quantile.dimension != SummaryDimension::Resampled {
        return Err(unexpected(format!("Unexpected quantile {quantile:?}")));
    }
    let histogram = statistics
        .get(2)
        .ok_or_else(|| AppError::config(ConfigError::from("Missing histogram")))?;
    if histogram.histogram_bins != Some(10) || histogram.dimension != SummaryDimension::Features {
        return Err(unexpected(format!("Unexpected histogram {histogram:?}")));
    }

    let options = config.summary_options();
    if options.duration_unit() != DurationUnit::Minutes
        || options.minimum_sample_size() != 3
        || !options.policy().allows(MetricName::MeanError)
        || options.policy().allows(MetricName::RootMeanSquareError)
    {
        return Err(unexpected(format!("Unexpected options {options:?}")));
    }
    Ok(())
}

#[test]
fn parse_json_config() -> AppResult<()> {
    let (_dir, path) = write_config(
        "skillstat.json",
        r#"{
  "metrics": ["MEAN_SQUARE_ERROR"],
  "engine": { "task_timeout": 5 },
  "summary": {
    "statistics": [ { "name": "MEDIAN" } ]
  }
}"#,
    )?;

    let config = load_config_file(&path)?;
    if config.metric_names() != [MetricName::MeanSquareError] {
        return Err(unexpected(format!("Unexpected metrics {:?}", config.metrics)));
    }
    if config.task_timeout()? != Some(Duration::from_secs(5)) {
        return Err(AppError::config(ConfigError::from("Unexpected timeout")));
    }
    let options = config.summary_options();
    if options.duration_unit() != DurationUnit::Hours || options.minimum_sample_size() != 0 {
        return Err(unexpected(format!("Unexpected defaults {options:?}")));
    }
    Ok(())
}

#[test]
fn unsupported_extension_is_rejected() -> AppResult<()> {
    let (_dir, path) = write_config("skillstat.yaml", "metrics: []")?;
    match load_config_file(&path) {
        Err(AppError::Config(ConfigError::UnsupportedExtension { ext })) if ext == "yaml" => Ok(()),
        other => Err(unexpected(format!("Unexpected result: {other:?}"))),
    }
}

#[test]
fn missing_extension_is_rejected() -> AppResult<()> {
    let (_dir, path) = write_config("skillstat", "metrics = []")?;
    match load_config_file(&path) {
        Err(AppError::Config(ConfigError::MissingExtension)) => Ok(()),
        other => Err(unexpected(format!("Unexpected result: {other:?}"))),
    }
}

#[test]
fn unknown_metric_names_fail_to_parse() -> AppResult<()> {
    let (_dir, path) = write_config("skillstat.toml", r#"metrics = ["NOT_A_METRIC"]"#)?;
    match load_config_file(&path) {
        Err(AppError::Config(ConfigError::ParseToml { .. })) => Ok(()),
        other => Err(unexpected(format!("Unexpected result: {other:?}"))),
    }
}

#[test]
fn invalid_summary_definition_is_reported_by_index() -> AppResult<()> {
    let (_dir, path) = write_config(
        "skillstat.toml",
        r#"
[[summary.statistics]]
name = "MEAN"

[[summary.statistics]]
name = "QUANTILE"
"#,
    )?;
    let config = load_config_file(&path)?;
    match config.summary_statistics() {
        Err(ConfigError::InvalidSummaryStatistic { index: 1, .. }) => Ok(()),
        other => Err(unexpected(format!("Unexpected result: {other:?}"))),
    }
}

#[test]
fn zero_workers_are_rejected() -> AppResult<()> {
    let config: EngineConfig = toml::from_str("[engine]\nworker_threads = 0\n")
        .map_err(|err| unexpected(err.to_string()))?;
    match config.build_runtime() {
        Err(ConfigError::FieldMustBePositive { .. }) => Ok(()),
        Err(other) => Err(unexpected(format!("Unexpected error: {other}"))),
        Ok(_) => Err(AppError::config(ConfigError::from(
            "Zero workers must not build",
        ))),
    }
}

#[test]
fn configured_processor_and_calculator_build() -> AppResult<()> {
    let config: EngineConfig = toml::from_str(
        r#"
metrics = ["MEAN_ERROR", "QUANTILE_QUANTILE_DIAGRAM"]

[engine]
worker_threads = 1

[[summary.statistics]]
name = "MAXIMUM"
"#,
    )
    .map_err(|err| unexpected(err.to_string()))?;
    let runtime = config.build_runtime()?;
    let _processor = config.processor(Some(runtime.handle()))?;
    let calculator = config.calculator()?;
    if calculator.summary_statistics().len() != 1 {
        return Err(AppError::config(ConfigError::from(
            "Expected one summary statistic",
        )));
    }
    Ok(())
}

#[test]
fn empty_config_builds_no_processor() -> AppResult<()> {
    let config = EngineConfig::default();
    match config.processor(None) {
        Err(AppError::Metric(_)) => Ok(()),
        other => Err(unexpected(format!(
            "Unexpected result: {:?}",
            other.map(|_processor| "processor")
        ))),
    }
}

#[test]
fn parse_duration_values() -> AppResult<()> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("30", Duration::from_secs(30)),
        ("5m", Duration::from_secs(300)),
        ("2h", Duration::from_secs(7_200)),
    ];
    for (text, expected) in cases {
        let parsed = parse_duration_value(text)?;
        if parsed != expected {
            return Err(unexpected(format!("{text} parsed as {parsed:?}")));
        }
    }
    for bad in ["", "s", "10d", "0ms"] {
        if parse_duration_value(bad).is_ok() {
            return Err(unexpected(format!("'{bad}' must not parse")));
        }
    }
    Ok(())
}
