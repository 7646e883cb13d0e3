//! Configuration validation and loading.
//!
//! Validates every configured value before any instrument is computed.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::backtest::BacktestConfig;
use crate::domain::engine::EngineOptions;
use crate::domain::error::EngineError;
use crate::domain::registry::{IndicatorRegistry, StrategyRegistry};
use crate::domain::score::ScoreConfig;
use crate::ports::config_port::ConfigPort;

/// Where and what to load in a `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub dir: PathBuf,
    /// Empty means every symbol the bar provider lists.
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    read_bool(config, "engine", "parallel", true)?;
    read_bool(config, "engine", "allow_shorting", true)?;
    validate_capital(config)?;
    validate_score_thresholds(config)?;
    validate_weight(config, "damp_weight", 0.7)?;
    validate_weight(config, "boost_weight", 0.3)?;
    IndicatorRegistry::from_config(config)?;
    StrategyRegistry::from_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    load_data_config(config).map(|_| ())
}

/// Validated engine options with tuned defaults for anything unset.
pub fn load_engine_options(config: &dyn ConfigPort) -> Result<EngineOptions, EngineError> {
    validate_engine_config(config)?;
    Ok(EngineOptions {
        parallel: read_bool(config, "engine", "parallel", true)?,
        backtest: BacktestConfig {
            capital: read_double(config, "engine", "capital", 100_000.0)?,
            allow_shorting: read_bool(config, "engine", "allow_shorting", true)?,
        },
        score: ScoreConfig {
            low_threshold: read_double(config, "score", "low_threshold", 30.0)?,
            high_threshold: read_double(config, "score", "high_threshold", 70.0)?,
            damp_weight: read_double(config, "score", "damp_weight", 0.7)?,
            boost_weight: read_double(config, "score", "boost_weight", 0.3)?,
        },
    })
}

/// `default` when the key is absent, `ConfigInvalid` when it is not a number.
fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, EngineError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{raw}' is not a number"),
        }),
    }
}

/// `default` when the key is absent, `ConfigInvalid` when it is not a boolean.
fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, EngineError> {
    if config.get_string(section, key).is_none() {
        return Ok(default);
    }
    // an unparseable value falls back to whichever default is passed
    let value = config.get_bool(section, key, true);
    if value != config.get_bool(section, key, false) {
        return Err(EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: "expected true/false, yes/no, on/off or 1/0".to_string(),
        });
    }
    Ok(value)
}

pub fn load_data_config(config: &dyn ConfigPort) -> Result<DataConfig, EngineError> {
    let dir = match config.get_string("data", "dir") {
        Some(d) if !d.trim().is_empty() => PathBuf::from(d.trim()),
        _ => {
            return Err(EngineError::ConfigMissing {
                section: "data".to_string(),
                key: "dir".to_string(),
            })
        }
    };

    let symbols = config.get_list("data", "symbols").unwrap_or_default();

    let start_date = parse_date(config.get_string("data", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("data", "end_date").as_deref(), "end_date")?;
    if start_date > end_date {
        return Err(EngineError::ConfigInvalid {
            section: "data".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }

    Ok(DataConfig {
        dir,
        symbols,
        start_date,
        end_date,
    })
}

fn validate_capital(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = read_double(config, "engine", "capital", 100_000.0)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::ConfigInvalid {
            section: "engine".to_string(),
            key: "capital".to_string(),
            reason: "capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_score_thresholds(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let low = read_double(config, "score", "low_threshold", 30.0)?;
    let high = read_double(config, "score", "high_threshold", 70.0)?;
    for (key, value) in [("low_threshold", low), ("high_threshold", high)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(EngineError::ConfigInvalid {
                section: "score".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be between 0 and 100"),
            });
        }
    }
    if low >= high {
        return Err(EngineError::ConfigInvalid {
            section: "score".to_string(),
            key: "low_threshold".to_string(),
            reason: "low_threshold must be below high_threshold".to_string(),
        });
    }
    Ok(())
}

fn validate_weight(config: &dyn ConfigPort, key: &str, default: f64) -> Result<(), EngineError> {
    let value = read_double(config, "score", key, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(EngineError::ConfigInvalid {
            section: "score".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be between 0 and 1"),
        });
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, EngineError> {
    match value {
        None => Err(EngineError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            EngineError::ConfigInvalid {
                section: "data".to_string(),
                key: field.to_string(),
                reason: format!("invalid {field} format, expected YYYY-MM-DD"),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const DATA: &str = "[data]\ndir = ./data\nsymbols = AAPL, MSFT\nstart_date = 2020-01-01\nend_date = 2024-12-31\n";

    #[test]
    fn empty_config_uses_defaults() {
        let config = make_config("");
        let options = load_engine_options(&config).unwrap();
        assert!(options.parallel);
        assert!(options.backtest.allow_shorting);
        assert!((options.backtest.capital - 100_000.0).abs() < f64::EPSILON);
        assert_eq!(options.score, ScoreConfig::default());
    }

    #[test]
    fn engine_section_is_read() {
        let config = make_config(
            r#"
[engine]
capital = 50000
allow_shorting = false
parallel = false

[score]
low_threshold = 25
high_threshold = 75
"#,
        );
        let options = load_engine_options(&config).unwrap();
        assert!(!options.parallel);
        assert!(!options.backtest.allow_shorting);
        assert!((options.backtest.capital - 50_000.0).abs() < f64::EPSILON);
        assert!((options.score.low_threshold - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn capital_must_be_positive() {
        let config = make_config("[engine]\ncapital = -1\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref key, .. } if key == "capital"));
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let config = make_config("[score]\nlow_threshold = 80\nhigh_threshold = 70\n");
        assert!(validate_engine_config(&config).is_err());
        let config = make_config("[score]\nhigh_threshold = 120\n");
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn weights_within_unit_interval() {
        let config = make_config("[score]\ndamp_weight = 1.5\n");
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn unknown_enabled_key_is_integrity_error() {
        let config = make_config("[indicators]\nenabled = KDJ_indicator, FOO_indicator\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(err.is_integrity());
    }

    #[test]
    fn strategy_params_are_checked() {
        let config = make_config("[art_dl_strategy]\nday_count = 2.5\n");
        assert!(matches!(
            validate_engine_config(&config),
            Err(EngineError::InvalidParam { .. })
        ));
    }

    #[test]
    fn data_config_loads() {
        let data = load_data_config(&make_config(DATA)).unwrap();
        assert_eq!(data.dir, PathBuf::from("./data"));
        assert_eq!(data.symbols, vec!["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(data.start_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn data_dates_validated() {
        let config = make_config(&DATA.replace("2020-01-01", "2020/01/01"));
        assert!(matches!(
            validate_data_config(&config),
            Err(EngineError::ConfigInvalid { .. })
        ));
        let config = make_config(&DATA.replace("2020-01-01", "2025-01-01"));
        assert!(validate_data_config(&config).is_err());
        let config = make_config("[data]\ndir = x\nsymbols = A\nend_date = 2024-01-01\n");
        assert!(matches!(
            validate_data_config(&config),
            Err(EngineError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn symbols_are_optional() {
        let data = load_data_config(&make_config(&DATA.replace("AAPL, MSFT", ""))).unwrap();
        assert!(data.symbols.is_empty());
        let data = load_data_config(&make_config(&DATA.replace("symbols = AAPL, MSFT\n", ""))).unwrap();
        assert!(data.symbols.is_empty());
    }

    #[test]
    fn non_numeric_capital_is_rejected() {
        let config = make_config("[engine]\ncapital = abc\n");
        assert!(matches!(
            validate_engine_config(&config),
            Err(EngineError::ConfigInvalid { ref key, .. }) if key == "capital"
        ));
        assert!(load_engine_options(&config).is_err());
    }

    #[test]
    fn non_numeric_threshold_is_rejected() {
        let config = make_config("[score]\nlow_threshold = thirty\n");
        assert!(matches!(
            validate_engine_config(&config),
            Err(EngineError::ConfigInvalid { ref key, .. }) if key == "low_threshold"
        ));
    }

    #[test]
    fn non_numeric_weight_is_rejected() {
        let config = make_config("[score]\nboost_weight = lots\n");
        assert!(matches!(
            validate_engine_config(&config),
            Err(EngineError::ConfigInvalid { ref key, .. }) if key == "boost_weight"
        ));
    }

    #[test]
    fn unparseable_bool_is_rejected() {
        let config = make_config("[engine]\nparallel = maybe\n");
        assert!(matches!(
            load_engine_options(&config),
            Err(EngineError::ConfigInvalid { ref key, .. }) if key == "parallel"
        ));
    }
}
