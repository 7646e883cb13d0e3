//! Caller-constructed registries of indicators and strategies.
//!
//! The engine iterates whatever a registry holds; nothing is process-global.
//! Keys are unique, registering a second implementation under an existing
//! key replaces the first.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::error::EngineError;
use crate::domain::indicator::bull_bear_power::BullBearPower;
use crate::domain::indicator::cci::CciCross;
use crate::domain::indicator::kdj::Kdj;
use crate::domain::indicator::macd::Macd;
use crate::domain::indicator::moving_average::PriceVsAverage;
use crate::domain::indicator::rsi::Rsi;
use crate::domain::indicator::williams_r::WilliamsR;
use crate::domain::indicator::Indicator;
use crate::domain::strategy::cci_ma::CciMa;
use crate::domain::strategy::cci_macd::CciMacd;
use crate::domain::strategy::cci_wma::CciWma;
use crate::domain::strategy::channel::{ArtChannel, BollChannel};
use crate::domain::strategy::ma_base::MaBase;
use crate::domain::strategy::{Strategy, StrategyParams};
use crate::ports::config_port::ConfigPort;

const AVERAGE_PERIODS: [usize; 6] = [5, 10, 20, 50, 100, 200];

#[derive(Default)]
pub struct IndicatorRegistry {
    entries: BTreeMap<String, Box<dyn Indicator>>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// SMA/EMA 5..200, CCI14, MACD(13,34), KDJ, RSI, WMSR14 and Bull/Bear Power.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for period in AVERAGE_PERIODS {
            registry.register(Box::new(PriceVsAverage::sma(period)));
            registry.register(Box::new(PriceVsAverage::ema(period)));
        }
        registry.register(Box::new(CciCross::new(14)));
        registry.register(Box::new(Macd::new(13, 34, 9)));
        registry.register(Box::new(Kdj::default()));
        registry.register(Box::new(Rsi::default()));
        registry.register(Box::new(WilliamsR::new(14)));
        registry.register(Box::new(BullBearPower::default()));
        registry
    }

    /// Defaults narrowed to `[indicators] enabled` when present.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let mut registry = Self::with_defaults();
        if let Some(keys) = config.get_list("indicators", "enabled") {
            registry.restrict(&keys)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, indicator: Box<dyn Indicator>) {
        self.entries.insert(indicator.key(), indicator);
    }

    pub fn get(&self, key: &str) -> Option<&dyn Indicator> {
        self.entries.get(key).map(|b| b.as_ref())
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Indicator> {
        self.entries.values().map(|b| b.as_ref())
    }

    /// Keep only `keys`. Fails without changing anything if one is unknown.
    pub fn restrict(&mut self, keys: &[String]) -> Result<(), EngineError> {
        if let Some(missing) = keys.iter().find(|k| !self.entries.contains_key(*k)) {
            return Err(EngineError::UnknownIndicator {
                key: missing.clone(),
            });
        }
        self.entries.retain(|key, _| keys.contains(key));
        Ok(())
    }
}

/// Strategies run when no `[strategies] enabled` list is configured.
pub const DEFAULT_STRATEGIES: [&str; 5] = [
    "BOLL_DL_strategy",
    "CCI_WMA_strategy",
    "CCI_MA_strategy",
    "ART_DL_strategy",
    "MA_Base_strategy",
];

#[derive(Default)]
pub struct StrategyRegistry {
    entries: BTreeMap<String, Box<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in strategy, including those outside the default set.
    pub fn available() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BollChannel::default()));
        registry.register(Box::new(CciWma::default()));
        registry.register(Box::new(CciMa::default()));
        registry.register(Box::new(ArtChannel::default()));
        registry.register(Box::new(MaBase::default()));
        registry.register(Box::new(CciMacd::default()));
        registry
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::available();
        registry.entries.retain(|key, _| DEFAULT_STRATEGIES.contains(&key.as_str()));
        registry
    }

    /// Select strategies from `[strategies] enabled` (or the defaults) and
    /// apply per-strategy sections such as `[art_dl_strategy] multi = 5`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, EngineError> {
        let mut registry = Self::available();
        let enabled = config.get_list("strategies", "enabled").unwrap_or_else(|| {
            DEFAULT_STRATEGIES.iter().map(|k| k.to_string()).collect()
        });
        registry.restrict(&enabled)?;

        for strategy in registry.entries.values_mut() {
            let params = configured_params(config, strategy.as_ref())?;
            if !params.is_empty() {
                debug!(strategy = %strategy.key(), ?params, "applying configured parameters");
                strategy.set_params(&params)?;
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        self.entries.insert(strategy.key(), strategy);
    }

    pub fn get(&self, key: &str) -> Option<&dyn Strategy> {
        self.entries.get(key).map(|b| b.as_ref())
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Strategy> {
        self.entries.values().map(|b| b.as_ref())
    }

    /// Override parameters of the strategy registered under `key`.
    pub fn set_params(&mut self, key: &str, params: &StrategyParams) -> Result<(), EngineError> {
        match self.entries.get_mut(key) {
            Some(strategy) => strategy.set_params(params),
            None => Err(EngineError::UnknownStrategy {
                key: key.to_string(),
            }),
        }
    }

    /// Keep only `keys`. Fails without changing anything if one is unknown.
    pub fn restrict(&mut self, keys: &[String]) -> Result<(), EngineError> {
        if let Some(missing) = keys.iter().find(|k| !self.entries.contains_key(*k)) {
            return Err(EngineError::UnknownStrategy {
                key: missing.clone(),
            });
        }
        self.entries.retain(|key, _| keys.contains(key));
        Ok(())
    }
}

/// Every key of the strategy's lower-cased section, parsed as a number.
/// Names the strategy does not know are left for `set_params` to reject.
fn configured_params(
    config: &dyn ConfigPort,
    strategy: &dyn Strategy,
) -> Result<StrategyParams, EngineError> {
    let section = strategy.key().to_lowercase();
    let mut params = StrategyParams::new();
    for name in config.section_keys(&section) {
        let raw = config.get_string(&section, &name).unwrap_or_default();
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| EngineError::ConfigInvalid {
                section: section.clone(),
                key: name.clone(),
                reason: format!("'{raw}' is not a number"),
            })?;
        params.insert(name, value);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapConfig {
        values: HashMap<(String, String), String>,
    }

    impl MapConfig {
        fn with(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }
        fn get_int(&self, _: &str, _: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _: &str, _: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _: &str, _: &str, default: bool) -> bool {
            default
        }
        fn section_keys(&self, section: &str) -> Vec<String> {
            let mut keys: Vec<String> = self
                .values
                .keys()
                .filter(|(s, _)| s == section)
                .map(|(_, k)| k.clone())
                .collect();
            keys.sort();
            keys
        }
    }

    #[test]
    fn default_indicators() {
        let registry = IndicatorRegistry::with_defaults();
        assert_eq!(registry.len(), 18);
        for key in [
            "KDJ_indicator",
            "BUll_BEAR_POWER_indicator",
            "SMA200_indicator",
            "EMA5_indicator",
            "CCI14_indicator",
            "MACD(13,34)_indicator",
            "RSI_indicator",
            "WMSR14_indicator",
        ] {
            assert!(registry.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn default_strategies_exclude_cci_macd() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(registry.len(), 5);
        assert!(registry.get("CCI_MACD_strategy").is_none());
        assert!(StrategyRegistry::available().get("CCI_MACD_strategy").is_some());
    }

    #[test]
    fn restrict_rejects_unknown_key() {
        let mut registry = IndicatorRegistry::with_defaults();
        let err = registry
            .restrict(&["KDJ_indicator".into(), "NOPE_indicator".into()])
            .unwrap_err();
        assert!(err.is_integrity());
        assert_eq!(registry.len(), 18);

        registry.restrict(&["KDJ_indicator".into()]).unwrap();
        assert_eq!(registry.keys(), vec!["KDJ_indicator".to_string()]);
    }

    #[test]
    fn from_config_selects_and_tunes() {
        let config = MapConfig::default()
            .with("strategies", "enabled", "ART_DL_strategy, CCI_MACD_strategy")
            .with("art_dl_strategy", "multi", "4.5");
        let registry = StrategyRegistry::from_config(&config).unwrap();
        assert_eq!(
            registry.keys(),
            vec!["ART_DL_strategy".to_string(), "CCI_MACD_strategy".to_string()]
        );
        let params = registry.get("ART_DL_strategy").unwrap().params();
        assert_eq!(params["multi"], 4.5);
        assert_eq!(params["day_count"], 21.0);
    }

    #[test]
    fn from_config_rejects_bad_values() {
        let config = MapConfig::default().with("ma_base_strategy", "p1", "abc");
        assert!(matches!(
            StrategyRegistry::from_config(&config),
            Err(EngineError::ConfigInvalid { .. })
        ));

        let config = MapConfig::default().with("ma_base_strategy", "p1", "0");
        assert!(matches!(
            StrategyRegistry::from_config(&config),
            Err(EngineError::InvalidParam { .. })
        ));

        let config = MapConfig::default().with("strategies", "enabled", "FOO_strategy");
        assert!(matches!(
            StrategyRegistry::from_config(&config),
            Err(EngineError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn from_config_rejects_unknown_param_names() {
        let config = MapConfig::default().with("art_dl_strategy", "multiplier", "5");
        let err = StrategyRegistry::from_config(&config).err().unwrap();
        assert!(
            matches!(err, EngineError::InvalidParam { ref param, .. } if param == "multiplier")
        );
    }

    #[test]
    fn from_config_ignores_sections_of_disabled_strategies() {
        let config = MapConfig::default()
            .with("strategies", "enabled", "MA_Base_strategy")
            .with("art_dl_strategy", "multiplier", "5");
        assert!(StrategyRegistry::from_config(&config).is_ok());
    }

    #[test]
    fn set_params_by_key() {
        let mut registry = StrategyRegistry::with_defaults();
        let params = StrategyParams::from([("p3".to_string(), 34.0)]);
        registry.set_params("MA_Base_strategy", &params).unwrap();
        assert_eq!(registry.get("MA_Base_strategy").unwrap().params()["p3"], 34.0);
        assert!(registry.set_params("X_strategy", &params).is_err());
    }

    #[test]
    fn indicators_from_config() {
        let config = MapConfig::default().with("indicators", "enabled", "RSI_indicator");
        let registry = IndicatorRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(IndicatorRegistry::from_config(&MapConfig::default()).unwrap().len() == 18);
    }
}
