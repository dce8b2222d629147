//! Chart configuration: which series to plot and which strategies to run.
//!
//! Loaded from TOML. Every field has a default, so an empty file yields the
//! stock chart layout:
//!
//! ```toml
//! symbol = "HOSE:VNM"
//! resolution = "5"
//! tail_window = 300
//!
//! [[indicators]]
//! component_type = "sma"
//! params = { period = 60 }
//!
//! [[strategies]]
//! component_type = "gaussian_cross"
//! params = { period = 20 }
//!
//! [confluence]
//! threshold = 3
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::confluence::ConfluenceParams;
use crate::data::Resolution;
use crate::factory::{self, FactoryError};
use crate::series::Indicator;
use crate::strategies::Strategy;

/// A named component with numeric parameters.
///
/// Missing parameters fall back to the component's defaults in the factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub component_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ComponentConfig {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Component(#[from] FactoryError),
}

/// Per-chart configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub symbol: String,
    /// Bar size: minutes ("1", "5", "60") or "D".
    pub resolution: String,
    /// Trailing bars recomputed on a live update, on top of the warmup.
    pub tail_window: usize,
    pub indicators: Vec<ComponentConfig>,
    pub strategies: Vec<ComponentConfig>,
    /// Overrides for the `confluence` strategy.
    pub confluence: Option<ConfluenceParams>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        let period = |name: &str, p: f64| ComponentConfig::new(name).with_param("period", p);
        let macd = |name: &str| {
            ComponentConfig::new(name)
                .with_param("fast", 12.0)
                .with_param("slow", 26.0)
                .with_param("signal", 9.0)
        };
        let kdj = |name: &str| {
            ComponentConfig::new(name)
                .with_param("k_period", 9.0)
                .with_param("d_period", 3.0)
        };
        let stoch = |name: &str| {
            ComponentConfig::new(name)
                .with_param("rsi_period", 14.0)
                .with_param("stoch_period", 14.0)
                .with_param("k_period", 3.0)
                .with_param("d_period", 3.0)
        };

        Self {
            symbol: String::new(),
            resolution: "1".into(),
            tail_window: 300,
            indicators: vec![
                period("sma", 60.0),
                period("ema", 15.0),
                macd("macd"),
                macd("macd_signal"),
                macd("macd_histogram"),
                kdj("kdj_k"),
                kdj("kdj_d"),
                kdj("kdj_j"),
                stoch("stoch_rsi_k"),
                stoch("stoch_rsi_d"),
            ],
            strategies: vec![ComponentConfig::new("structure_reversal")],
            confluence: None,
        }
    }
}

impl ChartConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check the resolution, the tail window and every component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tail_window == 0 {
            return Err(ConfigError::Invalid("tail_window must be >= 1".into()));
        }
        Resolution::parse(&self.resolution)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(params) = &self.confluence {
            if params.level_window == 0 || params.threshold == 0 {
                return Err(ConfigError::Invalid(
                    "confluence level_window and threshold must be >= 1".into(),
                ));
            }
        }
        self.build_indicators()?;
        self.build_strategies()?;
        Ok(())
    }

    pub fn build_indicators(&self) -> Result<Vec<Box<dyn Indicator>>, FactoryError> {
        self.indicators
            .iter()
            .map(factory::create_indicator)
            .collect()
    }

    /// Strategies in config order. `confluence` entries start from the
    /// `[confluence]` table when present.
    pub fn build_strategies(&self) -> Result<Vec<Box<dyn Strategy>>, FactoryError> {
        let base = self.confluence.clone().unwrap_or_default();
        self.strategies
            .iter()
            .map(|c| factory::create_strategy_with(c, &base))
            .collect()
    }
}
