//! Factory: turns `ComponentConfig` entries into indicators and strategies.
//!
//! Names match the series or strategy names they produce. Multi-line
//! indicators have one component name per line (`macd`, `macd_signal`,
//! `macd_histogram`). Missing parameters take the documented defaults;
//! present ones are validated before any constructor runs.

use crate::config::ComponentConfig;
use crate::confluence::ConfluenceParams;
use crate::indicators::{
    Atr, Ema, Kdj, KdjLine, Macd, MacdLine, Rsi, Sgma, Sma, Smi, SmiLine, SmiMode, StochRsi,
    StochRsiLine, Supertrend,
};
use crate::patterns::PatternParams;
use crate::series::Indicator;
use crate::strategies::{
    ConfluenceScorer, GaussianCross, Strategy, StructureReversal, SupertrendFlip,
};
use crate::structure::SwingMode;

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("Unknown indicator type: {0}")]
    UnknownIndicator(String),
    #[error("Unknown strategy type: {0}")]
    UnknownStrategy(String),
    #[error("Invalid parameter {name}={value} for {component}: {reason}")]
    InvalidParam {
        component: String,
        name: String,
        value: f64,
        reason: &'static str,
    },
    #[error("Strategy {0} reads bars after the marker bar and cannot run on a live chart")]
    LookAhead(String),
}

/// Largest accepted period or window.
pub const MAX_PERIOD: usize = 100_000;

// ─── Helpers ─────────────────────────────────────────────────────────

fn invalid(config: &ComponentConfig, name: &str, value: f64, reason: &'static str) -> FactoryError {
    FactoryError::InvalidParam {
        component: config.component_type.clone(),
        name: name.to_string(),
        value,
        reason,
    }
}

/// Named f64 parameter, falling back to `default`. Must be finite.
fn param(config: &ComponentConfig, name: &str, default: f64) -> Result<f64, FactoryError> {
    let value = config.params.get(name).copied().unwrap_or(default);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(config, name, value, "must be finite"))
    }
}

fn positive(config: &ComponentConfig, name: &str, default: f64) -> Result<f64, FactoryError> {
    let value = param(config, name, default)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(config, name, value, "must be > 0"))
    }
}

/// Named whole-number parameter, falling back to `default`.
fn param_usize(config: &ComponentConfig, name: &str, default: usize) -> Result<usize, FactoryError> {
    let value = param(config, name, default as f64)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(invalid(config, name, value, "must be a non-negative integer"));
    }
    if value > MAX_PERIOD as f64 {
        return Err(invalid(config, name, value, "must be <= 100000"));
    }
    Ok(value as usize)
}

/// A period: whole number, at least 1.
fn period(config: &ComponentConfig, name: &str, default: usize) -> Result<usize, FactoryError> {
    let value = param_usize(config, name, default)?;
    if value == 0 {
        return Err(invalid(config, name, 0.0, "must be >= 1"));
    }
    Ok(value)
}

// ─── Indicator factory ───────────────────────────────────────────────

/// Create an indicator from a `ComponentConfig`.
pub fn create_indicator(config: &ComponentConfig) -> Result<Box<dyn Indicator>, FactoryError> {
    let name = config.component_type.as_str();
    match name {
        "sma" => Ok(Box::new(Sma::new(period(config, "period", 60)?))),
        "ema" => Ok(Box::new(Ema::new(period(config, "period", 15)?))),
        "rsi" => Ok(Box::new(Rsi::new(period(config, "period", 14)?))),
        "sgma" => Ok(Box::new(Sgma::new(period(config, "period", 20)?))),
        "atr" => Ok(Box::new(Atr::new(period(config, "period", 14)?))),
        "supertrend" => Ok(Box::new(Supertrend::new(
            period(config, "period", 10)?,
            positive(config, "multiplier", 3.0)?,
        ))),
        "macd" | "macd_signal" | "macd_histogram" => {
            let line = match name {
                "macd" => MacdLine::Macd,
                "macd_signal" => MacdLine::Signal,
                _ => MacdLine::Histogram,
            };
            let fast = period(config, "fast", 12)?;
            let slow = period(config, "slow", 26)?;
            if fast >= slow {
                return Err(invalid(config, "fast", fast as f64, "must be < slow"));
            }
            Ok(Box::new(Macd::new(fast, slow, period(config, "signal", 9)?, line)))
        }
        "kdj_k" | "kdj_d" | "kdj_j" => {
            let line = match name {
                "kdj_k" => KdjLine::K,
                "kdj_d" => KdjLine::D,
                _ => KdjLine::J,
            };
            Ok(Box::new(Kdj::new(
                period(config, "k_period", 9)?,
                period(config, "d_period", 3)?,
                line,
            )))
        }
        "stoch_rsi" | "stoch_rsi_k" | "stoch_rsi_d" => {
            let line = match name {
                "stoch_rsi" => StochRsiLine::Raw,
                "stoch_rsi_k" => StochRsiLine::K,
                _ => StochRsiLine::D,
            };
            Ok(Box::new(StochRsi::new(
                period(config, "rsi_period", 14)?,
                period(config, "stoch_period", 14)?,
                period(config, "k_period", 3)?,
                period(config, "d_period", 3)?,
                line,
            )))
        }
        "smi" | "smi_signal" | "smi_histogram" => {
            let line = match name {
                "smi" => SmiLine::Smi,
                "smi_signal" => SmiLine::Signal,
                _ => SmiLine::Histogram,
            };
            // 0 = percent, 1 = normalized, 2 = zero-one
            let mode = match param_usize(config, "mode", 1)? {
                0 => SmiMode::Percent,
                1 => SmiMode::Normalized,
                2 => SmiMode::ZeroOne,
                other => return Err(invalid(config, "mode", other as f64, "must be 0, 1 or 2")),
            };
            Ok(Box::new(Smi::new(
                period(config, "period", 10)?,
                period(config, "smooth_a", 3)?,
                period(config, "smooth_b", 3)?,
                period(config, "signal", 10)?,
                mode,
                line,
            )))
        }
        other => Err(FactoryError::UnknownIndicator(other.to_string())),
    }
}

// ─── Strategy factory ────────────────────────────────────────────────

/// Create a strategy from a `ComponentConfig`, with default confluence tunables.
pub fn create_strategy(config: &ComponentConfig) -> Result<Box<dyn Strategy>, FactoryError> {
    create_strategy_with(config, &ConfluenceParams::default())
}

/// Create a strategy; `confluence` entries start from `base` and apply their
/// own params on top.
///
/// Strategies that read future bars are refused: everything built here can
/// end up in a live `ChartSession`. Build them directly for batch analysis.
pub fn create_strategy_with(
    config: &ComponentConfig,
    base: &ConfluenceParams,
) -> Result<Box<dyn Strategy>, FactoryError> {
    let strategy = build_strategy(config, base)?;
    if strategy.uses_future_bars() {
        return Err(FactoryError::LookAhead(strategy.name().to_string()));
    }
    Ok(strategy)
}

fn build_strategy(
    config: &ComponentConfig,
    base: &ConfluenceParams,
) -> Result<Box<dyn Strategy>, FactoryError> {
    match config.component_type.as_str() {
        "structure_reversal" => structure_reversal(config, SwingMode::Confirmed),
        "structure_reversal_trailing" => structure_reversal(config, SwingMode::Trailing),
        "structure_reversal_centered" => structure_reversal(config, SwingMode::Centered),
        "gaussian_cross" => Ok(Box::new(GaussianCross::new(period(config, "period", 20)?))),
        "trend_flip" => Ok(Box::new(SupertrendFlip::new(
            period(config, "period", 10)?,
            positive(config, "multiplier", 3.0)?,
        ))),
        "confluence" => Ok(Box::new(ConfluenceScorer::new(confluence_params(
            config, base,
        )?))),
        other => Err(FactoryError::UnknownStrategy(other.to_string())),
    }
}

fn structure_reversal(
    config: &ComponentConfig,
    mode: SwingMode,
) -> Result<Box<dyn Strategy>, FactoryError> {
    let window = period(config, "window", 5)?;
    // 0 leaves the shoulder distance uncapped.
    let cap = param_usize(config, "max_shoulder_distance", 0)?;
    let params = PatternParams {
        tolerance: positive(config, "tolerance", PatternParams::default().tolerance)?,
        max_shoulder_distance: (cap > 0).then_some(cap),
    };
    Ok(Box::new(StructureReversal::with_mode(window, mode, params)))
}

fn confluence_params(
    config: &ComponentConfig,
    base: &ConfluenceParams,
) -> Result<ConfluenceParams, FactoryError> {
    let b = base;
    let params = ConfluenceParams {
        level_window: period(config, "level_window", b.level_window)?,
        threshold: period(config, "threshold", b.threshold as usize)? as u32,
        rsi_period: period(config, "rsi_period", b.rsi_period)?,
        stoch_period: period(config, "stoch_period", b.stoch_period)?,
        stoch_k: period(config, "stoch_k", b.stoch_k)?,
        stoch_d: period(config, "stoch_d", b.stoch_d)?,
        macd_fast: period(config, "macd_fast", b.macd_fast)?,
        macd_slow: period(config, "macd_slow", b.macd_slow)?,
        macd_signal: period(config, "macd_signal", b.macd_signal)?,
        kdj_k: period(config, "kdj_k", b.kdj_k)?,
        kdj_d: period(config, "kdj_d", b.kdj_d)?,
        rsi_oversold: param(config, "rsi_oversold", b.rsi_oversold)?,
        rsi_overbought: param(config, "rsi_overbought", b.rsi_overbought)?,
        stoch_oversold: param(config, "stoch_oversold", b.stoch_oversold)?,
        stoch_overbought: param(config, "stoch_overbought", b.stoch_overbought)?,
        kdj_oversold: param(config, "kdj_oversold", b.kdj_oversold)?,
        kdj_overbought: param(config, "kdj_overbought", b.kdj_overbought)?,
    };
    if params.macd_fast >= params.macd_slow {
        return Err(invalid(
            config,
            "macd_fast",
            params.macd_fast as f64,
            "must be < macd_slow",
        ));
    }
    Ok(params)
}

/// Every indicator component name the factory accepts.
pub const INDICATOR_TYPES: &[&str] = &[
    "sma",
    "ema",
    "rsi",
    "sgma",
    "atr",
    "supertrend",
    "macd",
    "macd_signal",
    "macd_histogram",
    "kdj_k",
    "kdj_d",
    "kdj_j",
    "stoch_rsi",
    "stoch_rsi_k",
    "stoch_rsi_d",
    "smi",
    "smi_signal",
    "smi_histogram",
];

/// Every strategy component name the factory accepts.
pub const STRATEGY_TYPES: &[&str] = &[
    "structure_reversal",
    "structure_reversal_trailing",
    "gaussian_cross",
    "trend_flip",
    "confluence",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn cc(t: &str) -> ComponentConfig {
        ComponentConfig::new(t)
    }

    #[test]
    fn every_indicator_type_builds() {
        for &t in INDICATOR_TYPES {
            let ind = create_indicator(&cc(t)).unwrap_or_else(|e| panic!("{t}: {e}"));
            assert!(!ind.name().is_empty());
        }
    }

    #[test]
    fn every_strategy_type_builds_with_its_name() {
        for &t in STRATEGY_TYPES {
            let s = create_strategy(&cc(t)).unwrap_or_else(|e| panic!("{t}: {e}"));
            assert_eq!(s.name(), t);
        }
    }

    #[test]
    fn params_reach_the_indicator() {
        let ind = create_indicator(&cc("sma").with_param("period", 20.0)).unwrap();
        assert_eq!(ind.name(), "sma_20");
        assert_eq!(ind.lookback(), 19);
    }

    #[test]
    fn unknown_names() {
        assert!(matches!(
            create_indicator(&cc("vortex")),
            Err(FactoryError::UnknownIndicator(_))
        ));
        assert!(matches!(
            create_strategy(&cc("vortex")),
            Err(FactoryError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = create_indicator(&cc("ema").with_param("period", 0.0));
        assert!(matches!(err, Err(FactoryError::InvalidParam { .. })));
    }

    #[test]
    fn fractional_period_is_rejected() {
        let err = create_strategy(&cc("gaussian_cross").with_param("period", 2.5));
        assert!(matches!(err, Err(FactoryError::InvalidParam { .. })));
    }

    #[test]
    fn macd_fast_must_be_below_slow() {
        let config = cc("macd").with_param("fast", 30.0);
        assert!(matches!(
            create_indicator(&config),
            Err(FactoryError::InvalidParam { .. })
        ));
    }

    #[test]
    fn negative_multiplier_is_rejected() {
        let config = cc("trend_flip").with_param("multiplier", -1.0);
        assert!(matches!(
            create_strategy(&config),
            Err(FactoryError::InvalidParam { .. })
        ));
    }

    #[test]
    fn confluence_overrides_apply_on_base() {
        let base = ConfluenceParams {
            threshold: 5,
            ..ConfluenceParams::default()
        };
        let p = confluence_params(&cc("confluence").with_param("level_window", 10.0), &base)
            .unwrap();
        assert_eq!(p.threshold, 5);
        assert_eq!(p.level_window, 10);
    }

    #[test]
    fn look_ahead_strategy_is_refused() {
        let err = create_strategy(&cc("structure_reversal_centered"));
        assert!(matches!(err, Err(FactoryError::LookAhead(ref name)) if name == "structure_reversal_centered"));
    }

    #[test]
    fn huge_window_is_rejected() {
        let config = cc("structure_reversal").with_param("window", 1e19);
        assert!(matches!(
            create_strategy(&config),
            Err(FactoryError::InvalidParam { .. })
        ));
        let config = cc("confluence").with_param("level_window", 1e19);
        assert!(create_strategy(&config).is_err());
        let config = cc("sma").with_param("period", (MAX_PERIOD + 1) as f64);
        assert!(create_indicator(&config).is_err());

        let config = cc("structure_reversal").with_param("window", MAX_PERIOD as f64);
        let s = create_strategy(&config).unwrap();
        assert_eq!(s.warmup_bars(), 4 * MAX_PERIOD);
    }

    #[test]
    fn bad_smi_mode() {
        let config = cc("smi").with_param("mode", 7.0);
        assert!(create_indicator(&config).is_err());
    }
}
