use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use thiserror::Error;

/// Which steal-detection rule decides alerts for observed offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StealPolicy {
    /// Fixed percentage below the 30-day rolling route average.
    #[default]
    Threshold,
    /// Hard ceilings plus a weighted composite score minimum.
    Composite,
    /// Below the departure-weekday mean by k standard deviations.
    Weekday,
}

/// All tunables in one place. Every default is explicit here and the whole
/// struct is validated once at startup; decision code never falls back to
/// ad-hoc defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_chat_id: i64,
    #[serde(default = "default_true")]
    pub telegram_instant: bool,

    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub api_marker: String,
    #[serde(default = "default_currency")]
    pub currency: String,

    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    #[serde(default = "default_poll_interval_h")]
    pub poll_interval_h: u64,

    #[serde(default)]
    pub steal_policy: StealPolicy,
    /// Fraction below the rolling average that makes an offer a steal; the
    /// weekday policy reuses it as its stddev multiplier.
    #[serde(default = "default_steal_threshold")]
    pub steal_threshold: Decimal,
    /// Per-leg threshold for one-way pairs; falls back to `steal_threshold`.
    #[serde(default)]
    pub pair_steal_threshold: Option<Decimal>,

    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub max_price_total: Option<Decimal>,
    #[serde(default)]
    pub max_price_per_km: Option<f64>,
    #[serde(default)]
    pub min_score: f64,
    #[serde(default)]
    pub min_composite_score: f64,
    #[serde(default)]
    pub excluded_airlines: HashSet<String>,
    #[serde(default = "default_passengers")]
    pub passengers: u32,

    #[serde(default = "default_min_trip_days")]
    pub min_trip_days: i64,
    #[serde(default = "default_max_trip_days")]
    pub max_trip_days: i64,
    #[serde(default = "default_max_stops")]
    pub max_stops: u32,
    #[serde(default = "default_max_layover_h")]
    pub max_layover_h: f64,

    #[serde(default = "default_weight_price")]
    pub weight_price: f64,
    #[serde(default = "default_weight_price_per_km")]
    pub weight_price_per_km: f64,
    #[serde(default = "default_weight_baseline_diff")]
    pub weight_baseline_diff: f64,
    #[serde(default = "default_weight_trip_duration")]
    pub weight_trip_duration: f64,

    /// Enables the one-way pairing engine.
    #[serde(default)]
    pub combine_ow: bool,
    /// Enables instant alerts for steal pairs.
    #[serde(default)]
    pub alert_pair: bool,
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "pln".to_string()
}

fn default_poll_interval_h() -> u64 {
    6
}

fn default_steal_threshold() -> Decimal {
    dec!(0.20)
}

fn default_passengers() -> u32 {
    1
}

fn default_min_trip_days() -> i64 {
    6
}

fn default_max_trip_days() -> i64 {
    30
}

fn default_max_stops() -> u32 {
    1
}

fn default_max_layover_h() -> f64 {
    8.0
}

fn default_weight_price() -> f64 {
    0.4
}

fn default_weight_price_per_km() -> f64 {
    0.3
}

fn default_weight_baseline_diff() -> f64 {
    0.2
}

fn default_weight_trip_duration() -> f64 {
    0.1
}

impl AppConfig {
    /// Threshold applied to each leg of a one-way pair.
    pub fn pair_threshold(&self) -> Decimal {
        self.pair_steal_threshold.unwrap_or(self.steal_threshold)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Invalid("telegram_bot_token must be non-empty".into()));
        }
        if self.poll_interval_h == 0 {
            return Err(ConfigError::Invalid("poll_interval_h must be greater than 0".into()));
        }
        if self.origins.is_empty() || self.destinations.is_empty() {
            return Err(ConfigError::Invalid("origins and destinations must be non-empty".into()));
        }
        if self.steal_threshold < Decimal::ZERO || self.steal_threshold >= Decimal::ONE {
            return Err(ConfigError::Invalid("steal_threshold must be in [0, 1)".into()));
        }
        if let Some(thr) = self.pair_steal_threshold {
            if thr < Decimal::ZERO || thr >= Decimal::ONE {
                return Err(ConfigError::Invalid("pair_steal_threshold must be in [0, 1)".into()));
            }
        }
        if self.min_trip_days < 0 || self.max_trip_days < self.min_trip_days {
            return Err(ConfigError::Invalid("trip-day window is inverted".into()));
        }
        if self.passengers == 0 {
            return Err(ConfigError::Invalid("passengers must be at least 1".into()));
        }
        let weights = [
            self.weight_price,
            self.weight_price_per_km,
            self.weight_baseline_diff,
            self.weight_trip_duration,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(ConfigError::Invalid("scoring weights must be non-negative".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "telegram_bot_token": "123:abc",
            "telegram_chat_id": 42,
            "origins": ["WAW"],
            "destinations": ["JFK"]
        }"#
    }

    #[test]
    fn minimal_config_gets_explicit_defaults() {
        let cfg: AppConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.steal_policy, StealPolicy::Threshold);
        assert_eq!(cfg.steal_threshold, dec!(0.20));
        assert_eq!(cfg.pair_threshold(), dec!(0.20));
        assert_eq!(cfg.min_trip_days, 6);
        assert_eq!(cfg.max_trip_days, 30);
        assert_eq!(cfg.passengers, 1);
        assert!(!cfg.combine_ow);
        assert!(cfg.telegram_instant);
    }

    #[test]
    fn pair_threshold_override_wins() {
        let mut cfg: AppConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.pair_steal_threshold = Some(dec!(0.35));
        assert_eq!(cfg.pair_threshold(), dec!(0.35));
    }

    #[test]
    fn policy_names_deserialize() {
        let mut json: serde_json::Value = serde_json::from_str(minimal_json()).unwrap();
        json["steal_policy"] = "weekday".into();
        let cfg: AppConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.steal_policy, StealPolicy::Weekday);
    }

    #[test]
    fn empty_token_is_rejected() {
        let mut cfg: AppConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.telegram_bot_token = "  ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut cfg: AppConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.poll_interval_h = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_trip_window_is_rejected() {
        let mut cfg: AppConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.min_trip_days = 10;
        cfg.max_trip_days = 5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut cfg: AppConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.steal_threshold = dec!(1.0);
        assert!(cfg.validate().is_err());
    }
}
