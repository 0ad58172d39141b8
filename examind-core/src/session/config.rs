//! Configuration for CAT sessions

use serde::{Deserialize, Serialize};

use crate::estimator::EstimatorConfig;

/// Configuration for a CAT session
///
/// Priors, stopping rules, and the estimator constants. Loadable from
/// TOML; every field has a default so partial configs are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatConfig {
    /// Ability prior for a fresh session
    #[serde(default = "default_prior_ability")]
    pub prior_ability: f64,
    /// Standard-error prior for a fresh session
    #[serde(default = "default_prior_se")]
    pub prior_se: f64,
    /// Minimum items before the precision stopping rule may fire
    #[serde(default = "default_min_items")]
    pub min_items: usize,
    /// Hard cap on administered items
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Precision stopping rule: stop once SE falls to this value
    #[serde(default = "default_se_threshold")]
    pub se_threshold: f64,
    /// Wall-clock budget for the whole session, in seconds
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: u64,
    /// Half-width of the first-item difficulty band around the prior
    #[serde(default = "default_start_band_width")]
    pub start_band_width: f64,
    /// Ability update rule constants
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

fn default_prior_ability() -> f64 {
    5.0
}

fn default_prior_se() -> f64 {
    1.0
}

fn default_min_items() -> usize {
    5
}

fn default_max_items() -> usize {
    20
}

fn default_se_threshold() -> f64 {
    0.35
}

fn default_time_budget_secs() -> u64 {
    3600
}

fn default_start_band_width() -> f64 {
    2.0
}

impl Default for CatConfig {
    fn default() -> Self {
        Self {
            prior_ability: default_prior_ability(),
            prior_se: default_prior_se(),
            min_items: default_min_items(),
            max_items: default_max_items(),
            se_threshold: default_se_threshold(),
            time_budget_secs: default_time_budget_secs(),
            start_band_width: default_start_band_width(),
            estimator: EstimatorConfig::default(),
        }
    }
}

impl CatConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
