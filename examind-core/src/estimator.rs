//! Ability estimation
//!
//! A running proficiency estimate is updated after every answer: the
//! estimate moves up on a correct response and down on an incorrect
//! one, with the step scaled by the current standard error and the
//! item's discrimination. The standard error shrinks multiplicatively
//! per administered item and is clamped to a floor, so precision grows
//! monotonically but never claims to be infinite.
//!
//! The update rule is a coarse-grained stand-in for IRT scoring; all
//! constants are configurable so a calibrated deployment can tune them
//! (or swap in a maximum-likelihood estimator behind the same
//! contract).

use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Tunable constants for the ability update rule
///
/// Ability and difficulty share one fixed scale, `scale_min..=scale_max`
/// (0.0 to 10.0 by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Step size multiplier applied to (standard error x discrimination)
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Multiplicative shrink applied to the standard error per item
    #[serde(default = "default_se_decay")]
    pub se_decay: f64,
    /// Lower clamp for the standard error; never reached exactly zero
    #[serde(default = "default_se_floor")]
    pub se_floor: f64,
    /// Lower bound of the ability scale
    #[serde(default = "default_scale_min")]
    pub scale_min: f64,
    /// Upper bound of the ability scale
    #[serde(default = "default_scale_max")]
    pub scale_max: f64,
}

fn default_learning_rate() -> f64 {
    0.6
}

fn default_se_decay() -> f64 {
    0.9
}

fn default_se_floor() -> f64 {
    0.25
}

fn default_scale_min() -> f64 {
    0.0
}

fn default_scale_max() -> f64 {
    10.0
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            se_decay: default_se_decay(),
            se_floor: default_se_floor(),
            scale_min: default_scale_min(),
            scale_max: default_scale_max(),
        }
    }
}

/// Result of one estimator step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityUpdate {
    pub ability: f64,
    pub standard_error: f64,
}

/// Compute the post-response ability and standard error
///
/// Deterministic: the same inputs always produce the same update. The
/// returned standard error is `<=` the prior one (clamped to the
/// configured floor).
pub fn update(
    config: &EstimatorConfig,
    ability: f64,
    standard_error: f64,
    item: &Item,
    is_correct: bool,
) -> AbilityUpdate {
    let discrimination = item.discrimination.unwrap_or(1.0).max(0.0);
    let direction = if is_correct { 1.0 } else { -1.0 };

    // Larger gaps between ability and item difficulty carry more
    // information, so they nudge the estimate harder. The gap weight is
    // normalized by the scale width and kept >= 1 so a perfectly
    // matched item still moves the estimate.
    let scale_width = (config.scale_max - config.scale_min).abs().max(f64::EPSILON);
    let gap_weight = 1.0 + (item.difficulty - ability).abs() / scale_width;

    let step = config.learning_rate * standard_error * discrimination * gap_weight;
    let ability = (ability + direction * step).clamp(config.scale_min, config.scale_max);

    let standard_error = (standard_error * config.se_decay).max(config.se_floor);

    AbilityUpdate {
        ability,
        standard_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EstimatorConfig {
        EstimatorConfig::default()
    }

    #[test]
    fn correct_answer_raises_ability() {
        let update = update(&config(), 5.0, 1.0, &Item::new("q1", 5.0), true);
        assert!(update.ability > 5.0);
    }

    #[test]
    fn incorrect_answer_lowers_ability() {
        let update = update(&config(), 5.0, 1.0, &Item::new("q1", 5.0), false);
        assert!(update.ability < 5.0);
    }

    #[test]
    fn standard_error_decreases_each_step() {
        let cfg = config();
        let mut se = 1.0;
        let mut ability = 5.0;
        for i in 0..20 {
            let step = update(&cfg, ability, se, &Item::new(format!("q{i}"), 5.0), i % 2 == 0);
            assert!(step.standard_error <= se, "SE grew at step {i}");
            ability = step.ability;
            se = step.standard_error;
        }
    }

    #[test]
    fn standard_error_clamps_to_floor() {
        let cfg = config();
        let mut se = 1.0;
        for _ in 0..200 {
            se = update(&cfg, 5.0, se, &Item::new("q", 5.0), true).standard_error;
        }
        assert_eq!(se, cfg.se_floor);
        assert!(se > 0.0);
    }

    #[test]
    fn ability_stays_on_scale() {
        let cfg = config();
        let mut ability = 9.8;
        for _ in 0..50 {
            ability = update(&cfg, ability, 1.0, &Item::new("q", 10.0), true).ability;
        }
        assert!(ability <= cfg.scale_max);

        let mut ability = 0.2;
        for _ in 0..50 {
            ability = update(&cfg, ability, 1.0, &Item::new("q", 0.0), false).ability;
        }
        assert!(ability >= cfg.scale_min);
    }

    #[test]
    fn update_is_deterministic() {
        let cfg = config();
        let item = Item::new("q1", 6.3).with_discrimination(1.2);
        let a = update(&cfg, 5.1, 0.8, &item, true);
        let b = update(&cfg, 5.1, 0.8, &item, true);
        assert_eq!(a, b);
    }

    #[test]
    fn discrimination_scales_the_step() {
        let cfg = config();
        let sharp = update(&cfg, 5.0, 1.0, &Item::new("q1", 5.0).with_discrimination(2.0), true);
        let flat = update(&cfg, 5.0, 1.0, &Item::new("q1", 5.0).with_discrimination(0.5), true);
        assert!(sharp.ability - 5.0 > flat.ability - 5.0);
    }

    #[test]
    fn smaller_standard_error_means_smaller_steps() {
        let cfg = config();
        let early = update(&cfg, 5.0, 1.0, &Item::new("q1", 5.0), true);
        let late = update(&cfg, 5.0, 0.3, &Item::new("q1", 5.0), true);
        assert!(early.ability - 5.0 > late.ability - 5.0);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: EstimatorConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, EstimatorConfig::default());
    }
}
