use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{InvalidConfigSnafu, Result};

/// Review interval in days for Leitner boxes 1 through 5.
pub const BOX_INTERVALS: [u32; 5] = [1, 3, 7, 14, 30];
/// Longest interval a config may assign to a box, about a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;
pub const MIN_BOX: u8 = 1;
pub const MAX_BOX: u8 = 5;

/// Mastery below this is a knowledge gap.
pub const MASTERY_THRESHOLD: f64 = 70.0;
/// Mastery at or above this is ready for stretch questions.
pub const STRETCH_THRESHOLD: f64 = 85.0;

pub const GAP_PERCENTAGE: f64 = 0.60;
pub const MAINTENANCE_PERCENTAGE: f64 = 0.25;
pub const STRETCH_PERCENTAGE: f64 = 0.15;

pub const CONSECUTIVE_INCORRECT_THRESHOLD: u32 = 3;
pub const CONSECUTIVE_CORRECT_THRESHOLD: u32 = 5;

pub const DEFAULT_EXCLUDE_RECENT_DAYS: u32 = 7;

const RATIO_EPSILON: f64 = 1e-9;

/// Tunables shared by the scheduler and the selector. The defaults are the
/// production values; hosts may load overrides with serde and must call
/// [`EngineConfig::validate`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub box_intervals: [u32; 5],
    pub mastery_threshold: f64,
    pub stretch_threshold: f64,
    pub gap_ratio: f64,
    pub maintenance_ratio: f64,
    pub stretch_ratio: f64,
    pub incorrect_streak_threshold: u32,
    pub correct_streak_threshold: u32,
    pub default_exclude_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            box_intervals: BOX_INTERVALS,
            mastery_threshold: MASTERY_THRESHOLD,
            stretch_threshold: STRETCH_THRESHOLD,
            gap_ratio: GAP_PERCENTAGE,
            maintenance_ratio: MAINTENANCE_PERCENTAGE,
            stretch_ratio: STRETCH_PERCENTAGE,
            incorrect_streak_threshold: CONSECUTIVE_INCORRECT_THRESHOLD,
            correct_streak_threshold: CONSECUTIVE_CORRECT_THRESHOLD,
            default_exclude_days: DEFAULT_EXCLUDE_RECENT_DAYS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.box_intervals[0] > 0,
            InvalidConfigSnafu {
                reason: "box intervals must be positive"
            }
        );
        ensure!(
            self.box_intervals.windows(2).all(|w| w[0] < w[1]),
            InvalidConfigSnafu {
                reason: "box intervals must be strictly increasing"
            }
        );
        ensure!(
            self.box_intervals[4] <= MAX_INTERVAL_DAYS,
            InvalidConfigSnafu {
                reason: "box intervals must not exceed 36500 days"
            }
        );
        ensure!(
            self.mastery_threshold > 0.0
                && self.mastery_threshold < self.stretch_threshold
                && self.stretch_threshold < 100.0,
            InvalidConfigSnafu {
                reason: "thresholds must satisfy 0 < mastery < stretch < 100"
            }
        );
        let ratios = [self.gap_ratio, self.maintenance_ratio, self.stretch_ratio];
        ensure!(
            ratios.iter().all(|r| (0.0..=1.0).contains(r)),
            InvalidConfigSnafu {
                reason: "distribution ratios must lie in 0..=1"
            }
        );
        ensure!(
            (ratios.iter().sum::<f64>() - 1.0).abs() < RATIO_EPSILON,
            InvalidConfigSnafu {
                reason: "distribution ratios must sum to 1"
            }
        );
        ensure!(
            self.incorrect_streak_threshold > 0 && self.correct_streak_threshold > 0,
            InvalidConfigSnafu {
                reason: "streak thresholds must be at least 1"
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_ratios_sum_to_one() {
        let config = EngineConfig::default();
        let sum = config.gap_ratio + config.maintenance_ratio + config.stretch_ratio;
        assert!((sum - 1.0).abs() < RATIO_EPSILON);
    }

    #[test]
    fn rejects_out_of_order_thresholds() {
        let config = EngineConfig {
            mastery_threshold: 90.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(EngineError::InvalidConfig {
                reason: "thresholds must satisfy 0 < mastery < stretch < 100"
            })
        );
    }

    #[test]
    fn rejects_ratios_that_do_not_sum_to_one() {
        let config = EngineConfig {
            stretch_ratio: 0.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_flat_box_intervals() {
        let config = EngineConfig {
            box_intervals: [1, 3, 3, 14, 30],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_intervals_past_a_century() {
        let config = EngineConfig {
            box_intervals: [1, 3, 7, 14, u32::MAX],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(EngineError::InvalidConfig {
                reason: "box intervals must not exceed 36500 days"
            })
        );
        let longest = EngineConfig {
            box_intervals: [1, 3, 7, 14, MAX_INTERVAL_DAYS],
            ..Default::default()
        };
        assert_eq!(longest.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_streak_threshold() {
        let config = EngineConfig {
            correct_streak_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_overrides_fill_from_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "mastery_threshold": 60.0 }"#).unwrap();
        assert_eq!(config.mastery_threshold, 60.0);
        assert_eq!(config.stretch_threshold, STRETCH_THRESHOLD);
        assert_eq!(config.box_intervals, BOX_INTERVALS);
    }
}
