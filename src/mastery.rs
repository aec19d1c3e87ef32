use serde::{Deserialize, Serialize};
use snafu::ensure;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::config::{EngineConfig, MASTERY_THRESHOLD, STRETCH_THRESHOLD};
use crate::error::{InvalidMasteryLevelSnafu, Result};

/// Selection bucket for a question, derived from the user's mastery of it.
/// The declaration order is also the order categories appear in a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    /// Not yet learned.
    Gap,
    /// Learned, needs periodic reinforcement.
    Maintenance,
    /// Ready for challenge content.
    Stretch,
}

impl Category {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Categories that absorb this one's shortfall, in the order they are tried.
    pub fn backfill_order(self) -> [Category; 2] {
        match self {
            Category::Gap => [Category::Maintenance, Category::Stretch],
            Category::Maintenance => [Category::Gap, Category::Stretch],
            Category::Stretch => [Category::Maintenance, Category::Gap],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasteryClassifier {
    mastery_threshold: f64,
    stretch_threshold: f64,
}

impl Default for MasteryClassifier {
    fn default() -> Self {
        Self {
            mastery_threshold: MASTERY_THRESHOLD,
            stretch_threshold: STRETCH_THRESHOLD,
        }
    }
}

impl MasteryClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            mastery_threshold: config.mastery_threshold,
            stretch_threshold: config.stretch_threshold,
        }
    }

    /// Intervals are closed-open; a level sitting exactly on a threshold
    /// belongs to the higher category.
    ///
    /// The level is not range-checked: values above 100 and NaN land in
    /// [`Category::Stretch`], negatives in [`Category::Gap`]. Use
    /// [`MasteryClassifier::try_categorize`] for levels read from a store.
    pub fn categorize(&self, mastery_level: f64) -> Category {
        if mastery_level < self.mastery_threshold {
            Category::Gap
        } else if mastery_level < self.stretch_threshold {
            Category::Maintenance
        } else {
            Category::Stretch
        }
    }

    pub fn try_categorize(&self, mastery_level: f64) -> Result<Category> {
        check_mastery_level(mastery_level)?;
        Ok(self.categorize(mastery_level))
    }
}

/// Categorizes with the default thresholds.
pub fn categorize(mastery_level: f64) -> Category {
    MasteryClassifier::default().categorize(mastery_level)
}

pub(crate) fn check_mastery_level(mastery_level: f64) -> Result<()> {
    ensure!(
        (0.0..=100.0).contains(&mastery_level),
        InvalidMasteryLevelSnafu {
            value: mastery_level
        }
    );
    Ok(())
}
