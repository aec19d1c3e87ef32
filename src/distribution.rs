use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, GAP_PERCENTAGE, MAINTENANCE_PERCENTAGE};
use crate::mastery::Category;

/// Question counts per category for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub gap: usize,
    pub maintenance: usize,
    pub stretch: usize,
}

impl Distribution {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Gap => self.gap,
            Category::Maintenance => self.maintenance,
            Category::Stretch => self.stretch,
        }
    }

    pub fn total(&self) -> usize {
        self.gap + self.maintenance + self.stretch
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionPlanner {
    gap_ratio: f64,
    maintenance_ratio: f64,
}

impl Default for DistributionPlanner {
    fn default() -> Self {
        Self {
            gap_ratio: GAP_PERCENTAGE,
            maintenance_ratio: MAINTENANCE_PERCENTAGE,
        }
    }
}

impl DistributionPlanner {
    /// The stretch ratio is implied: stretch takes whatever gap and
    /// maintenance leave over.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            gap_ratio: config.gap_ratio,
            maintenance_ratio: config.maintenance_ratio,
        }
    }

    pub fn plan(&self, total_count: usize) -> Distribution {
        let gap = share(total_count, self.gap_ratio).min(total_count);
        // Only binds for custom ratios; the defaults never round past the total.
        let maintenance = share(total_count, self.maintenance_ratio).min(total_count - gap);
        Distribution {
            gap,
            maintenance,
            stretch: total_count - gap - maintenance,
        }
    }
}

/// Plans with the default 60/25/15 split.
pub fn plan(total_count: usize) -> Distribution {
    DistributionPlanner::default().plan(total_count)
}

fn share(total_count: usize, ratio: f64) -> usize {
    (total_count as f64 * ratio).round() as usize
}
