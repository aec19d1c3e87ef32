mod catalog;
mod config;
mod difficulty;
mod distribution;
mod error;
mod mastery;
mod progress;
mod recency;
mod scheduler;
mod selector;
#[cfg(test)]
mod test_helpers;

pub use catalog::{Catalog, ContentCache, ContentSource, Domain, Task};
pub use config::{
    BOX_INTERVALS, CONSECUTIVE_CORRECT_THRESHOLD, CONSECUTIVE_INCORRECT_THRESHOLD,
    DEFAULT_EXCLUDE_RECENT_DAYS, EngineConfig, GAP_PERCENTAGE, MAINTENANCE_PERCENTAGE,
    MASTERY_THRESHOLD, MAX_BOX, MAX_INTERVAL_DAYS, MIN_BOX, STRETCH_PERCENTAGE, STRETCH_THRESHOLD,
};
pub use difficulty::{
    Difficulty, DifficultyAdjuster, DifficultyRange, Streak, adjust_difficulty,
};
pub use distribution::{Distribution, DistributionPlanner, plan};
pub use error::{EngineError, Result};
pub use mastery::{Category, MasteryClassifier, categorize};
pub use progress::{CardProgress, CardProgressRecord, QuestionStat, QuestionStatRecord, Rating};
pub use recency::is_excluded;
pub use scheduler::{CardScheduler, due_cards, due_cards_by_box, mastery_percentage};
pub use selector::{
    DifficultyRangeRecord, Question, QuestionSelector, SelectedQuestion, SessionRequest,
    SessionRequestRecord,
};
