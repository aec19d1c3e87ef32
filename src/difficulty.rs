use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::config::{CONSECUTIVE_CORRECT_THRESHOLD, CONSECUTIVE_INCORRECT_THRESHOLD, EngineConfig};
use crate::error::{InvalidDifficultyRangeSnafu, Result};
use crate::progress::QuestionStat;

/// Serving difficulty of a question, ordered `Easy < Medium < Hard`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    const SCALE: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn easier(self) -> Self {
        Self::SCALE[self.index().saturating_sub(1)]
    }

    pub fn harder(self) -> Self {
        Self::SCALE[(self.index() + 1).min(Self::SCALE.len() - 1)]
    }
}

/// Inclusive band of authored difficulties a session may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DifficultyRange {
    min: Difficulty,
    max: Difficulty,
}

impl DifficultyRange {
    pub fn new(min: Difficulty, max: Difficulty) -> Result<Self> {
        ensure!(
            min <= max,
            InvalidDifficultyRangeSnafu {
                min: min.as_ref(),
                max: max.as_ref(),
            }
        );
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Difficulty {
        self.min
    }

    pub fn max(&self) -> Difficulty {
        self.max
    }

    pub fn contains(&self, difficulty: Difficulty) -> bool {
        (self.min..=self.max).contains(&difficulty)
    }
}

/// Moves serving difficulty one step at a time in response to answer streaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyAdjuster {
    incorrect_threshold: u32,
    correct_threshold: u32,
}

impl Default for DifficultyAdjuster {
    fn default() -> Self {
        Self {
            incorrect_threshold: CONSECUTIVE_INCORRECT_THRESHOLD,
            correct_threshold: CONSECUTIVE_CORRECT_THRESHOLD,
        }
    }
}

impl DifficultyAdjuster {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            incorrect_threshold: config.incorrect_streak_threshold,
            correct_threshold: config.correct_streak_threshold,
        }
    }

    /// The incorrect streak is checked first, so it wins if both counters are
    /// elevated. At most one step is taken per call.
    pub fn apply(
        &self,
        current: Difficulty,
        consecutive_correct: u32,
        consecutive_incorrect: u32,
    ) -> Difficulty {
        let next = if consecutive_incorrect >= self.incorrect_threshold {
            current.easier()
        } else if consecutive_correct >= self.correct_threshold {
            current.harder()
        } else {
            current
        };
        if next != current {
            debug!(
                "difficulty {current} -> {next} (correct streak {consecutive_correct}, incorrect streak {consecutive_incorrect})"
            );
        }
        next
    }
    /// Advances the streak counters for one answer, then re-evaluates the
    /// serving difficulty. Counters are left as they are after a move.
    pub fn record_answer(
        &self,
        stat: &QuestionStat,
        correct: bool,
        now: DateTime<Utc>,
    ) -> QuestionStat {
        let mut next = stat.clone();
        if correct {
            next.consecutive_correct = stat.consecutive_correct.saturating_add(1);
            next.consecutive_incorrect = 0;
            next.last_correct_at = Some(now);
        } else {
            next.consecutive_correct = 0;
            next.consecutive_incorrect = stat.consecutive_incorrect.saturating_add(1);
            next.last_incorrect_at = Some(now);
        }
        next.current_difficulty = self.apply(
            stat.current_difficulty,
            next.consecutive_correct,
            next.consecutive_incorrect,
        );
        next
    }
}

/// [`DifficultyAdjuster::apply`] with the default streak thresholds.
pub fn adjust_difficulty(
    current: Difficulty,
    consecutive_correct: u32,
    consecutive_incorrect: u32,
) -> Difficulty {
    DifficultyAdjuster::default().apply(current, consecutive_correct, consecutive_incorrect)
}

/// Current run of same-outcome answers. At most one side is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streak {
    pub correct: u32,
    pub incorrect: u32,
}

impl Streak {
    /// Builds the streak from answer outcomes ordered newest first; only the
    /// leading run of identical outcomes counts.
    pub fn from_outcomes<I>(newest_first: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut outcomes = newest_first.into_iter().peekable();
        let Some(&latest) = outcomes.peek() else {
            return Self::default();
        };
        let run = outcomes.take_while(|&correct| correct == latest).count() as u32;
        if latest {
            Self {
                correct: run,
                incorrect: 0,
            }
        } else {
            Self {
                correct: 0,
                incorrect: run,
            }
        }
    }

    /// Extends the streak by one answer, resetting the opposite side.
    pub fn push(self, correct: bool) -> Self {
        if correct {
            Self {
                correct: self.correct.saturating_add(1),
                incorrect: 0,
            }
        } else {
            Self {
                correct: 0,
                incorrect: self.incorrect.saturating_add(1),
            }
        }
    }
}
