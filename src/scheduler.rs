use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use log::debug;
use snafu::{OptionExt, ensure};

use crate::config::{BOX_INTERVALS, EngineConfig, MAX_BOX, MIN_BOX};
use crate::error::{DueDateOutOfRangeSnafu, IntervalMismatchSnafu, Result};
use crate::progress::{CardProgress, CardProgressRecord, Rating};

/// Boxes at or above this count as mastered in [`mastery_percentage`].
const MASTERED_BOX: u8 = 4;

/// Leitner-box scheduler. Each box has a fixed review interval; ratings move a
/// card between boxes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardScheduler {
    box_intervals: [u32; 5],
}

impl Default for CardScheduler {
    fn default() -> Self {
        Self {
            box_intervals: BOX_INTERVALS,
        }
    }
}

impl CardScheduler {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            box_intervals: config.box_intervals,
        })
    }

    pub fn create_initial(&self, now: DateTime<Utc>) -> CardProgress {
        CardProgress {
            interval_days: self.box_intervals[0],
            ..CardProgress::create_initial(now)
        }
    }

    /// Interval of `leitner_box`, clamped into 1..=5.
    pub fn interval_days(&self, leitner_box: u8) -> u32 {
        self.box_intervals[usize::from(leitner_box.clamp(MIN_BOX, MAX_BOX) - MIN_BOX)]
    }

    /// Applies one review. Fails if `progress` holds a box outside 1..=5 or an
    /// interval that does not belong to its box.
    pub fn update(
        &self,
        progress: &CardProgress,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<CardProgress> {
        self.check(progress)?;
        let leitner_box = next_box(progress.leitner_box, rating);
        let interval_days = self.interval_days(leitner_box);
        let due_at = now
            .checked_add_signed(Duration::days(i64::from(interval_days)))
            .context(DueDateOutOfRangeSnafu {
                days: interval_days,
            })?;
        debug!(
            "rated {rating}: box {} -> {leitner_box}, next review in {interval_days} days",
            progress.leitner_box
        );
        Ok(CardProgress {
            leitner_box,
            repetitions: progress.repetitions.saturating_add(1),
            interval_days,
            due_at,
            last_reviewed_at: now,
            last_rating: rating,
        })
    }

    /// Decodes a stored record and checks its interval against this
    /// scheduler's table.
    pub fn restore(&self, record: CardProgressRecord) -> Result<CardProgress> {
        let progress = CardProgress::try_from(record)?;
        self.check(&progress)?;
        Ok(progress)
    }

    fn check(&self, progress: &CardProgress) -> Result<()> {
        progress.check()?;
        let expected = self.interval_days(progress.leitner_box);
        ensure!(
            progress.interval_days == expected,
            IntervalMismatchSnafu {
                leitner_box: progress.leitner_box,
                interval_days: progress.interval_days,
                expected,
            }
        );
        Ok(())
    }

    pub fn is_due(&self, progress: &CardProgress, now: DateTime<Utc>) -> bool {
        progress.is_due(now)
    }
}

/// `Again` always resets to box 1; no other rating lowers the box.
fn next_box(current: u8, rating: Rating) -> u8 {
    match rating {
        Rating::Again => MIN_BOX,
        Rating::Hard => current,
        Rating::Good => (current + 1).min(MAX_BOX),
        Rating::Easy => (current + 2).min(MAX_BOX),
    }
}

/// Ids of the cards due at `now`, sorted.
pub fn due_cards(cards: &HashMap<String, CardProgress>, now: DateTime<Utc>) -> Vec<String> {
    cards
        .iter()
        .filter(|(_, progress)| progress.is_due(now))
        .map(|(id, _)| id.clone())
        .sorted()
        .collect()
}

/// Number of due cards in each box; index 0 is box 1.
pub fn due_cards_by_box(
    cards: &HashMap<String, CardProgress>,
    now: DateTime<Utc>,
) -> [usize; 5] {
    let mut counts = [0; 5];
    let due_by_box = cards
        .values()
        .filter(|progress| progress.is_due(now))
        .counts_by(|progress| progress.leitner_box);
    for (leitner_box, count) in due_by_box {
        if (MIN_BOX..=MAX_BOX).contains(&leitner_box) {
            counts[usize::from(leitner_box - MIN_BOX)] = count;
        }
    }
    counts
}

/// Share of cards in box 4 or higher, as a rounded percentage.
pub fn mastery_percentage(cards: &HashMap<String, CardProgress>) -> u32 {
    if cards.is_empty() {
        return 0;
    }
    let mastered = cards
        .values()
        .filter(|progress| progress.leitner_box >= MASTERED_BOX)
        .count();
    (mastered as f64 / cards.len() as f64 * 100.0).round() as u32
}
