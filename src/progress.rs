use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ensure};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::config::{BOX_INTERVALS, MAX_BOX, MIN_BOX};
use crate::difficulty::{Difficulty, DifficultyAdjuster};
use crate::error::{
    EngineError, InvalidBoxSnafu, InvalidTimestampSnafu, NegativeCountSnafu, Result,
    UnknownDifficultySnafu, UnknownRatingSnafu,
};
use crate::mastery::check_mastery_level;

/// How well a flashcard was recalled.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

/// Leitner progress of one user on one flashcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CardProgressRecord", into = "CardProgressRecord")]
pub struct CardProgress {
    /// Always within 1..=5.
    pub leitner_box: u8,
    pub repetitions: u32,
    pub interval_days: u32,
    pub due_at: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
    pub last_rating: Rating,
}

impl CardProgress {
    /// Progress for a card seen for the first time. It is due immediately; the
    /// initial rating carries no meaning.
    pub fn create_initial(now: DateTime<Utc>) -> Self {
        Self {
            leitner_box: MIN_BOX,
            repetitions: 0,
            interval_days: BOX_INTERVALS[0],
            due_at: now,
            last_reviewed_at: now,
            last_rating: Rating::Good,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.due_at
    }

    pub(crate) fn check(&self) -> Result<()> {
        check_box(i64::from(self.leitner_box))
    }
}

/// Per-question answer history of one user, as consumed by the selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionStatRecord", into = "QuestionStatRecord")]
pub struct QuestionStat {
    pub question_id: String,
    /// 0..=100, maintained outside the engine.
    pub mastery_level: f64,
    pub consecutive_correct: u32,
    pub consecutive_incorrect: u32,
    pub last_correct_at: Option<DateTime<Utc>>,
    pub last_incorrect_at: Option<DateTime<Utc>>,
    pub current_difficulty: Difficulty,
}

impl QuestionStat {
    /// Stat for a question the user has never answered. Mastery 0 routes it to
    /// the gap category.
    pub fn new(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            mastery_level: 0.0,
            consecutive_correct: 0,
            consecutive_incorrect: 0,
            last_correct_at: None,
            last_incorrect_at: None,
            current_difficulty: Difficulty::Medium,
        }
    }

    /// Records one answer with the default streak thresholds.
    pub fn record_answer(&self, correct: bool, now: DateTime<Utc>) -> Self {
        DifficultyAdjuster::default().record_answer(self, correct, now)
    }
}

/// Wire shape of [`CardProgress`] as kept by the progress store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProgressRecord {
    #[serde(rename = "box")]
    pub leitner_box: i64,
    pub repetitions: i64,
    pub interval_days: i64,
    #[serde(rename = "dueDateISO")]
    pub due_date: String,
    #[serde(rename = "lastReviewedISO")]
    pub last_reviewed: String,
    pub last_rating: String,
}

impl TryFrom<CardProgressRecord> for CardProgress {
    type Error = EngineError;

    fn try_from(record: CardProgressRecord) -> Result<Self> {
        check_box(record.leitner_box)?;
        Ok(Self {
            leitner_box: record.leitner_box as u8,
            repetitions: non_negative("repetitions", record.repetitions)?,
            interval_days: non_negative("intervalDays", record.interval_days)?,
            due_at: parse_timestamp(&record.due_date)?,
            last_reviewed_at: parse_timestamp(&record.last_reviewed)?,
            last_rating: record
                .last_rating
                .parse::<Rating>()
                .ok()
                .context(UnknownRatingSnafu {
                    value: &record.last_rating,
                })?,
        })
    }
}

impl From<CardProgress> for CardProgressRecord {
    fn from(progress: CardProgress) -> Self {
        Self {
            leitner_box: i64::from(progress.leitner_box),
            repetitions: i64::from(progress.repetitions),
            interval_days: i64::from(progress.interval_days),
            due_date: progress.due_at.to_rfc3339(),
            last_reviewed: progress.last_reviewed_at.to_rfc3339(),
            last_rating: progress.last_rating.to_string(),
        }
    }
}

/// Wire shape of [`QuestionStat`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStatRecord {
    pub question_id: String,
    pub mastery_level: f64,
    pub consecutive_correct: i64,
    pub consecutive_incorrect: i64,
    #[serde(default)]
    pub last_correct_at: Option<String>,
    #[serde(default)]
    pub last_incorrect_at: Option<String>,
    pub current_difficulty: String,
}

impl TryFrom<QuestionStatRecord> for QuestionStat {
    type Error = EngineError;

    fn try_from(record: QuestionStatRecord) -> Result<Self> {
        check_mastery_level(record.mastery_level)?;
        Ok(Self {
            consecutive_correct: non_negative("consecutiveCorrect", record.consecutive_correct)?,
            consecutive_incorrect: non_negative(
                "consecutiveIncorrect",
                record.consecutive_incorrect,
            )?,
            last_correct_at: record
                .last_correct_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            last_incorrect_at: record
                .last_incorrect_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            current_difficulty: parse_difficulty(&record.current_difficulty)?,
            mastery_level: record.mastery_level,
            question_id: record.question_id,
        })
    }
}

impl From<QuestionStat> for QuestionStatRecord {
    fn from(stat: QuestionStat) -> Self {
        Self {
            question_id: stat.question_id,
            mastery_level: stat.mastery_level,
            consecutive_correct: i64::from(stat.consecutive_correct),
            consecutive_incorrect: i64::from(stat.consecutive_incorrect),
            last_correct_at: stat.last_correct_at.map(|t| t.to_rfc3339()),
            last_incorrect_at: stat.last_incorrect_at.map(|t| t.to_rfc3339()),
            current_difficulty: stat.current_difficulty.to_string(),
        }
    }
}

pub(crate) fn check_box(value: i64) -> Result<()> {
    ensure!(
        (i64::from(MIN_BOX)..=i64::from(MAX_BOX)).contains(&value),
        InvalidBoxSnafu { value }
    );
    Ok(())
}

pub(crate) fn non_negative(field: &'static str, value: i64) -> Result<u32> {
    ensure!(value >= 0, NegativeCountSnafu { field, value });
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .context(InvalidTimestampSnafu { value })
}

pub(crate) fn parse_difficulty(value: &str) -> Result<Difficulty> {
    value
        .parse::<Difficulty>()
        .ok()
        .context(UnknownDifficultySnafu { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{days_ago, now};

    #[test]
    fn initial_card_is_due_immediately() {
        let progress = CardProgress::create_initial(now());
        assert_eq!(progress.leitner_box, 1);
        assert_eq!(progress.repetitions, 0);
        assert!(progress.is_due(now()));
    }

    #[test]
    fn card_record_round_trips_through_json() {
        let json = r#"{
            "box": 3,
            "repetitions": 4,
            "intervalDays": 7,
            "dueDateISO": "2024-05-08T09:00:00Z",
            "lastReviewedISO": "2024-05-01T09:00:00Z",
            "lastRating": "good"
        }"#;
        let progress: CardProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.leitner_box, 3);
        assert_eq!(progress.last_rating, Rating::Good);
        assert_eq!(progress.due_at.to_rfc3339(), "2024-05-08T09:00:00+00:00");

        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["box"], 3);
        assert_eq!(value["lastRating"], "good");
    }

    #[test]
    fn card_record_with_bad_box_is_rejected() {
        let record = CardProgressRecord {
            leitner_box: 6,
            repetitions: 0,
            interval_days: 1,
            due_date: "2024-05-08T09:00:00Z".into(),
            last_reviewed: "2024-05-01T09:00:00Z".into(),
            last_rating: "good".into(),
        };
        assert_eq!(
            CardProgress::try_from(record),
            Err(EngineError::InvalidBox { value: 6 })
        );
    }

    #[test]
    fn card_record_with_unknown_rating_is_rejected() {
        let record = CardProgressRecord {
            leitner_box: 2,
            repetitions: 1,
            interval_days: 3,
            due_date: "2024-05-08T09:00:00Z".into(),
            last_reviewed: "2024-05-01T09:00:00Z".into(),
            last_rating: "perfect".into(),
        };
        assert_eq!(
            CardProgress::try_from(record),
            Err(EngineError::UnknownRating {
                value: "perfect".into()
            })
        );
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        assert_eq!(
            parse_timestamp("yesterday"),
            Err(EngineError::InvalidTimestamp {
                value: "yesterday".into()
            })
        );
    }

    #[test]
    fn negative_counter_is_rejected() {
        let json = r#"{
            "questionId": "q1",
            "masteryLevel": 40.0,
            "consecutiveCorrect": -1,
            "consecutiveIncorrect": 0,
            "currentDifficulty": "MEDIUM"
        }"#;
        let err = serde_json::from_str::<QuestionStat>(json).unwrap_err();
        assert!(err.to_string().contains("consecutiveCorrect must not be negative"));
    }

    #[test]
    fn stat_record_parses_optional_timestamps() {
        let json = r#"{
            "questionId": "q1",
            "masteryLevel": 72.5,
            "consecutiveCorrect": 2,
            "consecutiveIncorrect": 0,
            "lastCorrectAt": "2024-05-10T12:00:00Z",
            "currentDifficulty": "HARD"
        }"#;
        let stat: QuestionStat = serde_json::from_str(json).unwrap();
        assert_eq!(stat.current_difficulty, Difficulty::Hard);
        assert!(stat.last_correct_at.is_some());
        assert_eq!(stat.last_incorrect_at, None);
    }

    #[test]
    fn stat_record_rejects_lowercase_difficulty() {
        let record = QuestionStatRecord {
            question_id: "q1".into(),
            mastery_level: 10.0,
            consecutive_correct: 0,
            consecutive_incorrect: 0,
            last_correct_at: None,
            last_incorrect_at: None,
            current_difficulty: "medium".into(),
        };
        assert_eq!(
            QuestionStat::try_from(record),
            Err(EngineError::UnknownDifficulty {
                value: "medium".into()
            })
        );
    }

    #[test]
    fn new_stat_is_a_medium_gap() {
        let stat = QuestionStat::new("q9");
        assert_eq!(stat.mastery_level, 0.0);
        assert_eq!(stat.current_difficulty, Difficulty::Medium);
        assert_eq!(stat.last_correct_at, None);
    }

    #[test]
    fn answers_reset_the_opposite_counter() {
        let stat = QuestionStat {
            consecutive_incorrect: 2,
            ..QuestionStat::new("q1")
        };
        let stat = stat.record_answer(true, now());
        assert_eq!(stat.consecutive_correct, 1);
        assert_eq!(stat.consecutive_incorrect, 0);
        assert_eq!(stat.last_correct_at, Some(now()));

        let stat = stat.record_answer(false, now());
        assert_eq!(stat.consecutive_correct, 0);
        assert_eq!(stat.consecutive_incorrect, 1);
        assert_eq!(stat.last_incorrect_at, Some(now()));
        assert_eq!(stat.last_correct_at, Some(now()));
    }

    #[test]
    fn fifth_correct_answer_raises_difficulty() {
        let mut stat = QuestionStat::new("q1");
        for i in 1..=4 {
            stat = stat.record_answer(true, days_ago(10 - i));
            assert_eq!(stat.current_difficulty, Difficulty::Medium);
        }
        stat = stat.record_answer(true, now());
        assert_eq!(stat.current_difficulty, Difficulty::Hard);
        stat = stat.record_answer(true, now());
        assert_eq!(stat.current_difficulty, Difficulty::Hard);
    }

    #[test]
    fn each_answer_past_the_threshold_moves_one_more_step() {
        let mut stat = QuestionStat {
            current_difficulty: Difficulty::Hard,
            ..QuestionStat::new("q1")
        };
        let mut seen = Vec::new();
        for _ in 0..5 {
            stat = stat.record_answer(false, now());
            seen.push(stat.current_difficulty);
        }
        assert_eq!(
            seen,
            [
                Difficulty::Hard,
                Difficulty::Hard,
                Difficulty::Medium,
                Difficulty::Easy,
                Difficulty::Easy
            ]
        );
    }
}
