use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::difficulty::Difficulty;
use crate::progress::{CardProgress, QuestionStat};
use crate::selector::Question;

/// Fixed clock so tests never depend on wall time.
pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub(crate) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub(crate) fn card_in_box(leitner_box: u8) -> CardProgress {
    CardProgress {
        leitner_box,
        repetitions: 3,
        interval_days: crate::config::BOX_INTERVALS[usize::from(leitner_box.clamp(1, 5) - 1)],
        due_at: now(),
        last_reviewed_at: days_ago(1),
        ..CardProgress::create_initial(now())
    }
}

pub(crate) fn question(id: &str, domain_id: &str, difficulty: Difficulty) -> Question {
    Question {
        id: id.to_string(),
        domain_id: domain_id.to_string(),
        task_id: None,
        difficulty,
    }
}

pub(crate) fn stat(question_id: &str, mastery_level: f64) -> QuestionStat {
    QuestionStat {
        mastery_level,
        ..QuestionStat::new(question_id)
    }
}
