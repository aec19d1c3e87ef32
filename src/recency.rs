use chrono::{DateTime, Duration, Utc};

/// Whether a question answered correctly at `last_correct_at` is still inside
/// its exclusion window. Exactly `exclude_days` after the answer it becomes
/// eligible again; a question never answered correctly is never excluded.
pub fn is_excluded(
    last_correct_at: Option<DateTime<Utc>>,
    exclude_days: u32,
    now: DateTime<Utc>,
) -> bool {
    match last_correct_at {
        None => false,
        Some(answered_at) => now - answered_at < Duration::days(i64::from(exclude_days)),
    }
}
