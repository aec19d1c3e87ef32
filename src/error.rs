use snafu::Snafu;

#[derive(Snafu, Debug, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum EngineError {
    #[snafu(display("Leitner box {value} is outside 1..=5"))]
    InvalidBox { value: i64 },
    #[snafu(display("box {leitner_box} reviews every {expected} days, record says {interval_days}"))]
    IntervalMismatch {
        leitner_box: u8,
        interval_days: u32,
        expected: u32,
    },
    #[snafu(display("due date {days} days after the review is out of range"))]
    DueDateOutOfRange { days: u32 },
    #[snafu(display("mastery level {value} is outside 0..=100"))]
    InvalidMasteryLevel { value: f64 },
    #[snafu(display("{field} must not be negative, got {value}"))]
    NegativeCount { field: &'static str, value: i64 },
    #[snafu(display("malformed timestamp {value:?}"))]
    InvalidTimestamp { value: String },
    #[snafu(display("unknown rating {value:?}"))]
    UnknownRating { value: String },
    #[snafu(display("unknown difficulty {value:?}"))]
    UnknownDifficulty { value: String },
    #[snafu(display("difficulty range {min}..={max} is empty"))]
    InvalidDifficultyRange { min: String, max: String },
    #[snafu(display("invalid engine config: {reason}"))]
    InvalidConfig { reason: &'static str },
    #[snafu(display("unknown domain {id:?}"))]
    UnknownDomain { id: String },
    #[snafu(display("unknown task {id:?}"))]
    UnknownTask { id: String },
    #[snafu(display("content catalog unavailable: {reason}"))]
    ContentUnavailable { reason: String },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
