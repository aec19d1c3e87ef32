use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use priority_queue::PriorityQueue;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use strum::IntoEnumIterator;

use crate::config::{DEFAULT_EXCLUDE_RECENT_DAYS, EngineConfig};
use crate::difficulty::{Difficulty, DifficultyRange};
use crate::distribution::{Distribution, DistributionPlanner};
use crate::error::{EngineError, NegativeCountSnafu, Result};
use crate::mastery::{Category, MasteryClassifier};
use crate::progress::{QuestionStat, non_negative, parse_difficulty};
use crate::recency::is_excluded;

/// A practice question as far as selection is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub domain_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    /// Authored difficulty.
    pub difficulty: Difficulty,
}

/// Parameters of one practice session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionRequestRecord")]
pub struct SessionRequest {
    pub total_count: usize,
    pub domain_filter: Option<String>,
    pub task_filter: Option<String>,
    /// Questions answered correctly within this many days are skipped.
    pub exclude_days: u32,
    pub difficulty_range: Option<DifficultyRange>,
    /// When set, the result is shuffled with an RNG seeded from this value.
    pub shuffle_seed: Option<u64>,
}

impl SessionRequest {
    pub fn new(total_count: usize) -> Self {
        Self {
            total_count,
            domain_filter: None,
            task_filter: None,
            exclude_days: DEFAULT_EXCLUDE_RECENT_DAYS,
            difficulty_range: None,
            shuffle_seed: None,
        }
    }

    pub fn with_domain(mut self, domain_id: impl Into<String>) -> Self {
        self.domain_filter = Some(domain_id.into());
        self
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_filter = Some(task_id.into());
        self
    }

    pub fn excluding_days(mut self, exclude_days: u32) -> Self {
        self.exclude_days = exclude_days;
        self
    }

    pub fn with_difficulty_range(mut self, range: DifficultyRange) -> Self {
        self.difficulty_range = Some(range);
        self
    }

    pub fn shuffled(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    fn admits(&self, question: &Question) -> bool {
        self.domain_filter
            .as_ref()
            .is_none_or(|domain| *domain == question.domain_id)
            && self
                .task_filter
                .as_ref()
                .is_none_or(|task| question.task_id.as_ref() == Some(task))
            && self
                .difficulty_range
                .is_none_or(|range| range.contains(question.difficulty))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequestRecord {
    pub total_count: i64,
    #[serde(default)]
    pub domain_filter: Option<String>,
    #[serde(default)]
    pub task_filter: Option<String>,
    #[serde(default)]
    pub exclude_days: Option<i64>,
    #[serde(default)]
    pub difficulty_range: Option<DifficultyRangeRecord>,
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyRangeRecord {
    pub min: String,
    pub max: String,
}

impl TryFrom<SessionRequestRecord> for SessionRequest {
    type Error = EngineError;

    fn try_from(record: SessionRequestRecord) -> Result<Self> {
        ensure!(
            record.total_count >= 0,
            NegativeCountSnafu {
                field: "totalCount",
                value: record.total_count,
            }
        );
        let exclude_days = match record.exclude_days {
            Some(days) => non_negative("excludeDays", days)?,
            None => DEFAULT_EXCLUDE_RECENT_DAYS,
        };
        let difficulty_range = record
            .difficulty_range
            .map(|range| {
                DifficultyRange::new(parse_difficulty(&range.min)?, parse_difficulty(&range.max)?)
            })
            .transpose()?;
        Ok(Self {
            total_count: usize::try_from(record.total_count).unwrap_or(usize::MAX),
            domain_filter: record.domain_filter,
            task_filter: record.task_filter,
            exclude_days,
            difficulty_range,
            shuffle_seed: record.shuffle_seed,
        })
    }
}

/// One question chosen for a session, with the reason it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedQuestion {
    pub question: Question,
    pub reason: Category,
    /// The user's stored serving difficulty for this question.
    pub serving_difficulty: Difficulty,
}

/// Builds practice sessions from a question pool and the user's stats.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSelector {
    classifier: MasteryClassifier,
    planner: DistributionPlanner,
    default_exclude_days: u32,
}

impl Default for QuestionSelector {
    fn default() -> Self {
        Self {
            classifier: MasteryClassifier::default(),
            planner: DistributionPlanner::default(),
            default_exclude_days: DEFAULT_EXCLUDE_RECENT_DAYS,
        }
    }
}

impl QuestionSelector {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: MasteryClassifier::new(config),
            planner: DistributionPlanner::new(config),
            default_exclude_days: config.default_exclude_days,
        })
    }

    /// A request for `total_count` questions using the configured exclusion
    /// window.
    pub fn session(&self, total_count: usize) -> SessionRequest {
        SessionRequest::new(total_count).excluding_days(self.default_exclude_days)
    }

    /// Picks up to `request.total_count` questions: gap questions first, then
    /// maintenance, then stretch. Categories that run short hand their
    /// deficit to the others; if the whole pool is short the result is short.
    ///
    /// Questions without a stat are treated as never seen. Fails only when a
    /// stat carries a mastery level outside 0..=100.
    pub fn select(
        &self,
        pool: &[Question],
        stats: &[QuestionStat],
        request: &SessionRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<SelectedQuestion>> {
        let stats: HashMap<&str, &QuestionStat> = stats
            .iter()
            .map(|stat| (stat.question_id.as_str(), stat))
            .collect();
        let unseen = QuestionStat::new("");

        let mut partitions: [Vec<Candidate>; 3] = Default::default();
        let mut excluded = 0;
        for (position, question) in pool
            .iter()
            .enumerate()
            .filter(|(_, question)| request.admits(question))
        {
            let stat = stats.get(question.id.as_str()).copied().unwrap_or(&unseen);
            let category = self.classifier.try_categorize(stat.mastery_level)?;
            if is_excluded(stat.last_correct_at, request.exclude_days, now) {
                excluded += 1;
                continue;
            }
            partitions[category.index()].push(Candidate {
                position,
                question,
                stat,
            });
        }

        let available = partitions.each_ref().map(Vec::len);
        let targets = self.planner.plan(request.total_count);
        let quotas = fill_quotas(&targets, available);

        let mut selected = Vec::with_capacity(quotas.iter().sum());
        for (category, candidates) in Category::iter().zip(&partitions) {
            let drawn = draw(candidates, quotas[category.index()], category);
            selected.extend(drawn.into_iter().map(|candidate| SelectedQuestion {
                question: candidate.question.clone(),
                reason: category,
                serving_difficulty: candidate.stat.current_difficulty,
            }));
        }

        debug!(
            "selected {} of {} requested: {} gap, {} maintenance, {} stretch ({excluded} recently correct skipped)",
            selected.len(),
            request.total_count,
            quotas[Category::Gap.index()],
            quotas[Category::Maintenance.index()],
            quotas[Category::Stretch.index()],
        );
        if selected.len() < request.total_count {
            warn!(
                "only {} eligible questions for a session of {}",
                selected.len(),
                request.total_count
            );
        }

        if let Some(seed) = request.shuffle_seed {
            selected.shuffle(&mut StdRng::seed_from_u64(seed));
        }
        Ok(selected)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    position: usize,
    question: &'a Question,
    stat: &'a QuestionStat,
}

/// Higher ranks are drawn first.
type Rank = (bool, Option<DateTime<Utc>>, i8, Reverse<usize>);

impl Candidate<'_> {
    /// Matching serving difficulty first, then the most recently missed, then
    /// hardest-first for stretch and easiest-first otherwise, then pool order.
    fn rank(&self, category: Category) -> Rank {
        let matches = self.question.difficulty == self.stat.current_difficulty;
        let difficulty = self.question.difficulty.index() as i8;
        let lean = match category {
            Category::Stretch => difficulty,
            Category::Gap | Category::Maintenance => -difficulty,
        };
        (
            matches,
            self.stat.last_incorrect_at,
            lean,
            Reverse(self.position),
        )
    }
}

fn draw<'a>(
    candidates: &[Candidate<'a>],
    quota: usize,
    category: Category,
) -> Vec<Candidate<'a>> {
    let mut queue = PriorityQueue::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        queue.push(index, candidate.rank(category));
    }
    queue
        .into_sorted_iter()
        .take(quota)
        .map(|(index, _)| candidates[index])
        .collect()
}

/// Caps each target at what is available, then hands every deficit to the
/// other categories in their backfill order.
fn fill_quotas(targets: &Distribution, available: [usize; 3]) -> [usize; 3] {
    let mut quotas = [0; 3];
    let mut deficits = [0; 3];
    for category in Category::iter() {
        let (target, supply) = (targets.get(category), available[category.index()]);
        quotas[category.index()] = target.min(supply);
        deficits[category.index()] = target.saturating_sub(supply);
    }
    for category in Category::iter() {
        let mut deficit = deficits[category.index()];
        for other in category.backfill_order() {
            if deficit == 0 {
                break;
            }
            let room = available[other.index()] - quotas[other.index()];
            let taken = room.min(deficit);
            if taken > 0 {
                debug!("{other} absorbs {taken} of the {category} shortfall");
            }
            quotas[other.index()] += taken;
            deficit -= taken;
        }
    }
    quotas
}
