use adaptive_learning::{
    Catalog, ContentCache, EngineConfig, Question, QuestionSelector, QuestionStat, SessionRequest,
};
use chrono::{Duration, Utc};

const CATALOG: &str = r#"{
    "domains": [
        { "id": "people", "name": "People" },
        { "id": "process", "name": "Process" }
    ],
    "tasks": [
        { "id": "conflict", "domainId": "people", "name": "Manage conflict" },
        { "id": "risk", "domainId": "process", "name": "Assess and manage risks" }
    ]
}"#;

const POOL: &str = r#"[
    { "id": "q1", "domainId": "people", "taskId": "conflict", "difficulty": "EASY" },
    { "id": "q2", "domainId": "people", "taskId": "conflict", "difficulty": "MEDIUM" },
    { "id": "q3", "domainId": "people", "taskId": "conflict", "difficulty": "HARD" },
    { "id": "q4", "domainId": "process", "taskId": "risk", "difficulty": "EASY" },
    { "id": "q5", "domainId": "process", "taskId": "risk", "difficulty": "MEDIUM" },
    { "id": "q6", "domainId": "process", "taskId": "risk", "difficulty": "HARD" },
    { "id": "q7", "domainId": "process", "difficulty": "MEDIUM" },
    { "id": "q8", "domainId": "process", "difficulty": "HARD" }
]"#;

fn init_logger() -> Result<(), Box<dyn std::error::Error>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn stats(now: chrono::DateTime<Utc>) -> Vec<QuestionStat> {
    let answered = |id: &str, outcomes: &[bool], days_ago: i64| {
        outcomes.iter().fold(QuestionStat::new(id), |stat, &correct| {
            stat.record_answer(correct, now - Duration::days(days_ago))
        })
    };
    vec![
        QuestionStat {
            mastery_level: 40.0,
            ..answered("q1", &[false, false, false], 10)
        },
        QuestionStat {
            mastery_level: 75.0,
            ..answered("q2", &[true, true], 12)
        },
        QuestionStat {
            mastery_level: 92.0,
            ..answered("q3", &[true, true, true, true, true], 2)
        },
        QuestionStat {
            mastery_level: 88.0,
            ..answered("q6", &[true], 20)
        },
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger()?;
    let now = Utc::now();

    let mut cache = ContentCache::new(|| -> adaptive_learning::Result<Catalog> {
        serde_json::from_str::<Catalog>(CATALOG).map_err(|err| {
            adaptive_learning::EngineError::ContentUnavailable {
                reason: err.to_string(),
            }
        })
    });
    let catalog = cache.get()?;

    let pool: Vec<Question> = serde_json::from_str(POOL)?;
    let selector = QuestionSelector::new(&EngineConfig::default())?;

    let everything = selector.session(6);
    catalog.check_request(&everything)?;
    println!("Mixed session:");
    for picked in selector.select(&pool, &stats(now), &everything, now)? {
        println!(
            "  {} ({}, {}) served at {}",
            picked.question.id, picked.reason, picked.question.difficulty, picked.serving_difficulty
        );
    }

    let request: SessionRequest = serde_json::from_str(
        r#"{ "totalCount": 3, "domainFilter": "process", "shuffleSeed": 7 }"#,
    )?;
    catalog.check_request(&request)?;
    println!("\nProcess domain, shuffled:");
    let session = selector.select(&pool, &stats(now), &request, now)?;
    println!("{}", serde_json::to_string_pretty(&session)?);

    Ok(())
}
