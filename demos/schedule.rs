use std::collections::HashMap;

use adaptive_learning::{
    CardProgress, CardScheduler, Rating, due_cards, due_cards_by_box, mastery_percentage,
};
use chrono::{Duration, Utc};

fn init_logger() -> Result<(), Box<dyn std::error::Error>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn review_new_card(scheduler: &CardScheduler) -> Result<(), Box<dyn std::error::Error>> {
    let mut now = Utc::now();
    let mut card = scheduler.create_initial(now);
    println!("New card: box {}, due {}", card.leitner_box, card.due_at);

    // Answer it every time it comes due.
    for rating in [Rating::Good, Rating::Good, Rating::Again, Rating::Easy, Rating::Good] {
        now = card.due_at;
        card = scheduler.update(&card, rating, now)?;
        println!(
            "Rated {rating}: box {}, next review in {} days ({})",
            card.leitner_box, card.interval_days, card.due_at
        );
    }
    Ok(())
}

fn deck_overview(scheduler: &CardScheduler) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let mut deck: HashMap<String, CardProgress> = HashMap::new();
    for (index, ratings) in [
        vec![Rating::Good, Rating::Good, Rating::Good],
        vec![Rating::Easy, Rating::Easy],
        vec![Rating::Again],
        vec![Rating::Hard, Rating::Good],
        vec![],
    ]
    .into_iter()
    .enumerate()
    {
        let mut card = scheduler.create_initial(now - Duration::days(60));
        for rating in ratings {
            card = scheduler.update(&card, rating, now - Duration::days(40))?;
        }
        deck.insert(format!("card-{index}"), card);
    }

    println!("Due now: {:?}", due_cards(&deck, now));
    println!("Due by box: {:?}", due_cards_by_box(&deck, now));
    println!("Mastered: {}%", mastery_percentage(&deck));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger()?;
    let scheduler = CardScheduler::default();

    println!("Reviewing a new card:");
    review_new_card(&scheduler)?;

    println!("\nDeck overview:");
    deck_overview(&scheduler)?;

    Ok(())
}
