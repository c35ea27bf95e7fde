// cardrecall - main.rs
// A terminal study loop around the scheduling core.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use rand::thread_rng;

use cardrecall::deck::loader::load_catalog;
use cardrecall::storage::{snapshot, DatabaseManager, ReplayLogger};
use cardrecall::{build_queue, stats, Catalog, Config, ProgressStore, Rating, Session, StudyMode};

/// Where progress lives between runs.
enum Backend {
    Json(PathBuf),
    Sqlite(DatabaseManager),
}

impl Backend {
    fn open(path: &Path) -> cardrecall::Result<(Self, ProgressStore)> {
        if path.extension().map_or(false, |ext| ext == "db" || ext == "sqlite") {
            let db = DatabaseManager::open(path)?;
            let store = db.load_store()?;
            Ok((Backend::Sqlite(db), store))
        } else {
            let store = snapshot::load_progress(path)?;
            Ok((Backend::Json(path.to_path_buf()), store))
        }
    }

    fn persist(&self, store: &ProgressStore, card_id: &str) -> cardrecall::Result<()> {
        match self {
            Backend::Json(path) => snapshot::save_progress(path, store),
            Backend::Sqlite(db) => db.sync_card(store, card_id),
        }
    }
}

fn read_command(input: &mut impl BufRead) -> Option<String> {
    print!("> ");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_lowercase()),
    }
}

fn parse_rating(command: &str) -> Option<Rating> {
    match command {
        "1" => Some(Rating::Again),
        "2" => Some(Rating::Hard),
        "3" => Some(Rating::Good),
        "4" => Some(Rating::Easy),
        other => other.parse().ok(),
    }
}

fn print_dashboard(catalog: &Catalog, store: &ProgressStore, config: &Config) {
    let today = Local::now().date_naive();
    let stats = stats::dashboard(catalog, store, config, Utc::now(), today);
    println!(
        "{} cards | {} due | {} new | {} mastered | {} hard-marked",
        stats.total_cards, stats.due_now, stats.new_cards, stats.mastered, stats.hard_marked
    );
    println!(
        "Streak {} days | {} reviews total | {} today",
        stats.streak, stats.total_reviews, stats.reviewed_today
    );
    if let Some(weakest) = stats.weakest {
        println!("Weakest: {} {} ({:.0}%)", weakest.icon, weakest.name, weakest.accuracy() * 100.0);
    }
}

fn run() -> cardrecall::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: {} <catalog.json> [progress.json|progress.db] [mode]",
            args.first().map(String::as_str).unwrap_or("cardrecall")
        );
        std::process::exit(2);
    }

    let config = Config::new();
    let catalog = load_catalog(Path::new(&args[1]))?;

    let progress_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config.progress_file));
    let data_dir = progress_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let settings_path = data_dir.join(config.settings_file);

    let (backend, mut store) = Backend::open(&progress_path)?;
    let mut setup = snapshot::load_setup(&settings_path);
    let mode: StudyMode = match args.get(3) {
        Some(raw) => raw.parse()?,
        None => setup.mode,
    };
    if mode != StudyMode::HardMarked {
        setup.mode = mode;
    }
    snapshot::save_setup(&settings_path, &setup)?;

    let replay = ReplayLogger::new(&data_dir.join(config.review_log_file))?;

    print_dashboard(&catalog, &store, &config);

    let queue = build_queue(&catalog, &store, &setup, mode, &config, Utc::now(), &mut thread_rng());
    if queue.is_empty() {
        println!("No cards available for {} mode.", mode);
        return Ok(());
    }

    let mut session = Session::start(&config, mode, queue, Utc::now());
    let cards = catalog.card_index();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("Enter: show answer | 1-4: again/hard/good/easy | u: undo | q: quit");

    while let Some(card_id) = session.current().map(str::to_string) {
        let Some(card) = cards.get(card_id.as_str()) else {
            log::warn!("Card {} is no longer in the catalog", card_id);
            break;
        };

        if !session.is_revealed() {
            println!();
            println!("Card {} of {} [{}]", session.position() + 1, session.len(), card.category);
            println!("{}", card.prompt());
        }

        let Some(command) = read_command(&mut input) else {
            break;
        };

        match command.as_str() {
            "q" => break,
            "u" => {
                if let Some(undone) = session.undo(&mut store) {
                    println!("Undid the last rating of {}", undone);
                    backend.persist(&store, &undone)?;
                    replay.log_undo(Utc::now(), &undone)?;
                }
            }
            "" if !session.is_revealed() => {
                session.reveal();
                println!("{}", card.answer());
                for point in card.answer_points() {
                    println!("  - {}", point);
                }
                if let Some(preview) = session.preview(&store, Utc::now()) {
                    println!(
                        "1 again {}d | 2 hard {}d | 3 good {}d | 4 easy {}d",
                        preview.again, preview.hard, preview.good, preview.easy
                    );
                }
            }
            other => {
                let Some(rating) = parse_rating(other) else {
                    println!("Unknown command {:?}", other);
                    continue;
                };
                let now = Utc::now();
                if let Some(outcome) = session.rate(&mut store, rating, now, &mut thread_rng()) {
                    backend.persist(&store, &outcome.card_id)?;
                    replay.log_review(now, &outcome.card_id, rating, &outcome.progress)?;
                }
            }
        }
    }

    let summary = session.summary();
    println!();
    println!(
        "{} reviews, {} distinct cards, {:.0}% confident",
        summary.reviewed,
        summary.unique_reviewed,
        summary.confidence * 100.0
    );
    println!(
        "again {} | hard {} | good {} | easy {}",
        summary.tally.again, summary.tally.hard, summary.tally.good, summary.tally.easy
    );
    Ok(())
}

pub fn main() -> Result<(), String> {
    env_logger::init();
    run().map_err(|e| e.to_string())
}
