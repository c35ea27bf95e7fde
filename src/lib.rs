// cardrecall - lib.rs
// Spaced-repetition scheduling: per-card progress, the interval/ease update,
// session queue construction and in-session requeueing.

pub mod config;
pub mod deck;
pub mod error;
pub mod progress;
pub mod queue;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod storage;

pub use config::Config;
pub use deck::{Card, Catalog, Category};
pub use error::{Result, StudyError};
pub use progress::{CardProgress, ProgressMeta, ProgressStore};
pub use queue::{build_queue, Setup, StudyMode};
pub use scheduler::{IntervalPreview, Rating, Scheduler, Sm2Scheduler};
pub use session::{ReviewOutcome, Session, SessionSummary};
