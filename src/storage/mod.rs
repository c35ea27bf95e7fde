// src/storage/mod.rs
// This module handles all data persistence: JSON snapshots, the database and the replay log.

pub mod db;
pub mod replay_log;
pub mod snapshot;

// Re-export the main structs for easier access.
pub use self::db::DatabaseManager;
pub use self::replay_log::ReplayLogger;
