// src/config.rs
// Tunable limits and default file locations.

pub struct Config {
    pub daily_limit: usize,
    pub quick_limit: usize,
    pub again_min_offset: usize,
    pub again_max_offset: usize,
    pub mastered_repetitions: u32,
    pub progress_file: &'static str,
    pub settings_file: &'static str,
    pub review_log_file: &'static str,
}

impl Config {
    pub fn new() -> Self {
        Self {
            daily_limit: 24,
            quick_limit: 12,
            again_min_offset: 3,
            again_max_offset: 5,
            mastered_repetitions: 4,
            progress_file: "progress.json",
            settings_file: "settings.json",
            review_log_file: "reviews.log",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
