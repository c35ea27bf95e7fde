// src/session/requeue.rs
// Reinserts imperfectly recalled cards further down the running queue.
// Only entries after the cursor are ever touched.

use rand::Rng;

/// Where an "again" card goes back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgainOptions {
    pub min_offset: usize,
    pub max_offset: usize,
    /// Fixed distance from the cursor, bypassing the random pick.
    pub offset: Option<usize>,
}

impl Default for AgainOptions {
    fn default() -> Self {
        AgainOptions { min_offset: 3, max_offset: 5, offset: None }
    }
}

impl AgainOptions {
    fn pick_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if let Some(offset) = self.offset {
            return offset;
        }
        let (lo, hi) = if self.min_offset <= self.max_offset {
            (self.min_offset, self.max_offset)
        } else {
            (self.max_offset, self.min_offset)
        };
        rng.gen_range(lo..=hi)
    }
}

/// Drops every copy of `card_id` strictly after `queue_index`.
pub fn remove_future_occurrences(queue: &[String], queue_index: usize, card_id: &str) -> Vec<String> {
    queue
        .iter()
        .enumerate()
        .filter(|(index, queued_id)| *index <= queue_index || queued_id.as_str() != card_id)
        .map(|(_, queued_id)| queued_id.clone())
        .collect()
}

/// Puts `card_id` back a few places after the cursor, so it comes round
/// again soon but not immediately.
pub fn queue_again_card<R: Rng + ?Sized>(
    queue: &[String],
    queue_index: usize,
    card_id: &str,
    options: &AgainOptions,
    rng: &mut R,
) -> Vec<String> {
    let mut next = remove_future_occurrences(queue, queue_index, card_id);
    let offset = options.pick_offset(rng);
    // Always land strictly after the cursor.
    let insert_at = next.len().min(queue_index.saturating_add(offset.max(1)));
    next.insert(insert_at, card_id.to_string());
    log::debug!("Requeued {} at {} (cursor {})", card_id, insert_at, queue_index);
    next
}

/// Moves `card_id` to the end of the session.
pub fn queue_hard_card(queue: &[String], queue_index: usize, card_id: &str) -> Vec<String> {
    let mut next = remove_future_occurrences(queue, queue_index, card_id);
    next.push(card_id.to_string());
    log::debug!("Deferred {} to the end of the queue", card_id);
    next
}
