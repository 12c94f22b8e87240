//! Bounded, insertion-ordered log of sent messages.

use parking_lot::Mutex;
use std::collections::VecDeque;
use uuid::Uuid;

/// Keeps the most recent `max_size` entries; the oldest is evicted first.
pub struct SentLog<T> {
    entries: Mutex<VecDeque<(Uuid, T)>>,
    max_size: usize,
    name: &'static str,
}

impl<T: Clone> SentLog<T> {
    pub fn new(name: &'static str, max_size: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_size: max_size.max(1),
            name,
        }
    }

    pub fn push(&self, id: Uuid, item: T) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.max_size {
            entries.pop_front();
            metrics::counter!("channels.sent_log.evicted", "log" => self.name).increment(1);
        }
        entries.push_back((id, item));
    }

    pub fn get(&self, id: Uuid) -> Option<T> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, item)| item.clone())
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<T> {
        self.entries
            .lock()
            .iter()
            .rev()
            .take(limit)
            .map(|(_, item)| item.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
