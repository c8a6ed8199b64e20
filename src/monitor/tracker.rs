//! Set of URLs the monitor probes each tick.

use std::sync::{RwLock, RwLockWriteGuard};

#[derive(Debug)]
struct Tracked {
    url: String,
    /// Not probed since it was (re)tracked; prior failures do not carry over
    fresh: bool,
}

/// Insertion-ordered, deduplicated URL set shared between the monitor loop
/// and its owner. Changes take effect from the next tick.
#[derive(Debug, Default)]
pub struct UrlTracker {
    urls: RwLock<Vec<Tracked>>,
}

impl UrlTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Tracked>> {
        match self.urls.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("RwLock poisoned in UrlTracker, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Start tracking `url`. Returns false if it was already tracked.
    pub fn track(&self, url: &str) -> bool {
        let mut urls = self.write();
        if urls.iter().any(|t| t.url == url) {
            return false;
        }
        urls.push(Tracked {
            url: url.to_string(),
            fresh: true,
        });
        true
    }

    /// Stop tracking `url`. Returns false if it was not tracked.
    pub fn untrack(&self, url: &str) -> bool {
        let mut urls = self.write();
        let before = urls.len();
        urls.retain(|t| t.url != url);
        urls.len() != before
    }

    pub fn contains(&self, url: &str) -> bool {
        self.snapshot().iter().any(|u| u == url)
    }

    /// Tracked URLs in insertion order.
    pub fn snapshot(&self) -> Vec<String> {
        let urls = match self.urls.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        urls.iter().map(|t| t.url.clone()).collect()
    }

    /// URLs for the next tick, each flagged if newly tracked. Clears the flags.
    pub(crate) fn begin_tick(&self) -> Vec<(String, bool)> {
        let mut urls = self.write();
        urls.iter_mut()
            .map(|t| (t.url.clone(), std::mem::take(&mut t.fresh)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
