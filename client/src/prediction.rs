use std::{collections::BTreeMap, time::Duration};

use ballast_shared::GameInstant;

/// Hold-off period after a local optimistic change, during which
/// authoritative updates for the same value are set aside.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrectionWindow<T> {
    pub started_at: GameInstant,
    pub delay: Duration,
    /// Latest authoritative update that arrived while the window was open
    pub buffered: Option<T>,
}

impl<T> CorrectionWindow<T> {
    pub fn is_active(&self, now: GameInstant) -> bool {
        !self.delay.is_zero() && now.saturating_duration_since(self.started_at) < self.delay
    }
}

/// What to do with a value whose window just closed.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<T> {
    /// Nothing arrived from the server; the optimistic value stands
    Promote,
    /// The server disagreed at least once; its latest word is final
    ApplyBuffered(T),
}

/// Tracks one correction window per predicted value.
///
/// `K` names the value (an entity, or an entity and component index) and `T`
/// is whatever form the authoritative update is kept in until the window
/// closes.
pub struct PredictionCorrector<K: Ord + Copy, T> {
    delay: Duration,
    windows: BTreeMap<K, CorrectionWindow<T>>,
}

impl<K: Ord + Copy, T> PredictionCorrector<K, T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            windows: BTreeMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Opens a window for `key`, or restarts the one already open. A
    /// previously buffered update is kept and still applies when the window
    /// closes.
    pub fn predict(&mut self, key: K, now: GameInstant) {
        if self.delay.is_zero() {
            return;
        }
        let window = self.windows.entry(key).or_insert(CorrectionWindow {
            started_at: now,
            delay: self.delay,
            buffered: None,
        });
        window.started_at = now;
    }

    pub fn is_pending(&self, key: &K, now: GameInstant) -> bool {
        self.windows
            .get(key)
            .is_some_and(|window| window.is_active(now))
    }

    /// Sets `value` aside if `key` has an open window, replacing anything
    /// buffered earlier. Otherwise hands it back to be applied right away.
    pub fn buffer(&mut self, key: K, value: T, now: GameInstant) -> Option<T> {
        match self.windows.get_mut(&key) {
            Some(window) if window.is_active(now) => {
                window.buffered = Some(value);
                None
            }
            _ => Some(value),
        }
    }

    /// Closes every window that has elapsed at `now`, in key order.
    pub fn update(&mut self, now: GameInstant) -> Vec<(K, Resolution<T>)> {
        let elapsed: Vec<K> = self
            .windows
            .iter()
            .filter(|(_, window)| !window.is_active(now))
            .map(|(key, _)| *key)
            .collect();

        let mut resolved = Vec::with_capacity(elapsed.len());
        for key in elapsed {
            let Some(window) = self.windows.remove(&key) else {
                continue;
            };
            let resolution = match window.buffered {
                Some(value) => Resolution::ApplyBuffered(value),
                None => Resolution::Promote,
            };
            resolved.push((key, resolution));
        }
        resolved
    }

    /// Drops the window for a value that no longer exists. Its buffered
    /// update is discarded.
    pub fn cancel(&mut self, key: &K) -> Option<CorrectionWindow<T>> {
        self.windows.remove(key)
    }

    /// Drops every window whose key matches.
    pub fn cancel_where<F: Fn(&K) -> bool>(&mut self, matches: F) {
        self.windows.retain(|key, _| !matches(key));
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
