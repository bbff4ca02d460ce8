use crate::core::config::AbsentPolicy;
use instant::Instant;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct AbsentEntry {
    tries: u32,
    last_mark: Instant,
}

/// Remembers resources that failed to load so they are not requested every frame.
///
/// A resource is absent when it has been marked and either the last mark is more
/// recent than the minimum check interval or it has failed more than `max_tries`
/// times. Once the try-again interval has passed since the last mark the entry
/// is forgotten and the resource may be requested again. The list is LRU-bounded.
///
/// Internally synchronized: marks come from retrieval workers while the render
/// loop queries.
#[derive(Debug)]
pub struct AbsentResourceList {
    entries: Mutex<LruCache<u64, AbsentEntry>>,
    max_tries: u32,
    min_check_interval: Duration,
    try_again_interval: Duration,
}

impl AbsentResourceList {
    pub fn new(
        capacity: usize,
        max_tries: u32,
        min_check_interval: Duration,
        try_again_interval: Duration,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            max_tries,
            min_check_interval,
            try_again_interval,
        }
    }

    pub fn from_policy(policy: &AbsentPolicy) -> Self {
        Self::new(
            policy.capacity,
            policy.max_tries,
            policy.min_check_interval(),
            policy.try_again_interval(),
        )
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    pub fn min_check_interval(&self) -> Duration {
        self.min_check_interval
    }

    pub fn try_again_interval(&self) -> Duration {
        self.try_again_interval
    }

    /// Recovers a poisoned lock; every entry update is a single field write.
    fn entries(&self) -> MutexGuard<'_, LruCache<u64, AbsentEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mark_resource_absent(&self, id: u64) {
        self.mark_resource_absent_at(id, Instant::now());
    }

    pub fn mark_resource_absent_at(&self, id: u64, now: Instant) {
        let mut entries = self.entries();
        match entries.get_mut(&id) {
            Some(entry) => {
                entry.tries += 1;
                entry.last_mark = now;
            }
            None => {
                entries.put(
                    id,
                    AbsentEntry {
                        tries: 1,
                        last_mark: now,
                    },
                );
            }
        }
    }

    pub fn unmark_resource_absent(&self, id: u64) {
        self.entries().pop(&id);
    }

    pub fn is_resource_absent(&self, id: u64) -> bool {
        self.is_resource_absent_at(id, Instant::now())
    }

    pub fn is_resource_absent_at(&self, id: u64, now: Instant) -> bool {
        let mut entries = self.entries();
        let Some(entry) = entries.get(&id).copied() else {
            return false;
        };

        let since_last_mark = now.saturating_duration_since(entry.last_mark);
        if since_last_mark > self.try_again_interval {
            entries.pop(&id);
            return false;
        }

        since_last_mark < self.min_check_interval || entry.tries > self.max_tries
    }

    /// Number of failures recorded for `id`, 0 if unknown.
    pub fn tries(&self, id: u64) -> u32 {
        self.entries().get(&id).map_or(0, |entry| entry.tries)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AbsentResourceList {
    fn default() -> Self {
        Self::from_policy(&AbsentPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> AbsentResourceList {
        AbsentResourceList::new(
            16,
            2,
            Duration::from_secs(10),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_unmarked_is_not_absent() {
        assert!(!list().is_resource_absent(7));
    }

    #[test]
    fn test_recent_failure_is_absent() {
        let absent = list();
        let t0 = Instant::now();
        absent.mark_resource_absent_at(7, t0);
        assert!(absent.is_resource_absent_at(7, t0 + Duration::from_secs(1)));
        // Past the minimum check interval with few tries the tile may be retried.
        assert!(!absent.is_resource_absent_at(7, t0 + Duration::from_secs(11)));
    }

    #[test]
    fn test_too_many_failures_hold_until_try_again() {
        let absent = list();
        let t0 = Instant::now();
        for _ in 0..3 {
            absent.mark_resource_absent_at(7, t0);
        }
        assert_eq!(absent.tries(7), 3);
        assert!(absent.is_resource_absent_at(7, t0 + Duration::from_secs(30)));
        assert!(!absent.is_resource_absent_at(7, t0 + Duration::from_secs(61)));
        // The entry was forgotten.
        assert_eq!(absent.tries(7), 0);
        assert!(absent.is_empty());
    }

    #[test]
    fn test_unmark_clears_entry() {
        let absent = list();
        absent.mark_resource_absent(3);
        assert!(absent.is_resource_absent(3));
        absent.unmark_resource_absent(3);
        assert!(!absent.is_resource_absent(3));
    }

    #[test]
    fn test_capacity_is_bounded() {
        let absent = AbsentResourceList::new(2, 2, Duration::from_secs(10), Duration::from_secs(60));
        for id in 0..5 {
            absent.mark_resource_absent(id);
        }
        assert_eq!(absent.len(), 2);
        assert!(!absent.is_resource_absent(0));
        assert!(absent.is_resource_absent(4));
    }

    #[test]
    fn test_marks_survive_poisoned_lock() {
        let absent = list();
        let t0 = Instant::now();
        for _ in 0..3 {
            absent.mark_resource_absent_at(9, t0);
        }

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = absent.entries.lock().unwrap();
            panic!("worker panicked while marking");
        }));
        assert!(absent.entries.is_poisoned());

        assert!(absent.is_resource_absent_at(9, t0 + Duration::from_secs(30)));
        assert_eq!(absent.tries(9), 3);
        absent.mark_resource_absent_at(10, t0);
        assert_eq!(absent.len(), 2);
    }
}
