//! # Feature: Cooldowns
//!
//! Per-node map of user id to the epoch-millisecond deadline before which the
//! user may not invoke the node again. Check and arm happen under one dashmap
//! entry lock, so two rapid invocations from the same user cannot both pass.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Deadline map with write-then-execute arming and injectable clock
//! - 1.0.0: Initial per-user sliding window rate limiting

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of "now" in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
#[derive(Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Deadlines for one command or subcommand node
#[derive(Default)]
pub struct Cooldowns {
    deadlines: DashMap<u64, i64>,
}

impl Cooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the user's deadline and, if it has passed, arm the next one.
    ///
    /// Returns the still-active deadline on refusal.
    pub fn try_arm(&self, user_id: u64, now_ms: i64, duration: Duration) -> Result<(), i64> {
        let next = now_ms + duration.as_millis() as i64;
        match self.deadlines.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let deadline = *entry.get();
                if now_ms < deadline {
                    return Err(deadline);
                }
                entry.insert(next);
            }
            Entry::Vacant(entry) => {
                entry.insert(next);
            }
        }
        Ok(())
    }

    pub fn deadline(&self, user_id: u64) -> Option<i64> {
        self.deadlines.get(&user_id).map(|d| *d)
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_millis(3000);

    #[test]
    fn test_first_invocation_arms_deadline() {
        let cooldowns = Cooldowns::new();
        assert!(cooldowns.try_arm(1, 1_000, WINDOW).is_ok());
        assert_eq!(cooldowns.deadline(1), Some(4_000));
    }

    #[test]
    fn test_second_invocation_within_window_is_refused() {
        let cooldowns = Cooldowns::new();
        cooldowns.try_arm(1, 1_000, WINDOW).unwrap();
        assert_eq!(cooldowns.try_arm(1, 3_999, WINDOW), Err(4_000));
        // refusal does not push the deadline
        assert_eq!(cooldowns.deadline(1), Some(4_000));
    }

    #[test]
    fn test_after_window_succeeds_and_resets() {
        let clock = ManualClock::new(10_000);
        let cooldowns = Cooldowns::new();

        cooldowns.try_arm(1, clock.now_ms(), WINDOW).unwrap();
        clock.advance(WINDOW);
        assert!(cooldowns.try_arm(1, clock.now_ms(), WINDOW).is_ok());
        assert_eq!(cooldowns.deadline(1), Some(16_000));
    }

    #[test]
    fn test_users_are_independent() {
        let cooldowns = Cooldowns::new();
        assert!(cooldowns.try_arm(1, 0, WINDOW).is_ok());
        assert!(cooldowns.try_arm(2, 0, WINDOW).is_ok());
        assert!(cooldowns.try_arm(1, 10, WINDOW).is_err());
        assert_eq!(cooldowns.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_repeats_only_one_passes() {
        let cooldowns = Arc::new(Cooldowns::new());
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let cooldowns = cooldowns.clone();
            tasks.push(tokio::spawn(async move {
                cooldowns.try_arm(7, 5_000, WINDOW).is_ok()
            }));
        }
        let mut passed = 0;
        for task in tasks {
            if task.await.unwrap() {
                passed += 1;
            }
        }
        assert_eq!(passed, 1);
    }
}
