use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::bot::db::UserId;

/// `(command key, user) -> expiry`. Expired entries count as absent and are
/// dropped the next time they are looked at.
#[derive(Default)]
pub struct CooldownTable {
    entries: DashMap<(String, UserId), Instant>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self, key: &str, user: UserId) -> Option<Duration> {
        let now = Instant::now();
        let entry_key = (key.to_string(), user);

        // Copy the expiry out so the shard lock is released before removing.
        let expiry = self.entries.get(&entry_key).map(|e| *e)?;
        if expiry > now {
            return Some(expiry - now);
        }

        self.entries.remove_if(&entry_key, |_, e| *e <= now);
        None
    }

    pub fn start(&self, key: &str, user: UserId, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        self.entries.insert((key.to_string(), user), Instant::now() + duration);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_lives_for_its_window() {
        let table = CooldownTable::new();
        let user = UserId::new(1);
        table.start("define", user, Duration::from_secs(5));

        assert_eq!(table.remaining("define", user), Some(Duration::from_secs(5)));
        assert_eq!(table.remaining("define", UserId::new(2)), None);
        assert_eq!(table.remaining("ping", user), None);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(table.remaining("define", user), Some(Duration::from_secs(2)));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(table.remaining("define", user), None);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn zero_cooldown_is_not_stored() {
        let table = CooldownTable::new();
        table.start("ping", UserId::new(1), Duration::ZERO);
        assert!(table.is_empty());
    }
}
