use std::time::{Duration, Instant};

use super::BotState;

const PENDING_TIMEOUT: Duration = Duration::from_secs(300);

impl BotState {
    pub async fn pending_create(&self, key: String) {
        self.pending_create_until(key, Instant::now() + PENDING_TIMEOUT)
            .await;
    }

    pub async fn pending_create_until(&self, key: String, expire_time: Instant) {
        self.0.write().await.pending.insert(key, expire_time);
    }

    pub async fn pending_exists(&self, key: &str) -> bool {
        match self.0.read().await.pending.get(key) {
            Some(expire_time) => *expire_time > Instant::now(),
            None => false,
        }
    }

    pub async fn pending_remove(&self, key: &str) {
        self.0.write().await.pending.remove(key);
    }

    /// Removes every entry expired at `now`; returns how many were dropped.
    pub async fn pending_prune(&self, now: Instant) -> usize {
        let mut this = self.0.write().await;

        let before = this.pending.len();
        this.pending.retain(|_, expire_time| *expire_time > now);
        before - this.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn test_pending_lifecycle() {
        let bot = test_state();

        assert!(!bot.pending_exists("abc").await);
        bot.pending_create("abc".to_string()).await;
        assert!(bot.pending_exists("abc").await);

        bot.pending_remove("abc").await;
        assert!(!bot.pending_exists("abc").await);
    }

    #[tokio::test]
    async fn test_pending_expired_entry_is_gone() {
        let bot = test_state();
        bot.pending_create_until("late".to_string(), Instant::now() - Duration::from_secs(1))
            .await;

        assert!(!bot.pending_exists("late").await);
    }

    #[tokio::test]
    async fn test_pending_prune() {
        let bot = test_state();
        bot.pending_create("old".to_string()).await;

        assert_eq!(bot.pending_prune(Instant::now()).await, 0);
        assert_eq!(
            bot.pending_prune(Instant::now() + PENDING_TIMEOUT + Duration::from_secs(1))
                .await,
            1
        );
        assert!(!bot.pending_exists("old").await);
    }
}
