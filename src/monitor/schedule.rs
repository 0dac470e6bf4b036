use std::sync::Arc;
use std::time::Duration;

use serenity::async_trait;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{Alert, StructureMonitor};
use crate::state::BotState;

/// Delivers alert text to wherever people will see it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), String>;
}

impl StructureMonitor {
    pub async fn start(bot: BotState) {
        let (auth, esi, config) = bot.monitor_parts().await;

        let monitor = StructureMonitor::new(auth, esi, config.corporation_id);
        let notifier: Arc<dyn Notifier> = Arc::new(bot);

        tokio::spawn(async move {
            monitor.run(notifier, config.poll_interval).await;
        });
    }

    pub async fn run(mut self, notifier: Arc<dyn Notifier>, interval: Duration) {
        info!(
            "Starting structure monitor, checking every {} seconds",
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        /* A slow poll pushes the next one back instead of firing a burst. */
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let alerts = self.poll().await;
            deliver(notifier.as_ref(), &alerts).await;
        }
    }
}

async fn deliver(notifier: &dyn Notifier, alerts: &[Alert]) {
    if alerts.is_empty() {
        return;
    }

    info!("Sending {} alerts", alerts.len());
    for alert in alerts {
        if let Err(error) = notifier.send(&alert.to_string()).await {
            warn!("Failed to send alert: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::monitor::tests::{body, FakeApi, FakeAuth};

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail_first: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), String> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(text.to_string());
            if self.fail_first && sent.len() == 1 {
                return Err("Missing Access".to_string());
            }
            Ok(())
        }
    }

    fn alerts() -> Vec<Alert> {
        vec![
            Alert::UnderAttack {
                name: "Keepstar".to_string(),
            },
            Alert::NewlyUnderAttack {
                name: "Keepstar".to_string(),
            },
            Alert::UnderAttack {
                name: "Fortizar".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_deliver_in_order() {
        let notifier = RecordingNotifier::default();
        deliver(&notifier, &alerts()).await;

        let expected: Vec<String> = alerts().iter().map(|a| a.to_string()).collect();
        assert_eq!(*notifier.sent.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_deliver_continues_after_failure() {
        let notifier = RecordingNotifier {
            fail_first: true,
            ..Default::default()
        };
        deliver(&notifier, &alerts()).await;

        assert_eq!(notifier.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_on_every_tick() {
        let api = FakeApi::new(vec![
            body(&[serde_json::json!({"structure_id": 1, "under_attack": true})]),
            body(&[serde_json::json!({"structure_id": 1, "under_attack": true})]),
        ]);
        let monitor = StructureMonitor::new(FakeAuth::new(Some("token"), None), api.clone(), 1);
        let notifier = Arc::new(RecordingNotifier::default());

        let handle = tokio::spawn(monitor.run(notifier.clone(), Duration::from_secs(60)));

        /* First tick fires immediately, the second one a minute later. */
        tokio::time::sleep(Duration::from_secs(90)).await;
        handle.abort();

        assert_eq!(api.calls(), 2);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }
}
