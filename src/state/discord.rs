use serenity::all::ChannelId;
use serenity::async_trait;

use super::BotState;
use crate::monitor::Notifier;

impl BotState {
    pub async fn discord_send_message(&self, channel_id: u64, message: &str) -> Result<(), String> {
        /* Don't hold the state lock while talking to Discord. */
        let http = {
            let this = self.0.read().await;
            this.discord
                .as_ref()
                .ok_or("Not connected to Discord yet")?
                .http
                .clone()
        };

        let channel_id = ChannelId::new(channel_id);
        channel_id.say(&http, message).await.map_err(|e| e.to_string())?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for BotState {
    async fn send(&self, text: &str) -> Result<(), String> {
        let channel_id = self.0.read().await.config.discord_channel_id;

        self.discord_send_message(channel_id, text).await
    }
}
