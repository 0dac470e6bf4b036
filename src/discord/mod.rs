use serenity::all::{ActivityData, GuildId, Ready};
use serenity::{async_trait, prelude::*};
use tracing::info;

use crate::monitor::StructureMonitor;
use crate::state::BotState;

#[async_trait]
impl EventHandler for BotState {
    async fn ready(&self, _: Context, ready: Ready) {
        info!("Connected to Discord as {}", ready.user.name);
    }

    async fn cache_ready(&self, ctx: Context, _guilds: Vec<GuildId>) {
        if !self.set_if_startup().await {
            return;
        }
        self.set_discord(ctx.clone()).await;

        ctx.set_activity(Some(ActivityData::custom("Watching corporation structures")));

        let config = self.config().await;
        info!(
            "Visit {}/login to authenticate the character used for structure checks",
            config.webserver_url
        );

        StructureMonitor::start(self.clone()).await;
    }
}
