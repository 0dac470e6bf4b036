use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Instant;

use serenity::all::Context;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::{Authenticator, EsiAuth};
use crate::config::Config;
use crate::esi::{Esi, StructureApi};

mod discord;
mod esi;
mod pending;

struct BotStorage {
    startup: AtomicBool,
    config: Config,
    /* Login states handed out by /login, with their expiry time. */
    pending: HashMap<String, Instant>,
    esi: Arc<Esi>,
    auth: Arc<EsiAuth>,
    discord: Option<Context>,
    last_ping: Option<Instant>,
}

pub struct BotState(Arc<RwLock<BotStorage>>);

impl Clone for BotState {
    fn clone(&self) -> Self {
        BotState(self.0.clone())
    }
}

impl BotState {
    pub fn new(config: Config) -> Result<Self, String> {
        let esi = Arc::new(Esi::new(&config)?);
        let auth = Arc::new(EsiAuth::new(esi.clone()));

        let store = BotState(Arc::new(RwLock::new(BotStorage {
            startup: AtomicBool::new(true),
            config,
            pending: HashMap::new(),
            esi,
            auth,
            discord: None,
            last_ping: None,
        })));

        /* Drop login states nobody completed in time. */
        let store_clone = store.clone();
        tokio::spawn(async move {
            loop {
                let expired = store_clone.pending_prune(Instant::now()).await;
                if expired != 0 {
                    info!("Expired {} pending logins", expired);
                }

                tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
            }
        });

        Ok(store)
    }

    pub async fn config(&self) -> Config {
        self.0.read().await.config.clone()
    }

    pub async fn auth(&self) -> Arc<EsiAuth> {
        self.0.read().await.auth.clone()
    }

    /// Everything the structure monitor needs from the shared state.
    pub async fn monitor_parts(
        &self,
    ) -> (Arc<dyn Authenticator>, Arc<dyn StructureApi>, Config) {
        let this = self.0.read().await;

        (this.auth.clone(), this.esi.clone(), this.config.clone())
    }

    pub async fn set_discord(&self, ctx: Context) {
        let mut this = self.0.write().await;

        this.discord = Some(ctx);
    }

    pub async fn set_if_startup(&self) -> bool {
        let this = self.0.read().await;

        this.startup.swap(false, Ordering::Relaxed)
    }

    pub async fn record_ping(&self) {
        self.0.write().await.last_ping = Some(Instant::now());
    }

    pub async fn last_ping(&self) -> Option<Instant> {
        self.0.read().await.last_ping
    }
}
