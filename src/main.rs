use serenity::all::GatewayIntents;
use serenity::Client;
use tracing::error;

mod auth;
mod config;
mod discord;
mod error;
mod esi;
mod monitor;
mod state;
mod webserver;

#[tokio::main]
async fn main() {
    /* Load, if it exists, from the .env file. This mostly makes development easier. */
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt::init();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(why) => {
            error!("Invalid configuration: {why}");
            std::process::exit(1);
        }
    };

    /* Only the guild cache is needed; the bot never reads messages. */
    let intents = GatewayIntents::GUILDS;

    let bot = match state::BotState::new(config.clone()) {
        Ok(bot) => bot,
        Err(why) => {
            error!("Failed to set up ESI client: {why}");
            std::process::exit(1);
        }
    };

    let web_app = webserver::create_app(bot.clone());
    let web_listener = match tokio::net::TcpListener::bind(&config.listen_address).await {
        Ok(listener) => listener,
        Err(why) => {
            error!("Failed to bind {}: {why}", config.listen_address);
            std::process::exit(1);
        }
    };
    tokio::spawn(async move {
        if let Err(why) = axum::serve(web_listener, web_app).await {
            error!("Webserver error: {why:?}");
        }
    });

    let mut discord_client = match Client::builder(&config.discord_token, intents)
        .event_handler(bot)
        .await
    {
        Ok(client) => client,
        Err(why) => {
            error!("Error creating client: {why:?}");
            std::process::exit(1);
        }
    };

    if let Err(why) = discord_client.start().await {
        error!("Client error: {why:?}");
    }
}
