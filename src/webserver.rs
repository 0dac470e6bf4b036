use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::{Json, Router};
use oauth2::CsrfToken;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{Authenticator, Character};
use crate::state::BotState;

#[derive(Debug, Deserialize)]
struct AuthRequest {
    code: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    last_ping_seconds: Option<u64>,
    authenticated: bool,
    character: Option<Character>,
}

async fn url_login(State(bot): State<BotState>) -> impl IntoResponse {
    let state = CsrfToken::new_random();
    bot.pending_create(state.secret().clone()).await;

    let auth_url = bot.get_authorization_url(state.secret().clone()).await;

    Redirect::to(auth_url.as_ref())
}

async fn url_oauth_callback(
    Query(query): Query<AuthRequest>,
    State(bot): State<BotState>,
) -> impl IntoResponse {
    let (Some(code), Some(state)) = (query.code, query.state) else {
        return (StatusCode::BAD_REQUEST, "Missing 'code' or 'state' parameter.");
    };

    if !bot.pending_exists(&state).await {
        return (
            StatusCode::BAD_REQUEST,
            "Your login expired. Visit /login to try again.",
        );
    }
    bot.pending_remove(&state).await;

    match bot.exchange_code(code).await {
        Ok(()) => (
            StatusCode::OK,
            "Authentication successful, structures will now be monitored. You can now safely close this tab.",
        ),
        Err(error) => {
            warn!("Authentication failed: {}", error);
            (
                StatusCode::BAD_REQUEST,
                "Authentication failed. Visit /login to try again.",
            )
        }
    }
}

async fn url_ping(State(bot): State<BotState>) -> impl IntoResponse {
    bot.record_ping().await;
    info!("Ping received");

    (StatusCode::OK, "pong")
}

async fn url_status(State(bot): State<BotState>) -> impl IntoResponse {
    let last_ping_seconds = bot.last_ping().await.map(|t| t.elapsed().as_secs());
    let auth = bot.auth().await;

    Json(StatusResponse {
        status: if last_ping_seconds.is_some() {
            "active"
        } else {
            "starting"
        },
        last_ping_seconds,
        authenticated: auth.has_token().await,
        character: auth.character().await,
    })
}

pub fn create_app(bot: BotState) -> Router {
    Router::new()
        .route("/callback", get(url_oauth_callback))
        .route("/login", get(url_login))
        .route("/ping", get(url_ping))
        .route("/status", get(url_status))
        .with_state(bot)
}
