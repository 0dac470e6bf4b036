use std::sync::Arc;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serenity::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::esi::Esi;

/// Source of bearer tokens for ESI requests.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn has_token(&self) -> bool;

    async fn bearer_token(&self) -> Option<String>;

    /// Attempts to obtain a new access token; returns whether it succeeded.
    async fn refresh(&self) -> bool;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Character {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    sub: String,
    name: String,
}

struct Session {
    tokens: Tokens,
    character: Option<Character>,
}

/// Holds the token pair of the authenticated character.
///
/// The pair is always replaced as a whole, so the poll loop and the OAuth
/// callback never see a half-updated session.
pub struct EsiAuth {
    esi: Arc<Esi>,
    session: RwLock<Option<Session>>,
}

fn decode_character(token: &str) -> Result<Character, String> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| e.to_string())?
        .claims;

    /* The ID is prefixed with "CHARACTER:EVE:" */
    let id = claims
        .sub
        .split(':')
        .nth(2)
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| format!("Unexpected subject {}", claims.sub))?;

    Ok(Character {
        id,
        name: claims.name,
    })
}

impl EsiAuth {
    pub fn new(esi: Arc<Esi>) -> Self {
        Self {
            esi,
            session: RwLock::new(None),
        }
    }

    pub async fn set_tokens(&self, tokens: Tokens) {
        let character = match decode_character(&tokens.access_token) {
            Ok(character) => {
                info!("Authenticated as {} ({})", character.name, character.id);
                Some(character)
            }
            Err(error) => {
                warn!("Failed to decode access token: {}", error);
                None
            }
        };

        *self.session.write().await = Some(Session { tokens, character });
    }

    pub async fn character(&self) -> Option<Character> {
        self.session
            .read()
            .await
            .as_ref()
            .and_then(|session| session.character.clone())
    }

    /// Exchanges an authorization code from the SSO callback and stores the result.
    pub async fn authenticate(&self, code: String) -> Result<(), String> {
        let (access_token, refresh_token) = self.esi.exchange_code(code).await?;
        let refresh_token = refresh_token.ok_or("No refresh token in response")?;

        self.set_tokens(Tokens {
            access_token,
            refresh_token,
        })
        .await;

        Ok(())
    }
}

#[async_trait]
impl Authenticator for EsiAuth {
    async fn has_token(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn bearer_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.tokens.access_token.clone())
    }

    async fn refresh(&self) -> bool {
        let refresh_token = match self.session.read().await.as_ref() {
            Some(session) => session.tokens.refresh_token.clone(),
            None => {
                warn!("Cannot refresh access token: not authenticated");
                return false;
            }
        };

        info!("Refreshing access token");
        match self.esi.exchange_refresh_token(refresh_token.clone()).await {
            Ok((access_token, new_refresh_token)) => {
                self.set_tokens(Tokens {
                    access_token,
                    refresh_token: new_refresh_token.unwrap_or(refresh_token),
                })
                .await;
                true
            }
            Err(error) => {
                warn!("{}", error);
                false
            }
        }
    }
}
