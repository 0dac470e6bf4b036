use std::collections::HashMap;

use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthUrl, AuthorizationCode, ClientId,
    ClientSecret, CsrfToken, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use serenity::async_trait;
use tokio::sync::Mutex;

use crate::config::Config;

/// Access to the corporation structure endpoints of ESI.
#[async_trait]
pub trait StructureApi: Send + Sync {
    /// Returns the raw HTTP status code and body; interpreting them is up to the caller.
    async fn fetch_structures(
        &self,
        corporation_id: u64,
        bearer_token: &str,
    ) -> Result<(u16, String), String>;

    async fn lookup_structure_name(
        &self,
        structure_id: u64,
        bearer_token: &str,
    ) -> Result<String, String>;
}

pub struct Esi {
    oauth: BasicClient,
    http: reqwest::Client,
    base_url: String,
    structure_name_cache: Mutex<HashMap<u64, String>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EsiStructure {
    pub structure_id: u64,
    pub state: Option<String>,
    pub fuel_expires: Option<String>,
    /* ESI may send an explicit null here; treat it like a missing key. */
    pub under_attack: Option<bool>,
    pub shield_percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EsiStructureInfo {
    name: String,
}

impl Esi {
    pub fn new(config: &Config) -> Result<Self, String> {
        let oauth_client = BasicClient::new(
            ClientId::new(config.eve_client_id.clone()),
            Some(ClientSecret::new(config.eve_client_secret.clone())),
            AuthUrl::new("https://login.eveonline.com/v2/oauth/authorize".to_string())
                .map_err(|e| format!("Invalid authorization URL: {}", e))?,
            Some(
                TokenUrl::new("https://login.eveonline.com/v2/oauth/token".to_string())
                    .map_err(|e| format!("Invalid token URL: {}", e))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(format!("{}/callback", config.webserver_url))
                .map_err(|e| format!("Invalid redirect URL: {}", e))?,
        );

        Ok(Esi {
            oauth: oauth_client,
            http: reqwest::Client::new(),
            base_url: config.esi_base_url.clone(),
            structure_name_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the access token and, when the SSO handed one out, the refresh token.
    pub async fn exchange_code(&self, code: String) -> Result<(String, Option<String>), String> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await;

        match token {
            Ok(token) => Ok((
                token.access_token().secret().to_string(),
                token.refresh_token().map(|t| t.secret().to_string()),
            )),
            Err(e) => Err(format!("Failed to exchange code: {}", e)),
        }
    }

    pub async fn exchange_refresh_token(
        &self,
        refresh_token: String,
    ) -> Result<(String, Option<String>), String> {
        let token = self
            .oauth
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(async_http_client)
            .await;

        match token {
            Ok(token) => Ok((
                token.access_token().secret().to_string(),
                token.refresh_token().map(|t| t.secret().to_string()),
            )),
            Err(e) => Err(format!("Failed to exchange refresh token: {}", e)),
        }
    }

    pub fn get_authorization_url(&self, state: String) -> String {
        let state = CsrfToken::new(state);

        let (auth_url, _) = self
            .oauth
            .authorize_url(|| state)
            .add_scope(Scope::new("esi-corporations.read_structures.v1".to_string()))
            .add_scope(Scope::new("esi-universe.read_structures.v1".to_string()))
            .url();

        auth_url.to_string()
    }
}

#[async_trait]
impl StructureApi for Esi {
    async fn fetch_structures(
        &self,
        corporation_id: u64,
        bearer_token: &str,
    ) -> Result<(u16, String), String> {
        let url = format!(
            "{}/corporations/{}/structures/",
            self.base_url, corporation_id
        );

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", bearer_token))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| e.to_string())?;

        Ok((status, body))
    }

    async fn lookup_structure_name(
        &self,
        structure_id: u64,
        bearer_token: &str,
    ) -> Result<String, String> {
        let mut structure_name_cache = self.structure_name_cache.lock().await;

        if let Some(name) = structure_name_cache.get(&structure_id) {
            return Ok(name.clone());
        }

        let url = format!("{}/universe/structures/{}/", self.base_url, structure_id);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", bearer_token))
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await;

                match (status, body) {
                    (200, Ok(body)) => {
                        let info: EsiStructureInfo =
                            serde_json::from_str(&body).map_err(|e| e.to_string())?;

                        structure_name_cache.insert(structure_id, info.name.clone());

                        Ok(info.name)
                    }
                    (_, Err(body)) => Err(body.to_string()),
                    (status, _) => Err(format!(
                        "Failed to fetch structure name: status code {}",
                        status
                    )),
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_authorization_url() {
        let esi = Esi::new(&test_config()).unwrap();
        let url = esi.get_authorization_url("abc123".to_string());

        assert!(url.starts_with("https://login.eveonline.com/v2/oauth/authorize"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("esi-corporations.read_structures.v1"));
        assert!(url.contains("esi-universe.read_structures.v1"));
        assert!(url.contains("bot.example.com%2Fcallback"));
    }

    #[test]
    fn test_base_url_from_config() {
        let mut config = test_config();
        config.esi_base_url = "http://127.0.0.1:9000".to_string();

        assert_eq!(Esi::new(&config).unwrap().base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_structure_defaults() {
        let structures: Vec<EsiStructure> = serde_json::from_str(
            r#"[
                {"structure_id": 1, "state": "shield_vulnerable", "fuel_expires": "2024-05-01T12:00:00Z"},
                {"structure_id": 2, "under_attack": true, "shield_percentage": 42.5}
            ]"#,
        )
        .unwrap();

        assert_eq!(structures[0].state.as_deref(), Some("shield_vulnerable"));
        assert_eq!(structures[0].under_attack, None);
        assert_eq!(structures[0].shield_percentage, None);
        assert_eq!(structures[1].fuel_expires, None);
        assert_eq!(structures[1].under_attack, Some(true));
        assert_eq!(structures[1].shield_percentage, Some(42.5));
    }
}
