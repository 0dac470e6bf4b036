use super::BotState;

impl BotState {
    pub async fn get_authorization_url(&self, state: String) -> String {
        let this = self.0.read().await;

        this.esi.get_authorization_url(state)
    }

    pub async fn exchange_code(&self, code: String) -> Result<(), String> {
        let auth = self.auth().await;

        auth.authenticate(code).await
    }
}
