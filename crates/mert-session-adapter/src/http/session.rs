/*
[INPUT]:  Signed challenge or bearer token
[OUTPUT]: Session token and user profile
[POS]:    HTTP layer - backend session endpoints
[UPDATE]: When connect/me endpoints or their error mapping change
*/

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use crate::http::{ExchangeClient, ExchangeError, Result};
use crate::session::SessionApi;
use crate::types::{ConnectRequest, ConnectResponse, MeResponse, UserProfile};

impl ExchangeClient {
    /// Submit a signed challenge
    ///
    /// POST /wallet/connect
    pub async fn connect_wallet(&self, message: &str, signature: &str) -> Result<ConnectResponse> {
        let body = ConnectRequest {
            message: message.to_string(),
            signature: signature.to_string(),
        };
        let builder = self.request(Method::POST, "wallet/connect")?.json(&body);

        self.send_json(builder).await.map_err(|err| match err {
            ExchangeError::Unauthorized => ExchangeError::Authentication {
                message: "signature rejected".to_string(),
            },
            ExchangeError::Api { code, message } if matches!(code, 400 | 403) => {
                ExchangeError::Authentication { message }
            }
            other => other,
        })
    }

    /// Fetch the profile the token belongs to
    ///
    /// GET /auth/me
    pub async fn fetch_profile(&self, token: &str) -> Result<UserProfile> {
        let builder = self.request_with_token(Method::GET, "auth/me", token)?;
        let response: MeResponse = self.send_authed_json(builder, token).await?;
        let profile = response.into_profile();
        debug!(address = %profile.wallet_address, is_admin = profile.is_admin, "profile fetched");
        Ok(profile)
    }
}

#[async_trait]
impl SessionApi for ExchangeClient {
    async fn connect(&self, message: &str, signature: &str) -> Result<ConnectResponse> {
        self.connect_wallet(message, signature).await
    }

    async fn me(&self, token: &str) -> Result<UserProfile> {
        self.fetch_profile(token).await
    }
}
