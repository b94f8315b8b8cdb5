/*
[INPUT]:  Signed challenges and bearer tokens
[OUTPUT]: Issued session tokens and user profiles
[POS]:    Session layer - backend seam consumed by the controller
[UPDATE]: When the backend session contract changes
*/

use async_trait::async_trait;

use crate::http::Result;
use crate::types::{ConnectResponse, UserProfile};

/// Backend calls the session controller depends on.
///
/// `connect` fails with [`crate::http::ExchangeError::Authentication`] for a
/// bad signature or expired challenge; `me` fails with
/// [`crate::http::ExchangeError::Unauthorized`] for an invalid token.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn connect(&self, message: &str, signature: &str) -> Result<ConnectResponse>;

    async fn me(&self, token: &str) -> Result<UserProfile>;
}
