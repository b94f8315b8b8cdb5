/*
[INPUT]:  Bearer token from the session store
[OUTPUT]: Backend view of the wallet link
[POS]:    HTTP layer - wallet link endpoints (bearer auth)
[UPDATE]: When wallet endpoints change
*/

use reqwest::Method;

use crate::http::{ExchangeClient, Result};
use crate::types::{ActionResponse, WalletStatus};

impl ExchangeClient {
    /// Unlink the wallet on the backend side
    ///
    /// DELETE /wallet/disconnect
    pub async fn disconnect_wallet(&self) -> Result<ActionResponse> {
        self.authed_json(Method::DELETE, "wallet/disconnect").await
    }

    /// Backend view of the linked wallet
    ///
    /// GET /wallet/status
    pub async fn wallet_status(&self) -> Result<WalletStatus> {
        self.authed_json(Method::GET, "wallet/status").await
    }
}
