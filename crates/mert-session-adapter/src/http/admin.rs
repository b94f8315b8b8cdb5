/*
[INPUT]:  Admin actions (price, mint, KYC, manual deposit) and paging parameters
[OUTPUT]: Acknowledgements, dashboard stats, user and transaction listings
[POS]:    HTTP layer - admin endpoints (bearer auth, admin role enforced by backend)
[UPDATE]: When adding new admin endpoints or changing request bodies
*/

use reqwest::Method;
use rust_decimal::Decimal;

use crate::http::{ExchangeClient, ExchangeError, Result};
use crate::types::{
    ActionResponse, AdminStats, DepositTryRequest, KycRegisterRequest, KycToggleRequest,
    MintRequest, Page, SetPriceRequest, TradeSide, Transaction, UserProfile,
};

impl ExchangeClient {
    /// POST /admin/set-price
    pub async fn admin_set_price(&self, price: Decimal) -> Result<ActionResponse> {
        ensure_positive("price", price)?;
        let body = SetPriceRequest { price };
        self.authed_json_body(Method::POST, "admin/set-price", &body).await
    }

    /// POST /admin/mint
    pub async fn admin_mint(&self, address: &str, amount: Decimal) -> Result<ActionResponse> {
        ensure_positive("amount", amount)?;
        let body = MintRequest {
            address: non_empty("address", address)?,
            amount,
        };
        self.authed_json_body(Method::POST, "admin/mint", &body).await
    }

    /// POST /admin/kyc/register
    pub async fn admin_kyc_register(&self, address: &str) -> Result<ActionResponse> {
        let body = KycRegisterRequest {
            address: non_empty("address", address)?,
        };
        self.authed_json_body(Method::POST, "admin/kyc/register", &body).await
    }

    /// POST /admin/kyc/toggle
    pub async fn admin_kyc_toggle(&self, enabled: bool) -> Result<ActionResponse> {
        let body = KycToggleRequest { enabled };
        self.authed_json_body(Method::POST, "admin/kyc/toggle", &body).await
    }

    /// Credit TRY to a user by username
    ///
    /// POST /admin/deposit-try
    pub async fn admin_deposit_try(&self, username: &str, amount: Decimal) -> Result<ActionResponse> {
        ensure_positive("amount", amount)?;
        let body = DepositTryRequest {
            username: non_empty("username", username)?,
            amount,
        };
        self.authed_json_body(Method::POST, "admin/deposit-try", &body).await
    }

    /// GET /admin/users?page={page}&limit={limit}
    pub async fn admin_users(&self, page: u32, limit: u32) -> Result<Page<UserProfile>> {
        let endpoint = format!("admin/users?page={}&limit={}", page.max(1), limit.max(1));
        self.authed_json(Method::GET, &endpoint).await
    }

    /// GET /admin/transactions?page={page}&limit={limit}&type={side}
    pub async fn admin_transactions(
        &self,
        page: u32,
        limit: u32,
        side: Option<TradeSide>,
    ) -> Result<Page<Transaction>> {
        let mut endpoint = format!(
            "admin/transactions?page={}&limit={}",
            page.max(1),
            limit.max(1)
        );
        if let Some(side) = side {
            endpoint.push_str(&format!("&type={side}"));
        }
        self.authed_json(Method::GET, &endpoint).await
    }

    /// GET /admin/stats
    pub async fn admin_stats(&self) -> Result<AdminStats> {
        self.authed_json(Method::GET, "admin/stats").await
    }
}

fn ensure_positive(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(ExchangeError::Config(format!(
            "{field} must be greater than zero, got {value}"
        )));
    }
    Ok(())
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ExchangeError::Config(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::http::{ClientConfig, ExchangeClient, ExchangeError};
    use crate::session::{MemorySessionStore, SessionStore};
    use crate::types::TradeSide;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn admin_client(server: &MockServer) -> ExchangeClient {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        store.save("admin-token", "0xadmin").unwrap();
        let config = ClientConfig {
            base_url: format!("{}/api", server.uri()),
            ..ClientConfig::default()
        };
        ExchangeClient::with_config(config, store).expect("client init")
    }

    #[tokio::test]
    async fn test_admin_actions_post_expected_bodies() {
        let server = MockServer::start().await;
        let ok = ResponseTemplate::new(200).set_body_json(json!({ "success": true }));

        for (endpoint, body) in [
            ("/api/admin/set-price", json!({ "price": "42.5" })),
            ("/api/admin/mint", json!({ "address": "0xabc", "amount": "100" })),
            ("/api/admin/kyc/register", json!({ "address": "0xabc" })),
            ("/api/admin/kyc/toggle", json!({ "enabled": false })),
            ("/api/admin/deposit-try", json!({ "username": "mert", "amount": "250" })),
        ] {
            Mock::given(method("POST"))
                .and(path(endpoint))
                .and(body_json(body))
                .respond_with(ok.clone())
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = admin_client(&server);
        client.admin_set_price(dec!(42.5)).await.unwrap();
        client.admin_mint("0xabc", dec!(100)).await.unwrap();
        client.admin_kyc_register(" 0xabc ").await.unwrap();
        client.admin_kyc_toggle(false).await.unwrap();
        client.admin_deposit_try("mert", dec!(250)).await.unwrap();
    }

    #[rstest]
    #[case::empty_address("", dec!(1))]
    #[case::zero_amount("0xabc", dec!(0))]
    #[case::negative_amount("0xabc", dec!(-5))]
    #[tokio::test]
    async fn test_admin_mint_validates_locally(
        #[case] address: &str,
        #[case] amount: rust_decimal::Decimal,
    ) {
        let server = MockServer::start().await;
        let err = admin_client(&server).admin_mint(address, amount).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Config(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_listings_and_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/users"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "id": 1, "username": "mert", "wallet_address": "0xabc", "is_admin": 0, "try_balance": 10 }],
                "totalPages": 1
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/admin/transactions"))
            .and(query_param("type", "sell"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [],
                "pages": 2
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/admin/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalUsers": 12,
                "totalTransactions": 40,
                "currentPrice": "41.5",
                "adminTokenBalance": 1000000
            })))
            .mount(&server)
            .await;

        let client = admin_client(&server);

        let users = client.admin_users(0, 20).await.unwrap();
        assert_eq!(users.items[0].username.as_deref(), Some("mert"));
        assert_eq!(users.items[0].try_balance, Some(dec!(10)));

        let txs = client
            .admin_transactions(1, 20, Some(TradeSide::Sell))
            .await
            .unwrap();
        assert!(txs.items.is_empty());
        assert_eq!(txs.total_pages, 2);

        let stats = client.admin_stats().await.unwrap();
        assert_eq!(stats.total_users, Some(12));
        assert_eq!(stats.current_price, Some(dec!(41.5)));
        assert_eq!(stats.admin_token_balance, Some(dec!(1000000)));
    }
}
