/*
[INPUT]:  Trade amounts, sell transaction hashes, paging parameters
[OUTPUT]: Price, balance, previews, trade acknowledgements, history
[POS]:    HTTP layer - trade endpoints (price public, the rest bearer auth)
[UPDATE]: When adding new trade endpoints or changing query parameters
*/

use reqwest::Method;
use rust_decimal::Decimal;

use crate::http::{ExchangeClient, ExchangeError, Result};
use crate::types::{
    ActionResponse, Balance, BuyRequest, Page, PriceQuote, SellRequest, TradePreview, TradeSide,
    Transaction,
};

impl ExchangeClient {
    /// Current token price
    ///
    /// GET /trade/price
    pub async fn get_price(&self) -> Result<PriceQuote> {
        let builder = self.request(Method::GET, "trade/price")?;
        self.send_json(builder).await
    }

    /// TRY and token balance of the session user
    ///
    /// GET /trade/balance
    pub async fn get_balance(&self) -> Result<Balance> {
        self.authed_json(Method::GET, "trade/balance").await
    }

    /// Preview a buy or sell of `amount` tokens
    ///
    /// GET /trade/preview/{side}/{amount}
    pub async fn preview_trade(&self, side: TradeSide, amount: Decimal) -> Result<TradePreview> {
        ensure_positive(amount)?;
        let endpoint = format!("trade/preview/{}/{}", side, amount.normalize());
        self.authed_json(Method::GET, &endpoint).await
    }

    /// Buy `token_amount` tokens with the TRY balance
    ///
    /// POST /trade/buy
    pub async fn buy_token(&self, token_amount: Decimal) -> Result<ActionResponse> {
        ensure_positive(token_amount)?;
        let body = BuyRequest { token_amount };
        self.authed_json_body(Method::POST, "trade/buy", &body).await
    }

    /// Credit a completed on-chain token transfer back as TRY
    ///
    /// POST /trade/sell
    pub async fn sell_token(&self, tx_hash: &str) -> Result<ActionResponse> {
        let tx_hash = tx_hash.trim();
        if tx_hash.is_empty() {
            return Err(ExchangeError::Config("transaction hash must not be empty".to_string()));
        }
        let body = SellRequest {
            tx_hash: tx_hash.to_string(),
        };
        self.authed_json_body(Method::POST, "trade/sell", &body).await
    }

    /// Paged trade history of the session user
    ///
    /// GET /trade/history?page={page}&limit={limit}
    pub async fn trade_history(&self, page: u32, limit: u32) -> Result<Page<Transaction>> {
        let endpoint = format!("trade/history?page={}&limit={}", page.max(1), limit.max(1));
        self.authed_json(Method::GET, &endpoint).await
    }
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(ExchangeError::Config(format!(
            "amount must be greater than zero, got {amount}"
        )));
    }
    Ok(())
}
