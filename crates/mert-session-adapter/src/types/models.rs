/*
[INPUT]:  Exchange backend schema and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::enums::{TradeSide, TransactionStatus};

/// Identity record owned by the backend, cached read-only by the session.
///
/// `me` responses and admin user listings share this shape; everything but
/// the admin flag and the wallet address is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_flexible_bool")]
    pub is_admin: bool,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub try_balance: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_balance: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_flexible_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub kyc_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl UserProfile {
    /// Minimal profile carrying only the wallet address.
    pub fn address_only(address: &str) -> Self {
        Self {
            id: None,
            username: None,
            wallet_address: address.to_string(),
            is_admin: false,
            try_balance: None,
            token_balance: None,
            kyc_verified: None,
            created_at: None,
        }
    }

    /// Fill the wallet address from the session when the backend omitted it.
    pub fn with_fallback_address(mut self, address: &str) -> Self {
        if self.wallet_address.trim().is_empty() {
            self.wallet_address = address.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_decimal_or_zero",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub try_balance: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_decimal_or_zero",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub token_balance: Decimal,
}

impl Balance {
    /// Largest token amount purchasable at `price`, floored to two decimals.
    pub fn max_buy_amount(&self, price: Decimal) -> Option<Decimal> {
        if price <= Decimal::ZERO || self.try_balance <= Decimal::ZERO {
            return None;
        }
        Some((self.try_balance / price).trunc_with_scale(2))
    }
}

/// Current token price in TRY. Accepts `{"price": x}` or a bare value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceQuote {
    #[serde(serialize_with = "serde_helpers::serialize_decimal")]
    pub price: Decimal,
}

impl<'de> Deserialize<'de> for PriceQuote {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let raw = match value.get("price") {
            Some(price) => price.clone(),
            None => value,
        };
        let price = serde_helpers::decimal_from_value(&raw)
            .map_err(serde::de::Error::custom)?
            .ok_or_else(|| serde::de::Error::custom("missing price"))?;
        Ok(Self { price })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePreview {
    #[serde(
        default,
        rename = "tryNeeded",
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub try_needed: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub try_amount: Option<Decimal>,
    #[serde(
        default,
        rename = "tokensOut",
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub tokens_out: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_amount: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_optional_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
}

impl TradePreview {
    /// TRY side of the trade, whichever key the backend used.
    pub fn try_total(&self) -> Option<Decimal> {
        self.try_needed.or(self.try_amount)
    }

    /// Token side of the trade, whichever key the backend used.
    pub fn token_total(&self) -> Option<Decimal> {
        self.tokens_out.or(self.token_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub side: TradeSide,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_decimal_or_zero",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub token_amount: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_decimal_or_zero",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub try_amount: Decimal,
    #[serde(default, deserialize_with = "serde_helpers::deserialize_optional_decimal")]
    pub price: Option<Decimal>,
    pub status: TransactionStatus,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default, rename = "totalUsers")]
    pub total_users: Option<u64>,
    #[serde(default, rename = "totalTransactions")]
    pub total_transactions: Option<u64>,
    #[serde(
        default,
        rename = "currentPrice",
        deserialize_with = "serde_helpers::deserialize_optional_decimal"
    )]
    pub current_price: Option<Decimal>,
    #[serde(
        default,
        rename = "adminTokenBalance",
        deserialize_with = "serde_helpers::deserialize_optional_decimal"
    )]
    pub admin_token_balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletStatus {
    #[serde(default, deserialize_with = "serde_helpers::deserialize_flexible_bool")]
    pub connected: bool,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub(crate) mod serde_helpers {
    use super::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::str::FromStr;

    pub fn decimal_from_value(value: &Value) -> Result<Option<Decimal>, String> {
        match value {
            Value::Null => Ok(None),
            Value::String(raw) if raw.trim().is_empty() => Ok(None),
            Value::String(raw) => Decimal::from_str(raw.trim())
                .map(Some)
                .map_err(|e| e.to_string()),
            Value::Number(number) => Decimal::from_str(&number.to_string())
                .or_else(|_| Decimal::from_scientific(&number.to_string()))
                .map(Some)
                .map_err(|e| e.to_string()),
            _ => Err("invalid decimal value".to_string()),
        }
    }

    pub fn deserialize_decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        decimal_from_value(&value)
            .map(|decimal| decimal.unwrap_or(Decimal::ZERO))
            .map_err(serde::de::Error::custom)
    }

    pub fn deserialize_optional_decimal<'de, D>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        decimal_from_value(&value).map_err(serde::de::Error::custom)
    }

    pub fn serialize_decimal<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    fn bool_from_value(value: &Value) -> Result<Option<bool>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(flag) => Ok(Some(*flag)),
            Value::Number(number) => Ok(Some(number.as_f64().is_some_and(|n| n != 0.0))),
            Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(Some(true)),
                "0" | "false" | "no" | "" => Ok(Some(false)),
                other => Err(format!("invalid boolean value: {other}")),
            },
            _ => Err("invalid boolean value".to_string()),
        }
    }

    /// Accepts `true`/`false`, `0`/`1`, and their string forms.
    pub fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        bool_from_value(&value)
            .map(|flag| flag.unwrap_or(false))
            .map_err(serde::de::Error::custom)
    }

    pub fn deserialize_optional_flexible_bool<'de, D>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        bool_from_value(&value).map_err(serde::de::Error::custom)
    }
}
