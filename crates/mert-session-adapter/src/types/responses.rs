/*
[INPUT]:  Exchange backend schema and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Deserializer, Serialize};

use super::models::UserProfile;

/// Response of `POST wallet/connect`. Both halves are optional.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl std::fmt::Debug for ConnectResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectResponse")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}

/// Response of `GET auth/me`: either `{"user": {...}}` or the bare profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MeResponse {
    Wrapped { user: UserProfile },
    Bare(UserProfile),
}

impl MeResponse {
    pub fn into_profile(self) -> UserProfile {
        match self {
            MeResponse::Wrapped { user } => user,
            MeResponse::Bare(user) => user,
        }
    }
}

/// Acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

/// A page of list results. The backend names the item array `transactions`,
/// `users` or `data`, and the page count `totalPages` or `pages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct RawPage<T> {
    transactions: Option<Vec<T>>,
    users: Option<Vec<T>>,
    data: Option<Vec<T>>,
    #[serde(rename = "totalPages")]
    total_pages: Option<u32>,
    pages: Option<u32>,
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawPage::<T>::deserialize(deserializer)?;
        let items = raw
            .transactions
            .or(raw.users)
            .or(raw.data)
            .unwrap_or_default();
        let total_pages = raw.total_pages.or(raw.pages).unwrap_or(1).max(1);
        Ok(Self { items, total_pages })
    }
}
