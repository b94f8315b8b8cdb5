/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod admin;
pub mod client;
pub mod error;
pub mod session;
pub mod trade;
pub mod wallet;

pub use error::{ExchangeError, Result};

pub use client::{ClientConfig, ClientEvent, DEFAULT_BASE_URL, ExchangeClient};
