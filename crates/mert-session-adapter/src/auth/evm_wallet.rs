/*
[INPUT]:  EVM private key (hex string)
[OUTPUT]: Personal-sign signatures and checksummed wallet address
[POS]:    Auth layer - local EVM key implementation of the challenge signer
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::fmt;
use std::str::FromStr;

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::auth::WalletSigner;
use crate::http::{ExchangeError, Result};

/// Signer backed by a local secp256k1 key (EIP-191 personal sign)
pub struct EvmWalletSigner {
    signer: PrivateKeySigner,
    address: String,
}

impl fmt::Debug for EvmWalletSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmWalletSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl EvmWalletSigner {
    /// Create a new EVM wallet signer from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(private_key_hex: &str) -> Result<Self> {
        let private_key_hex = private_key_hex.trim();
        let private_key_hex = private_key_hex
            .strip_prefix("0x")
            .unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| ExchangeError::Config(format!("Invalid EVM private key: {}", e)))?;

        let address = signer.address().to_checksum(None);

        Ok(Self { signer, address })
    }

    /// Checksummed address the key controls
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl WalletSigner for EvmWalletSigner {
    async fn sign_message(&self, message: &str) -> Result<String> {
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| ExchangeError::WalletUnavailable(format!("Failed to sign EVM message: {}", e)))?;

        // r, s, v
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_evm_wallet_signer() {
        let signer = EvmWalletSigner::new(TEST_KEY).unwrap();

        assert_eq!(signer.address(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

        let signature = signer
            .sign_message("MERT Token Wallet Link: 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266 - 1")
            .await
            .unwrap();

        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 132); // 0x + 65 bytes * 2 = 132
    }

    #[test]
    fn test_evm_wallet_signer_no_prefix() {
        let signer = EvmWalletSigner::new(&TEST_KEY[2..]).unwrap();
        assert_eq!(signer.address(), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }

    #[test]
    fn test_evm_wallet_signer_rejects_garbage() {
        let err = EvmWalletSigner::new("not-a-key").unwrap_err();
        assert!(matches!(err, ExchangeError::Config(_)));
    }

    #[test]
    fn test_debug_does_not_print_key() {
        let signer = EvmWalletSigner::new(TEST_KEY).unwrap();
        let rendered = format!("{signer:?}");
        assert!(!rendered.contains(&TEST_KEY[2..]));
    }
}
