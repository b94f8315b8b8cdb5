/*
[INPUT]:  Application name and connected wallet address
[OUTPUT]: Unique human-readable challenge messages
[POS]:    Auth layer - sign-in challenge construction
[UPDATE]: When the challenge wording or timestamp source changes
*/

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Application name embedded in challenges by default
pub const DEFAULT_APP_NAME: &str = "MERT Token";

/// A challenge ready to be signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub address: String,
    pub timestamp: i64,
    message: String,
}

impl Challenge {
    pub fn new(app_name: &str, address: &str, timestamp: i64) -> Self {
        let message = format!("{app_name} Wallet Link: {address} - {timestamp}");
        Self {
            address: address.to_string(),
            timestamp,
            message,
        }
    }

    /// The exact string the wallet must sign
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Millisecond wall clock that never repeats or goes backwards.
#[derive(Debug, Default)]
pub struct ChallengeClock {
    last: AtomicI64,
}

impl ChallengeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current Unix time in milliseconds, bumped past the previous value
    pub fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    pub fn challenge(&self, app_name: &str, address: &str) -> Challenge {
        Challenge::new(app_name, address, self.next_timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_format() {
        let challenge = Challenge::new("MERT Token", "0xABC", 1_700_000_000_000);
        assert_eq!(
            challenge.message(),
            "MERT Token Wallet Link: 0xABC - 1700000000000"
        );
        assert_eq!(challenge.to_string(), challenge.message());
    }

    #[test]
    fn test_clock_is_strictly_increasing() {
        let clock = ChallengeClock::new();
        let mut prev = clock.next_timestamp();
        for _ in 0..1000 {
            let next = clock.next_timestamp();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_consecutive_challenges_differ() {
        let clock = ChallengeClock::new();
        let first = clock.challenge(DEFAULT_APP_NAME, "0xabc");
        let second = clock.challenge(DEFAULT_APP_NAME, "0xabc");
        assert_ne!(first.message(), second.message());
        assert!(first.message().contains("0xabc"));
    }
}
