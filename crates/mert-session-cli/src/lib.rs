/*
[INPUT]:  Public API exports for mert-session-cli crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod cli;
pub mod config;
pub mod i18n;
pub mod runtime;

// Re-export main types for convenience
pub use config::CliConfig;
pub use i18n::{Locale, MessageKey};
pub use runtime::SessionRuntime;
