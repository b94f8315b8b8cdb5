/*
[INPUT]:  Parsed CLI subcommands
[OUTPUT]: Command execution and interactive config setup
[POS]:    CLI layer - module wiring
[UPDATE]: When adding CLI submodules
*/

pub mod commands;
pub mod init;

pub use commands::{AdminCommand, Command, CommandContext, SideArg, execute};
pub use init::run_init;
