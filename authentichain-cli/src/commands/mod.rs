//! Subcommand implementations.

pub mod commit;
pub mod digest;
pub mod init;
pub mod request;
pub mod simulate;
pub mod treasury;
