//! Logger setup for binaries and tests.
//!
//! Library code only talks to the `log` facade; this module wires
//! `env_logger` behind it once per process.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
