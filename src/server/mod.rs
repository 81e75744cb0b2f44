//! Server module for Agentpad
//!
//! - `config`: configuration structures
//! - `loader`: configuration loading from files and environment
//! - `init`: server initialization, run loop and shutdown

pub mod config;
mod init;
mod loader;

pub use init::run;
pub use loader::load_config;
