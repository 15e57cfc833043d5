pub mod actions;
pub mod cli;
pub mod config;
pub mod errors;
pub mod log;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod sections;
pub mod server;
pub mod session;
pub mod speech;
pub mod ux;
pub mod wire;
