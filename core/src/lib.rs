pub mod backends;
pub mod browser;
pub mod config;
pub mod errors;
pub mod files;
pub mod locator;
pub mod player;
pub mod session;
pub mod share;
pub mod store;
pub mod transfer;
