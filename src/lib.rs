pub mod bridge;
pub mod chain_client;
pub mod coin;
pub mod config;
pub mod fetcher;
pub mod respository;
pub mod shutdown;
pub mod signer;
pub mod tasks;
pub mod types;
