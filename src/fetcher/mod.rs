pub mod fee;
pub mod fetcher;
pub mod runner;
pub mod tron_fetcher;
