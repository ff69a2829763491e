pub mod cache;
pub mod keys;
pub mod tss;

pub use cache::SignerCache;
pub use keys::{KeyManager, LocalKeyManager};
pub use tss::{Blame, KeysignError, TssKeyManager, TssServer};
