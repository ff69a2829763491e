mod memory;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb;
mod r#trait;

pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb::RocksDbStore;
pub use r#trait::KeyValueStore;

use crate::types::AppError;
use log::info;
use std::sync::Arc;

const SCAN_POSITION_PREFIX: &str = "scan_position:";

/// Opens the per-chain store: RocksDB when a path is configured, memory otherwise.
pub fn open_store(db_path: Option<&str>, chain_id: &str) -> Result<Arc<dyn KeyValueStore>, AppError> {
    match db_path {
        Some(path) if !path.is_empty() => open_disk_store(path, chain_id),
        _ => {
            info!("[Store] no db_path configured, using in-memory store for {}", chain_id);
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(feature = "rocksdb-backend")]
fn open_disk_store(path: &str, chain_id: &str) -> Result<Arc<dyn KeyValueStore>, AppError> {
    info!("[Store] opening RocksDB at {}/{}", path, chain_id);
    Ok(Arc::new(RocksDbStore::open(path, chain_id)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_disk_store(path: &str, chain_id: &str) -> Result<Arc<dyn KeyValueStore>, AppError> {
    log::warn!(
        "[Store] db_path {} set but rocksdb-backend is not enabled, using in-memory store for {}",
        path, chain_id
    );
    Ok(Arc::new(MemoryStore::new()))
}

/// Next height to fetch for `chain`, if a cursor was ever stored.
pub async fn get_scan_position(store: &dyn KeyValueStore, chain: &str) -> Result<Option<i64>, AppError> {
    match store.get(&format!("{}{}", SCAN_POSITION_PREFIX, chain)).await? {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| AppError::Database(format!("corrupt scan position {:?}: {}", value, e))),
        None => Ok(None),
    }
}

pub async fn set_scan_position(store: &dyn KeyValueStore, chain: &str, height: i64) -> Result<(), AppError> {
    store.put(&format!("{}{}", SCAN_POSITION_PREFIX, chain), &height.to_string()).await
}
