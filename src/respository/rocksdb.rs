use crate::respository::r#trait::KeyValueStore;
use crate::types::AppError;
use async_trait::async_trait;
use ::rocksdb::{Options, DB};
use std::path::Path;
use std::sync::Arc;

/// RocksDB store, one database per chain under `${db_path}/${chain_id}`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    pub fn open(db_path: &str, chain_id: &str) -> Result<Self, AppError> {
        let path = Path::new(db_path).join(chain_id);
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, &path)
            .map_err(|e| AppError::Database(format!("Failed to open RocksDB at '{}': {}", path.display(), e)))?;
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl KeyValueStore for RocksDbStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(value)) => {
                let value = String::from_utf8(value)
                    .map_err(|e| AppError::Database(format!("Invalid UTF-8 under {}: {}", key, e)))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("RocksDB get failed: {}", e))),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.db
            .put(key.as_bytes(), value.as_bytes())
            .map_err(|e| AppError::Database(format!("RocksDB put failed: {}", e)))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.db
            .delete(key.as_bytes())
            .map_err(|e| AppError::Database(format!("RocksDB delete failed: {}", e)))
    }
}
