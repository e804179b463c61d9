//! Directory of JSON files, one per pending order.

use crate::StoreError;
use chrono::{DateTime, Duration, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use storefront_commerce::order::{OrderId, PendingOrder};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Directory used when none is configured, relative to the working directory.
pub const DEFAULT_TEMP_DIR: &str = ".temp_orders";

const EXTENSION: &str = "json";

/// File-backed store of orders awaiting a payment confirmation.
///
/// Cheap to clone; clones share the same directory.
#[derive(Debug, Clone)]
pub struct TempOrderStore {
    dir: PathBuf,
}

/// A stored order as seen by [`TempOrderStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOrder {
    pub order_id: OrderId,
    pub modified: DateTime<Utc>,
    pub path: PathBuf,
}

impl TempOrderStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an order under its id, replacing any previous record.
    ///
    /// The file is written next to its final name and renamed into place,
    /// so readers never observe a partial record.
    pub async fn save(&self, order: &PendingOrder) -> Result<PathBuf, StoreError> {
        self.ensure_dir().await?;

        let path = self.path_for(&order.order_id);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", order.order_id, Uuid::new_v4().simple()));
        let json = serde_json::to_vec_pretty(order)?;

        fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io(&path, e));
        }

        info!(order_id = %order.order_id, path = %path.display(), "saved pending order");
        Ok(path)
    }

    /// Load an order. A missing record is `Ok(None)`.
    pub async fn get(&self, order_id: impl AsRef<str>) -> Result<Option<PendingOrder>, StoreError> {
        let order_id = parse_id(order_id.as_ref())?;
        let path = self.path_for(&order_id);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(order_id = %order_id, "no pending order on disk");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        match serde_json::from_slice(&bytes) {
            Ok(order) => Ok(Some(order)),
            Err(source) => {
                warn!(order_id = %order_id, error = %source, "pending order file is corrupt");
                Err(StoreError::Corrupt {
                    order_id: order_id.into_inner(),
                    source,
                })
            }
        }
    }

    /// Remove an order. Returns false if there was nothing to remove.
    pub async fn delete(&self, order_id: impl AsRef<str>) -> Result<bool, StoreError> {
        let order_id = parse_id(order_id.as_ref())?;
        let path = self.path_for(&order_id);

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(order_id = %order_id, "deleted pending order");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(order_id = %order_id, "pending order already gone");
                Ok(false)
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Check if an order is stored.
    pub async fn exists(&self, order_id: impl AsRef<str>) -> Result<bool, StoreError> {
        let order_id = parse_id(order_id.as_ref())?;
        let path = self.path_for(&order_id);
        fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }

    /// All stored orders, oldest first. A missing directory is an empty store.
    pub async fn list(&self) -> Result<Vec<StoredOrder>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.dir, e)),
        };

        let mut orders = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(order_id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| OrderId::parse(s).ok())
            else {
                continue;
            };
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| StoreError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .map_err(|e| StoreError::io(&path, e))?;
            orders.push(StoredOrder {
                order_id,
                modified,
                path,
            });
        }

        orders.sort_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Ok(orders)
    }

    /// Delete orders last written more than `max_age` ago. Returns the ids removed.
    pub async fn purge_older_than(&self, max_age: Duration) -> Result<Vec<OrderId>, StoreError> {
        let cutoff = Utc::now() - max_age;
        let mut removed = Vec::new();
        for stored in self.list().await? {
            if stored.modified >= cutoff {
                continue;
            }
            if self.delete(&stored.order_id).await? {
                removed.push(stored.order_id);
            }
        }
        if !removed.is_empty() {
            info!(count = removed.len(), "purged stale pending orders");
        }
        Ok(removed)
    }

    fn path_for(&self, order_id: &OrderId) -> PathBuf {
        self.dir.join(format!("{}.{}", order_id, EXTENSION))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))
    }
}

impl Default for TempOrderStore {
    fn default() -> Self {
        Self::new(DEFAULT_TEMP_DIR)
    }
}

fn parse_id(raw: &str) -> Result<OrderId, StoreError> {
    OrderId::parse(raw).map_err(|_| StoreError::InvalidOrderId(raw.to_string()))
}
