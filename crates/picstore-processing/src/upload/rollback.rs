use picstore_core::AppError;
use picstore_storage::{Storage, StorageError};
use std::sync::Arc;

/// Deletes every registered blob unless disarmed.
///
/// Await [`RollbackGuard::rollback`] on the error path. A guard dropped while
/// still armed (panic, cancelled request) schedules the same cleanup on the
/// current runtime without waiting for it.
pub(crate) struct RollbackGuard {
    storage: Arc<dyn Storage>,
    keys: Vec<String>,
    armed: bool,
}

impl RollbackGuard {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            keys: Vec::new(),
            armed: true,
        }
    }

    pub fn register(&mut self, key: impl Into<String>) {
        self.keys.push(key.into());
    }

    /// Keep everything that was written.
    pub fn disarm(mut self) {
        self.armed = false;
    }

    /// Delete everything that was written and return `cause`, annotated with
    /// the cleanup failure if there was one.
    pub async fn rollback(mut self, cause: AppError) -> AppError {
        self.armed = false;
        let keys = std::mem::take(&mut self.keys);

        match remove_all(self.storage.as_ref(), &keys).await {
            Ok(()) => {
                tracing::debug!(keys = ?keys, "Rolled back partial upload");
                cause
            }
            Err(cleanup) => {
                let err = cause.map_message(|msg| {
                    format!("{} (removing copies failed: {})", msg, cleanup)
                });
                tracing::error!(
                    keys = ?keys,
                    error = %err,
                    "Rollback left orphaned blobs"
                );
                err
            }
        }
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        if !self.armed || self.keys.is_empty() {
            return;
        }

        let keys = std::mem::take(&mut self.keys);
        let storage = self.storage.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = remove_all(storage.as_ref(), &keys).await {
                        tracing::error!(keys = ?keys, error = %e, "Deferred rollback failed");
                    }
                });
            }
            Err(_) => {
                tracing::error!(keys = ?keys, "No runtime for deferred rollback");
            }
        }
    }
}

/// Attempt every delete, reporting the first failure.
async fn remove_all(storage: &dyn Storage, keys: &[String]) -> Result<(), StorageError> {
    let mut first_error = None;
    for key in keys {
        if let Err(e) = storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete blob during rollback");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
