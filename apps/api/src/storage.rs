//! # Object Storage Boundary
//!
//! Image bytes never pass through the core: clients upload to the storage
//! provider directly and submit `{storageId, url}` references with their
//! listings. The only storage operation the server performs is cleanup
//! when listings or rewards are deleted or re-imaged.

use tracing::info;

/// The storage collaborator's interface, reduced to what the server uses.
///
/// Deletion is best-effort: failures are the implementation's problem to
/// log and retry; they never fail the calling request.
pub trait ObjectStore: Send + Sync {
    /// Deletes stored images by storage id.
    fn delete_images(&self, storage_ids: &[String]);
}

/// A no-op store for deployments without a storage provider; it only
/// records what would have been deleted.
#[derive(Debug, Default)]
pub struct DisabledStore;

impl ObjectStore for DisabledStore {
    fn delete_images(&self, storage_ids: &[String]) {
        if !storage_ids.is_empty() {
            info!(count = storage_ids.len(), "Object storage disabled, skipping image deletion");
        }
    }
}
