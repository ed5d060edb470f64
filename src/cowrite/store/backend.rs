use crate::error::Result;

/// Abstract interface for raw storage I/O.
///
/// A backend is a flat key-value medium holding serialized blobs, in the
/// shape of a browser's `localStorage`. It knows nothing about documents;
/// [`DocumentStore`](super::DocumentStore) handles the "what" (the Root
/// aggregate, merging, timestamps) while the backend handles the "how".
pub trait StorageBackend {
    /// Read the blob stored under `key`.
    /// Returns Ok(None) if nothing has been written under that key yet.
    /// Returns Err only when the medium itself is unavailable.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    /// MUST be atomic: a failed write leaves the previous value intact.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}
