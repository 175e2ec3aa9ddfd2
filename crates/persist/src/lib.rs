//! Persistence: verifiable snapshots of the edit-mode level and the JSON
//! document format used for import and export.
//!
//! # Invariants
//! - Restoring a snapshot yields a level equal to the captured one, ids and
//!   id counter included.
//! - Snapshots are content-addressed; a corrupted snapshot is never restored.
//! - Documents carry a schema version and are refused on mismatch.

pub mod document;
pub mod snapshot;

pub use document::{DocumentError, LevelDocument, SCHEMA_VERSION};
pub use snapshot::{Snapshot, SnapshotError};

use sha2::{Digest, Sha256};

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
