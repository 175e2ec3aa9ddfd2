use mekanix_kernel::Level;
use uuid::Uuid;

use crate::sha256_hex;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
}

/// A frozen copy of an edit-mode level, taken when entering Play.
///
/// The level is stored as CBOR bytes addressed by their SHA-256, so restore
/// can detect corruption before handing anything back.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    id: Uuid,
    level_name: String,
    bytes: Vec<u8>,
    hash: String,
}

impl Snapshot {
    pub fn capture(level: &Level) -> Result<Self, SnapshotError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(level, &mut bytes)
            .map_err(|e| SnapshotError::CborEncode(e.to_string()))?;
        let hash = sha256_hex(&bytes);
        let id = Uuid::new_v4();
        tracing::debug!(%id, size = bytes.len(), "captured level snapshot");
        Ok(Self {
            id,
            level_name: level.name().to_owned(),
            bytes,
            hash,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Recompute the content hash and compare.
    pub fn verify(&self) -> bool {
        sha256_hex(&self.bytes) == self.hash
    }

    /// Decode the captured level. Fails if the bytes no longer match the hash.
    pub fn restore(&self) -> Result<Level, SnapshotError> {
        let actual = sha256_hex(&self.bytes);
        if actual != self.hash {
            return Err(SnapshotError::IntegrityMismatch {
                expected: self.hash.clone(),
                actual,
            });
        }
        let mut level: Level = ciborium::from_reader(self.bytes.as_slice())
            .map_err(|e| SnapshotError::CborDecode(e.to_string()))?;
        level.mark_dirty();
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use mekanix_kernel::{PartKind, PropertyEdit, presets};

    fn edited_level() -> Level {
        let mut level = presets::default_level();
        let root = level.player().primary;
        let child = level.add_part(PartKind::Limb, root, None).unwrap();
        level.update_property(child, PropertyEdit::Angle(1.25)).unwrap();
        let platform = level.add_platform(Vec2::new(200.0, 800.0));
        level.delete_platform(platform).unwrap();
        level
    }

    #[test]
    fn capture_and_verify() {
        let snap = Snapshot::capture(&edited_level()).unwrap();
        assert!(snap.verify());
        assert!(!snap.is_empty());
        assert_eq!(snap.hash().len(), 64);
        assert_eq!(snap.level_name(), "default");
    }

    #[test]
    fn restore_preserves_ids_and_counter() {
        let level = edited_level();
        let snap = Snapshot::capture(&level).unwrap();
        let restored = snap.restore().unwrap();
        assert_eq!(restored, level);
        assert_eq!(restored.entity_ids(), level.entity_ids());
        assert_eq!(restored.next_id(), level.next_id());
    }

    #[test]
    fn same_level_same_hash() {
        let level = edited_level();
        let a = Snapshot::capture(&level).unwrap();
        let b = Snapshot::capture(&level).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn corruption_detected() {
        let mut snap = Snapshot::capture(&edited_level()).unwrap();
        if let Some(byte) = snap.bytes.last_mut() {
            *byte ^= 0xff;
        }
        assert!(!snap.verify());
        assert!(matches!(
            snap.restore(),
            Err(SnapshotError::IntegrityMismatch { .. })
        ));
    }
}
