use mekanix_kernel::Level;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version of the on-disk level layout.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("document level is inconsistent: {0}")]
    InvalidLevel(#[from] mekanix_kernel::LevelError),
}

/// A level as exchanged with the outside world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDocument {
    pub schema_version: u32,
    pub level: Level,
}

impl LevelDocument {
    pub fn new(level: Level) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            level,
        }
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and check a document. The level must pass [`Level::validate`],
    /// so ids stay unique and the id counter is ahead of every id.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let mut doc: Self = serde_json::from_str(json)?;
        if doc.schema_version != SCHEMA_VERSION {
            return Err(DocumentError::SchemaMismatch {
                file_version: doc.schema_version,
                expected_version: SCHEMA_VERSION,
            });
        }
        doc.level.validate()?;
        doc.level.mark_dirty();
        Ok(doc)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), level_name = self.level.name(), "saved level");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn into_level(self) -> Level {
        self.level
    }
}
