//! Persistence of trained voice models.
//!
//! Each model is one JSON file, `<name>.json`, inside a single directory.
//! The directory is injected so tests and embedders can point the store
//! anywhere; the default is `~/.stimmenklon_models`.
//!
//! There is no cross-process locking. Two processes saving under the same
//! name race, last write wins; the single-flight guard in the manager only
//! covers one process.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::SpeakerEmbedding;
use crate::error::VoiceError;

/// File extension of persisted model records.
pub const MODEL_FILE_EXT: &str = "json";

/// Format tag written into every record.
pub const FORMAT_VERSION: &str = "1.0";

/// The persisted form of a trained voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceModel {
    pub model_name: String,
    pub speaker_embedding: SpeakerEmbedding,
    pub version: String,
}

impl VoiceModel {
    pub fn new(name: impl Into<String>, embedding: SpeakerEmbedding) -> Self {
        Self {
            model_name: name.into(),
            speaker_embedding: embedding,
            version: FORMAT_VERSION.to_string(),
        }
    }
}

/// Directory-backed store of [`VoiceModel`] records, keyed by model name.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Store rooted at an explicit directory.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store at the per-user default location.
    pub fn default_location() -> Self {
        let base = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self::open(base.join(".stimmenklon_models"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{MODEL_FILE_EXT}"))
    }

    /// Serialize `model` under its name, creating the directory on first
    /// save. An existing record of the same name is overwritten.
    pub fn save(&self, model: &VoiceModel) -> Result<PathBuf, VoiceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.model_path(&model.model_name);
        let json =
            serde_json::to_string_pretty(model).map_err(|e| VoiceError::Io(e.into()))?;
        fs::write(&path, json)?;
        log::info!("voice model saved to {}", path.display());
        Ok(path)
    }

    /// Load the record stored under `name`.
    pub fn load(&self, name: &str) -> Result<VoiceModel, VoiceError> {
        let path = self.model_path(name);
        if !path.exists() {
            return Err(VoiceError::ModelNotFound(name.to_string()));
        }
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|e| VoiceError::ModelCorrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Names of all stored models, sorted. A store whose directory does not
    /// exist yet is empty, not an error.
    pub fn list(&self) -> Result<Vec<String>, VoiceError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MODEL_FILE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding() -> SpeakerEmbedding {
        SpeakerEmbedding::new(vec![0.5; 8])
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path());

        store.save(&VoiceModel::new("alice", embedding())).unwrap();
        let loaded = store.load("alice").unwrap();

        assert_eq!(loaded.model_name, "alice");
        assert_eq!(loaded.speaker_embedding, embedding());
        assert_eq!(loaded.version, FORMAT_VERSION);
    }

    #[test]
    fn load_of_unknown_name_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path());
        assert!(matches!(
            store.load("ghost"),
            Err(VoiceError::ModelNotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn unparseable_record_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path());
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("broken.json"), "{ nope").unwrap();

        assert!(matches!(
            store.load("broken"),
            Err(VoiceError::ModelCorrupt { .. })
        ));
    }

    #[test]
    fn listing_a_nonexistent_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path().join("never_created"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn listing_strips_the_extension_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path());

        store.save(&VoiceModel::new("zeta", embedding())).unwrap();
        store.save(&VoiceModel::new("alpha", embedding())).unwrap();
        // Foreign files in the directory are ignored.
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn resaving_overwrites_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path());

        store.save(&VoiceModel::new("bob", embedding())).unwrap();
        store
            .save(&VoiceModel::new("bob", SpeakerEmbedding::new(vec![1.0; 8])))
            .unwrap();

        assert_eq!(store.list().unwrap(), vec!["bob"]);
        assert_eq!(
            store.load("bob").unwrap().speaker_embedding,
            SpeakerEmbedding::new(vec![1.0; 8])
        );
    }
}
