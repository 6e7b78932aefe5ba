use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Error type for persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The document could not be read (missing file, permissions, I/O failure).
    #[error("failed to read document at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document exists but is not valid JSON for the expected shape.
    /// Surfaced loudly so a corrupt collection is never mistaken for an
    /// empty one and overwritten on the next save.
    #[error("document at {path} is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The document could not be written (disk full, permissions).
    #[error("failed to write document at {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single JSON document on disk, loaded and saved as a whole.
///
/// This is the seam between the entry store and durable storage: swapping
/// the backing store means replacing this type, not the store's contract.
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Returns the path of the underlying document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and deserializes the whole document.
    pub async fn load(&self) -> Result<T, StorageError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| StorageError::Read {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Serializes and replaces the whole document.
    ///
    /// The new content is written to a sibling temp file which is then
    /// renamed over the target, so a concurrent `load` sees either the old
    /// document or the new one, never a mix, and a failed save leaves the
    /// old document intact.
    pub async fn save(&self, value: &T) -> Result<(), StorageError> {
        let bytes =
            serde_json::to_vec_pretty(value).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn can_round_trip_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Vec<u64>> = JsonDocument::new(dir.path().join("numbers.json"));

        doc.save(&vec![1, 2, 3]).await.unwrap();
        let loaded = doc.load().await.unwrap();

        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn load_of_missing_document_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Vec<u64>> = JsonDocument::new(dir.path().join("missing.json"));

        let err = doc.load().await.unwrap_err();

        assert!(matches!(err, StorageError::Read { .. }));
    }

    #[tokio::test]
    async fn load_of_corrupt_document_is_loud() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, b"[{not json").unwrap();
        let doc: JsonDocument<Vec<u64>> = JsonDocument::new(&path);

        let err = doc.load().await.unwrap_err();

        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn save_replaces_the_previous_content_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        let doc: JsonDocument<Vec<String>> = JsonDocument::new(&path);

        doc.save(&vec!["a".to_string(), "b".to_string()]).await.unwrap();
        doc.save(&vec!["c".to_string()]).await.unwrap();

        let loaded = doc.load().await.unwrap();
        assert_eq!(loaded, vec!["c".to_string()]);
        // No temp file is left behind after a successful save.
        assert!(!dir.path().join("items.json.tmp").exists());
    }
}
