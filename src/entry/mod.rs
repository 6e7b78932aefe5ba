use serde::{Deserialize, Serialize};

use crate::storage::{JsonDocument, StorageError};

pub mod api;

/// A single to-do entry owned by one user.
///
/// The serialized field names (`id`, `userId`, `completed`, `content`) are
/// the durable document contract and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    id: u64,
    #[serde(rename = "userId")]
    user_id: u64,
    completed: bool,
    content: String,
}

impl Entry {
    pub fn new(id: u64, user_id: u64, completed: bool, content: String) -> Self {
        Self {
            id,
            user_id,
            completed,
            content,
        }
    }

    /// Returns the ID of the entry.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the ID of the owning user.
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// Returns whether the entry has been completed.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the entry's content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Error type for EntryStore operations.
#[derive(Debug, thiserror::Error)]
pub enum EntryStoreError {
    /// Represents an entry not found error.
    #[error("Entry with ID {0} not found")]
    EntryNotFound(u64),
    /// Represents a persistence error.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The canonical store of to-do entries, backed by one JSON document.
///
/// Every operation is a full load-mutate-save cycle. Mutations take the
/// write lock for the whole cycle so two concurrent writers can never
/// overwrite each other's result with stale data. Reads run without the
/// lock: the document is replaced atomically on save, so a load never
/// observes a partial write.
pub struct EntryStore {
    doc: JsonDocument<Vec<Entry>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl EntryStore {
    pub fn new(doc: JsonDocument<Vec<Entry>>) -> Self {
        Self {
            doc,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Retrieves all entries owned by the given user, ordered by ascending ID.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The ID of the owning user.
    ///
    /// # Returns
    ///
    /// A `Result` containing the user's entries (empty when they have none),
    /// or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn entries_by_user(&self, user_id: u64) -> Result<Vec<Entry>, EntryStoreError> {
        let mut entries = self.doc.load().await?;
        entries.sort_by_key(|entry| entry.id);
        entries.retain(|entry| entry.user_id == user_id);
        Ok(entries)
    }

    /// Appends a new, not-yet-completed entry for the given user.
    ///
    /// The new entry's ID is one greater than the highest ID in the
    /// collection, so IDs are unique and strictly increasing in assignment
    /// order.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The ID of the owning user.
    /// * `content` - The entry content. Emptiness is rejected at the API
    ///   boundary; the store does not re-check it.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Entry` if successful, or an error
    /// otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn add_entry(&self, user_id: u64, content: String) -> Result<Entry, EntryStoreError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.doc.load().await?;
        // Saturates instead of overflowing if a corrupt document carries
        // id == u64::MAX; the store favors forward progress over repair.
        let next_id = entries
            .iter()
            .map(Entry::id)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        let entry = Entry::new(next_id, user_id, false, content);
        entries.push(entry.clone());
        // Re-sort before saving. Entries are appended in ID order, so this
        // only matters if the document was ever written out of order.
        entries.sort_by_key(|entry| entry.id);
        self.doc.save(&entries).await?;

        Ok(entry)
    }

    /// Sets the completion state of the entry with the given ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the entry to update.
    /// * `completed` - The new completion state.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Entry` if successful, or an error
    /// otherwise. On error the persisted collection is unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn set_completion(
        &self,
        id: u64,
        completed: bool,
    ) -> Result<Entry, EntryStoreError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.doc.load().await?;
        entries.sort_by_key(|entry| entry.id);
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(EntryStoreError::EntryNotFound(id))?;
        entry.completed = completed;
        let updated = entry.clone();
        self.doc.save(&entries).await?;

        Ok(updated)
    }
}
