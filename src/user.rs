use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::storage::{JsonDocument, StorageError};

/// A registered user, as stored in the users document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: u64,
    username: String,
    #[serde(rename = "passwordHash")]
    password_hash: String,
}

impl User {
    pub fn new(id: u64, username: String, password_hash: String) -> Self {
        Self {
            id,
            username,
            password_hash,
        }
    }

    /// Returns the ID of the user.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Hex digest used for stored passwords.
pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Read-only lookup over the users document.
///
/// User management (registration, password change) is out of scope; the
/// document is provisioned by the operator.
#[derive(Debug, Clone)]
pub struct UserService {
    doc: JsonDocument<Vec<User>>,
}

impl UserService {
    pub fn new(doc: JsonDocument<Vec<User>>) -> Self {
        Self { doc }
    }

    /// Finds the user matching the given username and password.
    ///
    /// Returns `None` when no user matches. The password is compared by
    /// SHA-256 hex digest against the stored hash.
    #[tracing::instrument(skip(self, password))]
    pub async fn user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, StorageError> {
        let digest = password_digest(password);
        let users = self.doc.load().await?;
        Ok(users
            .into_iter()
            .find(|user| user.username == username && user.password_hash == digest))
    }

    /// Finds the user with the given ID.
    #[tracing::instrument(skip(self))]
    pub async fn user_by_id(&self, id: u64) -> Result<Option<User>, StorageError> {
        let users = self.doc.load().await?;
        Ok(users.into_iter().find(|user| user.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with(dir: &tempfile::TempDir, users: &[User]) -> UserService {
        let path = dir.path().join("users.json");
        std::fs::write(&path, serde_json::to_string_pretty(users).unwrap()).unwrap();
        UserService::new(JsonDocument::new(path))
    }

    #[tokio::test]
    async fn can_find_user_by_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(
            &dir,
            &[User::new(
                7,
                "alice".to_string(),
                password_digest("hunter2"),
            )],
        );

        let found = service.user_by_credentials("alice", "hunter2").await.unwrap();
        assert_eq!(found.map(|user| user.id()), Some(7));

        let wrong_password = service.user_by_credentials("alice", "wrong").await.unwrap();
        assert!(wrong_password.is_none());

        let unknown_user = service.user_by_credentials("bob", "hunter2").await.unwrap();
        assert!(unknown_user.is_none());
    }

    #[tokio::test]
    async fn can_find_user_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(
            &dir,
            &[
                User::new(1, "alice".to_string(), password_digest("a")),
                User::new(2, "bob".to_string(), password_digest("b")),
            ],
        );

        let found = service.user_by_id(2).await.unwrap();
        assert_eq!(found.map(|user| user.username().to_string()), Some("bob".to_string()));

        assert!(service.user_by_id(99).await.unwrap().is_none());
    }

    #[test]
    fn password_digest_is_sha256_hex() {
        assert_eq!(
            password_digest("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }
}
