//! crates/med_imaging_core/src/auth.rs
//!
//! Registration and verification policy on top of the `CredentialStore` port.

use sha2::{Digest, Sha256};

use crate::domain::User;
use crate::ports::{CredentialError, CredentialStore};

/// Hashes a password with a single unsalted SHA-256 round, hex-encoded.
///
/// This reproduces the documented credential scheme of the system being
/// reimplemented. It is a weak scheme (no per-user salt, no stretching);
/// see DESIGN.md before reusing it anywhere else.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Registers a new user, storing only the password digest.
///
/// Fails with `AlreadyExists` when the username is taken; the original
/// digest is left untouched in that case.
pub async fn register(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<User, CredentialError> {
    store.insert_user(username, &hash_password(password)).await?;
    Ok(User {
        username: username.to_string(),
    })
}

/// Verifies a username/password pair against the stored digest.
pub async fn verify(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<(), CredentialError> {
    let stored = store.fetch_password_hash(username).await?;
    if stored == hash_password(password) {
        Ok(())
    } else {
        Err(CredentialError::WrongPassword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stand-in for the SQLite adapter.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn insert_user(
            &self,
            username: &str,
            password_hash: &str,
        ) -> Result<(), CredentialError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(username) {
                return Err(CredentialError::AlreadyExists);
            }
            rows.insert(username.to_string(), password_hash.to_string());
            Ok(())
        }

        async fn fetch_password_hash(&self, username: &str) -> Result<String, CredentialError> {
            self.rows
                .lock()
                .unwrap()
                .get(username)
                .cloned()
                .ok_or(CredentialError::NotFound)
        }
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first_digest() {
        let store = MemoryStore::default();
        let user = register(&store, "alice", "pw1").await.unwrap();
        assert_eq!(user.username, "alice");

        let err = register(&store, "alice", "pw2").await.unwrap_err();
        assert_eq!(err, CredentialError::AlreadyExists);

        let stored = store.fetch_password_hash("alice").await.unwrap();
        assert_eq!(stored, hash_password("pw1"));
    }

    #[tokio::test]
    async fn verify_distinguishes_wrong_password_from_unknown_user() {
        let store = MemoryStore::default();
        register(&store, "alice", "pw1").await.unwrap();

        assert!(verify(&store, "alice", "pw1").await.is_ok());
        assert_eq!(
            verify(&store, "alice", "wrong").await.unwrap_err(),
            CredentialError::WrongPassword
        );
        assert_eq!(
            verify(&store, "bob", "x").await.unwrap_err(),
            CredentialError::NotFound
        );
    }

    #[tokio::test]
    async fn usernames_are_case_sensitive() {
        let store = MemoryStore::default();
        register(&store, "Alice", "pw").await.unwrap();
        assert_eq!(
            verify(&store, "alice", "pw").await.unwrap_err(),
            CredentialError::NotFound
        );
    }

    #[test]
    fn hash_is_deterministic_and_never_the_clear_text() {
        let digest = hash_password("hunter2");
        assert_eq!(digest, hash_password("hunter2"));
        assert_ne!(digest, "hunter2");
        assert_eq!(digest.len(), 64);
    }
}
