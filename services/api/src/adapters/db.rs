//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `CredentialStore` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use med_imaging_core::domain::UserCredentials;
use med_imaging_core::ports::{CredentialError, CredentialStore};
use sqlx::{FromRow, SqlitePool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `CredentialStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotently creates the credential table at startup. The primary key
    /// is what serializes concurrent registrations to a single winner.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CredentialsRecord {
    username: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for DbAdapter {
    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), CredentialError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO users (username, password_hash) VALUES (?1, ?2)")
                .bind(username)
                .bind(password_hash)
                .execute(&self.pool)
                .await
                .map_err(|e| CredentialError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CredentialError::AlreadyExists);
        }
        Ok(())
    }

    async fn fetch_password_hash(&self, username: &str) -> Result<String, CredentialError> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT username, password_hash FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CredentialError::Storage(e.to_string()))?;

        match record {
            Some(record) => Ok(record.to_domain().password_hash),
            None => Err(CredentialError::NotFound),
        }
    }
}
