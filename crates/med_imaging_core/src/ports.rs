//! crates/med_imaging_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use std::path::Path;

use async_trait::async_trait;

//=========================================================================================
// Port Error Types
//=========================================================================================

/// Errors surfaced by the credential store and the register/verify policy
/// built on top of it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Username already exists")]
    AlreadyExists,
    #[error("Username not found")]
    NotFound,
    #[error("Wrong password")]
    WrongPassword,
    #[error("Credential storage error: {0}")]
    Storage(String),
}

/// Errors from a single remote analysis call, as classified by the adapter.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// Provider-signaled throttling; the caller should back off and retry.
    #[error("Remote model rate-limited the request")]
    RateLimited,
    /// Retried on rate limits up to the configured budget without success.
    #[error("Rate-limit retries exhausted")]
    RetriesExhausted,
    /// The request's cancellation token fired before a response arrived.
    #[error("Analysis cancelled")]
    Cancelled,
    /// Any other remote failure; never retried.
    #[error("Remote analysis error: {0}")]
    Remote(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable storage for user credentials. Implementations must enforce
/// username uniqueness with a storage-level unique-key constraint so that
/// concurrent inserts of the same name serialize to a single winner.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a new user row. Returns `AlreadyExists` if the username is
    /// already present (case-sensitive exact match). The row must be durably
    /// committed before this returns `Ok`.
    async fn insert_user(&self, username: &str, password_hash: &str)
        -> Result<(), CredentialError>;

    /// Fetches the stored password digest for a username, or `NotFound`.
    async fn fetch_password_hash(&self, username: &str) -> Result<String, CredentialError>;
}

/// A single call to the remote multimodal model: one prompt, one image
/// attachment staged on disk, one text response. The remote capability may
/// invoke a web-search tool on its own; that is opaque to this port.
#[async_trait]
pub trait VisionAnalysisService: Send + Sync {
    /// `attachment` is the path of the staged, normalized image; it is valid
    /// only for the duration of this call.
    async fn analyze_image(&self, prompt: &str, attachment: &Path)
        -> Result<String, AnalysisError>;
}
