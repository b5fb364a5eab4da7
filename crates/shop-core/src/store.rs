//! # Credential Store
//!
//! Read-only access to user records held by the persistence layer.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │         CredentialStore (trait)              │
//! │  ├── find_by_email()                         │
//! │  └── find_by_id()                            │
//! └──────────────────────────────────────────────┘
//!                       ▲
//!          ┌────────────┴────────────┐
//!  ┌───────┴─────────┐      ┌────────┴────────┐
//!  │MemoryCredential │      │ database-backed │
//!  │     Store       │      │   (external)    │
//!  └─────────────────┘      └─────────────────┘
//! ```

use crate::user::UserRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Failure to produce a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No record matches
    #[error("Record not found")]
    NotFound,

    /// The store could not answer
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for store lookups
pub type LookupResult<T> = Result<T, LookupError>;

/// Failure to load a seed file
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Malformed seed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate email in seed: {0}")]
    DuplicateEmail(String),
}

/// Lookup of user records by email or ID.
///
/// Emails are unique, so `find_by_email` yields at most one record.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> LookupResult<UserRecord>;

    async fn find_by_id(&self, id: &str) -> LookupResult<UserRecord>;
}

/// Type alias for a shared credential store (dynamic dispatch)
pub type BoxedCredentialStore = Arc<dyn CredentialStore>;

/// In-memory credential store, seeded from TOML at startup.
///
/// ```toml
/// [[users]]
/// id = "6501f0c2"
/// email = "a@x.com"
/// role = "user"
/// password_hash = "<64 hex chars>"
/// salt = "<32 hex chars>"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryCredentialStore {
    #[serde(default)]
    users: Vec<UserRecord>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self { users: Vec::new() }
    }

    /// Add a user. Returns false if the email is already taken.
    pub fn add(&mut self, user: UserRecord) -> bool {
        if self.users.iter().any(|u| u.email == user.email) {
            return false;
        }
        self.users.push(user);
        true
    }

    /// Builder: add a user
    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.add(user);
        self
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Load store from TOML string. Emails must be unique.
    pub fn from_toml(toml_str: &str) -> Result<Self, SeedError> {
        let parsed: MemoryCredentialStore = toml::from_str(toml_str)?;
        let mut store = Self::new();
        for user in parsed.users {
            let email = user.email.clone();
            if !store.add(user) {
                return Err(SeedError::DuplicateEmail(email));
            }
        }
        Ok(store)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> LookupResult<UserRecord> {
        self.users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(LookupError::NotFound)
    }

    async fn find_by_id(&self, id: &str) -> LookupResult<UserRecord> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(LookupError::NotFound)
    }
}
