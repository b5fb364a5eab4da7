//! # User Types
//!
//! User records as held by the persistence layer, and the sanitized
//! identity that is the only user representation allowed past it.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer
    User,
    /// Store administrator
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored user record.
///
/// Not `Serialize`. Convert with [`sanitize`] before the record is placed in
/// a token, a session or a response.
#[derive(Clone, Deserialize)]
pub struct UserRecord {
    /// Unique user ID
    pub id: String,

    /// Login email (unique)
    pub email: String,

    /// Role
    #[serde(default)]
    pub role: Role,

    /// PBKDF2 output, hex encoded in seed files
    #[serde(deserialize_with = "from_hex")]
    password_hash: Vec<u8>,

    /// Per-user salt, hex encoded in seed files
    #[serde(deserialize_with = "from_hex")]
    salt: Vec<u8>,

    /// Shipping addresses (opaque here)
    #[serde(default)]
    pub addresses: Vec<serde_json::Value>,
}

impl UserRecord {
    /// Create a record with a generated ID
    pub fn new(
        email: impl Into<String>,
        role: Role,
        password_hash: Vec<u8>,
        salt: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            role,
            password_hash,
            salt,
            addresses: Vec::new(),
        }
    }

    /// Builder: set a fixed ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: add an address
    pub fn with_address(mut self, address: serde_json::Value) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn password_hash(&self) -> &[u8] {
        &self.password_hash
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password_hash", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("addresses", &self.addresses.len())
            .finish()
    }
}

fn from_hex<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    hex::decode(s).map_err(serde::de::Error::custom)
}

/// The non-sensitive projection of a [`UserRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedIdentity {
    pub id: String,
    pub role: Role,
}

impl SanitizedIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&UserRecord> for SanitizedIdentity {
    fn from(user: &UserRecord) -> Self {
        sanitize(user)
    }
}

/// Strip credentials from a user record.
pub fn sanitize(user: &UserRecord) -> SanitizedIdentity {
    SanitizedIdentity {
        id: user.id.clone(),
        role: user.role,
    }
}
