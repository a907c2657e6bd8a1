//! This file defines the identity record of one user account and its
//! field-delimited serialization for the durable key-value store.

use std::fmt::Display;
use std::str::FromStr;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// A newtype wrapper for opaque user IDs.
///
/// IDs are opaque strings (UUIDs in the local backend, service-assigned ids
/// in the remote backend). The wrapper keeps them from being mixed up with
/// other stringly-typed values at compile time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The durable representation of one user account.
///
/// Created on signup, read on login and session restore, mutated only via
/// display-name updates. Accounts are never deleted by the application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The account's unique, opaque id.
    pub id: UserId,
    /// The email address the account was registered with. Unique within a
    /// store.
    pub email: EmailAddress,
    /// The name shown in menus and greetings.
    pub name: String,
    /// When the account was created. Stored with whole-second precision so
    /// the value survives a round trip through the record format.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserProfile {
    /// Serialize the profile as a field-delimited record for the key-value
    /// store.
    ///
    /// The format is `id|email|name|created_at` with the timestamp as unix
    /// seconds. Display names are validated against embedded `|` and line
    /// breaks before they reach this function, see [validate_display_name].
    pub fn to_record(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.id,
            self.email,
            self.name,
            self.created_at.unix_timestamp()
        )
    }

    /// Parse a profile from a field-delimited record.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidRecord] if the record does not have the shape
    /// produced by [UserProfile::to_record].
    pub fn from_record(record: &str) -> Result<Self, Error> {
        let (id, email, name, timestamp) =
            sscanf::sscanf!(record, "{String}|{String}|{String}|{i64}").ok_or_else(|| {
                Error::InvalidRecord("expected id|email|name|created_at".to_string())
            })?;

        let email = EmailAddress::from_str(&email).map_err(|_| Error::InvalidEmail(email))?;
        let created_at = OffsetDateTime::from_unix_timestamp(timestamp)
            .map_err(|error| Error::InvalidRecord(error.to_string()))?;

        Ok(Self {
            id: UserId::new(id),
            email,
            name,
            created_at,
        })
    }
}

/// Check that a display name is non-empty and representable in the record
/// format.
///
/// # Errors
///
/// Returns [Error::EmptyField] for an empty or whitespace-only name and
/// [Error::InvalidDisplayName] if the name contains `|` or a line break.
pub(crate) fn validate_display_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::EmptyField("name"));
    }

    if name.contains('|') || name.contains('\n') || name.contains('\r') {
        return Err(Error::InvalidDisplayName);
    }

    Ok(())
}
