//! The mock identity backend over durable key-value storage.
//!
//! Two keys are used: `"user"` holds the current session identity and
//! `"users"` holds the registered-identity table. Values are field-delimited
//! text records, one identity per line in the table. Secrets are stored as
//! bcrypt hashes, never in the clear.

use std::str::FromStr;

use async_trait::async_trait;
use email_address::EmailAddress;
use time::OffsetDateTime;

use crate::{
    Error,
    backend::AuthBackend,
    password::{PasswordHash, ValidatedPassword},
    storage::LocalStorage,
    user::{UserId, UserProfile, validate_display_name},
};

/// Key under which the current session identity is persisted.
const USER_KEY: &str = "user";
/// Key under which the registered-identity table is persisted.
const USERS_KEY: &str = "users";

/// An identity record together with its credential hash, as stored in the
/// `"users"` table.
#[derive(Clone, Debug, PartialEq)]
struct StoredUser {
    profile: UserProfile,
    password_hash: PasswordHash,
}

impl StoredUser {
    /// Serialize as `id|email|name|created_at|bcrypt_hash`. Bcrypt hashes
    /// never contain `|`, and display names are validated against it.
    fn to_record(&self) -> String {
        format!("{}|{}", self.profile.to_record(), self.password_hash)
    }

    fn from_record(record: &str) -> Result<Self, Error> {
        let (id, email, name, timestamp, hash) =
            sscanf::sscanf!(record, "{String}|{String}|{String}|{i64}|{String}").ok_or_else(
                || Error::InvalidRecord("expected id|email|name|created_at|hash".to_string()),
            )?;

        let email = EmailAddress::from_str(&email).map_err(|_| Error::InvalidEmail(email))?;
        let created_at = OffsetDateTime::from_unix_timestamp(timestamp)
            .map_err(|error| Error::InvalidRecord(error.to_string()))?;

        Ok(Self {
            profile: UserProfile {
                id: UserId::new(id),
                email,
                name,
                created_at,
            },
            password_hash: PasswordHash::new_unchecked(&hash),
        })
    }
}

/// An [AuthBackend] over a [LocalStorage] store.
///
/// Stands in for the managed identity service during local development and
/// in tests. Pair it with [crate::MemoryStorage] for an ephemeral store or
/// [crate::DirStorage] for one that survives restarts.
#[derive(Debug, Clone)]
pub struct LocalBackend<S> {
    storage: S,
    bcrypt_cost: u32,
    strong_passwords: bool,
}

impl<S: LocalStorage> LocalBackend<S> {
    /// Create a backend over `storage` with the default bcrypt cost.
    ///
    /// Any non-empty password is accepted at registration, matching the
    /// managed identity service this backend stands in for. Chain
    /// [LocalBackend::require_strong_passwords] to reject guessable ones.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            bcrypt_cost: PasswordHash::DEFAULT_COST,
            strong_passwords: false,
        }
    }

    /// Create a backend with a custom bcrypt cost. Tests use the minimum
    /// cost to keep hashing fast.
    pub fn with_bcrypt_cost(storage: S, bcrypt_cost: u32) -> Self {
        Self {
            storage,
            bcrypt_cost,
            strong_passwords: false,
        }
    }

    /// Reject passwords that fail the [ValidatedPassword] strength check at
    /// registration.
    pub fn require_strong_passwords(mut self) -> Self {
        self.strong_passwords = true;
        self
    }

    fn load_users(&self) -> Result<Vec<StoredUser>, Error> {
        let Some(table) = self.storage.get(USERS_KEY)? else {
            return Ok(Vec::new());
        };

        table
            .lines()
            .filter(|line| !line.is_empty())
            .map(StoredUser::from_record)
            .collect()
    }

    fn save_users(&mut self, users: &[StoredUser]) -> Result<(), Error> {
        let table = users
            .iter()
            .map(StoredUser::to_record)
            .collect::<Vec<_>>()
            .join("\n");

        self.storage.set(USERS_KEY, &table)
    }

    fn persist_session(&mut self, profile: &UserProfile) -> Result<(), Error> {
        self.storage.set(USER_KEY, &profile.to_record())
    }
}

#[async_trait]
impl<S: LocalStorage + Send + Sync> AuthBackend for LocalBackend<S> {
    async fn authenticate(&mut self, email: &str, secret: &str) -> Result<UserProfile, Error> {
        let users = self.load_users()?;

        let matched = users
            .iter()
            .find(|user| user.profile.email.as_str().eq_ignore_ascii_case(email))
            .ok_or(Error::InvalidCredentials)?;

        if !matched.password_hash.matches(secret)? {
            return Err(Error::InvalidCredentials);
        }

        let profile = matched.profile.clone();
        self.persist_session(&profile)?;

        Ok(profile)
    }

    async fn register(
        &mut self,
        email: &str,
        secret: &str,
        name: &str,
    ) -> Result<UserProfile, Error> {
        let email =
            EmailAddress::from_str(email).map_err(|_| Error::InvalidEmail(email.to_string()))?;
        validate_display_name(name)?;

        let password = if self.strong_passwords {
            ValidatedPassword::new(secret)?
        } else if secret.is_empty() {
            return Err(Error::EmptyField("password"));
        } else {
            ValidatedPassword::new_unchecked(secret)
        };
        let password_hash = PasswordHash::new(password, self.bcrypt_cost)?;

        let mut users = self.load_users()?;

        if users
            .iter()
            .any(|user| user.profile.email.as_str().eq_ignore_ascii_case(email.as_str()))
        {
            return Err(Error::DuplicateEmail);
        }

        // Whole seconds, so the timestamp survives the record round trip.
        let created_at =
            OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp())
                .expect("current time is always in range");

        let profile = UserProfile {
            id: UserId::random(),
            email,
            name: name.to_string(),
            created_at,
        };

        users.push(StoredUser {
            profile: profile.clone(),
            password_hash,
        });
        self.save_users(&users)?;
        self.persist_session(&profile)?;

        Ok(profile)
    }

    async fn restore_session(&mut self) -> Result<Option<UserProfile>, Error> {
        let Some(record) = self.storage.get(USER_KEY)? else {
            return Ok(None);
        };

        match UserProfile::from_record(&record) {
            Ok(profile) => Ok(Some(profile)),
            Err(error) => {
                // A corrupt marker is discarded so restore still resolves to
                // a definite state.
                tracing::warn!("discarding unreadable session marker: {error}");
                self.storage.remove(USER_KEY)?;

                Ok(None)
            }
        }
    }

    async fn sign_out(&mut self) -> Result<(), Error> {
        self.storage.remove(USER_KEY)
    }

    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, Error> {
        self.load_users()?
            .into_iter()
            .find(|user| &user.profile.id == id)
            .map(|user| user.profile)
            .ok_or(Error::NotFound)
    }

    async fn update_profile(&mut self, id: &UserId, name: &str) -> Result<(), Error> {
        validate_display_name(name)?;

        let mut users = self.load_users()?;
        let user = users
            .iter_mut()
            .find(|user| &user.profile.id == id)
            .ok_or(Error::NotFound)?;

        user.profile.name = name.to_string();
        let updated_profile = user.profile.clone();
        self.save_users(&users)?;

        // Keep the session marker in step when it refers to this identity.
        if let Some(record) = self.storage.get(USER_KEY)?
            && let Ok(session_profile) = UserProfile::from_record(&record)
            && session_profile.id == *id
        {
            self.persist_session(&updated_profile)?;
        }

        Ok(())
    }
}
