//! The swappable identity capability behind the session holder.
//!
//! The session state machine only ever talks to an [AuthBackend]. Which
//! implementation backs it is decided where the application is assembled,
//! never by runtime type inspection: [LocalBackend] keeps identities in
//! durable key-value storage, [RemoteBackend] delegates to a managed
//! identity service over HTTP.

use async_trait::async_trait;

use crate::{
    Error,
    user::{UserId, UserProfile},
};

mod local;
mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

/// The operations the session holder needs from an identity store.
///
/// All calls are asynchronous and non-blocking from the caller's point of
/// view. In-flight operations are not cancellable; dropping a future leaves
/// the backend in whatever state the operation reached.
#[async_trait]
pub trait AuthBackend {
    /// Validate credentials and, on success, persist a restorable session
    /// marker for the matched identity.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidCredentials] when the email and secret do not
    /// match a registered identity, or [Error::Transport] when the store
    /// cannot be reached.
    async fn authenticate(&mut self, email: &str, secret: &str) -> Result<UserProfile, Error>;

    /// Create a new identity record, install it as the current session and
    /// persist it.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email is already registered,
    /// or a validation error if any field is rejected.
    async fn register(&mut self, email: &str, secret: &str, name: &str)
    -> Result<UserProfile, Error>;

    /// Recover the identity of a prior session, or `None` when no session
    /// marker exists.
    async fn restore_session(&mut self) -> Result<Option<UserProfile>, Error>;

    /// Discard the current session marker.
    async fn sign_out(&mut self) -> Result<(), Error>;

    /// Fetch the identity record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if no such identity exists.
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, Error>;

    /// Change the display name of the identity with the given id.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if no such identity exists, or a validation
    /// error if the name is rejected.
    async fn update_profile(&mut self, id: &UserId, name: &str) -> Result<(), Error>;
}
