//! Defines the crate level error type shared by the session holder and the
//! auth backends.

use thiserror::Error;

/// The errors that may occur in the application.
///
/// Every variant is recoverable at the call site that triggered it; none is
/// fatal to the process. There is no retry policy, a failed operation must be
/// retried by the caller.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A required form field was left empty.
    ///
    /// The field name is included so the client can highlight the offending
    /// input.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// The display name contains characters that cannot be represented in
    /// the persisted identity record.
    #[error("display names must not contain '|' or line breaks")]
    InvalidDisplayName,

    /// The string used to register could not be parsed as an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email and secret did not match a registered identity.
    ///
    /// Deliberately does not reveal whether the email exists.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The email used to register is already in use. The client should try
    /// again with a different email address.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// The identity service could not be reached or answered with an
    /// unexpected response. Local state is left unchanged, except for the
    /// optimistic clear performed by log-out.
    #[error("the identity service is unavailable: {0}")]
    Transport(String),

    /// An operation that requires an authenticated session was called while
    /// the session was unauthenticated.
    #[error("no user is logged in")]
    NoSession,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred in the underlying hashing library.
    ///
    /// The error string should only be logged for debugging; clients should
    /// see a generic internal error instead.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A persisted identity record could not be parsed.
    #[error("could not parse identity record: {0}")]
    InvalidRecord(String),

    /// The durable key-value store failed to read or write.
    #[error("storage error: {0}")]
    StorageError(String),

    /// No identity record matched the given details.
    #[error("no user found with the given details")]
    NotFound,
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Transport(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::StorageError(value.to_string())
    }
}
