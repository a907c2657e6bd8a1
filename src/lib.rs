//! Fintrack is the client core of a personal and business finance tracker.
//!
//! The crate models the session state machine the tracker's UI is built on:
//! restoring a prior session at startup, logging in and out, registering new
//! accounts, and updating the profile of the signed-in user. The identity
//! store behind the session is swappable via [AuthBackend]: a mock backend
//! over durable key-value storage for local use and tests, or a thin client
//! for a managed identity service.
//!
//! The remaining modules cover the small domain model the tracker displays:
//! transactions with quick-stat aggregation, and currency preferences with
//! amount formatting.

#![warn(missing_docs)]

mod backend;
mod currency;
mod error;
mod password;
mod session;
mod storage;
mod transaction;
mod user;

pub use backend::{AuthBackend, LocalBackend, RemoteBackend};
pub use currency::{Currency, CurrencyPreference};
pub use error::Error;
pub use password::{PasswordHash, ValidatedPassword};
pub use session::{Session, SessionListener, SessionState};
pub use storage::{DirStorage, LocalStorage, MemoryStorage};
pub use transaction::{
    Transaction, TransactionKind, TransactionSummary, sample_transactions, summarize,
};
pub use user::{UserId, UserProfile};
