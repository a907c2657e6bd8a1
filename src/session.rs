//! The session state holder: the one piece of client state the rest of the
//! tracker hangs off.
//!
//! A [Session] is either [SessionState::Unauthenticated] or
//! [SessionState::Authenticated] with exactly one identity. It starts
//! unauthenticated and stays that way until [Session::restore] resolves, so
//! consumers can show a loading indicator in the meantime.
//!
//! The holder is an explicitly owned, single-writer object: it is meant to
//! be created once at the application root and passed down to the view
//! layer. Every mutating operation takes `&mut self`, which serializes
//! overlapping calls structurally; a second log-in cannot begin while one is
//! in flight.

use crate::{Error, backend::AuthBackend, user::UserProfile};

/// Which identity, if any, is currently active in the running client.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    /// No identity is active.
    Unauthenticated,
    /// Exactly one identity is active.
    Authenticated(UserProfile),
}

impl SessionState {
    /// The active identity, or `None` when unauthenticated.
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Unauthenticated => None,
            SessionState::Authenticated(profile) => Some(profile),
        }
    }
}

/// A callback invoked on every session transition.
pub type SessionListener = Box<dyn FnMut(&SessionState) + Send>;

/// Tracks the current authenticated identity and exposes the login, signup,
/// logout and profile-update transitions.
pub struct Session<B> {
    backend: B,
    state: SessionState,
    restoring: bool,
    listeners: Vec<SessionListener>,
}

impl<B: AuthBackend> Session<B> {
    /// Create a holder over `backend`.
    ///
    /// The session starts unauthenticated with the loading flag set; call
    /// [Session::restore] to resolve it.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SessionState::Unauthenticated,
            restoring: true,
            listeners: Vec::new(),
        }
    }

    /// The current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The active identity, or `None` when unauthenticated.
    pub fn user(&self) -> Option<&UserProfile> {
        self.state.user()
    }

    /// Whether startup restoration has not resolved yet. Consumers render a
    /// loading indicator while this is true.
    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Register a callback invoked after every transition, including the one
    /// performed by [Session::restore].
    pub fn subscribe(&mut self, listener: SessionListener) {
        self.listeners.push(listener);
    }

    /// Attempt to recover a prior session from the backend.
    ///
    /// Always resolves to a definite state: the recovered identity if the
    /// backend holds a valid marker, otherwise unauthenticated. Backend
    /// failures are logged and treated as "no session" rather than left
    /// pending, matching how the tracker boots when the service is down.
    pub async fn restore(&mut self) {
        let outcome = self.backend.restore_session().await;
        self.restoring = false;

        match outcome {
            Ok(Some(profile)) => {
                tracing::debug!("restored session for user {}", profile.id);
                self.transition(SessionState::Authenticated(profile));
            }
            Ok(None) => {
                tracing::debug!("no prior session found");
                self.transition(SessionState::Unauthenticated);
            }
            Err(error) => {
                tracing::error!("could not restore session: {error}");
                self.transition(SessionState::Unauthenticated);
            }
        }
    }

    /// Validate credentials and install the matched identity as the current
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyField] for missing input,
    /// [Error::InvalidCredentials] for a credential mismatch, or
    /// [Error::Transport] when the backend is unreachable. The session is
    /// left unchanged on every error.
    pub async fn log_in(&mut self, email: &str, secret: &str) -> Result<&UserProfile, Error> {
        if email.trim().is_empty() {
            return Err(Error::EmptyField("email"));
        }
        if secret.is_empty() {
            return Err(Error::EmptyField("password"));
        }

        let profile = self.backend.authenticate(email, secret).await?;
        self.transition(SessionState::Authenticated(profile));

        Ok(self.state.user().expect("state was just set"))
    }

    /// Register a new identity and install it as the current session.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyField] for missing input,
    /// [Error::DuplicateEmail] if the email is already registered, or any
    /// validation error from the backend. The session is left unchanged on
    /// every error.
    pub async fn sign_up(
        &mut self,
        email: &str,
        secret: &str,
        name: &str,
    ) -> Result<&UserProfile, Error> {
        if email.trim().is_empty() {
            return Err(Error::EmptyField("email"));
        }
        if secret.is_empty() {
            return Err(Error::EmptyField("password"));
        }
        if name.trim().is_empty() {
            return Err(Error::EmptyField("name"));
        }

        let profile = self.backend.register(email, secret, name).await?;
        self.transition(SessionState::Authenticated(profile));

        Ok(self.state.user().expect("state was just set"))
    }

    /// Clear the current session.
    ///
    /// The local session is cleared optimistically, before the backend
    /// confirms, to keep the UI responsive. If confirmation fails the
    /// already-cleared local session is NOT restored; local state wins. The
    /// error is still returned so the caller can surface a notice.
    pub async fn log_out(&mut self) -> Result<(), Error> {
        self.transition(SessionState::Unauthenticated);

        if let Err(error) = self.backend.sign_out().await {
            tracing::warn!("log-out confirmation failed, local session stays cleared: {error}");
            return Err(error);
        }

        Ok(())
    }

    /// Change the display name of the signed-in user, both in the backing
    /// store and in the in-memory session copy.
    ///
    /// # Errors
    ///
    /// Returns [Error::NoSession] when no user is logged in, or the
    /// backend's validation and storage errors. The in-memory copy is only
    /// updated after the backend accepts the change.
    pub async fn update_profile(&mut self, name: &str) -> Result<(), Error> {
        let id = match &self.state {
            SessionState::Authenticated(profile) => profile.id.clone(),
            SessionState::Unauthenticated => return Err(Error::NoSession),
        };

        self.backend.update_profile(&id, name).await?;

        if let SessionState::Authenticated(profile) = &self.state {
            let mut updated = profile.clone();
            updated.name = name.to_string();
            self.transition(SessionState::Authenticated(updated));
        }

        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        self.state = next;

        let state = &self.state;
        for listener in &mut self.listeners {
            listener(state);
        }
    }
}

#[cfg(test)]
mod session_tests {
    use std::sync::{Arc, Mutex};

    use crate::{
        Error, LocalBackend, MemoryStorage,
        storage::LocalStorage,
    };

    use super::{Session, SessionState};

    // The minimum bcrypt cost keeps these tests fast.
    const TEST_COST: u32 = 4;

    const EMAIL: &str = "demo@example.com";
    const PASSWORD: &str = "averysafeandsecurepassword";
    const NAME: &str = "Demo User";

    fn get_session() -> Session<LocalBackend<MemoryStorage>> {
        get_session_over(MemoryStorage::new())
    }

    fn get_session_over(storage: MemoryStorage) -> Session<LocalBackend<MemoryStorage>> {
        init_logging();

        Session::new(LocalBackend::with_bcrypt_cost(storage, TEST_COST))
    }

    // Run tests with RUST_LOG=debug to see the holder's transitions.
    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    #[tokio::test]
    async fn new_session_is_unauthenticated_and_restoring() {
        let session = get_session();

        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert!(session.is_restoring());
    }

    #[tokio::test]
    async fn restore_resolves_to_unauthenticated_on_empty_storage() {
        let mut session = get_session();

        session.restore().await;

        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert!(!session.is_restoring());
    }

    #[tokio::test]
    async fn sign_up_then_restore_yields_the_same_identity() {
        let storage = MemoryStorage::new();

        let mut session = get_session_over(storage.clone());
        let registered = session.sign_up(EMAIL, PASSWORD, NAME).await.unwrap().clone();

        // A fresh session over the same storage simulates a reload.
        let mut reloaded = get_session_over(storage);
        reloaded.restore().await;

        let restored = reloaded.user().unwrap();
        assert_eq!(restored.id, registered.id);
        assert_eq!(restored.email, registered.email);
        assert_eq!(restored.name, registered.name);
        assert_eq!(restored.created_at, registered.created_at);
    }

    #[tokio::test]
    async fn sign_up_rejects_empty_fields() {
        let mut session = get_session();

        assert_eq!(
            session.sign_up("", PASSWORD, NAME).await.err(),
            Some(Error::EmptyField("email"))
        );
        assert_eq!(
            session.sign_up(EMAIL, "", NAME).await.err(),
            Some(Error::EmptyField("password"))
        );
        assert_eq!(
            session.sign_up(EMAIL, PASSWORD, "  ").await.err(),
            Some(Error::EmptyField("name"))
        );
        assert_eq!(session.state(), &SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn log_in_with_wrong_credentials_leaves_session_and_storage_unchanged() {
        let storage = MemoryStorage::new();

        let mut session = get_session_over(storage.clone());
        session.sign_up(EMAIL, PASSWORD, NAME).await.unwrap();
        session.log_out().await.unwrap();

        let users_before = storage.get("users").unwrap();

        let result = session.log_in(EMAIL, "wrong").await.err();

        assert_eq!(result, Some(Error::InvalidCredentials));
        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert_eq!(storage.get("user").unwrap(), None);
        assert_eq!(storage.get("users").unwrap(), users_before);
    }

    /// Storage whose `remove` always fails, so log-out confirmation fails
    /// after the local session is already cleared.
    #[derive(Debug, Clone)]
    struct RemoveFailsStorage {
        inner: MemoryStorage,
    }

    impl LocalStorage for RemoveFailsStorage {
        fn get(&self, key: &str) -> Result<Option<String>, Error> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
            self.inner.set(key, value)
        }

        fn remove(&mut self, _key: &str) -> Result<(), Error> {
            Err(Error::StorageError("remove is wired to fail".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_log_out_confirmation_keeps_the_local_session_cleared() {
        let storage = RemoveFailsStorage {
            inner: MemoryStorage::new(),
        };
        let mut session = Session::new(LocalBackend::with_bcrypt_cost(storage, TEST_COST));
        session.sign_up(EMAIL, PASSWORD, NAME).await.unwrap();

        let result = session.log_out().await;

        // The error is surfaced, but local state wins: the session stays
        // cleared rather than being restored.
        assert!(matches!(result, Err(Error::StorageError(_))));
        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert_eq!(session.user(), None);
    }

    #[tokio::test]
    async fn log_out_clears_the_durable_marker() {
        let storage = MemoryStorage::new();

        let mut session = get_session_over(storage.clone());
        session.sign_up(EMAIL, PASSWORD, NAME).await.unwrap();
        session.log_out().await.unwrap();

        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert_eq!(storage.get("user").unwrap(), None);

        let mut reloaded = get_session_over(storage);
        reloaded.restore().await;

        assert_eq!(reloaded.state(), &SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn update_profile_without_session_fails_and_mutates_nothing() {
        let storage = MemoryStorage::new();
        let mut session = get_session_over(storage.clone());

        let result = session.update_profile("Alice").await;

        assert_eq!(result, Err(Error::NoSession));
        assert_eq!(storage.get("user").unwrap(), None);
        assert_eq!(storage.get("users").unwrap(), None);
    }

    #[tokio::test]
    async fn update_profile_changes_the_visible_name_and_survives_restore() {
        let storage = MemoryStorage::new();

        let mut session = get_session_over(storage.clone());
        session.sign_up(EMAIL, PASSWORD, NAME).await.unwrap();

        session.update_profile("Alice").await.unwrap();
        assert_eq!(session.user().unwrap().name, "Alice");

        let mut reloaded = get_session_over(storage);
        reloaded.restore().await;

        assert_eq!(reloaded.user().unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn log_in_after_sign_up_round_trips_the_demo_account() {
        let mut session = get_session();

        let registered = session
            .sign_up("demo@example.com", "password", "Demo User")
            .await
            .unwrap();
        assert_eq!(registered.name, "Demo User");

        session.log_out().await.unwrap();

        assert_eq!(
            session.log_in("demo@example.com", "wrong").await.err(),
            Some(Error::InvalidCredentials)
        );
        assert_eq!(session.state(), &SessionState::Unauthenticated);

        let logged_in = session
            .log_in("demo@example.com", "password")
            .await
            .unwrap();
        assert_eq!(logged_in.email.as_str(), "demo@example.com");
    }

    #[tokio::test]
    async fn listeners_observe_every_transition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_listener = Arc::clone(&seen);

        let mut session = get_session();
        session.subscribe(Box::new(move |state| {
            let label = match state {
                SessionState::Unauthenticated => "signed-out".to_string(),
                SessionState::Authenticated(profile) => profile.name.clone(),
            };
            seen_by_listener.lock().unwrap().push(label);
        }));

        session.sign_up(EMAIL, PASSWORD, NAME).await.unwrap();
        session.update_profile("Alice").await.unwrap();
        session.log_out().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "Demo User".to_string(),
                "Alice".to_string(),
                "signed-out".to_string()
            ]
        );
    }
}
