//! The service-backed identity backend.
//!
//! A thin HTTP client for a managed identity/profile service. The service
//! owns credential verification and secret storage; this backend only maps
//! its endpoints onto [AuthBackend] and its HTTP failures onto the crate
//! error taxonomy. Transport failures are never reported as credential
//! mismatches.

use std::str::FromStr;

use async_trait::async_trait;
use email_address::EmailAddress;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    backend::AuthBackend,
    user::{UserId, UserProfile, validate_display_name},
};

/// An [AuthBackend] that delegates to a managed identity service over HTTP.
///
/// The access token for the current session is held in memory only; after a
/// restart [AuthBackend::restore_session] resolves to no session and the
/// user logs in again.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl RemoteBackend {
    /// Create a backend for the service at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: None,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer_token(&self) -> Result<&str, Error> {
        self.access_token.as_deref().ok_or(Error::NoSession)
    }
}

/// Request body for the password-grant token endpoint.
#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Request body for the registration endpoint.
#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

/// Request body for a profile update.
#[derive(Serialize)]
struct ProfilePatch<'a> {
    name: &'a str,
}

/// The session payload returned by the token, registration and session
/// endpoints.
#[derive(Deserialize)]
struct SessionResponse {
    access_token: String,
    user: WireProfile,
}

/// The identity record as the service serializes it.
#[derive(Deserialize)]
struct WireProfile {
    id: String,
    email: String,
    name: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl TryFrom<WireProfile> for UserProfile {
    type Error = Error;

    fn try_from(wire: WireProfile) -> Result<Self, Error> {
        let email =
            EmailAddress::from_str(&wire.email).map_err(|_| Error::InvalidEmail(wire.email))?;

        Ok(UserProfile {
            id: UserId::new(wire.id),
            email,
            name: wire.name,
            created_at: wire.created_at,
        })
    }
}

/// Map a failed credential check (token endpoint) onto the error taxonomy.
fn authenticate_error(status: StatusCode) -> Error {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::InvalidCredentials
        }
        status => Error::Transport(format!("token endpoint answered {status}")),
    }
}

/// Map a failed registration onto the error taxonomy.
fn register_error(status: StatusCode) -> Error {
    match status {
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Error::DuplicateEmail,
        status => Error::Transport(format!("registration endpoint answered {status}")),
    }
}

/// Map a failed profile fetch or update onto the error taxonomy.
fn profile_error(status: StatusCode) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::NoSession,
        status => Error::Transport(format!("profile endpoint answered {status}")),
    }
}

#[async_trait]
impl AuthBackend for RemoteBackend {
    async fn authenticate(&mut self, email: &str, secret: &str) -> Result<UserProfile, Error> {
        let response = self
            .http
            .post(self.endpoint("/auth/token"))
            .json(&PasswordGrant {
                email,
                password: secret,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(authenticate_error(response.status()));
        }

        let session: SessionResponse = response.json().await?;
        self.access_token = Some(session.access_token);

        session.user.try_into()
    }

    async fn register(
        &mut self,
        email: &str,
        secret: &str,
        name: &str,
    ) -> Result<UserProfile, Error> {
        validate_display_name(name)?;

        let response = self
            .http
            .post(self.endpoint("/auth/register"))
            .json(&RegisterRequest {
                email,
                password: secret,
                name,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(register_error(response.status()));
        }

        let session: SessionResponse = response.json().await?;
        self.access_token = Some(session.access_token);

        session.user.try_into()
    }

    async fn restore_session(&mut self) -> Result<Option<UserProfile>, Error> {
        let Some(token) = self.access_token.clone() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.endpoint("/auth/session"))
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // The token has expired; the session is definitively gone.
            self.access_token = None;
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "session endpoint answered {}",
                response.status()
            )));
        }

        let session: SessionResponse = response.json().await?;
        self.access_token = Some(session.access_token);

        session.user.try_into().map(Some)
    }

    async fn sign_out(&mut self) -> Result<(), Error> {
        let Some(token) = self.access_token.take() else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.endpoint("/auth/logout"))
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "logout endpoint answered {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, Error> {
        let response = self
            .http
            .get(self.endpoint(&format!("/profiles/{id}")))
            .bearer_auth(self.bearer_token()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(profile_error(response.status()));
        }

        let profile: WireProfile = response.json().await?;

        profile.try_into()
    }

    async fn update_profile(&mut self, id: &UserId, name: &str) -> Result<(), Error> {
        validate_display_name(name)?;

        let response = self
            .http
            .patch(self.endpoint(&format!("/profiles/{id}")))
            .bearer_auth(self.bearer_token()?)
            .json(&ProfilePatch { name })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(profile_error(response.status()));
        }

        Ok(())
    }
}


#[cfg(test)]
mod wire_tests {
    use crate::user::UserProfile;

    use super::SessionResponse;

    #[test]
    fn session_response_deserializes_service_payload() {
        let payload = r#"{
            "access_token": "token-123",
            "user": {
                "id": "b2f7c0de-1234-4321-9abc-000000000001",
                "email": "demo@example.com",
                "name": "Demo User",
                "created_at": "2024-01-15T10:00:00Z"
            }
        }"#;

        let session: SessionResponse = serde_json::from_str(payload).unwrap();
        let profile: UserProfile = session.user.try_into().unwrap();

        assert_eq!(session.access_token, "token-123");
        assert_eq!(profile.email.as_str(), "demo@example.com");
        assert_eq!(profile.name, "Demo User");
        assert_eq!(profile.created_at.unix_timestamp(), 1_705_312_800);
    }

    #[test]
    fn wire_profile_with_invalid_email_is_rejected() {
        let payload = r#"{
            "access_token": "token-123",
            "user": {
                "id": "id-1",
                "email": "not-an-email",
                "name": "Demo User",
                "created_at": "2024-01-15T10:00:00Z"
            }
        }"#;

        let session: SessionResponse = serde_json::from_str(payload).unwrap();
        let result: Result<UserProfile, _> = session.user.try_into();

        assert!(result.is_err());
    }
}
