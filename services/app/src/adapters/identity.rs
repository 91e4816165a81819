//! services/app/src/adapters/identity.rs
//!
//! This module contains the REST adapter for the managed identity platform,
//! the concrete implementation of the `IdentityService` port from the `core`
//! crate. The signed-in principal is held in memory and mirrored to a small
//! session file, which is how a pre-existing session is visible to
//! `current_principal` at the next startup.

use async_trait::async_trait;
use papershelf_core::domain::Principal;
use papershelf_core::ports::{IdentityError, IdentityService};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `IdentityService` port against the
/// identity platform's account REST endpoints.
pub struct RestIdentityAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session_file: PathBuf,
    current: RwLock<Option<StoredSession>>,
}

/// The on-device session record persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    user_id: String,
    email: Option<String>,
    id_token: String,
}

impl StoredSession {
    fn to_principal(&self) -> Principal {
        Principal {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
        }
    }
}

impl RestIdentityAdapter {
    /// Creates a new `RestIdentityAdapter`, loading any session persisted by
    /// a previous run.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: &str,
        session_file: PathBuf,
    ) -> Self {
        let current = RwLock::new(load_session(&session_file));
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session_file,
            current,
        }
    }

    async fn post_account_action(
        &self,
        action: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, IdentityError> {
        let url = format!("{}/v1/accounts:{}?key={}", self.base_url, action, self.api_key);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| IdentityError::Unknown(e.to_string()))?;
        if status.is_success() {
            Ok(payload)
        } else {
            Err(classify_error_payload(status, &payload))
        }
    }

    /// Records the principal returned by a sign-up or sign-in call, both in
    /// memory and on disk. A token response without a user id yields `None`,
    /// which callers treat as the "no error, no user" edge case.
    fn adopt(&self, token: TokenResponse, email: &str) -> Option<Principal> {
        let user_id = token.local_id?;
        let session = StoredSession {
            user_id,
            email: token.email.or_else(|| Some(email.to_string())),
            id_token: token.id_token.unwrap_or_default(),
        };
        match serde_json::to_vec_pretty(&session) {
            Ok(bytes) => {
                if let Err(err) = std::fs::write(&self.session_file, bytes) {
                    warn!(path = %self.session_file.display(), error = %err, "could not persist session");
                }
            }
            Err(err) => {
                warn!(error = %err, "could not serialize session");
            }
        }
        let principal = session.to_principal();
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(session);
        Some(principal)
    }
}

//=========================================================================================
// Wire Shapes and Error Classification
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: Option<String>,
    email: Option<String>,
    id_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthUriResponse {
    #[serde(default)]
    signin_methods: Vec<String>,
}

/// Maps the platform's machine error codes onto the port taxonomy.
fn classify_error_code(code: &str) -> IdentityError {
    // Codes sometimes arrive suffixed with prose, e.g.
    // "WEAK_PASSWORD : Password should be at least 6 characters".
    let code = code.split(':').next().unwrap_or(code).trim();
    match code {
        "EMAIL_EXISTS" => IdentityError::EmailInUse,
        "WEAK_PASSWORD" => IdentityError::WeakPassword,
        "INVALID_EMAIL" | "MISSING_EMAIL" => IdentityError::InvalidEmail,
        "EMAIL_NOT_FOUND" => IdentityError::NoSuchUser,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => IdentityError::BadCredentials,
        other => IdentityError::Unknown(other.to_string()),
    }
}

fn classify_error_payload(
    status: reqwest::StatusCode,
    payload: &serde_json::Value,
) -> IdentityError {
    match payload["error"]["message"].as_str() {
        Some(code) => classify_error_code(code),
        None => IdentityError::Unknown(format!("HTTP {status}")),
    }
}

fn load_session(path: &Path) -> Option<StoredSession> {
    let raw = std::fs::read(path).ok()?;
    match serde_json::from_slice(&raw) {
        Ok(session) => Some(session),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable session file");
            None
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(payload: serde_json::Value) -> Result<T, IdentityError> {
    serde_json::from_value(payload).map_err(|e| IdentityError::Unknown(e.to_string()))
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for RestIdentityAdapter {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Principal>, IdentityError> {
        let payload = self
            .post_account_action(
                "signUp",
                json!({"email": email, "password": password, "returnSecureToken": true}),
            )
            .await?;
        let token: TokenResponse = parse(payload)?;
        Ok(self.adopt(token, email))
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Principal>, IdentityError> {
        let payload = self
            .post_account_action(
                "signInWithPassword",
                json!({"email": email, "password": password, "returnSecureToken": true}),
            )
            .await?;
        let token: TokenResponse = parse(payload)?;
        Ok(self.adopt(token, email))
    }

    async fn list_sign_in_methods(&self, email: &str) -> Result<Vec<String>, IdentityError> {
        let payload = self
            .post_account_action(
                "createAuthUri",
                json!({"identifier": email, "continueUri": "http://localhost"}),
            )
            .await?;
        let response: AuthUriResponse = parse(payload)?;
        Ok(response.signin_methods)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        self.post_account_action(
            "sendOobCode",
            json!({"requestType": "PASSWORD_RESET", "email": email}),
        )
        .await?;
        Ok(())
    }

    fn current_principal(&self) -> Option<Principal> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(StoredSession::to_principal)
    }

    fn sign_out(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(err) = std::fs::remove_file(&self.session_file) {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %self.session_file.display(), error = %err, "could not remove session file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_onto_the_port_taxonomy() {
        assert!(matches!(
            classify_error_code("EMAIL_EXISTS"),
            IdentityError::EmailInUse
        ));
        assert!(matches!(
            classify_error_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            IdentityError::WeakPassword
        ));
        assert!(matches!(
            classify_error_code("INVALID_EMAIL"),
            IdentityError::InvalidEmail
        ));
        assert!(matches!(
            classify_error_code("EMAIL_NOT_FOUND"),
            IdentityError::NoSuchUser
        ));
        assert!(matches!(
            classify_error_code("INVALID_PASSWORD"),
            IdentityError::BadCredentials
        ));
        assert!(matches!(
            classify_error_code("INVALID_LOGIN_CREDENTIALS"),
            IdentityError::BadCredentials
        ));
        assert!(matches!(
            classify_error_code("TOO_MANY_ATTEMPTS_TRY_LATER"),
            IdentityError::Unknown(_)
        ));
    }

    #[test]
    fn payload_without_a_code_falls_back_to_the_status() {
        let err = classify_error_payload(
            reqwest::StatusCode::BAD_GATEWAY,
            &serde_json::json!({"unexpected": true}),
        );
        match err {
            IdentityError::Unknown(detail) => assert!(detail.contains("502")),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn auth_uri_response_defaults_to_no_methods() {
        let response: AuthUriResponse = serde_json::from_str("{}").unwrap();
        assert!(response.signin_methods.is_empty());

        let response: AuthUriResponse =
            serde_json::from_str(r#"{"signinMethods": ["password"]}"#).unwrap();
        assert_eq!(response.signin_methods, vec!["password".to_string()]);
    }
}
