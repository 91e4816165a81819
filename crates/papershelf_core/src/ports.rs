//! crates/papershelf_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the managed backend the adapters talk to.

use crate::domain::{Principal, ProfileDocument};
use async_trait::async_trait;

//=========================================================================================
// Port Error Types
//=========================================================================================

/// Failures the remote identity service can report. The transport-level
/// `Unavailable` case exists so callers can tell a transient outage apart
/// from an authoritative rejection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentityError {
    #[error("an account already exists for that email")]
    EmailInUse,
    #[error("the password does not meet the strength policy")]
    WeakPassword,
    #[error("the email address is malformed")]
    InvalidEmail,
    #[error("no account is registered for that email")]
    NoSuchUser,
    #[error("the password does not match")]
    BadCredentials,
    #[error("the identity service is unreachable: {0}")]
    Unavailable(String),
    #[error("identity service error: {0}")]
    Unknown(String),
}

/// Failures from the remote profile store. The store's own per-document
/// atomicity is relied upon; everything it reports collapses to one case.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("profile store error: {0}")]
    Unknown(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote identity service: issues user identifiers, verifies
/// credentials, and dispatches password-reset email.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates an account for the given email and raw password. `Ok(None)`
    /// models the service reporting success without a principal; callers
    /// treat it as a creation failure.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Principal>, IdentityError>;

    /// Verifies credentials. `Ok(None)` is the "no error, no user" edge case.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Principal>, IdentityError>;

    /// Enumerates the sign-in methods registered for an email. Advisory:
    /// the create call stays authoritative for uniqueness.
    async fn list_sign_in_methods(&self, email: &str) -> Result<Vec<String>, IdentityError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// The currently signed-in principal, if the service already holds one
    /// (e.g. a session persisted from a previous run).
    fn current_principal(&self) -> Option<Principal>;

    /// Drops the current principal. Assumed always successful.
    fn sign_out(&self);
}

/// The remote document store holding per-user profile fields keyed by the
/// identity-service-issued user identifier.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_document(&self, user_id: &str) -> Result<Option<ProfileDocument>, StoreError>;

    /// Overwrite semantics, not merge.
    async fn set_document(&self, user_id: &str, doc: &ProfileDocument) -> Result<(), StoreError>;
}
