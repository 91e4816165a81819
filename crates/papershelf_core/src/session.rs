//! crates/papershelf_core/src/session.rs
//!
//! The Session Manager: owns the process-wide authentication state, mediates
//! every identity operation against the remote services, and classifies
//! failures into the fixed user-facing categories the UI shows.

use crate::domain::{ProfileDocument, SessionSnapshot, UserProfile};
use crate::ports::{IdentityError, IdentityService, ProfileStore, StoreError};
use crate::validation::normalize_email;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::warn;

/// Fixed success messages, one per operation.
pub const REGISTER_SUCCESS: &str = "Account created successfully.";
pub const SIGN_IN_SUCCESS: &str = "Signed in successfully.";
pub const RESET_SUCCESS: &str = "Password reset email sent.";

/// One extra read after a failed or empty hydration fetch, then give up.
const HYDRATION_ATTEMPTS: u32 = 2;
const HYDRATION_RETRY_DELAY: Duration = Duration::from_millis(250);

//=========================================================================================
// Error Classification
//=========================================================================================

/// Every failure a Session Manager operation can surface, with its fixed
/// user-facing message. Nothing below this boundary propagates upward as a
/// raw port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthFailure {
    #[error("An account already exists for that email.")]
    EmailInUse,
    #[error("That password is too weak. Choose a longer one.")]
    WeakPassword,
    #[error("That email address is not valid.")]
    InvalidEmailFormat,
    #[error("No account found for that email.")]
    NoSuchUser,
    #[error("Incorrect email or password.")]
    BadCredentials,
    #[error("Another request is still in progress.")]
    OperationInFlight,
    #[error("You need to be signed in to do that.")]
    NotSignedIn,
    #[error("Something went wrong: {0}")]
    Unknown(String),
}

impl From<IdentityError> for AuthFailure {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailInUse => AuthFailure::EmailInUse,
            IdentityError::WeakPassword => AuthFailure::WeakPassword,
            IdentityError::InvalidEmail => AuthFailure::InvalidEmailFormat,
            IdentityError::NoSuchUser => AuthFailure::NoSuchUser,
            IdentityError::BadCredentials => AuthFailure::BadCredentials,
            IdentityError::Unavailable(detail) | IdentityError::Unknown(detail) => {
                AuthFailure::Unknown(detail)
            }
        }
    }
}

impl From<StoreError> for AuthFailure {
    fn from(err: StoreError) -> Self {
        let StoreError::Unknown(detail) = err;
        AuthFailure::Unknown(detail)
    }
}

//=========================================================================================
// The Session Manager
//=========================================================================================

/// Owns the single observable [`SessionSnapshot`] for the process and every
/// identity operation against the remote services. Constructed once at
/// startup and shared behind an `Arc` with whatever UI layer consumes it.
pub struct SessionManager {
    identity: Arc<dyn IdentityService>,
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<SessionSnapshot>,
    /// Single-flight gate: at most one identity operation in flight.
    gate: Mutex<()>,
    /// Bumped on every auth transition so an in-flight hydration result for
    /// a stale session is discarded instead of applied.
    epoch: Arc<AtomicU64>,
}

impl SessionManager {
    /// Builds the manager and probes the identity service for a pre-existing
    /// principal. When one exists the session starts authenticated and its
    /// profile hydration is kicked off immediately, with no
    /// re-authentication prompt.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(identity: Arc<dyn IdentityService>, profiles: Arc<dyn ProfileStore>) -> Self {
        let existing = identity.current_principal();
        let snapshot = SessionSnapshot {
            is_authenticated: existing.is_some(),
            ..SessionSnapshot::default()
        };
        let (state, _) = watch::channel(snapshot);
        let manager = Self {
            identity,
            profiles,
            state,
            gate: Mutex::new(()),
            epoch: Arc::new(AtomicU64::new(0)),
        };
        if let Some(principal) = existing {
            manager.spawn_hydration(principal.user_id);
        }
        manager
    }

    /// A clone of the current observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// A receiver the UI layer can await state changes on.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Clears both messages. Called whenever the user edits an input field.
    pub fn clear_messages(&self) {
        self.state.send_modify(|s| {
            s.last_error = None;
            s.last_success = None;
        });
    }

    //-------------------------------------------------------------------------------------
    // Identity operations
    //-------------------------------------------------------------------------------------

    /// Registers a new account and writes its profile document.
    ///
    /// The duplicate pre-check is best effort: a failed lookup is logged and
    /// swallowed because the create call enforces uniqueness
    /// authoritatively. A positive lookup fails fast without creating
    /// anything.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        grade_level: &str,
    ) -> Result<(), AuthFailure> {
        let email = normalize_email(email);
        let _busy = self.begin_operation()?;

        match self.identity.list_sign_in_methods(&email).await {
            Ok(methods) if !methods.is_empty() => {
                return Err(self.fail(AuthFailure::EmailInUse));
            }
            Ok(_) => {}
            Err(err) => {
                warn!(email = %email, error = %err, "duplicate pre-check failed, proceeding");
            }
        }

        let principal = match self.identity.create_account(&email, password).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                return Err(self.fail(AuthFailure::Unknown(
                    "account creation returned no user".to_string(),
                )));
            }
            Err(err) => return Err(self.fail(err.into())),
        };

        // The profile document is written before the session is marked
        // authenticated.
        let doc = ProfileDocument::new(&email, display_name, grade_level, Utc::now());
        if let Err(err) = self.profiles.set_document(&principal.user_id, &doc).await {
            return Err(self.fail(err.into()));
        }

        self.succeed_auth(&principal.user_id, REGISTER_SUCCESS);
        Ok(())
    }

    /// Verifies credentials and, on success, marks the session authenticated
    /// and hydrates the profile.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthFailure> {
        let email = normalize_email(email);
        let _busy = self.begin_operation()?;

        match self.identity.verify_credentials(&email, password).await {
            Ok(Some(principal)) => {
                self.succeed_auth(&principal.user_id, SIGN_IN_SUCCESS);
                Ok(())
            }
            Ok(None) => Err(self.fail(AuthFailure::Unknown(
                "sign-in returned no user".to_string(),
            ))),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Asks the identity service to dispatch a reset email. Never changes
    /// `is_authenticated` or `current_user`.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthFailure> {
        let email = normalize_email(email);
        let _busy = self.begin_operation()?;

        match self.identity.send_password_reset(&email).await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.last_success = Some(RESET_SUCCESS.to_string());
                    s.last_error = None;
                });
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Drops the current principal and resets the session. No failure path:
    /// the local reset happens regardless of remote acknowledgement.
    pub fn sign_out(&self) {
        self.identity.sign_out();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.is_authenticated = false;
            s.current_user = None;
            s.last_error = None;
            s.last_success = None;
        });
    }

    //-------------------------------------------------------------------------------------
    // Profile document operations
    //-------------------------------------------------------------------------------------

    /// Bookmarks or un-bookmarks a paper, returning whether it is now a
    /// favorite. Requires a hydrated profile; the local mirror is updated
    /// only after the remote overwrite lands.
    pub async fn toggle_favorite(&self, paper_id: &str) -> Result<bool, AuthFailure> {
        let mut profile = self.hydrated_profile()?;
        let now_favorite = if profile.favorite_ids.remove(paper_id) {
            false
        } else {
            profile.favorite_ids.insert(paper_id.to_string());
            true
        };
        self.write_profile(&profile).await?;
        Ok(now_favorite)
    }

    /// Records a download. Idempotent: an already-recorded id writes
    /// nothing. There is no removal operation.
    pub async fn record_download(&self, paper_id: &str) -> Result<(), AuthFailure> {
        let mut profile = self.hydrated_profile()?;
        if !profile.downloaded_ids.insert(paper_id.to_string()) {
            return Ok(());
        }
        self.write_profile(&profile).await
    }

    fn hydrated_profile(&self) -> Result<UserProfile, AuthFailure> {
        self.state
            .borrow()
            .current_user
            .clone()
            .ok_or(AuthFailure::NotSignedIn)
    }

    async fn write_profile(&self, profile: &UserProfile) -> Result<(), AuthFailure> {
        let doc = ProfileDocument::from(profile);
        self.profiles
            .set_document(&profile.id, &doc)
            .await
            .map_err(AuthFailure::from)?;
        self.state.send_modify(|s| {
            if let Some(current) = &mut s.current_user {
                if current.id == profile.id {
                    current.favorite_ids = profile.favorite_ids.clone();
                    current.downloaded_ids = profile.downloaded_ids.clone();
                }
            }
        });
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Internals
    //-------------------------------------------------------------------------------------

    /// Claims the single-flight gate, raises the busy flag, and clears both
    /// messages. A second operation while one is in flight is rejected
    /// without touching the in-flight operation's messages.
    fn begin_operation(&self) -> Result<OperationGuard<'_>, AuthFailure> {
        let permit = self
            .gate
            .try_lock()
            .map_err(|_| AuthFailure::OperationInFlight)?;
        self.state.send_modify(|s| {
            s.is_busy = true;
            s.last_error = None;
            s.last_success = None;
        });
        Ok(OperationGuard {
            state: &self.state,
            _permit: permit,
        })
    }

    /// Records the classified failure as the visible error message and hands
    /// it back for the caller to return.
    fn fail(&self, failure: AuthFailure) -> AuthFailure {
        self.state.send_modify(|s| {
            s.last_error = Some(failure.to_string());
            s.last_success = None;
        });
        failure
    }

    /// Marks the session authenticated with the operation's success message
    /// and kicks off profile hydration for `user_id`.
    fn succeed_auth(&self, user_id: &str, message: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.is_authenticated = true;
            s.last_success = Some(message.to_string());
            s.last_error = None;
        });
        self.spawn_hydration(user_id.to_string());
    }

    /// Fire-and-forget hydration of `current_user` from the profile store.
    ///
    /// A failed or empty read gets one retry after a short delay, then a
    /// warning log; nothing is surfaced to the user and `current_user`
    /// simply stays unset. A result arriving after the session epoch changed
    /// (sign-out, or a different user signed in) is discarded.
    fn spawn_hydration(&self, user_id: String) {
        let profiles = Arc::clone(&self.profiles);
        let state = self.state.clone();
        let epoch = Arc::clone(&self.epoch);
        let started_at = epoch.load(Ordering::SeqCst);

        tokio::spawn(async move {
            let mut fetched = None;
            for attempt in 1..=HYDRATION_ATTEMPTS {
                match profiles.get_document(&user_id).await {
                    Ok(Some(doc)) => {
                        fetched = Some(doc);
                        break;
                    }
                    Ok(None) => {
                        warn!(user_id = %user_id, attempt, "profile document missing");
                    }
                    Err(err) => {
                        warn!(user_id = %user_id, attempt, error = %err, "profile hydration failed");
                    }
                }
                if attempt < HYDRATION_ATTEMPTS {
                    tokio::time::sleep(HYDRATION_RETRY_DELAY).await;
                }
            }

            let Some(doc) = fetched else { return };
            if epoch.load(Ordering::SeqCst) != started_at {
                return;
            }
            state.send_modify(|s| {
                if s.is_authenticated {
                    s.current_user = Some(doc.into_profile(user_id));
                }
            });
        });
    }
}

/// Holds the single-flight permit for the duration of one identity
/// operation; lowers the busy flag when dropped, success or failure.
struct OperationGuard<'a> {
    state: &'a watch::Sender<SessionSnapshot>,
    _permit: MutexGuard<'a, ()>,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_busy = false);
    }
}
