//! crates/papershelf_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any remote backend or UI framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A signed-in user as reported by the remote identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Opaque identifier issued by the identity service at account creation.
    pub user_id: String,
    pub email: Option<String>,
}

/// The local projection of a user's profile document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Always equals the identity-service-issued user identifier; primary
    /// key into the profile store.
    pub id: String,
    /// Normalized (trimmed, lower-cased) at registration, never changed here.
    pub email: String,
    pub display_name: String,
    /// Free-text classification label, e.g. "10", "O-Level", "University".
    pub grade_level: String,
    /// Paper ids the user has bookmarked. Grows and shrinks.
    pub favorite_ids: BTreeSet<String>,
    /// Paper ids the user has downloaded. Append-only from the client.
    pub downloaded_ids: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

/// The wire shape of a profile document in the remote store:
/// `{email, name, grade, favorites, downloads, createdAt}` with
/// `createdAt` in epoch milliseconds. Every field is defaulted on read so a
/// sparse or hand-edited document still deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDocument {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub downloads: Vec<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
}

impl ProfileDocument {
    /// Builds the document written once at registration: trimmed inputs,
    /// empty favorite and download sets.
    pub fn new(email: &str, name: &str, grade: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            name: name.trim().to_string(),
            grade: grade.trim().to_string(),
            favorites: Vec::new(),
            downloads: Vec::new(),
            created_at: created_at.timestamp_millis(),
        }
    }

    /// Converts the wire document into the local projection for `user_id`.
    pub fn into_profile(self, user_id: String) -> UserProfile {
        UserProfile {
            id: user_id,
            email: self.email,
            display_name: self.name,
            grade_level: self.grade,
            favorite_ids: self.favorites.into_iter().collect(),
            downloaded_ids: self.downloads.into_iter().collect(),
            created_at: DateTime::from_timestamp_millis(self.created_at).unwrap_or_default(),
        }
    }
}

impl From<&UserProfile> for ProfileDocument {
    fn from(profile: &UserProfile) -> Self {
        Self {
            email: profile.email.clone(),
            name: profile.display_name.clone(),
            grade: profile.grade_level.clone(),
            favorites: profile.favorite_ids.iter().cloned().collect(),
            downloads: profile.downloaded_ids.iter().cloned().collect(),
            created_at: profile.created_at.timestamp_millis(),
        }
    }
}

/// The observable session state. One instance per process, consumed by the
/// UI layer through `SessionManager::subscribe`.
///
/// Invariant: at most one of `last_error` / `last_success` is `Some`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Whether the identity service reports a signed-in principal.
    pub is_authenticated: bool,
    /// Populated asynchronously after authentication succeeds; absent while
    /// hydrating or when signed out.
    pub current_user: Option<UserProfile>,
    /// True exactly while an identity operation is in flight.
    pub is_busy: bool,
    pub last_error: Option<String>,
    pub last_success: Option<String>,
}

/// A single catalog entry: one categorized exam paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub grade_level: String,
    pub year: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn document_round_trips_through_the_wire_shape() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let doc = ProfileDocument::new("jane@test.com", " Jane ", " 10 ", created);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["email"], "jane@test.com");
        assert_eq!(json["name"], "Jane");
        assert_eq!(json["grade"], "10");
        assert_eq!(json["favorites"], serde_json::json!([]));
        assert_eq!(json["downloads"], serde_json::json!([]));
        assert_eq!(json["createdAt"], created.timestamp_millis());

        let back: ProfileDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn sparse_document_deserializes_with_defaults() {
        let doc: ProfileDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.email, "");
        assert!(doc.favorites.is_empty());
        assert!(doc.downloads.is_empty());

        let profile = doc.into_profile("uid-1".to_string());
        assert_eq!(profile.id, "uid-1");
        assert_eq!(profile.email, "");
        assert!(profile.favorite_ids.is_empty());
        assert!(profile.downloaded_ids.is_empty());
    }
}
