//! services/app/src/adapters/profile.rs
//!
//! This module contains the REST adapter for the profile document store, the
//! concrete implementation of the `ProfileStore` port from the `core` crate.
//! Documents are read and overwritten whole; the store's per-document
//! atomicity is relied upon for the single profile write.

use async_trait::async_trait;
use papershelf_core::domain::ProfileDocument;
use papershelf_core::ports::{ProfileStore, StoreError};
use reqwest::StatusCode;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ProfileStore` port over the document
/// store's REST surface.
pub struct RestProfileStoreAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestProfileStoreAdapter {
    /// Creates a new `RestProfileStoreAdapter`.
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn document_url(&self, user_id: &str) -> String {
        format!("{}/profiles/{}?key={}", self.base_url, user_id, self.api_key)
    }
}

//=========================================================================================
// `ProfileStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileStore for RestProfileStoreAdapter {
    async fn get_document(&self, user_id: &str) -> Result<Option<ProfileDocument>, StoreError> {
        let response = self
            .http
            .get(self.document_url(user_id))
            .send()
            .await
            .map_err(|e| StoreError::Unknown(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Unknown(format!("HTTP {}", response.status())));
        }

        let doc = response
            .json::<ProfileDocument>()
            .await
            .map_err(|e| StoreError::Unknown(e.to_string()))?;
        Ok(Some(doc))
    }

    async fn set_document(&self, user_id: &str, doc: &ProfileDocument) -> Result<(), StoreError> {
        let response = self
            .http
            .put(self.document_url(user_id))
            .json(doc)
            .send()
            .await
            .map_err(|e| StoreError::Unknown(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Unknown(format!("HTTP {}", response.status())))
        }
    }
}
