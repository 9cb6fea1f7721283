//! Token storage and management

use anyhow::Result;
use std::sync::Arc;

use crate::config::KeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Access/refresh token pair issued on login
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Reads and writes the two session tokens in key-value storage.
#[derive(Clone)]
pub struct TokenStore {
    kv: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn access_token(&self) -> Option<String> {
        self.kv.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.kv.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Both tokens, or `None` if either is absent.
    pub fn credentials(&self) -> Option<CredentialPair> {
        Some(CredentialPair {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
        })
    }

    pub fn set_credentials(&self, pair: &CredentialPair) -> Result<()> {
        self.kv.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        self.kv.set(REFRESH_TOKEN_KEY, &pair.refresh_token)
    }

    /// Replace the access token in place; the refresh token is untouched.
    pub fn set_access_token(&self, token: &str) -> Result<()> {
        self.kv.set(ACCESS_TOKEN_KEY, token)
    }

    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.kv.set(REFRESH_TOKEN_KEY, token)
    }

    pub fn clear_tokens(&self) -> Result<()> {
        self.kv.remove(ACCESS_TOKEN_KEY)?;
        self.kv.remove(REFRESH_TOKEN_KEY)
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials().is_some()
    }
}
