//! Gemini API key storage and resolution
//!
//! A key saved through the settings API wins over the configured default.
//! The key is read on every step request so a change between runs takes
//! effect on the next run without a restart.

use crate::db::{Database, DbError};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Settings key the API key is persisted under
pub const CREDENTIAL_KEY: &str = "gemini_api_key";

/// Where the active credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    Stored,
    Default,
    None,
}

/// A credential ready to authenticate a request
pub struct ResolvedCredential {
    pub secret: SecretString,
    pub source: CredentialSource,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key must not be blank")]
    Blank,
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Persistent storage for the user-supplied key
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<SecretString>, DbError>;
    fn save(&self, api_key: &SecretString) -> Result<(), DbError>;
    /// Returns whether a key was present
    fn clear(&self) -> Result<bool, DbError>;
}

impl CredentialStore for Database {
    fn load(&self) -> Result<Option<SecretString>, DbError> {
        Ok(self.get_setting(CREDENTIAL_KEY)?.map(SecretString::new))
    }

    fn save(&self, api_key: &SecretString) -> Result<(), DbError> {
        self.set_setting(CREDENTIAL_KEY, api_key.expose_secret())
    }

    fn clear(&self) -> Result<bool, DbError> {
        self.delete_setting(CREDENTIAL_KEY)
    }
}

/// Combines the persisted key with the configured fallback
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
    default: Option<SecretString>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>, default: Option<SecretString>) -> Self {
        let default = default.filter(|k| !k.expose_secret().trim().is_empty());
        Self { store, default }
    }

    /// The key to use for the next request, if any
    pub fn resolve(&self) -> Option<ResolvedCredential> {
        match self.store.load() {
            Ok(Some(stored)) if !stored.expose_secret().trim().is_empty() => {
                return Some(ResolvedCredential {
                    secret: stored,
                    source: CredentialSource::Stored,
                });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored API key, using default");
            }
        }

        self.default.as_ref().map(|key| ResolvedCredential {
            secret: SecretString::new(key.expose_secret().clone()),
            source: CredentialSource::Default,
        })
    }

    pub fn source(&self) -> CredentialSource {
        self.resolve()
            .map_or(CredentialSource::None, |resolved| resolved.source)
    }

    /// Persist a user-supplied key
    pub fn store(&self, api_key: &str) -> Result<(), CredentialError> {
        let trimmed = api_key.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::Blank);
        }
        self.store.save(&SecretString::new(trimmed.to_string()))?;
        tracing::info!("Stored Gemini API key updated");
        Ok(())
    }

    /// Remove the stored key; the default (if any) applies again
    pub fn clear(&self) -> Result<bool, CredentialError> {
        let removed = self.store.clear()?;
        if removed {
            tracing::info!("Stored Gemini API key cleared");
        }
        Ok(removed)
    }
}
