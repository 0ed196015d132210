//! Persistent storage for the bearer credential.
//!
//! Exactly one credential exists per profile, kept under [`CREDENTIAL_KEY`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Fixed storage key of the credential.
pub const CREDENTIAL_KEY: &str = "token";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential storage I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential storage at {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the credential lives between runs.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, CredentialError>;
    fn save(&self, token: &str) -> Result<(), CredentialError>;
    /// Remove the credential. Succeeds when nothing is stored.
    fn clear(&self) -> Result<(), CredentialError>;
}

/// JSON key/value file; the credential sits under [`CREDENTIAL_KEY`].
///
/// Other keys in the file are preserved across writes.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(CredentialError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| CredentialError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        let io_err = |source| CredentialError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(entries).map_err(|source| {
            CredentialError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, body).map_err(io_err)
    }

    /// Raw key lookup (used to assert on the storage layout).
    pub fn contains_key(&self, key: &str) -> Result<bool, CredentialError> {
        Ok(self.read_entries()?.contains_key(key))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        Ok(self
            .read_entries()?
            .remove(CREDENTIAL_KEY)
            .filter(|t| !t.trim().is_empty()))
    }

    fn save(&self, token: &str) -> Result<(), CredentialError> {
        // A corrupt file is replaced rather than blocking sign-in.
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(CREDENTIAL_KEY.to_string(), token.to_string());
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(CredentialError::Corrupt { .. }) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        entries.remove(CREDENTIAL_KEY);
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(CredentialError::Io {
                    path: self.path.clone(),
                    source,
                }),
            };
        }
        self.write_entries(&entries)
    }
}

/// Process-local store (tests, ephemeral sessions).
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> Result<(), CredentialError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
