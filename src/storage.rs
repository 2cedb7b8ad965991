//! Persistence for the single credential entry, kept under one key the way
//! browser local storage would hold it.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use tracing::debug;

use crate::error::ClientError;

/// Key the credential is stored under.
pub const AUTH_KEY: &str = "auth";

pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, ClientError>;
    fn set(&self, token: &str) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn get(&self) -> Result<Option<String>, ClientError> {
        (**self).get()
    }

    fn set(&self, token: &str) -> Result<(), ClientError> {
        (**self).set(token)
    }

    fn clear(&self) -> Result<(), ClientError> {
        (**self).clear()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Result<Option<String>, ClientError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, token: &str) -> Result<(), ClientError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

/// A JSON key/value file, the on-disk counterpart of local storage.
///
/// Entries other than [`AUTH_KEY`] are preserved across writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self) -> Result<Option<String>, ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_entries()?.remove(AUTH_KEY))
    }

    fn set(&self, token: &str) -> Result<(), ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        entries.insert(AUTH_KEY.to_string(), token.to_string());
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "credential stored");
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        if entries.remove(AUTH_KEY).is_none() {
            return Ok(());
        }
        if entries.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            self.write_entries(&entries)?;
        }
        debug!(path = %self.path.display(), "credential cleared");
        Ok(())
    }
}
