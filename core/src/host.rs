//! Services the host environment provides to a `Session`: a place to keep
//! the credential across restarts, and a way to send the user to the
//! sign-in view.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::Credential;

/// Key under which the bearer credential is persisted.
pub const TOKEN_KEY: &str = "railway-todo-app__token";

/// Path of the sign-in view.
pub const SIGN_IN_PATH: &str = "/signin";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid credential file: {0}")]
    InvalidFile(String),
}

/// Persistent slot for the one active credential.
pub trait CredentialStore {
    fn load(&self) -> Result<Option<Credential>, HostError>;
    fn save(&self, credential: &Credential) -> Result<(), HostError>;
    fn remove(&self) -> Result<(), HostError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn load(&self) -> Result<Option<Credential>, HostError> {
        (**self).load()
    }

    fn save(&self, credential: &Credential) -> Result<(), HostError> {
        (**self).save(credential)
    }

    fn remove(&self) -> Result<(), HostError> {
        (**self).remove()
    }
}

/// In-memory credential slot. Lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: RefCell<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new(credential: Option<Credential>) -> Self {
        Self {
            slot: RefCell::new(credential),
        }
    }

    pub fn get(&self) -> Option<Credential> {
        self.slot.borrow().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, HostError> {
        Ok(self.get())
    }

    fn save(&self, credential: &Credential) -> Result<(), HostError> {
        *self.slot.borrow_mut() = Some(credential.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), HostError> {
        *self.slot.borrow_mut() = None;
        Ok(())
    }
}

/// Key-value JSON file holding the credential under `TOKEN_KEY`. Other keys
/// in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, HostError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&raw)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(HostError::InvalidFile(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_entries(&self, entries: Map<String, Value>) -> Result<(), HostError> {
        let json = serde_json::to_string_pretty(&Value::Object(entries))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, HostError> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .map(Credential::new))
    }

    fn save(&self, credential: &Credential) -> Result<(), HostError> {
        let mut entries = self.read_entries()?;
        entries.insert(
            TOKEN_KEY.to_string(),
            Value::String(credential.as_str().to_string()),
        );
        self.write_entries(entries)
    }

    fn remove(&self) -> Result<(), HostError> {
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(entries)
    }
}

/// Routing hook used to force the sign-in view after a 401.
pub trait Navigator {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// Navigator for hosts without views.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn navigate(&self, _path: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryCredentialStore::default();
        assert!(store.load().unwrap().is_none());
        store.save(&Credential::new("tok")).unwrap();
        assert_eq!(store.load().unwrap(), Some(Credential::new("tok")));
        store.remove().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn file_store_missing_file_is_logged_out() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());
        store.remove().unwrap();
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        FileCredentialStore::new(&path)
            .save(&Credential::new("tok"))
            .unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(Credential::new("tok")));
        reopened.remove().unwrap();
        assert!(FileCredentialStore::new(&path).load().unwrap().is_none());
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = FileCredentialStore::new(&path);
        store.save(&Credential::new("tok")).unwrap();
        store.remove().unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({ "theme": "dark" }));
    }

    #[test]
    fn file_store_rejects_non_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1,2]").unwrap();
        let err = FileCredentialStore::new(&path).load().unwrap_err();
        assert!(matches!(err, HostError::InvalidFile(_)));
    }
}
