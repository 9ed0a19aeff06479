//! Environment-driven client configuration.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::client::ApiClient;
use crate::host::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

pub const API_URL_VAR: &str = "TODO_API_URL";
pub const TOKEN_FILE_VAR: &str = "TODO_TOKEN_FILE";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    /// Where to persist the credential. `None` keeps it in memory only.
    pub token_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup(API_URL_VAR) {
            Some(url) => url.trim().to_string(),
            None => {
                info!("{API_URL_VAR} not set, using default: {DEFAULT_API_URL}");
                DEFAULT_API_URL.to_string()
            }
        };
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: API_URL_VAR,
                reason: format!("expected an http(s) URL, got {api_url:?}"),
            });
        }

        let token_file = lookup(TOKEN_FILE_VAR)
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        if token_file.is_none() {
            info!("{TOKEN_FILE_VAR} not set, credential will not survive restarts");
        }

        Ok(Self {
            api_url,
            token_file,
        })
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_url)
    }

    pub fn credential_store(&self) -> Box<dyn CredentialStore> {
        match &self.token_file {
            Some(path) => Box::new(FileCredentialStore::new(path)),
            None => Box::new(MemoryCredentialStore::default()),
        }
    }
}
