//! Durable storage of the gateway credential.

use std::{fs, io, path::PathBuf};

use crate::error::ClientError;

/// Persists the one credential the client keeps across restarts.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send {
    /// Read the stored token, if any
    fn load(&self) -> Result<Option<String>, ClientError>;

    /// Replace the stored token
    fn save(&mut self, token: &str) -> Result<(), ClientError>;

    /// Remove the stored token. Clearing an empty store is not an error.
    fn clear(&mut self) -> Result<(), ClientError>;
}

/// Token kept in a single file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        tracing::debug!("Token saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Token removed from {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Token kept only for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), ClientError> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        self.token = None;
        Ok(())
    }
}
