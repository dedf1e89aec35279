// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable credential persistence.
//!
//! One secret string, kept under a fixed storage identifier, written and
//! removed atomically per operation. The mobile shell backs this with its
//! platform keystore; the file implementation covers desktop and tests.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Fixed storage identifier for the persisted session token.
pub const CREDENTIAL_STORAGE_KEY: &str = "dez_session";

pub trait CredentialStore: Send + Sync {
    /// Read the persisted token, if any. Read failures surface as `None`.
    fn load(&self) -> Option<String>;

    fn save(&self, token: &str) -> std::io::Result<()>;

    fn clear(&self) -> std::io::Result<()>;
}

/// Volatile store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok()?.clone()
    }

    fn save(&self, token: &str) -> std::io::Result<()> {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> std::io::Result<()> {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
        Ok(())
    }
}

/// File-backed store: one file named [`CREDENTIAL_STORAGE_KEY`] inside the
/// given directory. Writes go through a temporary file and a rename, so a
/// crash never leaves a half-written token behind.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_STORAGE_KEY)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(self.path()) {
            Ok(contents) => {
                let token = contents.trim().to_string();
                if token.is_empty() {
                    None
                } else {
                    Some(token)
                }
            }
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %err, "credential store read failed");
                }
                None
            }
        }
    }

    fn save(&self, token: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!("{CREDENTIAL_STORAGE_KEY}.tmp"));
        fs::write(&tmp, token)?;
        fs::rename(&tmp, self.path())
    }

    fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
