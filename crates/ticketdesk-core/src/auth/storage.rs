//! Persistence for the session token.
//!
//! There is exactly one persisted slot holding the bearer token. Writes are
//! last-writer-wins; the client runs a single UI loop so no locking beyond
//! the in-memory backend's mutex is needed.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Token file name in the data directory
const TOKEN_FILE: &str = "token.json";

/// Keychain service and account names for the keyring backend
const KEYRING_SERVICE: &str = "ticketdesk";
const KEYRING_ACCOUNT: &str = "session-token";

/// A single persisted token slot.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, if any.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the persisted token.
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the persisted token. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedToken {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Token persisted as JSON in the application data directory.
pub struct FileTokenStore {
    data_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(TOKEN_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        let persisted: PersistedToken =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        debug!(saved_at = %persisted.saved_at, "Loaded persisted token");
        Ok(Some(persisted.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        let persisted = PersistedToken {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&persisted)?;
        write_private(&path, &contents).context("Failed to write token file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// Token persisted in the OS keychain.
///
/// Holds one `Entry` for the lifetime of the store; credentials are bound to
/// the entry that created them.
pub struct KeyringTokenStore {
    entry: Entry,
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self> {
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)
            .context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// Process-local token slot. Clones share the same slot, which lets tests
/// simulate a fresh start over the same storage.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.to_string()))),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Token slot lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}
