/*
[INPUT]:  Session token and the wallet address it was issued for
[OUTPUT]: Durable key-value persistence surviving process restarts
[POS]:    Session layer - local storage for {token, auth_address}
[UPDATE]: When store keys, file format, or write strategy change
*/

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::http::Result;

/// Keys held by a session store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {
    Token,
    AuthAddress,
}

impl SessionKey {
    pub const ALL: [SessionKey; 2] = [SessionKey::Token, SessionKey::AuthAddress];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::Token => "token",
            SessionKey::AuthAddress => "auth_address",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted token together with the address it is bound to
#[derive(Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub address: String,
}

impl fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSession")
            .field("token", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

/// Synchronous key-value persistence for the session pair.
///
/// Writes must be idempotent: setting a key to the value it already holds
/// has no externally visible effect.
pub trait SessionStore: Send + Sync + fmt::Debug {
    fn get(&self, key: SessionKey) -> Option<String>;

    fn set(&self, key: SessionKey, value: &str) -> Result<()>;

    fn remove(&self, key: SessionKey) -> Result<()>;

    fn token(&self) -> Option<String> {
        self.get(SessionKey::Token)
    }

    fn bound_address(&self) -> Option<String> {
        self.get(SessionKey::AuthAddress)
    }

    /// The persisted pair, only when both halves are present.
    fn load(&self) -> Option<StoredSession> {
        Some(StoredSession {
            token: self.token()?,
            address: self.bound_address()?,
        })
    }

    /// Persist a token bound to `address` (stored lowercase).
    fn save(&self, token: &str, address: &str) -> Result<()> {
        self.set(SessionKey::AuthAddress, &normalize_address(address))?;
        self.set(SessionKey::Token, token)
    }

    fn clear(&self) -> Result<()> {
        for key in SessionKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }

    /// Clear the pair only if it still holds `token`. Returns whether it did.
    fn clear_if_token(&self, token: &str) -> Result<bool> {
        if self.token().as_deref() == Some(token) {
            self.clear()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Lowercase, trimmed address used for binding and comparison.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Case-insensitive address comparison.
pub fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// In-process store, lost on restart. Used by tests and ephemeral clients.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<BTreeMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(&key).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(&key);
        Ok(())
    }
}

/// JSON-file store. The whole map is rewritten through a temp file and an
/// atomic rename; on unix the file is created with mode 0600.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// treated as empty and replaced on the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "session file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        restrict_permissions(tmp.path())?;
        tmp.persist(&self.path).map_err(|err| err.error)?;

        debug!(path = %self.path.display(), keys = entries.len(), "session file written");
        Ok(())
    }

    fn update(&self, key: SessionKey, value: Option<&str>) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if guard.get(key.as_str()).map(String::as_str) == value {
            return Ok(());
        }

        let mut next = guard.clone();
        match value {
            Some(value) => next.insert(key.as_str().to_string(), value.to_string()),
            None => next.remove(key.as_str()),
        };
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(key.as_str()).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.update(key, Some(value))
    }

    fn remove(&self, key: SessionKey) -> Result<()> {
        self.update(key, None)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("mert-session-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn test_memory_store_pair_lifecycle() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_none());

        store.save("tkn1", "0xABC").unwrap();
        let stored = store.load().unwrap();
        assert_eq!(stored.token, "tkn1");
        assert_eq!(stored.address, "0xabc");

        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(store.token().is_none());
        assert!(store.bound_address().is_none());
    }

    #[test]
    fn test_load_requires_both_keys() {
        let store = MemorySessionStore::new();
        store.set(SessionKey::Token, "orphan").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear_if_token_only_matches_current() {
        let store = MemorySessionStore::new();
        store.save("tkn2", "0xabc").unwrap();

        assert!(!store.clear_if_token("tkn1").unwrap());
        assert_eq!(store.token().as_deref(), Some("tkn2"));

        assert!(store.clear_if_token("tkn2").unwrap());
        assert!(store.token().is_none());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = temp_dir();
        let path = dir.join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.save("tkn1", "0xAbC").unwrap();
        drop(store);

        let reopened = FileSessionStore::open(&path).unwrap();
        let stored = reopened.load().unwrap();
        assert_eq!(stored.token, "tkn1");
        assert_eq!(stored.address, "0xabc");

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], "tkn1");
        assert_eq!(raw["auth_address"], "0xabc");

        fs::remove_dir_all(dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir();
        let path = dir.join("session.json");
        let store = FileSessionStore::open(&path).unwrap();
        store.save("tkn1", "0xabc").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_store_identical_write_is_noop() {
        let dir = temp_dir();
        let path = dir.join("session.json");
        let store = FileSessionStore::open(&path).unwrap();
        store.save("tkn1", "0xabc").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        store.save("tkn1", "0xabc").unwrap();
        let after = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file_starts_empty() {
        let dir = temp_dir();
        let path = dir.join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::open(&path).unwrap();
        assert!(store.load().is_none());

        store.save("tkn1", "0xabc").unwrap();
        assert_eq!(FileSessionStore::open(&path).unwrap().token().as_deref(), Some("tkn1"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_same_address_ignores_case() {
        assert!(same_address("0xABC", "0xabc"));
        assert!(same_address(" 0xabc", "0xABC "));
        assert!(!same_address("0xabc", "0xabd"));
    }
}
