//! Session context: tokens and identity of the signed-in user.
//!
//! A [`Session`] is created by a successful login (or two-factor
//! verification), passed by reference to every authenticated call, and
//! dropped at logout or account deletion. Persisting it between runs is the
//! job of a [`SessionStore`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cake_shop_core::{UserId, UserRole};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Tokens and identity for one signed-in user.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone)]
pub struct Session {
    access_token: SecretString,
    refresh_token: SecretString,
    user_id: UserId,
    role: UserRole,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .finish()
    }
}

impl Session {
    #[must_use]
    pub fn new(
        access_token: SecretString,
        refresh_token: SecretString,
        user_id: UserId,
        role: UserRole,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            user_id,
            role,
        }
    }

    /// Bearer token for the `Authorization` header.
    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub const fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Same identity with freshly issued tokens.
    #[must_use]
    pub fn with_tokens(&self, access_token: SecretString, refresh_token: SecretString) -> Self {
        Self {
            access_token,
            refresh_token,
            user_id: self.user_id.clone(),
            role: self.role,
        }
    }
}

/// On-disk form of a [`Session`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    access_token: String,
    refresh_token: String,
    user_id: UserId,
    role: UserRole,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.expose_secret().to_string(),
            refresh_token: session.refresh_token.expose_secret().to_string(),
            user_id: session.user_id.clone(),
            role: session.role,
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: SecretString::from(stored.refresh_token),
            user_id: stored.user_id,
            role: stored.role,
        }
    }
}

/// Errors from loading or saving a session.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Session file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence for the current session.
pub trait SessionStore: Send + Sync {
    /// The saved session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<Session>, SessionStoreError>;

    /// Replace the saved session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Forget the saved session. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Session store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    current: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        Ok(self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        *self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Write `contents` to `path`, readable by the owner only on unix.
///
/// The mode is applied at creation and again on an existing file, since
/// `mode` on `OpenOptions` only affects newly created files.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}

/// Session store backed by a JSON file.
///
/// The file holds the tokens in plain text, so it is created owner-only.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), "Loaded session");
        Ok(Some(stored.into()))
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string_pretty(&StoredSession::from(session))?;
        write_private(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), "Saved session");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            SecretString::from("access-abc"),
            SecretString::from("refresh-xyz"),
            UserId::new("u1"),
            UserRole::Admin,
        )
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", session());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("access-abc"));
        assert!(!debug.contains("refresh-xyz"));
    }

    #[test]
    fn test_with_tokens_keeps_identity() {
        let refreshed = session().with_tokens(
            SecretString::from("access-2"),
            SecretString::from("refresh-2"),
        );
        assert_eq!(refreshed.user_id().as_str(), "u1");
        assert!(refreshed.is_admin());
        assert_eq!(refreshed.access_token().expose_secret(), "access-2");
    }

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemorySessionStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap().unwrap().user_id().as_str(), "u1");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_lifecycle() {
        let path = std::env::temp_dir().join(format!(
            "cake-shop-session-test-{}.json",
            std::process::id()
        ));
        let store = FileSessionStore::new(&path);
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        store.save(&session()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.refresh_token().expose_secret(), "refresh-xyz");
        assert_eq!(loaded.role(), UserRole::Admin);

        store.clear().unwrap();
        assert!(!path.exists());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!(
            "cake-shop-session-mode-{}.json",
            std::process::id()
        ));
        // A pre-existing world-readable file is tightened on save.
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionStore::new(&path);
        store.save(&session()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);

        store.clear().unwrap();
        store.save(&session()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_reports_corruption() {
        let path = std::env::temp_dir().join(format!(
            "cake-shop-session-corrupt-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{not json").unwrap();
        let store = FileSessionStore::new(&path);
        assert!(matches!(store.load(), Err(SessionStoreError::Corrupt(_))));
        store.clear().unwrap();
    }
}
