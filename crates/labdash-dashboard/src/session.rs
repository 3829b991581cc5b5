//! Operator session and logout

use crate::error::{DashboardError, Result};
use crate::service::DashboardService;
use labdash_client::Credentials;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Route the navigator sends the operator to after logout
pub const LOGIN_ROUTE: &str = "/login";

/// Owner read/write only; the file holds a bearer token
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

/// Who is signed in
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Bearer token for REST calls
    pub token: String,
    /// Role reported by the auth service
    #[serde(default)]
    pub role: Option<String>,
    /// Operator name
    pub username: String,
    /// Whether the operator may use the admin dashboard
    #[serde(default)]
    pub is_admin: bool,
}

impl SessionContext {
    /// Create a session
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            role: None,
            username: username.into(),
            is_admin: false,
        }
    }

    /// Set the role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Mark the session as admin
    #[must_use]
    pub const fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// REST credentials for this session
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone(), self.username.clone())
    }

    /// Fail unless this session may open the admin dashboard
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Session`] for non-admin sessions.
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(DashboardError::session(format!(
                "{} is not an administrator",
                self.username
            )))
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .field("username", &self.username)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Where the session is kept between runs
pub trait SessionStore: Send + Sync {
    /// Saved session, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be read.
    fn load(&self) -> Result<Option<SessionContext>>;

    /// Persist a session, replacing the previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    fn save(&self, session: &SessionContext) -> Result<()>;

    /// Forget the session; clearing an empty store succeeds
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed.
    fn clear(&self) -> Result<()>;
}

/// Where the operator goes after logging out
pub trait Navigator: Send + Sync {
    /// Leave the dashboard for the login screen
    fn redirect_to_login(&self);
}

/// Session stored as JSON in a file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store the session at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing this store
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionContext>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &SessionContext) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_vec_pretty(session)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(SESSION_FILE_MODE);
        }
        let mut file = options.open(&self.path)?;

        // The mode above only applies to newly created files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(SESSION_FILE_MODE))?;
        }

        file.write_all(&contents)?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session held in memory only
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<SessionContext>>,
}

impl MemorySessionStore {
    /// Create a store holding `session`
    #[must_use]
    pub fn with_session(session: SessionContext) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionContext>> {
        Ok(self.session.lock().clone())
    }

    fn save(&self, session: &SessionContext) -> Result<()> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock() = None;
        Ok(())
    }
}

/// Navigator for the terminal: tells the operator how to sign in again
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect_to_login(&self) {
        println!("Signed out. Run `labdash login` to sign in again ({LOGIN_ROUTE}).");
    }
}

/// Tear down the dashboard, clear the session, then go to the login screen
///
/// # Errors
///
/// Returns an error if teardown or clearing the store fails; the navigator is
/// not called in that case.
pub async fn logout(
    dashboard: Option<&DashboardService>,
    store: &dyn SessionStore,
    navigator: &dyn Navigator,
) -> Result<()> {
    if let Some(dashboard) = dashboard {
        dashboard.stop().await?;
    }
    store.clear()?;
    info!("Session cleared");
    navigator.redirect_to_login();
    Ok(())
}
