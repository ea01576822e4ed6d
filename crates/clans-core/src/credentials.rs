//! Where session cookies live between runs.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    client::PlansClient,
    error::{IoResultExt, Result},
};

/// Persists the opaque session string produced by
/// [`PlansClient::export_cookies`].
pub trait CredentialStore {
    /// The saved session, or `None` if nothing was saved.
    fn load(&self) -> Result<Option<String>>;

    fn save(&self, session: &str) -> Result<()>;

    /// Forgets the saved session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

/// A session kept in `<profile>/<username>.cookie`, readable only by its
/// owner.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_user(profile_dir: &Path, username: &str) -> Self {
        Self::new(profile_dir.join(format!("{username}.cookie")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for CookieFile {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(session) if session.trim().is_empty() => Ok(None),
            Ok(session) => Ok(Some(session.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).at_path(&self.path),
        }
    }

    /// Creates the file owner-only, and narrows an existing one before
    /// anything is written to it.
    fn save(&self, session: &str) -> Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).at_path(&self.path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .at_path(&self.path)?;
        }
        file.write_all(session.as_bytes())
            .and_then(|()| file.flush())
            .at_path(&self.path)?;
        log::debug!("saved session to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).at_path(&self.path),
        }
    }
}

/// Loads a saved session into the client. Returns whether one was found.
pub fn restore_session(client: &PlansClient, store: &dyn CredentialStore) -> Result<bool> {
    match store.load()? {
        Some(session) => {
            client.import_cookies(&session);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Saves the client's current session, if it has one.
pub fn persist_session(client: &PlansClient, store: &dyn CredentialStore) -> Result<()> {
    match client.export_cookies() {
        Some(session) => store.save(&session),
        None => Ok(()),
    }
}
