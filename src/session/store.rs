//! Saved-session persistence.
//!
//! Stores VRChat's auth cookies as JSON so a restart can skip the password
//! (and 2FA) handshake while the session is still valid.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::upstream::AuthCookies;

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved cookies. A missing file is not an error.
    pub fn load(&self) -> io::Result<Option<AuthCookies>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        let cookies: AuthCookies = serde_json::from_reader(BufReader::new(file))?;
        Ok((!cookies.is_empty()).then_some(cookies))
    }

    /// Write cookies, replacing any previous file.
    pub fn save(&self, cookies: &AuthCookies) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(cookies)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)
    }

    /// Remove the saved session, ignoring a missing file.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
