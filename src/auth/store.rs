use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::CredentialPair;

/// Durable storage for the signed-in user's credential pair.
///
/// Implementations only persist; deciding when to refresh is the
/// coordinator's job.
pub trait TokenStore: Send + Sync {
    /// Load the stored pair. Incomplete pairs are reported as `None`.
    fn load(&self) -> Result<Option<CredentialPair>, AuthError>;
    fn save(&self, pair: &CredentialPair) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
    pub profile: String,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            profile: "default".to_string(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn default_dir() -> PathBuf {
        default_ignite_dir()
    }
}

/// File-backed token store using one TOML file per profile.
///
/// # Example
/// ```no_run
/// use ignite::auth::{CredentialPair, FileTokenStore, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// store.save(&CredentialPair::new("access", "refresh"))?;
/// # Ok::<(), ignite::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    base_dir: PathBuf,
    profile: String,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            base_dir: config.base_dir,
            profile: config.profile,
        }
    }

    pub fn new_default() -> Self {
        Self::new(TokenStoreConfig::new(default_ignite_dir()))
    }

    pub fn path(&self) -> PathBuf {
        self.base_dir
            .join(format!("{}.toml", normalize_label(&self.profile)))
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>, AuthError> {
        let path = self.path();
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: SessionFile = toml::from_str(&raw)?;
        Ok(Some(file.credentials).filter(CredentialPair::is_complete))
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), AuthError> {
        let path = self.path();
        Self::ensure_parent(&path)?;
        let file = SessionFile {
            version: 1,
            profile: self.profile.clone(),
            credentials: pair.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(path = %path.display(), "saved session credentials");
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    profile: String,
    credentials: CredentialPair,
    saved_at: DateTime<Utc>,
}

fn default_ignite_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".ignite"))
        .unwrap_or_else(|| PathBuf::from(".ignite"))
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let out: String = trimmed
        .chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() || lower == '-' {
                lower
            } else {
                '-'
            }
        })
        .collect();
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
