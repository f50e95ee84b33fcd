use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::Result;

/// Account written when no credentials file exists yet.
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";

/// Username to plaintext password mapping stored as one JSON object.
///
/// The file is read on every login attempt, so edits made on disk take
/// effect without a restart.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Open the store at `path`, seeding the default account if the file is absent.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !tokio::fs::try_exists(&path).await? {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let seed = HashMap::from([(DEFAULT_USERNAME, DEFAULT_PASSWORD)]);
            tokio::fs::write(&path, serde_json::to_string_pretty(&seed)?).await?;
            tracing::info!(path = %path.display(), "Created credentials file with default account");
        }

        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check `username` / `password` against the stored accounts.
    ///
    /// Unknown users and wrong passwords are `Ok(false)`; an unreadable or
    /// malformed file is an error, which callers must treat as a denial.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let users: HashMap<String, String> = serde_json::from_str(&content)?;

        let ok = users.get(username).is_some_and(|stored| stored == password);
        if ok {
            tracing::info!(username, "Login succeeded");
        } else {
            tracing::warn!(username, "Login rejected");
        }
        Ok(ok)
    }
}
