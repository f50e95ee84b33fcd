use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Result};

const MAX_FILENAME_BYTES: usize = 255;

/// A document stored for a college, as reported by the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Reject names that could escape the college directory or that the
/// download header cannot carry.
pub fn validate_filename(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.len() > MAX_FILENAME_BYTES
        || name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '"' | '\0') || c.is_control());

    if invalid {
        return Err(Error::InvalidFilename(name.to_string()));
    }
    Ok(())
}

/// Uploaded documents, one directory per college under `root`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn college_dir(&self, college: Uuid) -> PathBuf {
        self.root.join(college.to_string())
    }

    /// Write `bytes` as `filename`, replacing any file of the same name.
    pub async fn save(&self, college: Uuid, filename: &str, bytes: &[u8]) -> Result<()> {
        validate_filename(filename)?;

        let dir = self.college_dir(college);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(filename), bytes).await?;

        tracing::info!(%college, filename, size = bytes.len(), "Stored file");
        Ok(())
    }

    /// Files stored for `college`, sorted by name; empty if none were uploaded.
    pub async fn list(&self, college: Uuid) -> Result<Vec<StoredFile>> {
        let dir = self.college_dir(college);
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().to_string(),
                size: metadata.len(),
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(files)
    }

    pub async fn fetch(&self, college: Uuid, filename: &str) -> Result<Vec<u8>> {
        validate_filename(filename)?;

        match tokio::fs::read(self.college_dir(college).join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::FileNotFound {
                college: college.to_string(),
                filename: filename.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop every file stored for `college`.
    pub async fn remove_college(&self, college: Uuid) -> Result<()> {
        match tokio::fs::remove_dir_all(self.college_dir(college)).await {
            Ok(()) => {
                tracing::info!(%college, "Removed college files");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("files")).await.unwrap();
        (dir, store)
    }

    #[test]
    fn test_validate_filename() {
        for ok in ["report.pdf", "خطة القسم.docx", ".hidden", "a..b.txt"] {
            assert!(validate_filename(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["", ".", "..", "../etc/passwd", "a/b", "a\\b", "quote\".txt", "nul\0", "tab\t"] {
            assert!(
                matches!(validate_filename(bad), Err(Error::InvalidFilename(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(validate_filename(&"x".repeat(256)).is_err());
    }

    #[tokio::test]
    async fn test_save_fetch_list() {
        let (_dir, store) = setup().await;
        let college = Uuid::new_v4();
        let bytes = vec![0u8, 159, 146, 150, 255, 10];

        store.save(college, "plan.pdf", &bytes).await.unwrap();
        store.save(college, "Annex.txt", b"annex").await.unwrap();

        assert_eq!(store.fetch(college, "plan.pdf").await.unwrap(), bytes);

        let files = store.list(college).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Annex.txt", "plan.pdf"]);
        assert_eq!(files[1].size, 6);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_latest() {
        let (_dir, store) = setup().await;
        let college = Uuid::new_v4();

        store.save(college, "notes.txt", b"first").await.unwrap();
        store.save(college, "notes.txt", b"second").await.unwrap();

        assert_eq!(store.fetch(college, "notes.txt").await.unwrap(), b"second");
        assert_eq!(store.list(college).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_and_hostile_names() {
        let (dir, store) = setup().await;
        let college = Uuid::new_v4();

        assert!(store.list(college).await.unwrap().is_empty());
        assert!(store.fetch(college, "absent.pdf").await.unwrap_err().is_not_found());

        let err = store.save(college, "../escape.txt", b"x").await.unwrap_err();
        assert!(matches!(err, Error::InvalidFilename(_)));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_remove_college() {
        let (_dir, store) = setup().await;
        let college = Uuid::new_v4();

        store.save(college, "a.txt", b"a").await.unwrap();
        store.remove_college(college).await.unwrap();
        assert!(store.list(college).await.unwrap().is_empty());

        store.remove_college(college).await.unwrap();
    }
}
