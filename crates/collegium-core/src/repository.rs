use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    college::{College, CollegeFields},
    stats::{self, DepartmentStats},
    Error, Result,
};

/// College catalog persisted as a single JSON array document.
///
/// Every mutation holds `write_lock` across its read-modify-write cycle, so
/// concurrent requests are applied one after another instead of
/// overwriting each other. The document is replaced through a temp file and
/// rename, so readers never observe a partial write.
pub struct CollegeRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CollegeRepository {
    /// Open the catalog at `path`, creating an empty document if needed.
    ///
    /// Records written without an `id` or timestamps are given them and the
    /// document is rewritten so those values stay stable across reads.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let repo = Self {
            path,
            write_lock: Mutex::new(()),
        };

        if tokio::fs::try_exists(&repo.path).await? {
            let content = tokio::fs::read_to_string(&repo.path).await?;
            if needs_backfill(&content)? {
                let colleges: Vec<College> = serde_json::from_str(&content)?;
                tracing::info!(
                    path = %repo.path.display(),
                    count = colleges.len(),
                    "Backfilling ids and timestamps of legacy college records"
                );
                repo.write_all(&colleges).await?;
            }
        } else {
            repo.write_all(&[]).await?;
        }

        Ok(repo)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Result<Vec<College>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let colleges: Vec<College> = serde_json::from_str(&content)?;
        tracing::debug!(count = colleges.len(), "Loaded colleges");
        Ok(colleges)
    }

    pub async fn get(&self, id: Uuid) -> Result<College> {
        self.list()
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(Error::CollegeNotFound(id))
    }

    /// Append a new college. Names are not checked for uniqueness.
    pub async fn add(&self, fields: CollegeFields, departments: Vec<String>) -> Result<College> {
        let college = College::new(fields, departments);

        let _guard = self.write_lock.lock().await;
        let mut colleges = self.list().await?;
        colleges.push(college.clone());
        self.write_all(&colleges).await?;

        tracing::info!(id = %college.id, name = %college.name(), "Added college");
        Ok(college)
    }

    /// Overwrite the scalar fields of college `id`, and its departments when
    /// `departments` is given.
    pub async fn update(
        &self,
        id: Uuid,
        fields: CollegeFields,
        departments: Option<Vec<String>>,
    ) -> Result<College> {
        self.modify(id, |college| {
            college.fields = fields;
            if let Some(departments) = departments {
                college.departments = departments;
            }
        })
        .await
        .map(|(college, ())| college)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut colleges = self.list().await?;
        let before = colleges.len();
        colleges.retain(|c| c.id != id);
        if colleges.len() == before {
            return Err(Error::CollegeNotFound(id));
        }
        self.write_all(&colleges).await?;

        tracing::info!(%id, "Deleted college");
        Ok(())
    }

    /// Remove every college called `name`; returns the ids that were removed.
    pub async fn delete_by_name(&self, name: &str) -> Result<Vec<Uuid>> {
        let _guard = self.write_lock.lock().await;
        let (removed, kept): (Vec<College>, Vec<College>) = self
            .list()
            .await?
            .into_iter()
            .partition(|c| c.name() == name);
        if !removed.is_empty() {
            self.write_all(&kept).await?;
        }

        tracing::info!(name, removed = removed.len(), "Deleted colleges by name");
        Ok(removed.into_iter().map(|c| c.id).collect())
    }

    /// Replace the department list of college `id`, leaving its counts alone.
    pub async fn set_departments(&self, id: Uuid, departments: Vec<String>) -> Result<College> {
        self.modify(id, |college| college.departments = departments)
            .await
            .map(|(college, ())| college)
    }

    /// Returns whether the department was inserted (false if already listed).
    pub async fn add_department(&self, id: Uuid, department: &str) -> Result<bool> {
        self.modify(id, |college| college.add_department(department))
            .await
            .map(|(_, added)| added)
    }

    /// Returns whether the department was present and removed.
    pub async fn remove_department(&self, id: Uuid, department: &str) -> Result<bool> {
        self.modify(id, |college| college.remove_department(department))
            .await
            .map(|(_, removed)| removed)
    }

    pub async fn department_stats(
        &self,
        college_name: Option<&str>,
    ) -> Result<BTreeMap<String, DepartmentStats>> {
        let colleges = self.list().await?;
        Ok(stats::department_stats(&colleges, college_name))
    }

    /// Apply `f` to college `id` under the write lock and persist the result.
    async fn modify<T>(&self, id: Uuid, f: impl FnOnce(&mut College) -> T) -> Result<(College, T)> {
        let _guard = self.write_lock.lock().await;
        let mut colleges = self.list().await?;

        let college = colleges
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::CollegeNotFound(id))?;
        let output = f(&mut *college);
        college.touch();
        let updated = college.clone();

        self.write_all(&colleges).await?;
        tracing::info!(%id, name = %updated.name(), "Updated college");
        Ok((updated, output))
    }

    async fn write_all(&self, colleges: &[College]) -> Result<()> {
        let content = serde_json::to_string_pretty(colleges)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Keys that deserialize to a fresh default when absent.
const GENERATED_KEYS: [&str; 3] = ["id", "created_at", "updated_at"];

fn needs_backfill(content: &str) -> Result<bool> {
    let records: Vec<serde_json::Value> = serde_json::from_str(content)?;
    Ok(records
        .iter()
        .any(|r| GENERATED_KEYS.iter().any(|key| r.get(key).is_none())))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, CollegeRepository) {
        let dir = TempDir::new().unwrap();
        let repo = CollegeRepository::open(dir.path().join("colleges.json"))
            .await
            .unwrap();
        (dir, repo)
    }

    fn fields(name: &str, students: u64) -> CollegeFields {
        CollegeFields {
            students_count: students,
            foreign_students: 3,
            graduate_students: 4,
            dorm_students: 5,
            evening_students: 6,
            evening_hosted_students: 7,
            ..CollegeFields::named(name)
        }
    }

    #[tokio::test]
    async fn test_open_creates_empty_document() {
        let (_dir, repo) = setup().await;
        let raw = std::fs::read_to_string(repo.path()).unwrap();
        assert_eq!(raw.trim(), "[]");
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let (_dir, repo) = setup().await;
        let added = repo
            .add(fields("كلية العلوم", 250), vec!["Physics".into(), "Math".into()])
            .await
            .unwrap();

        let colleges = repo.list().await.unwrap();
        assert_eq!(colleges.len(), 1);
        assert_eq!(colleges[0], added);
        assert_eq!(colleges[0].fields, fields("كلية العلوم", 250));
        assert_eq!(colleges[0].departments, vec!["Physics", "Math"]);

        let raw = std::fs::read_to_string(repo.path()).unwrap();
        assert!(raw.contains("كلية العلوم"));
    }

    #[tokio::test]
    async fn test_update_touches_only_target() {
        let (_dir, repo) = setup().await;
        let science = repo.add(fields("Science", 100), vec!["A".into()]).await.unwrap();
        let arts = repo.add(fields("Arts", 80), vec!["B".into()]).await.unwrap();

        let updated = repo
            .update(science.id, fields("Natural Science", 120), None)
            .await
            .unwrap();
        assert_eq!(updated.name(), "Natural Science");
        assert_eq!(updated.departments, vec!["A"]);

        let replaced = repo
            .update(science.id, fields("Natural Science", 120), Some(vec!["C".into()]))
            .await
            .unwrap();
        assert_eq!(replaced.departments, vec!["C"]);

        assert_eq!(repo.get(arts.id).await.unwrap(), arts);
    }

    #[tokio::test]
    async fn test_missing_id_is_reported() {
        let (_dir, repo) = setup().await;
        let id = Uuid::new_v4();

        let err = repo.update(id, fields("X", 1), None).await.unwrap_err();
        assert!(matches!(err, Error::CollegeNotFound(missing) if missing == id));
        assert!(repo.delete(id).await.unwrap_err().is_not_found());
        assert!(repo.add_department(id, "A").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_by_name_removes_all() {
        let (_dir, repo) = setup().await;
        repo.add(fields("Dup", 1), vec![]).await.unwrap();
        repo.add(fields("Dup", 2), vec![]).await.unwrap();
        let keep = repo.add(fields("Keep", 3), vec![]).await.unwrap();

        let removed = repo.delete_by_name("Dup").await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!removed.contains(&keep.id));
        assert!(repo.delete_by_name("Dup").await.unwrap().is_empty());

        let colleges = repo.list().await.unwrap();
        assert_eq!(colleges, vec![keep]);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let (_dir, repo) = setup().await;
        let gone = repo.add(fields("Gone", 1), vec![]).await.unwrap();
        repo.add(fields("Stays", 1), vec![]).await.unwrap();

        repo.delete(gone.id).await.unwrap();
        let names: Vec<_> = repo.list().await.unwrap().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["Stays"]);
    }

    #[tokio::test]
    async fn test_department_edits() {
        let (_dir, repo) = setup().await;
        let college = repo.add(fields("Science", 10), vec!["A".into()]).await.unwrap();

        assert!(!repo.add_department(college.id, "A").await.unwrap());
        assert!(repo.add_department(college.id, "B").await.unwrap());
        assert!(repo.remove_department(college.id, "A").await.unwrap());
        assert!(!repo.remove_department(college.id, "Z").await.unwrap());

        assert_eq!(repo.get(college.id).await.unwrap().departments, vec!["B"]);

        let replaced = repo
            .set_departments(college.id, vec!["X".into(), "Y".into()])
            .await
            .unwrap();
        assert_eq!(replaced.departments, vec!["X", "Y"]);
        assert_eq!(replaced.fields, college.fields);
    }

    #[tokio::test]
    async fn test_department_stats_from_storage() {
        let (_dir, repo) = setup().await;
        repo.add(fields("One", 100), vec!["A".into(), "B".into()]).await.unwrap();
        repo.add(fields("Two", 100), vec!["A".into(), "B".into()]).await.unwrap();

        let stats = repo.department_stats(None).await.unwrap();
        assert!((stats["A"].total_students - 100.0).abs() < f64::EPSILON);
        assert!((stats["B"].total_students - 100.0).abs() < f64::EPSILON);

        let one = repo.department_stats(Some("One")).await.unwrap();
        assert!((one["A"].total_students - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_legacy_document_gets_stable_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("colleges.json");
        std::fs::write(
            &path,
            r#"[{"name": "Legacy", "students_count": 42, "departments": ["A", "B"]}]"#,
        )
        .unwrap();

        let repo = CollegeRepository::open(&path).await.unwrap();
        let first = repo.list().await.unwrap();
        let second = repo.list().await.unwrap();
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[0].count(crate::StudentCategory::Total), 42);
    }

    #[tokio::test]
    async fn test_legacy_timestamps_are_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("colleges.json");
        let id = Uuid::new_v4();
        std::fs::write(
            &path,
            format!(r#"[{{"id": "{id}", "name": "Dated", "students_count": 7}}]"#),
        )
        .unwrap();

        let repo = CollegeRepository::open(&path).await.unwrap();
        let first = repo.get(id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.get(id).await.unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(first.updated_at, second.updated_at);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("created_at"));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let (_dir, repo) = setup().await;
        std::fs::write(repo.path(), "{ not json").unwrap();
        assert!(matches!(repo.list().await, Err(Error::Serialization(_))));
    }

    #[tokio::test]
    async fn test_concurrent_writes_are_serialized() {
        let (_dir, repo) = setup().await;
        let repo = Arc::new(repo);
        let id = repo.add(fields("Busy", 10), vec![]).await.unwrap().id;

        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.add_department(id, &format!("Dept {i}")).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        let stored = repo.get(id).await.unwrap();
        assert_eq!(stored.departments.len(), 16);
    }
}
