use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the six head-count columns tracked per college.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentCategory {
    #[serde(rename = "students_count")]
    Total,
    #[serde(rename = "foreign_students")]
    Foreign,
    #[serde(rename = "graduate_students")]
    Graduate,
    #[serde(rename = "dorm_students")]
    Dorm,
    #[serde(rename = "evening_students")]
    Evening,
    #[serde(rename = "evening_hosted_students")]
    EveningHosted,
}

impl StudentCategory {
    pub const ALL: [Self; 6] = [
        Self::Total,
        Self::Foreign,
        Self::Graduate,
        Self::Dorm,
        Self::Evening,
        Self::EveningHosted,
    ];

    /// Field name used in the stored document and in query strings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Total => "students_count",
            Self::Foreign => "foreign_students",
            Self::Graduate => "graduate_students",
            Self::Dorm => "dorm_students",
            Self::Evening => "evening_students",
            Self::EveningHosted => "evening_hosted_students",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Total => "Total students",
            Self::Foreign => "Foreign students",
            Self::Graduate => "Graduate students",
            Self::Dorm => "Dormitory students",
            Self::Evening => "Evening students",
            Self::EveningHosted => "Hosted evening students",
        }
    }
}

impl std::fmt::Display for StudentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StudentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown student category: {s}"))
    }
}

/// Caller-editable part of a college: everything except identity and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollegeFields {
    pub name: String,
    #[serde(default)]
    pub students_count: u64,
    #[serde(default)]
    pub foreign_students: u64,
    #[serde(default)]
    pub graduate_students: u64,
    #[serde(default)]
    pub dorm_students: u64,
    #[serde(default)]
    pub evening_students: u64,
    #[serde(default)]
    pub evening_hosted_students: u64,
}

impl CollegeFields {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn count(&self, category: StudentCategory) -> u64 {
        match category {
            StudentCategory::Total => self.students_count,
            StudentCategory::Foreign => self.foreign_students,
            StudentCategory::Graduate => self.graduate_students,
            StudentCategory::Dorm => self.dorm_students,
            StudentCategory::Evening => self.evening_students,
            StudentCategory::EveningHosted => self.evening_hosted_students,
        }
    }
}

/// A college record as stored in the catalog document.
///
/// The scalar fields are flattened so the document keeps the plain
/// `name` / `students_count` / ... layout; `id` and the timestamps are
/// defaulted so documents written before ids existed still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct College {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: CollegeFields,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl College {
    pub fn new(fields: CollegeFields, departments: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            fields,
            departments,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    #[must_use]
    pub const fn count(&self, category: StudentCategory) -> u64 {
        self.fields.count(category)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns false if the department was already listed.
    pub fn add_department(&mut self, department: &str) -> bool {
        if self.departments.iter().any(|d| d == department) {
            return false;
        }
        self.departments.push(department.to_string());
        true
    }

    /// Returns false if the department was not listed.
    pub fn remove_department(&mut self, department: &str) -> bool {
        match self.departments.iter().position(|d| d == department) {
            Some(index) => {
                self.departments.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Parse the bulk department editor: one department per line, lines
/// trimmed, blanks dropped, repeats collapsed onto their first occurrence.
#[must_use]
pub fn parse_department_list(text: &str) -> Vec<String> {
    let mut departments: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || departments.iter().any(|d| d == line) {
            continue;
        }
        departments.push(line.to_string());
    }
    departments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_department_list() {
        let parsed = parse_department_list("  Physics \n\n\tChemistry\r\nPhysics\n   \nBiology");
        assert_eq!(parsed, vec!["Physics", "Chemistry", "Biology"]);
        assert!(parse_department_list("\n  \n").is_empty());
    }

    #[test]
    fn test_legacy_record_loads() {
        let raw = r#"{"name": "كلية الطب", "students_count": 120, "departments": ["A"]}"#;
        let college: College = serde_json::from_str(raw).unwrap();
        assert_eq!(college.name(), "كلية الطب");
        assert_eq!(college.count(StudentCategory::Total), 120);
        assert_eq!(college.count(StudentCategory::EveningHosted), 0);
        assert_eq!(college.departments, vec!["A"]);
    }

    #[test]
    fn test_serialized_layout_is_flat() {
        let college = College::new(CollegeFields::named("Engineering"), vec![]);
        let value = serde_json::to_value(&college).unwrap();
        assert_eq!(value["name"], "Engineering");
        assert_eq!(value["dorm_students"], 0);
        assert!(value.get("fields").is_none());
    }

    #[test]
    fn test_department_edits() {
        let mut college = College::new(CollegeFields::named("Science"), vec!["Math".into()]);
        assert!(!college.add_department("Math"));
        assert!(college.add_department("Physics"));
        assert!(college.remove_department("Math"));
        assert!(!college.remove_department("Math"));
        assert_eq!(college.departments, vec!["Physics"]);
    }

    #[test]
    fn test_category_round_trip() {
        for category in StudentCategory::ALL {
            assert_eq!(category.as_str().parse::<StudentCategory>().unwrap(), category);
        }
        assert!("bogus".parse::<StudentCategory>().is_err());
    }
}
