//! Dashboard aggregates computed from the college list.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::college::{College, StudentCategory};

/// Apportioned head counts for one department name.
///
/// Values are fractional: a college's counts are split evenly across its
/// departments, since students are not assigned to departments individually.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DepartmentStats {
    pub total_students: f64,
    pub foreign_students: f64,
    pub graduate_students: f64,
    pub dorm_students: f64,
    pub evening_students: f64,
    pub evening_hosted_students: f64,
}

impl DepartmentStats {
    #[must_use]
    pub const fn get(&self, category: StudentCategory) -> f64 {
        match category {
            StudentCategory::Total => self.total_students,
            StudentCategory::Foreign => self.foreign_students,
            StudentCategory::Graduate => self.graduate_students,
            StudentCategory::Dorm => self.dorm_students,
            StudentCategory::Evening => self.evening_students,
            StudentCategory::EveningHosted => self.evening_hosted_students,
        }
    }

    fn slot(&mut self, category: StudentCategory) -> &mut f64 {
        match category {
            StudentCategory::Total => &mut self.total_students,
            StudentCategory::Foreign => &mut self.foreign_students,
            StudentCategory::Graduate => &mut self.graduate_students,
            StudentCategory::Dorm => &mut self.dorm_students,
            StudentCategory::Evening => &mut self.evening_students,
            StudentCategory::EveningHosted => &mut self.evening_hosted_students,
        }
    }
}

/// Per-department apportionment across `colleges`, optionally restricted to
/// colleges named `college_name`.
#[must_use]
pub fn department_stats(
    colleges: &[College],
    college_name: Option<&str>,
) -> BTreeMap<String, DepartmentStats> {
    let mut stats: BTreeMap<String, DepartmentStats> = BTreeMap::new();

    for college in colleges {
        if college_name.is_some_and(|name| college.name() != name) {
            continue;
        }

        let department_count = college.departments.len();
        if department_count == 0 {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let divisor = department_count as f64;

        for department in &college.departments {
            let entry = stats.entry(department.clone()).or_default();
            for category in StudentCategory::ALL {
                #[allow(clippy::cast_precision_loss)]
                let share = college.count(category) as f64 / divisor;
                *entry.slot(category) += share;
            }
        }
    }

    stats
}

/// Catalog-wide sums shown as the dashboard headline metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub colleges: usize,
    pub departments: usize,
    pub students_count: u64,
    pub foreign_students: u64,
    pub graduate_students: u64,
    pub dorm_students: u64,
    pub evening_students: u64,
    pub evening_hosted_students: u64,
}

impl Totals {
    #[must_use]
    pub fn from_colleges(colleges: &[College]) -> Self {
        // Counts are caller-supplied up to u64::MAX; clamp instead of overflowing.
        let sum = |category: StudentCategory| -> u64 {
            colleges
                .iter()
                .map(|c| c.count(category))
                .fold(0, u64::saturating_add)
        };
        Self {
            colleges: colleges.len(),
            departments: colleges.iter().map(|c| c.departments.len()).sum(),
            students_count: sum(StudentCategory::Total),
            foreign_students: sum(StudentCategory::Foreign),
            graduate_students: sum(StudentCategory::Graduate),
            dorm_students: sum(StudentCategory::Dorm),
            evening_students: sum(StudentCategory::Evening),
            evening_hosted_students: sum(StudentCategory::EveningHosted),
        }
    }

    #[must_use]
    pub const fn get(&self, category: StudentCategory) -> u64 {
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

/// One row of the general statistics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollegeSummary {
    pub name: String,
    pub counts: [u64; 6],
    pub department_count: usize,
}

#[must_use]
pub fn college_summaries(colleges: &[College]) -> Vec<CollegeSummary> {
    colleges
        .iter()
        .map(|college| CollegeSummary {
            name: college.name().to_string(),
            counts: StudentCategory::ALL.map(|category| college.count(category)),
            department_count: college.departments.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::college::CollegeFields;

    fn college(name: &str, students: u64, departments: &[&str]) -> College {
        let fields = CollegeFields {
            students_count: students,
            foreign_students: 10,
            ..CollegeFields::named(name)
        };
        College::new(fields, departments.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_shared_department_accumulates() {
        let colleges = vec![
            college("Science", 100, &["A", "B"]),
            college("Arts", 100, &["A", "C"]),
        ];

        let stats = department_stats(&colleges, None);
        assert!((stats["A"].total_students - 100.0).abs() < f64::EPSILON);
        assert!((stats["B"].total_students - 50.0).abs() < f64::EPSILON);
        assert!((stats["C"].foreign_students - 5.0).abs() < f64::EPSILON);
        assert_eq!(stats.len(), 3);
    }

    #[test]
    fn test_zero_departments_contribute_nothing() {
        let colleges = vec![college("Empty", 500, &[])];
        assert!(department_stats(&colleges, None).is_empty());
    }

    #[test]
    fn test_filter_by_college_name() {
        let colleges = vec![
            college("Science", 90, &["A", "B", "C"]),
            college("Arts", 100, &["A"]),
        ];

        let stats = department_stats(&colleges, Some("Science"));
        assert_eq!(stats.len(), 3);
        assert!((stats["A"].total_students - 30.0).abs() < f64::EPSILON);

        assert!(department_stats(&colleges, Some("Medicine")).is_empty());
    }

    #[test]
    fn test_totals_and_summaries() {
        let colleges = vec![college("Science", 100, &["A", "B"]), college("Arts", 40, &[])];

        let totals = Totals::from_colleges(&colleges);
        assert_eq!(totals.colleges, 2);
        assert_eq!(totals.departments, 2);
        assert_eq!(totals.students_count, 140);
        assert_eq!(totals.get(StudentCategory::Foreign), 20);

        let rows = college_summaries(&colleges);
        assert_eq!(rows[0].name, "Science");
        assert_eq!(rows[0].counts[0], 100);
        assert_eq!(rows[1].department_count, 0);
    }

    #[test]
    fn test_totals_saturate_on_huge_counts() {
        let colleges = vec![college("Huge", u64::MAX, &["A"]), college("Small", 1, &["B"])];

        let totals = Totals::from_colleges(&colleges);
        assert_eq!(totals.students_count, u64::MAX);
        assert_eq!(totals.foreign_students, 20);

        let stats = department_stats(&colleges, None);
        assert!(stats["A"].total_students > 0.0);
    }
}
