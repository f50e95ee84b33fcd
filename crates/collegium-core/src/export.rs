//! Spreadsheet (CSV) renditions of the dashboard tables.
//!
//! Output starts with a UTF-8 byte order mark so spreadsheet tools pick the
//! right encoding for non-Latin college and department names.

use std::collections::BTreeMap;

use crate::{
    college::{College, StudentCategory},
    stats::{college_summaries, DepartmentStats},
    Result,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn writer() -> csv::Writer<Vec<u8>> {
    csv::Writer::from_writer(UTF8_BOM.to_vec())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| e.into_error().into())
}

/// One row per college: name, the six counts, and the department count.
pub fn college_summary_csv(colleges: &[College]) -> Result<Vec<u8>> {
    let mut out = writer();

    let mut header = vec!["College"];
    header.extend(StudentCategory::ALL.iter().map(StudentCategory::label));
    header.push("Departments");
    out.write_record(&header)?;

    for row in college_summaries(colleges) {
        let mut record = vec![row.name];
        record.extend(row.counts.iter().map(ToString::to_string));
        record.push(row.department_count.to_string());
        out.write_record(&record)?;
    }

    finish(out)
}

/// One row per department with apportioned counts to two decimals.
pub fn department_stats_csv(stats: &BTreeMap<String, DepartmentStats>) -> Result<Vec<u8>> {
    let mut out = writer();

    let mut header = vec!["Department"];
    header.extend(StudentCategory::ALL.iter().map(StudentCategory::label));
    out.write_record(&header)?;

    for (department, values) in stats {
        let mut record = vec![department.clone()];
        record.extend(
            StudentCategory::ALL
                .iter()
                .map(|category| format!("{:.2}", values.get(*category))),
        );
        out.write_record(&record)?;
    }

    finish(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{college::CollegeFields, stats::department_stats};

    fn sample() -> Vec<College> {
        let fields = CollegeFields {
            students_count: 90,
            foreign_students: 3,
            ..CollegeFields::named("Science, Applied")
        };
        vec![College::new(fields, vec!["Physics".into(), "Math".into(), "Geology".into()])]
    }

    fn text(bytes: &[u8]) -> &str {
        std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).unwrap()).unwrap()
    }

    #[test]
    fn test_college_summary_csv() {
        let bytes = college_summary_csv(&sample()).unwrap();
        let lines: Vec<_> = text(&bytes).lines().collect();
        assert_eq!(
            lines[0],
            "College,Total students,Foreign students,Graduate students,Dormitory students,Evening students,Hosted evening students,Departments"
        );
        assert_eq!(lines[1], "\"Science, Applied\",90,3,0,0,0,0,3");
    }

    #[test]
    fn test_department_stats_csv() {
        let stats = department_stats(&sample(), None);
        let bytes = department_stats_csv(&stats).unwrap();
        let lines: Vec<_> = text(&bytes).lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Department,Total students"));
        assert_eq!(lines[1], "Geology,30.00,1.00,0.00,0.00,0.00,0.00");
    }

    #[test]
    fn test_empty_tables_have_headers() {
        assert!(text(&college_summary_csv(&[]).unwrap()).starts_with("College,"));
        assert_eq!(text(&department_stats_csv(&BTreeMap::new()).unwrap()).lines().count(), 1);
    }
}
