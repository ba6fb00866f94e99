use chrono::{DateTime, Utc};

use crate::models::Student;

/// Column order of the roster export.
pub const EXPORT_HEADERS: [&str; 10] = [
    "ID",
    "Name",
    "University",
    "Major",
    "Grade",
    "Email",
    "Phone",
    "Join Date",
    "Approval",
    "Bio",
];

/// students_to_csv
///
/// Serializes the full roster snapshot to CSV bytes. One row per student, in
/// the order the repository returned them; the password hash is never part of
/// the export.
pub fn students_to_csv(students: &[Student]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;
    for student in students {
        writer.write_record([
            student.id.to_string(),
            student.name.clone(),
            student.university.clone(),
            student.major.clone(),
            student.grade.clone().unwrap_or_default(),
            student.email.clone(),
            student.phone.clone().unwrap_or_default(),
            student.join_date.format("%Y-%m-%d").to_string(),
            if student.is_approved {
                "approved".to_string()
            } else {
                "pending".to_string()
            },
            student.bio.clone().unwrap_or_default(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))
}

/// export_filename
///
/// Timestamped download name, e.g. `students_20260823_153000.csv`.
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("students_{}.csv", now.format("%Y%m%d_%H%M%S"))
}
