use crate::model::{Attendance, Student};
use std::collections::BTreeMap;

/// Minimal CSV quoting: fields with commas, quotes, or newlines are wrapped
/// and inner quotes doubled. The exporter this replaces emitted such fields
/// raw, corrupting rows; files without special characters are byte-identical.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Wide export: `Student ID,First Name,Last Name,Email,<date1>,<date2>,...`,
/// one row per student, one column per date that has any attendance. An
/// empty roster or an empty attendance set yields no file at all, never a
/// header-only one.
pub fn class_csv(students: &[Student], attendance: &[Attendance]) -> Option<String> {
    if students.is_empty() || attendance.is_empty() {
        return None;
    }

    // date -> student id -> status
    let mut by_date: BTreeMap<&str, BTreeMap<&str, &str>> = BTreeMap::new();
    for record in attendance {
        by_date
            .entry(record.date.as_str())
            .or_default()
            .insert(record.student_id.as_str(), record.status.as_str());
    }
    let dates: Vec<&str> = by_date.keys().copied().collect();

    let mut csv = String::from("Student ID,First Name,Last Name,Email");
    for date in &dates {
        csv.push(',');
        csv.push_str(&csv_field(date));
    }
    csv.push('\n');

    for student in students {
        let mut row = vec![
            csv_field(&student.id),
            csv_field(&student.first_name),
            csv_field(&student.last_name),
            csv_field(&student.email),
        ];
        for date in &dates {
            let status = by_date
                .get(date)
                .and_then(|m| m.get(student.id.as_str()))
                .copied()
                .unwrap_or("");
            row.push(status.to_string());
        }
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    Some(csv)
}

/// Daily export: `Date,Student,Status`, one row per attendance entry.
/// Students the roster cannot resolve appear under their raw id.
pub fn day_csv(students: &[Student], attendance: &[Attendance]) -> Option<String> {
    if attendance.is_empty() {
        return None;
    }

    let mut csv = String::from("Date,Student,Status\n");
    for record in attendance {
        let name = students
            .iter()
            .find(|s| s.id == record.student_id)
            .map(|s| format!("{} {}", s.first_name, s.last_name))
            .unwrap_or_else(|| record.student_id.clone());
        csv.push_str(&format!(
            "{},{},{}\n",
            csv_field(&record.date),
            csv_field(&name),
            record.status.as_str()
        ));
    }
    Some(csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttendanceStatus;

    fn student(id: &str, first: &str, last: &str, email: &str) -> Student {
        Student {
            id: id.into(),
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            class_id: "c1".into(),
        }
    }

    fn record(student_id: &str, date: &str, status: AttendanceStatus) -> Attendance {
        Attendance {
            id: format!("a-{}-{}", student_id, date),
            student_id: student_id.into(),
            class_id: "c1".into(),
            date: date.into(),
            status,
        }
    }

    #[test]
    fn empty_attendance_produces_no_file() {
        let roster = vec![student("s1", "Aarav", "Sharma", "aarav.sharma@niet.ac.in")];
        assert!(class_csv(&roster, &[]).is_none());
        assert!(class_csv(&[], &[record("s1", "2024-01-01", AttendanceStatus::Present)]).is_none());
        assert!(day_csv(&roster, &[]).is_none());
    }

    #[test]
    fn wide_export_has_one_column_per_date() {
        let roster = vec![
            student("s1", "Aarav", "Sharma", "aarav.sharma@niet.ac.in"),
            student("s2", "Priya", "Patel", "priya.patel@niet.ac.in"),
        ];
        let attendance = vec![
            record("s1", "2024-01-01", AttendanceStatus::Present),
            record("s2", "2024-01-01", AttendanceStatus::Late),
            record("s1", "2024-01-02", AttendanceStatus::Absent),
        ];
        let csv = class_csv(&roster, &attendance).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Student ID,First Name,Last Name,Email,2024-01-01,2024-01-02"
        );
        assert_eq!(
            lines[1],
            "s1,Aarav,Sharma,aarav.sharma@niet.ac.in,present,absent"
        );
        assert_eq!(lines[2], "s2,Priya,Patel,priya.patel@niet.ac.in,late,");
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let roster = vec![student("s1", "Rahul", "Kumar, Jr.", "rahul.kumar@niet.ac.in")];
        let attendance = vec![record("s1", "2024-01-01", AttendanceStatus::Present)];
        let csv = class_csv(&roster, &attendance).expect("csv");
        assert!(csv.contains("\"Kumar, Jr.\""));
        let day = day_csv(&roster, &attendance).expect("day csv");
        assert!(day.contains("\"Rahul Kumar, Jr.\""));
    }

    #[test]
    fn daily_export_lists_one_row_per_entry() {
        let roster = vec![student("s1", "Neha", "Gupta", "neha.gupta@niet.ac.in")];
        let attendance = vec![
            record("s1", "2024-01-01", AttendanceStatus::Present),
            record("ghost", "2024-01-01", AttendanceStatus::Absent),
        ];
        let csv = day_csv(&roster, &attendance).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Student,Status");
        assert_eq!(lines[1], "2024-01-01,Neha Gupta,present");
        assert_eq!(lines[2], "2024-01-01,ghost,absent");
    }
}
