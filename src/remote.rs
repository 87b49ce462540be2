use crate::model::{Attendance, AttendanceStatus, Class, Student};
use rusqlite::{Connection, OptionalExtension};
use std::fmt;
use uuid::Uuid;

/// Failure surface of the hosted backend. Constraint violations are split out
/// because the fallback policy treats them differently from plain transport
/// failures. No retries anywhere: one failed call is surfaced to the caller.
#[derive(Debug)]
pub enum RemoteError {
    /// The backend cannot be reached at all.
    Unavailable,
    UniqueViolation(String),
    ForeignKeyViolation(String),
    Other(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Unavailable => write!(f, "remote store unavailable"),
            RemoteError::UniqueViolation(m) => write!(f, "unique violation: {}", m),
            RemoteError::ForeignKeyViolation(m) => write!(f, "foreign key violation: {}", m),
            RemoteError::Other(m) => write!(f, "remote error: {}", m),
        }
    }
}

impl std::error::Error for RemoteError {}

impl RemoteError {
    pub fn code(&self) -> &'static str {
        match self {
            RemoteError::Unavailable => "remote_unavailable",
            RemoteError::UniqueViolation(_) => "unique_violation",
            RemoteError::ForeignKeyViolation(_) => "foreign_key_violation",
            RemoteError::Other(_) => "remote_error",
        }
    }
}

fn map_sql_err(e: rusqlite::Error) -> RemoteError {
    if let rusqlite::Error::SqliteFailure(ffi_err, ref msg) = e {
        let text = msg.clone().unwrap_or_else(|| e.to_string());
        match ffi_err.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return RemoteError::UniqueViolation(text)
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return RemoteError::ForeignKeyViolation(text)
            }
            _ => {}
        }
    }
    RemoteError::Other(e.to_string())
}

type Result<T> = std::result::Result<T, RemoteError>;

/// Thin CRUD client for the hosted relational service. The `online` flag
/// simulates reachability: when cleared every call fails with `Unavailable`,
/// which is what drives callers onto the local-cache fallback paths.
pub struct RemoteStore {
    conn: Connection,
    online: bool,
}

impl RemoteStore {
    pub fn new(conn: Connection, online: bool) -> RemoteStore {
        RemoteStore { conn, online }
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    fn reach(&self) -> Result<&Connection> {
        if self.online {
            Ok(&self.conn)
        } else {
            Err(RemoteError::Unavailable)
        }
    }

    // Classes

    pub fn list_classes(&self) -> Result<Vec<Class>> {
        let conn = self.reach()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, description, schedule, user_id, created_at
                 FROM classes ORDER BY name",
            )
            .map_err(map_sql_err)?;
        stmt.query_map([], |r| {
            Ok(Class {
                id: r.get(0)?,
                name: r.get(1)?,
                description: r.get(2)?,
                schedule: r.get(3)?,
                user_id: r.get(4)?,
                created_at: r.get(5)?,
            })
        })
        .and_then(|it| it.collect::<std::result::Result<Vec<_>, _>>())
        .map_err(map_sql_err)
    }

    pub fn get_class(&self, class_id: &str) -> Result<Option<Class>> {
        let conn = self.reach()?;
        conn.query_row(
            "SELECT id, name, description, schedule, user_id, created_at
             FROM classes WHERE id = ?",
            [class_id],
            |r| {
                Ok(Class {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    description: r.get(2)?,
                    schedule: r.get(3)?,
                    user_id: r.get(4)?,
                    created_at: r.get(5)?,
                })
            },
        )
        .optional()
        .map_err(map_sql_err)
    }

    pub fn create_class(
        &self,
        name: &str,
        description: &str,
        schedule: &str,
        user_id: Option<&str>,
    ) -> Result<Class> {
        let conn = self.reach()?;
        let class = Class {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            schedule: schedule.to_string(),
            user_id: user_id.map(|s| s.to_string()),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        conn.execute(
            "INSERT INTO classes(id, name, description, schedule, user_id, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &class.id,
                &class.name,
                &class.description,
                &class.schedule,
                &class.user_id,
                &class.created_at,
            ),
        )
        .map_err(map_sql_err)?;
        Ok(class)
    }

    pub fn update_class(&self, class: &Class) -> Result<()> {
        let conn = self.reach()?;
        conn.execute(
            "UPDATE classes SET name = ?, description = ?, schedule = ? WHERE id = ?",
            (&class.name, &class.description, &class.schedule, &class.id),
        )
        .map_err(map_sql_err)?;
        Ok(())
    }

    /// Deletes a class and everything hanging off it, in dependency order.
    pub fn delete_class(&self, class_id: &str) -> Result<bool> {
        let conn = self.reach()?;
        let tx = conn.unchecked_transaction().map_err(map_sql_err)?;
        tx.execute("DELETE FROM attendance WHERE class_id = ?", [class_id])
            .map_err(map_sql_err)?;
        tx.execute("DELETE FROM students WHERE class_id = ?", [class_id])
            .map_err(map_sql_err)?;
        let n = tx
            .execute("DELETE FROM classes WHERE id = ?", [class_id])
            .map_err(map_sql_err)?;
        tx.commit().map_err(map_sql_err)?;
        Ok(n > 0)
    }

    // Students

    pub fn list_students(&self, class_id: &str) -> Result<Vec<Student>> {
        let conn = self.reach()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, first_name, last_name, email, class_id
                 FROM students WHERE class_id = ? ORDER BY first_name",
            )
            .map_err(map_sql_err)?;
        stmt.query_map([class_id], |r| {
            Ok(Student {
                id: r.get(0)?,
                first_name: r.get(1)?,
                last_name: r.get(2)?,
                email: r.get(3)?,
                class_id: r.get(4)?,
            })
        })
        .and_then(|it| it.collect::<std::result::Result<Vec<_>, _>>())
        .map_err(map_sql_err)
    }

    pub fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        let conn = self.reach()?;
        conn.query_row(
            "SELECT id, first_name, last_name, email, class_id
             FROM students WHERE id = ?",
            [student_id],
            |r| {
                Ok(Student {
                    id: r.get(0)?,
                    first_name: r.get(1)?,
                    last_name: r.get(2)?,
                    email: r.get(3)?,
                    class_id: r.get(4)?,
                })
            },
        )
        .optional()
        .map_err(map_sql_err)
    }

    pub fn create_student(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        class_id: &str,
    ) -> Result<Student> {
        let conn = self.reach()?;
        let student = Student {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            class_id: class_id.to_string(),
        };
        conn.execute(
            "INSERT INTO students(id, first_name, last_name, email, class_id)
             VALUES(?, ?, ?, ?, ?)",
            (
                &student.id,
                &student.first_name,
                &student.last_name,
                &student.email,
                &student.class_id,
            ),
        )
        .map_err(map_sql_err)?;
        Ok(student)
    }

    pub fn find_student_by_email(&self, class_id: &str, email: &str) -> Result<Option<Student>> {
        let conn = self.reach()?;
        conn.query_row(
            "SELECT id, first_name, last_name, email, class_id
             FROM students WHERE class_id = ? AND email = ?",
            (class_id, email),
            |r| {
                Ok(Student {
                    id: r.get(0)?,
                    first_name: r.get(1)?,
                    last_name: r.get(2)?,
                    email: r.get(3)?,
                    class_id: r.get(4)?,
                })
            },
        )
        .optional()
        .map_err(map_sql_err)
    }

    pub fn find_student_by_name(
        &self,
        class_id: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Student>> {
        let conn = self.reach()?;
        conn.query_row(
            "SELECT id, first_name, last_name, email, class_id
             FROM students WHERE class_id = ? AND first_name = ? AND last_name = ?",
            (class_id, first_name, last_name),
            |r| {
                Ok(Student {
                    id: r.get(0)?,
                    first_name: r.get(1)?,
                    last_name: r.get(2)?,
                    email: r.get(3)?,
                    class_id: r.get(4)?,
                })
            },
        )
        .optional()
        .map_err(map_sql_err)
    }

    pub fn update_student(&self, student: &Student) -> Result<()> {
        let conn = self.reach()?;
        conn.execute(
            "UPDATE students SET first_name = ?, last_name = ?, email = ?, class_id = ?
             WHERE id = ?",
            (
                &student.first_name,
                &student.last_name,
                &student.email,
                &student.class_id,
                &student.id,
            ),
        )
        .map_err(map_sql_err)?;
        Ok(())
    }

    pub fn delete_student(&self, student_id: &str) -> Result<bool> {
        let conn = self.reach()?;
        let tx = conn.unchecked_transaction().map_err(map_sql_err)?;
        tx.execute("DELETE FROM attendance WHERE student_id = ?", [student_id])
            .map_err(map_sql_err)?;
        let n = tx
            .execute("DELETE FROM students WHERE id = ?", [student_id])
            .map_err(map_sql_err)?;
        tx.commit().map_err(map_sql_err)?;
        Ok(n > 0)
    }

    // Attendance

    pub fn find_attendance(
        &self,
        student_id: &str,
        class_id: &str,
        date: &str,
    ) -> Result<Option<Attendance>> {
        let conn = self.reach()?;
        conn.query_row(
            "SELECT id, student_id, class_id, date, status
             FROM attendance WHERE student_id = ? AND class_id = ? AND date = ?",
            (student_id, class_id, date),
            row_to_attendance,
        )
        .optional()
        .map_err(map_sql_err)
    }

    pub fn insert_attendance(&self, record: &Attendance) -> Result<()> {
        let conn = self.reach()?;
        conn.execute(
            "INSERT INTO attendance(id, student_id, class_id, date, status)
             VALUES(?, ?, ?, ?, ?)",
            (
                &record.id,
                &record.student_id,
                &record.class_id,
                &record.date,
                record.status.as_str(),
            ),
        )
        .map_err(map_sql_err)?;
        Ok(())
    }

    pub fn update_attendance_status(&self, id: &str, status: AttendanceStatus) -> Result<()> {
        let conn = self.reach()?;
        conn.execute(
            "UPDATE attendance SET status = ? WHERE id = ?",
            (status.as_str(), id),
        )
        .map_err(map_sql_err)?;
        Ok(())
    }

    pub fn list_attendance(&self, class_id: &str, date: &str) -> Result<Vec<Attendance>> {
        let conn = self.reach()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, student_id, class_id, date, status
                 FROM attendance WHERE class_id = ? AND date = ?",
            )
            .map_err(map_sql_err)?;
        stmt.query_map((class_id, date), row_to_attendance)
            .and_then(|it| it.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(map_sql_err)
    }

    pub fn list_attendance_for_class(&self, class_id: &str) -> Result<Vec<Attendance>> {
        let conn = self.reach()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, student_id, class_id, date, status
                 FROM attendance WHERE class_id = ? ORDER BY date",
            )
            .map_err(map_sql_err)?;
        stmt.query_map([class_id], row_to_attendance)
            .and_then(|it| it.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(map_sql_err)
    }

    pub fn list_attendance_by_student(&self, student_id: &str) -> Result<Vec<Attendance>> {
        let conn = self.reach()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, student_id, class_id, date, status
                 FROM attendance WHERE student_id = ? ORDER BY date",
            )
            .map_err(map_sql_err)?;
        stmt.query_map([student_id], row_to_attendance)
            .and_then(|it| it.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(map_sql_err)
    }
}

fn row_to_attendance(r: &rusqlite::Row<'_>) -> rusqlite::Result<Attendance> {
    let status_raw: String = r.get(4)?;
    let status = AttendanceStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown attendance status: {}", status_raw).into(),
        )
    })?;
    Ok(Attendance {
        id: r.get(0)?,
        student_id: r.get(1)?,
        class_id: r.get(2)?,
        date: r.get(3)?,
        status,
    })
}
