use crate::cache::LocalCache;
use crate::ids::StudentRef;
use crate::model::{Attendance, AttendanceStatus, Student};
use crate::remote::{RemoteError, RemoteStore};
use uuid::Uuid;

pub struct MarkOutcome {
    pub record: Attendance,
    /// The mark degraded to the local cache instead of the remote store.
    pub local_fallback: bool,
}

/// Find-or-create a single attendance record for (student, class, date).
///
/// Policy, in order:
/// 1. Local-format student id: write straight into the class/date cache key,
///    updating in place when the student already has an entry.
/// 2. Otherwise locate the student remotely. Not found: register a
///    placeholder student in the cache and take the local path. A remote
///    outage also degrades to the local path.
/// 3. Found: find-then-update-or-insert against the remote attendance table.
/// 4. A foreign-key violation on the remote write (student missing after
///    all) falls back to the local path; any other write failure is
///    surfaced.
///
/// Exactly one record is produced or updated per call. The find-then-write
/// sequence is not atomic, so two rapid calls for the same key can race and
/// the last writer wins.
pub fn mark_attendance(
    remote: &RemoteStore,
    cache: &mut LocalCache,
    student_id: &str,
    class_id: &str,
    date: &str,
    status: AttendanceStatus,
) -> anyhow::Result<MarkOutcome> {
    if StudentRef::classify(student_id).is_local() {
        return local_mark(cache, student_id, class_id, date, status);
    }

    match remote.get_student(student_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            ensure_placeholder(cache, student_id, class_id)?;
            return local_mark(cache, student_id, class_id, date, status);
        }
        Err(RemoteError::Unavailable) => {
            return local_mark(cache, student_id, class_id, date, status)
        }
        Err(e) => return Err(e.into()),
    }

    match remote.find_attendance(student_id, class_id, date)? {
        Some(existing) => match remote.update_attendance_status(&existing.id, status) {
            Ok(()) => Ok(MarkOutcome {
                record: Attendance { status, ..existing },
                local_fallback: false,
            }),
            Err(RemoteError::Unavailable) => local_mark(cache, student_id, class_id, date, status),
            Err(e) => Err(e.into()),
        },
        None => {
            let record = Attendance {
                id: Uuid::new_v4().to_string(),
                student_id: student_id.to_string(),
                class_id: class_id.to_string(),
                date: date.to_string(),
                status,
            };
            match remote.insert_attendance(&record) {
                Ok(()) => Ok(MarkOutcome {
                    record,
                    local_fallback: false,
                }),
                Err(RemoteError::ForeignKeyViolation(_)) | Err(RemoteError::Unavailable) => {
                    local_mark(cache, student_id, class_id, date, status)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn local_mark(
    cache: &mut LocalCache,
    student_id: &str,
    class_id: &str,
    date: &str,
    status: AttendanceStatus,
) -> anyhow::Result<MarkOutcome> {
    let record = cache.upsert_attendance(student_id, class_id, date, status)?;
    Ok(MarkOutcome {
        record,
        local_fallback: true,
    })
}

/// A student the remote store has never heard of still gets an entry in the
/// class roster so its attendance rows are not orphaned.
fn ensure_placeholder(
    cache: &mut LocalCache,
    student_id: &str,
    class_id: &str,
) -> anyhow::Result<()> {
    if cache.find_student_by_id(student_id)?.is_some() {
        return Ok(());
    }
    cache.save_student(&Student {
        id: student_id.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        class_id: class_id.to_string(),
    })
}

/// Attendance for one class and date, from both stores. Remote rows win;
/// cache rows are appended for students the remote does not cover. A remote
/// read failure is recovered locally.
pub fn day_sheet(
    remote: &RemoteStore,
    cache: &LocalCache,
    class_id: &str,
    date: &str,
) -> anyhow::Result<Vec<Attendance>> {
    let local = cache.list_attendance(class_id, date)?;
    let mut merged = match remote.list_attendance(class_id, date) {
        Ok(rows) => rows,
        Err(_) => return Ok(local),
    };
    for record in local {
        if !merged.iter().any(|r| r.student_id == record.student_id) {
            merged.push(record);
        }
    }
    Ok(merged)
}

pub fn by_student(
    remote: &RemoteStore,
    cache: &LocalCache,
    student_id: &str,
) -> anyhow::Result<Vec<Attendance>> {
    let local = cache.attendance_by_student(student_id)?;
    let mut merged = match remote.list_attendance_by_student(student_id) {
        Ok(rows) => rows,
        Err(_) => return Ok(local),
    };
    for record in local {
        if !merged
            .iter()
            .any(|r| r.class_id == record.class_id && r.date == record.date)
        {
            merged.push(record);
        }
    }
    Ok(merged)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Excused => self.excused += 1,
        }
    }
}

pub fn stats(
    remote: &RemoteStore,
    cache: &LocalCache,
    class_id: &str,
) -> anyhow::Result<StatusCounts> {
    let mut counts = StatusCounts::default();
    for record in class_attendance(remote, cache, class_id)? {
        counts.bump(record.status);
    }
    Ok(counts)
}

/// Every attendance record for a class from both stores, deduplicated on
/// (student, date) with remote rows winning.
pub fn class_attendance(
    remote: &RemoteStore,
    cache: &LocalCache,
    class_id: &str,
) -> anyhow::Result<Vec<Attendance>> {
    let local = cache.attendance_for_class(class_id)?;
    let mut merged = match remote.list_attendance_for_class(class_id) {
        Ok(rows) => rows,
        Err(_) => return Ok(local),
    };
    for record in local {
        if !merged
            .iter()
            .any(|r| r.student_id == record.student_id && r.date == record.date)
        {
            merged.push(record);
        }
    }
    Ok(merged)
}
