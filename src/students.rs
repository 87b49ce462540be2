use crate::cache::LocalCache;
use crate::ids::{new_local_id, StudentRef};
use crate::model::Student;
use crate::reconcile::merge_student_lists;
use crate::remote::{RemoteError, RemoteStore};
use crate::sync;

pub struct CreateOutcome {
    pub student: Student,
    /// The write degraded to local-only storage. Not an error, but the
    /// record is invisible to other clients until reconciled.
    pub local_fallback: bool,
}

/// Remote-first create. A unique violation is recovered by adopting the
/// existing remote row (looked up by email, then by name, within the class);
/// any other remote failure persists the student locally under a placeholder
/// id. Either way the resulting record is propagated across class caches.
pub fn create_student(
    remote: &RemoteStore,
    cache: &mut LocalCache,
    first_name: &str,
    last_name: &str,
    email: &str,
    class_id: &str,
) -> anyhow::Result<CreateOutcome> {
    match remote.create_student(first_name, last_name, email, class_id) {
        Ok(student) => {
            sync::propagate(cache, &student)?;
            Ok(CreateOutcome {
                student,
                local_fallback: false,
            })
        }
        Err(RemoteError::UniqueViolation(_)) => {
            if let Some(existing) = adopt_existing(remote, first_name, last_name, email, class_id) {
                sync::propagate(cache, &existing)?;
                return Ok(CreateOutcome {
                    student: existing,
                    local_fallback: false,
                });
            }
            create_local(cache, first_name, last_name, email, class_id)
        }
        Err(_) => create_local(cache, first_name, last_name, email, class_id),
    }
}

fn adopt_existing(
    remote: &RemoteStore,
    first_name: &str,
    last_name: &str,
    email: &str,
    class_id: &str,
) -> Option<Student> {
    if !email.is_empty() {
        if let Ok(Some(existing)) = remote.find_student_by_email(class_id, email) {
            return Some(existing);
        }
    }
    remote
        .find_student_by_name(class_id, first_name, last_name)
        .ok()
        .flatten()
}

fn create_local(
    cache: &mut LocalCache,
    first_name: &str,
    last_name: &str,
    email: &str,
    class_id: &str,
) -> anyhow::Result<CreateOutcome> {
    let student = Student {
        id: new_local_id(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        class_id: class_id.to_string(),
    };
    cache.save_student(&student)?;
    sync::propagate(cache, &student)?;
    Ok(CreateOutcome {
        student,
        local_fallback: true,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSource {
    Merged,
    LocalOnly,
}

impl RosterSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RosterSource::Merged => "merged",
            RosterSource::LocalOnly => "local",
        }
    }
}

/// The class roster as the UI sees it: remote list merged with the class's
/// cache. A remote read failure is recovered locally and never surfaced.
pub fn class_roster(
    remote: &RemoteStore,
    cache: &LocalCache,
    class_id: &str,
) -> anyhow::Result<(Vec<Student>, RosterSource)> {
    let local = cache.list_students(class_id)?;
    match remote.list_students(class_id) {
        Ok(remote_students) => Ok((
            merge_student_lists(&remote_students, &local),
            RosterSource::Merged,
        )),
        Err(_) => Ok((local, RosterSource::LocalOnly)),
    }
}

#[derive(Debug, Default, Clone)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl StudentPatch {
    fn apply(&self, student: &mut Student) {
        if let Some(v) = &self.first_name {
            student.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            student.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            student.email = v.clone();
        }
    }
}

/// Updates whichever store owns the id, then re-propagates the identity.
/// Returns None when the student exists in neither store.
pub fn update_student(
    remote: &RemoteStore,
    cache: &mut LocalCache,
    student_id: &str,
    patch: &StudentPatch,
) -> anyhow::Result<Option<Student>> {
    match StudentRef::classify(student_id) {
        StudentRef::Local(_) => {
            let Some(mut student) = cache.find_student_by_id(student_id)? else {
                return Ok(None);
            };
            patch.apply(&mut student);
            cache.save_student(&student)?;
            sync::propagate(cache, &student)?;
            Ok(Some(student))
        }
        StudentRef::Remote(_) => {
            let Some(mut student) = remote.get_student(student_id)? else {
                return Ok(None);
            };
            patch.apply(&mut student);
            remote.update_student(&student)?;
            sync::propagate(cache, &student)?;
            Ok(Some(student))
        }
    }
}

/// Deletes by id from the owning store. Local deletion scans every class
/// cache since ownership is not keyed by class; remote deletion also clears
/// any cached copies propagation may have left behind.
pub fn delete_student(
    remote: &RemoteStore,
    cache: &mut LocalCache,
    student_id: &str,
) -> anyhow::Result<bool> {
    match StudentRef::classify(student_id) {
        StudentRef::Local(_) => cache.delete_student(student_id),
        StudentRef::Remote(_) => {
            let remote_deleted = remote.delete_student(student_id)?;
            let cache_deleted = cache.delete_student(student_id)?;
            Ok(remote_deleted || cache_deleted)
        }
    }
}
