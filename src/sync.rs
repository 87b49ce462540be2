use crate::cache::LocalCache;
use crate::model::Student;
use crate::remote::RemoteStore;
use crate::students;

/// The roster used to standardize specific classes. Matched by identity, so
/// re-running a replace converges instead of duplicating.
pub const STANDARD_ROSTER: [(&str, &str, &str); 9] = [
    ("Aarav", "Sharma", "aarav.sharma@niet.ac.in"),
    ("Priya", "Patel", "priya.patel@niet.ac.in"),
    ("Rahul", "Kumar", "rahul.kumar@niet.ac.in"),
    ("Ananya", "Verma", "ananya.verma@niet.ac.in"),
    ("Kunal", "Mehra", "kunal.mehra@niet.ac.in"),
    ("Ishita", "Singh", "ishita.singh@niet.ac.in"),
    ("Arjun", "Reddy", "arjun.reddy@niet.ac.in"),
    ("Neha", "Gupta", "neha.gupta@niet.ac.in"),
    ("Rohan", "Joshi", "rohan.joshi@niet.ac.in"),
];

/// Pushes a student's identity into every other class's local cache. The
/// underlying id is carried across classes unchanged; only classId differs
/// per copy. An identity match overwrites the matched record's name and
/// email fields in place: last writer wins, no timestamps, no ordering
/// guarantee. There is also no atomicity across classes; an interrupted run
/// leaves some caches updated and others not, reconciled only at next read.
pub fn propagate(cache: &mut LocalCache, student: &Student) -> anyhow::Result<()> {
    for class_id in cache.class_ids()? {
        if class_id == student.class_id {
            continue;
        }
        let roster = cache.list_students(&class_id)?;
        let matched = roster.iter().find(|s| {
            (s.first_name == student.first_name && s.last_name == student.last_name)
                || (!student.email.is_empty() && s.email == student.email)
        });
        match matched {
            Some(existing) => {
                let mut updated = existing.clone();
                updated.first_name = student.first_name.clone();
                updated.last_name = student.last_name.clone();
                updated.email = student.email.clone();
                cache.save_student(&updated)?;
            }
            None => {
                let copy = Student {
                    class_id: class_id.clone(),
                    ..student.clone()
                };
                cache.save_student(&copy)?;
            }
        }
    }
    Ok(())
}

/// Destructive: wipes the class's cached roster and recreates the standard
/// list through the normal create path, so each member lands remotely when
/// possible and every create re-enters propagation. The class cache always
/// ends up holding exactly the standard members.
pub fn replace_roster(
    remote: &RemoteStore,
    cache: &mut LocalCache,
    class_id: &str,
) -> anyhow::Result<Vec<Student>> {
    cache.clear_students(class_id)?;
    let mut created = Vec::new();
    for (first_name, last_name, email) in STANDARD_ROSTER {
        let outcome = students::create_student(remote, cache, first_name, last_name, email, class_id)?;
        let member = Student {
            class_id: class_id.to_string(),
            ..outcome.student
        };
        cache.save_student(&member)?;
        created.push(member);
    }
    Ok(created)
}

/// Applies the standard roster to every class the remote store knows about.
pub fn standardize_rosters(
    remote: &RemoteStore,
    cache: &mut LocalCache,
) -> anyhow::Result<Vec<String>> {
    let classes = remote.list_classes()?;
    let mut class_ids = Vec::new();
    for class in classes {
        replace_roster(remote, cache, &class.id)?;
        class_ids.push(class.id);
    }
    Ok(class_ids)
}
