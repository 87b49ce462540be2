use crate::model::Student;

/// Fuzzy identity of a student, used to decide whether two records from
/// different stores describe the same person. A record with a non-empty
/// email is identified by that email alone; only records without one fall
/// back to the (first, last) name pair. The two keys are never combined in a
/// single pass, which mirrors the behavior any migrated data was shaped by;
/// see DESIGN.md before "fixing" this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKey {
    Email(String),
    Name(String, String),
}

pub fn identity_key(student: &Student) -> IdentityKey {
    if !student.email.is_empty() {
        IdentityKey::Email(student.email.clone())
    } else {
        IdentityKey::Name(student.first_name.clone(), student.last_name.clone())
    }
}

/// Merges a class roster read from both stores. The remote list is
/// authoritative and passes through unchanged; a local record is appended
/// only if no remote record shares its identity key. No field-level merge:
/// when both stores know the student, the remote copy wins wholesale.
///
/// O(remote x local) comparisons, fine at classroom scale.
pub fn merge_student_lists(remote: &[Student], local: &[Student]) -> Vec<Student> {
    let remote_keys: Vec<IdentityKey> = remote.iter().map(identity_key).collect();
    let mut merged = remote.to_vec();
    for student in local {
        let key = identity_key(student);
        if !remote_keys.contains(&key) {
            merged.push(student.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, first: &str, last: &str, email: &str) -> Student {
        Student {
            id: id.into(),
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            class_id: "c1".into(),
        }
    }

    #[test]
    fn remote_wins_on_matching_email() {
        let remote = vec![student("r1", "Aarav", "Sharma", "aarav.sharma@niet.ac.in")];
        let local = vec![student("local-1", "A.", "Sharma", "aarav.sharma@niet.ac.in")];
        let merged = merge_student_lists(&remote, &local);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "r1");
    }

    #[test]
    fn remote_wins_on_matching_name_when_both_lack_email() {
        let remote = vec![student("r1", "Priya", "Patel", "")];
        let local = vec![student("local-2", "Priya", "Patel", "")];
        let merged = merge_student_lists(&remote, &local);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "r1");
    }

    #[test]
    fn local_with_email_never_matches_remote_by_name() {
        // Same person by name, but the local copy carries an email and the
        // remote copy does not: the email key never falls back to the name
        // key, so both survive the merge.
        let remote = vec![student("r1", "Rahul", "Kumar", "")];
        let local = vec![student("local-3", "Rahul", "Kumar", "rahul.kumar@niet.ac.in")];
        let merged = merge_student_lists(&remote, &local);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn unmatched_local_students_are_appended_after_remote() {
        let remote = vec![student("r1", "Ananya", "Verma", "ananya.verma@niet.ac.in")];
        let local = vec![
            student("local-4", "Kunal", "Mehra", "kunal.mehra@niet.ac.in"),
            student("local-5", "Ishita", "Singh", ""),
        ];
        let merged = merge_student_lists(&remote, &local);
        assert_eq!(
            merged.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
            vec!["r1", "local-4", "local-5"]
        );
    }

    #[test]
    fn merged_list_has_no_duplicate_identity_keys() {
        let remote = vec![
            student("r1", "Arjun", "Reddy", "arjun.reddy@niet.ac.in"),
            student("r2", "Neha", "Gupta", ""),
        ];
        let local = vec![
            student("local-6", "Arjun", "R.", "arjun.reddy@niet.ac.in"),
            student("local-7", "Neha", "Gupta", ""),
            student("local-8", "Rohan", "Joshi", "rohan.joshi@niet.ac.in"),
        ];
        let merged = merge_student_lists(&remote, &local);
        for (i, a) in merged.iter().enumerate() {
            for b in merged.iter().skip(i + 1) {
                assert_ne!(identity_key(a), identity_key(b));
            }
        }
    }
}
