use crate::model::{Attendance, AttendanceStatus, Student};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const STUDENTS_KEY_PREFIX: &str = "local_students_";
pub const ATTENDANCE_KEY_PREFIX: &str = "attendance_";

/// Per-class fallback store for records the remote backend never accepted.
///
/// One JSON array file per key under `<workspace>/cache/`, with the key names
/// kept bit-exact for data migrated from older deployments:
/// `local_students_<classId>` and `attendance_<classId>_<date>`.
///
/// Lookup-by-id used to require a linear scan over every class key; a
/// secondary index (student id -> owning class ids) is rebuilt on open and
/// maintained on every write so point lookups are cheap. Deleting a student
/// still walks every attendance key, an O(classes x dates) cost.
pub struct LocalCache {
    dir: PathBuf,
    index: HashMap<String, BTreeSet<String>>,
}

pub fn students_key(class_id: &str) -> String {
    format!("{}{}", STUDENTS_KEY_PREFIX, class_id)
}

pub fn attendance_key(class_id: &str, date: &str) -> String {
    format!("{}{}_{}", ATTENDANCE_KEY_PREFIX, class_id, date)
}

impl LocalCache {
    pub fn open(workspace: &Path) -> anyhow::Result<LocalCache> {
        let dir = workspace.join("cache");
        std::fs::create_dir_all(&dir)?;
        let mut cache = LocalCache {
            dir,
            index: HashMap::new(),
        };
        cache.rebuild_index()?;
        Ok(cache)
    }

    fn rebuild_index(&mut self) -> anyhow::Result<()> {
        self.index.clear();
        for class_id in self.class_ids()? {
            for student in self.list_students(&class_id)? {
                self.index
                    .entry(student.id)
                    .or_default()
                    .insert(class_id.clone());
            }
        }
        Ok(())
    }

    fn keys(&self) -> anyhow::Result<Vec<String>> {
        let mut out = Vec::new();
        for ent in std::fs::read_dir(&self.dir)? {
            let ent = ent?;
            if !ent.path().is_file() {
                continue;
            }
            if let Some(name) = ent.file_name().to_str() {
                out.push(name.to_string());
            }
        }
        out.sort();
        Ok(out)
    }

    fn read_array<T: serde::de::DeserializeOwned>(&self, key: &str) -> anyhow::Result<Vec<T>> {
        let path = self.dir.join(key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_array<T: serde::Serialize>(&self, key: &str, items: &[T]) -> anyhow::Result<()> {
        let path = self.dir.join(key);
        std::fs::write(path, serde_json::to_string(items)?)?;
        Ok(())
    }

    /// Every class id with a students key, whether or not the array is empty.
    pub fn class_ids(&self) -> anyhow::Result<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(STUDENTS_KEY_PREFIX).map(|s| s.to_string()))
            .collect())
    }

    // Students

    pub fn list_students(&self, class_id: &str) -> anyhow::Result<Vec<Student>> {
        self.read_array(&students_key(class_id))
    }

    /// Idempotent upsert keyed on the student id within its class collection.
    pub fn save_student(&mut self, student: &Student) -> anyhow::Result<()> {
        let key = students_key(&student.class_id);
        let mut students: Vec<Student> = self.read_array(&key)?;
        match students.iter_mut().find(|s| s.id == student.id) {
            Some(existing) => *existing = student.clone(),
            None => students.push(student.clone()),
        }
        self.write_array(&key, &students)?;
        self.index
            .entry(student.id.clone())
            .or_default()
            .insert(student.class_id.clone());
        Ok(())
    }

    pub fn find_student_by_id(&self, student_id: &str) -> anyhow::Result<Option<Student>> {
        let Some(class_ids) = self.index.get(student_id) else {
            return Ok(None);
        };
        for class_id in class_ids {
            if let Some(found) = self
                .list_students(class_id)?
                .into_iter()
                .find(|s| s.id == student_id)
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Removes the student from every class collection it appears in, then
    /// purges its entries from every attendance key. Returns whether any
    /// roster entry was removed.
    pub fn delete_student(&mut self, student_id: &str) -> anyhow::Result<bool> {
        let class_ids: Vec<String> = self
            .index
            .remove(student_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        let mut deleted = false;
        for class_id in &class_ids {
            let key = students_key(class_id);
            let mut students: Vec<Student> = self.read_array(&key)?;
            let before = students.len();
            students.retain(|s| s.id != student_id);
            if students.len() != before {
                self.write_array(&key, &students)?;
                deleted = true;
            }
        }
        if deleted {
            for key in self.keys()? {
                if !key.starts_with(ATTENDANCE_KEY_PREFIX) {
                    continue;
                }
                let mut records: Vec<Attendance> = self.read_array(&key)?;
                let before = records.len();
                records.retain(|r| r.student_id != student_id);
                if records.len() != before {
                    self.write_array(&key, &records)?;
                }
            }
        }
        Ok(deleted)
    }

    /// Replaces the class's students key with an empty array.
    pub fn clear_students(&mut self, class_id: &str) -> anyhow::Result<()> {
        self.write_array::<Student>(&students_key(class_id), &[])?;
        for classes in self.index.values_mut() {
            classes.remove(class_id);
        }
        self.index.retain(|_, classes| !classes.is_empty());
        Ok(())
    }

    /// Drops every key belonging to the class (roster and attendance).
    pub fn remove_class(&mut self, class_id: &str) -> anyhow::Result<()> {
        let roster = self.dir.join(students_key(class_id));
        if roster.exists() {
            std::fs::remove_file(roster)?;
        }
        let day_prefix = format!("{}{}_", ATTENDANCE_KEY_PREFIX, class_id);
        for key in self.keys()? {
            if key.starts_with(&day_prefix) {
                std::fs::remove_file(self.dir.join(key))?;
            }
        }
        for classes in self.index.values_mut() {
            classes.remove(class_id);
        }
        self.index.retain(|_, classes| !classes.is_empty());
        Ok(())
    }

    // Attendance

    pub fn list_attendance(&self, class_id: &str, date: &str) -> anyhow::Result<Vec<Attendance>> {
        self.read_array(&attendance_key(class_id, date))
    }

    /// Update-in-place if the student already has an entry for this key,
    /// else append. At most one entry per student per (class, date).
    pub fn upsert_attendance(
        &mut self,
        student_id: &str,
        class_id: &str,
        date: &str,
        status: AttendanceStatus,
    ) -> anyhow::Result<Attendance> {
        let key = attendance_key(class_id, date);
        let mut records: Vec<Attendance> = self.read_array(&key)?;
        let record = match records.iter_mut().find(|r| r.student_id == student_id) {
            Some(existing) => {
                existing.status = status;
                existing.clone()
            }
            None => {
                let fresh = Attendance {
                    id: Uuid::new_v4().to_string(),
                    student_id: student_id.to_string(),
                    class_id: class_id.to_string(),
                    date: date.to_string(),
                    status,
                };
                records.push(fresh.clone());
                fresh
            }
        };
        self.write_array(&key, &records)?;
        Ok(record)
    }

    pub fn attendance_for_class(&self, class_id: &str) -> anyhow::Result<Vec<Attendance>> {
        let day_prefix = format!("{}{}_", ATTENDANCE_KEY_PREFIX, class_id);
        let mut out = Vec::new();
        for key in self.keys()? {
            if key.starts_with(&day_prefix) {
                out.extend(self.read_array::<Attendance>(&key)?);
            }
        }
        Ok(out)
    }

    pub fn attendance_by_student(&self, student_id: &str) -> anyhow::Result<Vec<Attendance>> {
        let mut out = Vec::new();
        for key in self.keys()? {
            if !key.starts_with(ATTENDANCE_KEY_PREFIX) {
                continue;
            }
            let records: Vec<Attendance> = self.read_array(&key)?;
            out.extend(records.into_iter().filter(|r| r.student_id == student_id));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_workspace(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    fn student(id: &str, first: &str, last: &str, email: &str, class_id: &str) -> Student {
        Student {
            id: id.into(),
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            class_id: class_id.into(),
        }
    }

    #[test]
    fn key_names_are_bit_exact() {
        assert_eq!(students_key("c1"), "local_students_c1");
        assert_eq!(attendance_key("c1", "2024-01-01"), "attendance_c1_2024-01-01");
    }

    #[test]
    fn save_is_idempotent_and_files_use_exact_keys() {
        let ws = temp_workspace("attendanced-cache-save");
        let mut cache = LocalCache::open(&ws).expect("open");
        let s = student("local-1-aa", "Aarav", "Sharma", "aarav.sharma@niet.ac.in", "c1");
        cache.save_student(&s).expect("save");
        cache.save_student(&s).expect("save again");
        assert_eq!(cache.list_students("c1").expect("list").len(), 1);
        assert!(ws.join("cache").join("local_students_c1").is_file());
    }

    #[test]
    fn index_survives_reopen() {
        let ws = temp_workspace("attendanced-cache-reopen");
        {
            let mut cache = LocalCache::open(&ws).expect("open");
            cache
                .save_student(&student("local-2-bb", "Priya", "Patel", "", "c2"))
                .expect("save");
        }
        let cache = LocalCache::open(&ws).expect("reopen");
        let found = cache.find_student_by_id("local-2-bb").expect("find");
        assert_eq!(found.map(|s| s.class_id), Some("c2".to_string()));
    }

    #[test]
    fn delete_student_clears_every_class_and_attendance_entry() {
        let ws = temp_workspace("attendanced-cache-delete");
        let mut cache = LocalCache::open(&ws).expect("open");
        let s1 = student("local-3-cc", "Rahul", "Kumar", "", "c1");
        let s2 = Student {
            class_id: "c2".into(),
            ..s1.clone()
        };
        cache.save_student(&s1).expect("save c1");
        cache.save_student(&s2).expect("save c2");
        cache
            .upsert_attendance("local-3-cc", "c1", "2024-01-01", AttendanceStatus::Late)
            .expect("attendance");

        assert!(cache.delete_student("local-3-cc").expect("delete"));
        assert!(cache.list_students("c1").expect("list c1").is_empty());
        assert!(cache.list_students("c2").expect("list c2").is_empty());
        assert!(cache
            .list_attendance("c1", "2024-01-01")
            .expect("attendance list")
            .is_empty());
        assert!(!cache.delete_student("local-3-cc").expect("second delete"));
    }

    #[test]
    fn attendance_upsert_keeps_one_entry_per_student() {
        let ws = temp_workspace("attendanced-cache-upsert");
        let mut cache = LocalCache::open(&ws).expect("open");
        cache
            .upsert_attendance("temp-id-123", "c1", "2024-01-01", AttendanceStatus::Late)
            .expect("first mark");
        let updated = cache
            .upsert_attendance("temp-id-123", "c1", "2024-01-01", AttendanceStatus::Present)
            .expect("second mark");
        let records = cache.list_attendance("c1", "2024-01-01").expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttendanceStatus::Present);
        assert_eq!(records[0].id, updated.id);
    }

    #[test]
    fn clear_students_leaves_an_empty_key_behind() {
        let ws = temp_workspace("attendanced-cache-clear");
        let mut cache = LocalCache::open(&ws).expect("open");
        cache
            .save_student(&student("local-4-dd", "Neha", "Gupta", "", "c9"))
            .expect("save");
        cache.clear_students("c9").expect("clear");
        assert!(cache.list_students("c9").expect("list").is_empty());
        assert_eq!(cache.class_ids().expect("class ids"), vec!["c9".to_string()]);
        assert!(cache.find_student_by_id("local-4-dd").expect("find").is_none());
    }
}
