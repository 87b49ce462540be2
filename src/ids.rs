use uuid::Uuid;

/// Which store owns a student record, decided by id format alone.
/// Remote ids are UUIDs issued by the backend; local ids are placeholder
/// tokens minted when a remote create failed. A record never holds both: it
/// migrates local -> remote by being recreated under a fresh remote id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentRef {
    Remote(String),
    Local(String),
}

pub const LOCAL_ID_MARKER: &str = "local-";

impl StudentRef {
    /// An id is local if it carries the placeholder marker or fails to parse
    /// as a hyphenated-hex UUID. Anything the remote store did not issue is
    /// therefore treated as local (e.g. "temp-id-123").
    pub fn classify(id: &str) -> StudentRef {
        if id.contains(LOCAL_ID_MARKER) || Uuid::parse_str(id).is_err() {
            StudentRef::Local(id.to_string())
        } else {
            StudentRef::Remote(id.to_string())
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, StudentRef::Local(_))
    }

    pub fn id(&self) -> &str {
        match self {
            StudentRef::Remote(id) | StudentRef::Local(id) => id,
        }
    }
}

/// Timestamp-prefixed placeholder id for records that only exist locally.
pub fn new_local_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}-{}", LOCAL_ID_MARKER, millis, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_remote() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(StudentRef::classify(&id), StudentRef::Remote(id));
    }

    #[test]
    fn marker_and_malformed_ids_are_local() {
        assert!(StudentRef::classify("local-1714000000000-ab12cd34").is_local());
        assert!(StudentRef::classify("temp-id-123").is_local());
        assert!(StudentRef::classify("").is_local());
    }

    #[test]
    fn generated_placeholder_ids_classify_as_local() {
        let id = new_local_id();
        assert!(id.starts_with(LOCAL_ID_MARKER));
        assert!(StudentRef::classify(&id).is_local());
    }
}
