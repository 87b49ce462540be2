
use serde_json::json;
use test_support::{request_ok, spawn_sidecar, temp_dir};

// A student that exists both remotely and as a local shadow must appear once
// in the merged roster, with the remote copy winning.
#[test]
fn merged_roster_contains_no_duplicate_identities() {
    let workspace = temp_dir("attendanced-merge-dedupe");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let class = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "Mathematics 101" }),
    );
    let class_id = class.pointer("/class/id").and_then(|v| v.as_str()).expect("class id").to_string();

    // First create happens while the remote is down: local shadow copy.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "remote.setOnline",
        json!({ "online": false }),
    );
    let local = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({
            "classId": class_id,
            "firstName": "Rahul",
            "lastName": "Kumar",
            "email": "rahul.kumar@niet.ac.in"
        }),
    );
    assert_eq!(local.get("localFallback").and_then(|v| v.as_bool()), Some(true));

    // The remote comes back and the same person is created again.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "remote.setOnline",
        json!({ "online": true }),
    );
    let remote = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.create",
        json!({
            "classId": class_id,
            "firstName": "Rahul",
            "lastName": "Kumar",
            "email": "rahul.kumar@niet.ac.in"
        }),
    );
    assert_eq!(remote.get("localFallback").and_then(|v| v.as_bool()), Some(false));
    let remote_id = remote
        .pointer("/student/id")
        .and_then(|v| v.as_str())
        .expect("remote id")
        .to_string();

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "classId": class_id }),
    );
    assert_eq!(listed.get("source").and_then(|v| v.as_str()), Some("merged"));
    let roster = listed.get("students").and_then(|v| v.as_array()).expect("roster");
    let rahuls: Vec<_> = roster
        .iter()
        .filter(|s| s.get("email").and_then(|v| v.as_str()) == Some("rahul.kumar@niet.ac.in"))
        .collect();
    assert_eq!(rahuls.len(), 1);
    assert_eq!(
        rahuls[0].get("id").and_then(|v| v.as_str()),
        Some(remote_id.as_str())
    );
}

#[test]
fn deleting_a_local_student_clears_every_trace() {
    let workspace = temp_dir("attendanced-delete-local");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy(), "offline": true }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "classId": "c1",
            "firstName": "Kunal",
            "lastName": "Mehra",
            "email": "kunal.mehra@niet.ac.in"
        }),
    );
    let student_id = created
        .pointer("/student/id")
        .and_then(|v| v.as_str())
        .expect("student id")
        .to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.mark",
        json!({
            "studentId": student_id,
            "classId": "c1",
            "date": "2024-03-01",
            "status": "present"
        }),
    );

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.delete",
        json!({ "studentId": student_id }),
    );
    assert_eq!(deleted.get("ok").and_then(|v| v.as_bool()), Some(true));

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.list",
        json!({ "classId": "c1" }),
    );
    assert!(listed
        .get("students")
        .and_then(|v| v.as_array())
        .expect("roster")
        .is_empty());
    let sheet = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.list",
        json!({ "classId": "c1", "date": "2024-03-01" }),
    );
    assert!(sheet
        .get("attendance")
        .and_then(|v| v.as_array())
        .expect("records")
        .is_empty());
}
