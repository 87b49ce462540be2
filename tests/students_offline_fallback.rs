
use serde_json::json;
use test_support::{request_ok, spawn_sidecar, temp_dir};

// A student created while the remote backend is unreachable gets a
// placeholder id and is propagated into every other class's local cache.
#[test]
fn offline_create_lands_locally_and_propagates() {
    let workspace = temp_dir("attendanced-offline-create");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let class_a = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "Mathematics 101" }),
    );
    let class_a = class_a.pointer("/class/id").and_then(|v| v.as_str()).expect("class a id").to_string();
    let class_b = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "classes.create",
        json!({ "name": "Physics 201" }),
    );
    let class_b = class_b.pointer("/class/id").and_then(|v| v.as_str()).expect("class b id").to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "remote.setOnline",
        json!({ "online": false }),
    );

    // Seed class B's cache collection so propagation has somewhere to land.
    let seeded = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({
            "classId": class_b,
            "firstName": "Ishita",
            "lastName": "Singh",
            "email": "ishita.singh@niet.ac.in"
        }),
    );
    assert_eq!(seeded.get("localFallback").and_then(|v| v.as_bool()), Some(true));

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.create",
        json!({
            "classId": class_a,
            "firstName": "Aarav",
            "lastName": "Sharma",
            "email": "aarav.sharma@niet.ac.in"
        }),
    );
    assert_eq!(created.get("localFallback").and_then(|v| v.as_bool()), Some(true));
    let local_id = created
        .pointer("/student/id")
        .and_then(|v| v.as_str())
        .expect("student id")
        .to_string();
    assert!(local_id.starts_with("local-"), "placeholder id, got {}", local_id);

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "classId": class_b }),
    );
    assert_eq!(listed.get("source").and_then(|v| v.as_str()), Some("local"));
    let students = listed.get("students").and_then(|v| v.as_array()).expect("students");
    let copy = students
        .iter()
        .find(|s| s.get("email").and_then(|v| v.as_str()) == Some("aarav.sharma@niet.ac.in"))
        .expect("propagated copy in class b");
    assert_eq!(copy.get("classId").and_then(|v| v.as_str()), Some(class_b.as_str()));
    assert_eq!(copy.get("id").and_then(|v| v.as_str()), Some(local_id.as_str()));
    assert_eq!(copy.get("firstName").and_then(|v| v.as_str()), Some("Aarav"));
}
