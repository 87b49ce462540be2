use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{fail, optional_str, required_str, stores};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::students::{self, StudentPatch};
use serde_json::json;

pub fn student_json(student: &Student) -> serde_json::Value {
    json!({
        "id": student.id,
        "firstName": student.first_name,
        "lastName": student.last_name,
        "email": student.email,
        "classId": student.class_id
    })
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match students::class_roster(remote, cache, &class_id) {
        Ok((roster, source)) => ok(
            &req.id,
            json!({
                "students": roster.iter().map(student_json).collect::<Vec<_>>(),
                "source": source.as_str()
            }),
        ),
        Err(e) => fail(req, e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let first_name = match required_str(req, "firstName") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let last_name = match required_str(req, "lastName") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if first_name.is_empty() || last_name.is_empty() {
        return err(&req.id, "bad_params", "first and last name must not be empty", None);
    }
    let email = optional_str(req, "email").unwrap_or_default();

    match students::create_student(remote, cache, &first_name, &last_name, &email, &class_id) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "student": student_json(&outcome.student),
                "localFallback": outcome.local_fallback
            }),
        ),
        Err(e) => fail(req, e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = StudentPatch {
        first_name: optional_str(req, "firstName"),
        last_name: optional_str(req, "lastName"),
        email: optional_str(req, "email"),
    };
    match students::update_student(remote, cache, &student_id, &patch) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student_json(&student) })),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => fail(req, e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match students::delete_student(remote, cache, &student_id) {
        Ok(true) => ok(&req.id, json!({ "ok": true })),
        Ok(false) => err(&req.id, "not_found", "student not found", None),
        Err(e) => fail(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
