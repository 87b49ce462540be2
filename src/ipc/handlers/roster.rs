use super::students::student_json;
use crate::ipc::error::ok;
use crate::ipc::helpers::{fail, required_str, stores};
use crate::ipc::types::{AppState, Request};
use crate::sync;
use serde_json::json;

fn handle_roster_replace(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match sync::replace_roster(remote, cache, &class_id) {
        Ok(students) => ok(
            &req.id,
            json!({ "students": students.iter().map(student_json).collect::<Vec<_>>() }),
        ),
        Err(e) => fail(req, e),
    }
}

fn handle_roster_standardize(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match sync::standardize_rosters(remote, cache) {
        Ok(class_ids) => ok(&req.id, json!({ "classIds": class_ids })),
        Err(e) => fail(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.replace" => Some(handle_roster_replace(state, req)),
        "roster.standardize" => Some(handle_roster_standardize(state, req)),
        _ => None,
    }
}
