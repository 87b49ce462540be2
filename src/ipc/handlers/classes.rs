use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{fail, optional_str, remote_fail, required_str, stores};
use crate::ipc::types::{AppState, Request};
use crate::model::Class;
use serde_json::json;

fn class_json(class: &Class) -> serde_json::Value {
    json!({
        "id": class.id,
        "name": class.name,
        "description": class.description,
        "schedule": class.schedule,
        "userId": class.user_id,
        "createdAt": class.created_at
    })
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, _cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match remote.list_classes() {
        Ok(classes) => ok(
            &req.id,
            json!({ "classes": classes.iter().map(class_json).collect::<Vec<_>>() }),
        ),
        Err(e) => remote_fail(req, e),
    }
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, _cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }
    let description = optional_str(req, "description").unwrap_or_default();
    let schedule = optional_str(req, "schedule").unwrap_or_default();
    let user_id = optional_str(req, "userId");

    match remote.create_class(&name, &description, &schedule, user_id.as_deref()) {
        Ok(class) => ok(&req.id, json!({ "class": class_json(&class) })),
        Err(e) => remote_fail(req, e),
    }
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, _cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut class = match remote.get_class(&class_id) {
        Ok(Some(c)) => c,
        Ok(None) => return err(&req.id, "not_found", "class not found", None),
        Err(e) => return remote_fail(req, e),
    };
    if let Some(name) = optional_str(req, "name") {
        let name = name.trim().to_string();
        if name.is_empty() {
            return err(&req.id, "bad_params", "name must not be empty", None);
        }
        class.name = name;
    }
    if let Some(description) = optional_str(req, "description") {
        class.description = description;
    }
    if let Some(schedule) = optional_str(req, "schedule") {
        class.schedule = schedule;
    }
    match remote.update_class(&class) {
        Ok(()) => ok(&req.id, json!({ "class": class_json(&class) })),
        Err(e) => remote_fail(req, e),
    }
}

/// Removes the class remotely (students and attendance cascade in dependency
/// order) and drops every cache key the class owned.
fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let remote_deleted = match remote.delete_class(&class_id) {
        Ok(v) => v,
        Err(e) => return remote_fail(req, e),
    };
    let had_cache = match cache.class_ids() {
        Ok(ids) => ids.contains(&class_id),
        Err(e) => return fail(req, e),
    };
    if let Err(e) = cache.remove_class(&class_id) {
        return fail(req, e);
    }
    if !remote_deleted && !had_cache {
        return err(&req.id, "not_found", "class not found", None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.update" => Some(handle_classes_update(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
