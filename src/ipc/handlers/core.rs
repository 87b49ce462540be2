use crate::cache::LocalCache;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::remote::RemoteStore;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "remoteOnline": state.remote.as_ref().map(|r| r.is_online())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    let offline = req
        .params
        .get("offline")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let conn = match db::open_db(&path) {
        Ok(conn) => conn,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };
    let cache = match LocalCache::open(&path) {
        Ok(cache) => cache,
        Err(e) => return err(&req.id, "cache_open_failed", format!("{e:?}"), None),
    };

    state.remote = Some(RemoteStore::new(conn, !offline));
    state.cache = Some(cache);
    state.workspace = Some(path.clone());
    ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
}

fn handle_remote_set_online(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(online) = req.params.get("online").and_then(|v| v.as_bool()) else {
        return err(&req.id, "bad_params", "missing online", None);
    };
    let Some(remote) = state.remote.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    remote.set_online(online);
    ok(&req.id, json!({ "remoteOnline": online }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "remote.setOnline" => Some(handle_remote_set_online(state, req)),
        _ => None,
    }
}
