use crate::cache::LocalCache;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::remote::{RemoteError, RemoteStore};

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

/// Split borrow of both stores; the remote client is read-only here.
pub fn stores<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<(&'a RemoteStore, &'a mut LocalCache), serde_json::Value> {
    let AppState { remote, cache, .. } = state;
    match (remote.as_ref(), cache.as_mut()) {
        (Some(remote), Some(cache)) => Ok((remote, cache)),
        _ => Err(err(&req.id, "no_workspace", "select a workspace first", None)),
    }
}

/// Errors escaping the service layer keep their remote taxonomy code when
/// they have one.
pub fn fail(req: &Request, e: anyhow::Error) -> serde_json::Value {
    match e.downcast_ref::<RemoteError>() {
        Some(remote_err) => err(&req.id, remote_err.code(), remote_err.to_string(), None),
        None => err(&req.id, "internal", e.to_string(), None),
    }
}

pub fn remote_fail(req: &Request, e: RemoteError) -> serde_json::Value {
    err(&req.id, e.code(), e.to_string(), None)
}
