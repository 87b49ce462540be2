use crate::attendance;
use crate::ipc::error::ok;
use crate::ipc::helpers::{fail, required_str, stores};
use crate::ipc::types::{AppState, Request};
use crate::report;
use crate::students;
use serde_json::json;

fn handle_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (roster, _source) = match students::class_roster(remote, cache, &class_id) {
        Ok(v) => v,
        Err(e) => return fail(req, e),
    };
    let records = match attendance::class_attendance(remote, cache, &class_id) {
        Ok(v) => v,
        Err(e) => return fail(req, e),
    };
    ok(&req.id, json!({ "csv": report::class_csv(&roster, &records) }))
}

fn handle_export_daily(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let date = match required_str(req, "date") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (roster, _source) = match students::class_roster(remote, cache, &class_id) {
        Ok(v) => v,
        Err(e) => return fail(req, e),
    };
    let records = match attendance::day_sheet(remote, cache, &class_id, &date) {
        Ok(v) => v,
        Err(e) => return fail(req, e),
    };
    ok(&req.id, json!({ "csv": report::day_csv(&roster, &records) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.exportCsv" => Some(handle_export_csv(state, req)),
        "reports.exportDaily" => Some(handle_export_daily(state, req)),
        _ => None,
    }
}
