use crate::attendance;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{fail, required_str, stores};
use crate::ipc::types::{AppState, Request};
use crate::model::{self, Attendance, AttendanceStatus};
use serde_json::json;

fn attendance_json(record: &Attendance) -> serde_json::Value {
    json!({
        "id": record.id,
        "studentId": record.student_id,
        "classId": record.class_id,
        "date": record.date,
        "status": record.status.as_str()
    })
}

fn parse_date(req: &Request) -> Result<String, serde_json::Value> {
    let date = required_str(req, "date")?;
    if !model::valid_date(&date) {
        return Err(err(&req.id, "bad_params", "date must be YYYY-MM-DD", None));
    }
    Ok(date)
}

fn handle_attendance_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let date = match parse_date(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match required_str(req, "status") {
        Ok(raw) => match AttendanceStatus::parse(&raw) {
            Some(v) => v,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "status must be one of: present, absent, late, excused",
                    Some(json!({ "status": raw })),
                )
            }
        },
        Err(resp) => return resp,
    };

    match attendance::mark_attendance(remote, cache, &student_id, &class_id, &date, status) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "attendance": attendance_json(&outcome.record),
                "localFallback": outcome.local_fallback
            }),
        ),
        Err(e) => fail(req, e),
    }
}

fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let date = match parse_date(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match attendance::day_sheet(remote, cache, &class_id, &date) {
        Ok(records) => ok(
            &req.id,
            json!({ "attendance": records.iter().map(attendance_json).collect::<Vec<_>>() }),
        ),
        Err(e) => fail(req, e),
    }
}

fn handle_attendance_by_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match attendance::by_student(remote, cache, &student_id) {
        Ok(records) => ok(
            &req.id,
            json!({ "attendance": records.iter().map(attendance_json).collect::<Vec<_>>() }),
        ),
        Err(e) => fail(req, e),
    }
}

fn handle_attendance_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (remote, cache) = match stores(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match attendance::stats(remote, cache, &class_id) {
        Ok(counts) => ok(
            &req.id,
            json!({
                "present": counts.present,
                "absent": counts.absent,
                "late": counts.late,
                "excused": counts.excused
            }),
        ),
        Err(e) => fail(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.mark" => Some(handle_attendance_mark(state, req)),
        "attendance.list" => Some(handle_attendance_list(state, req)),
        "attendance.byStudent" => Some(handle_attendance_by_student(state, req)),
        "attendance.stats" => Some(handle_attendance_stats(state, req)),
        _ => None,
    }
}
