//! Student performance handlers.

use super::{authenticate, get_i64_param, require_str_param};
use crate::server::AppState;
use serde_json::{json, Value};
use worklink::StudentPerformance;

/// Serialize counters together with the derived percentage rates.
fn performance_json(perf: &StudentPerformance) -> worklink::Result<Value> {
    let mut value = serde_json::to_value(perf)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("completion_rate".into(), json!(perf.completion_rate()));
        obj.insert("on_time_rate".into(), json!(perf.on_time_rate()));
    }
    Ok(value)
}

pub async fn get_student_performance(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let student_id = require_str_param(params, "student_id", "studentId")?;

    let perf = state.api.get_student_performance(&ctx, &student_id)?;
    performance_json(&perf)
}

pub async fn top_students(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let limit = get_i64_param(params, "limit", "limit").map(|l| l.max(0) as usize);

    let students = state.api.top_students(&ctx, limit)?;
    let rows: Vec<Value> = students
        .iter()
        .map(performance_json)
        .collect::<worklink::Result<_>>()?;
    Ok(Value::Array(rows))
}
