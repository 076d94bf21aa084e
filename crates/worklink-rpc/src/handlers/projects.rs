//! Project handlers.

use super::{authenticate, get_i64_param, get_str_list_param, get_str_param, require_str_param};
use crate::server::AppState;
use serde_json::Value;
use worklink::models::{ProjectSpec, ProjectStatus, ProjectUpdate};

pub async fn create_project(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let spec = ProjectSpec {
        title: require_str_param(params, "title", "title")?,
        description: require_str_param(params, "description", "description")?,
        budget: get_i64_param(params, "budget", "budget").unwrap_or(0),
        deadline: require_str_param(params, "deadline", "deadline")?,
        skills_required: get_str_list_param(params, "skills_required", "skillsRequired")
            .unwrap_or_default(),
        attachment_refs: get_str_list_param(params, "attachment_refs", "attachmentRefs")
            .unwrap_or_default(),
    };

    let project = state.api.create_project(&ctx, &spec)?;
    Ok(serde_json::to_value(project)?)
}

pub async fn get_project(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let project_id = require_str_param(params, "project_id", "projectId")?;

    let project = state.api.get_project(&ctx, &project_id)?;
    Ok(serde_json::to_value(project)?)
}

pub async fn list_projects(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let status = get_str_param(params, "status", "status").and_then(ProjectStatus::from_str);

    let projects = state.api.list_projects(&ctx, status)?;
    Ok(serde_json::to_value(projects)?)
}

pub async fn update_project(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let project_id = require_str_param(params, "project_id", "projectId")?;
    let update = ProjectUpdate {
        title: get_str_param(params, "title", "title").map(String::from),
        description: get_str_param(params, "description", "description").map(String::from),
        budget: get_i64_param(params, "budget", "budget"),
        deadline: get_str_param(params, "deadline", "deadline").map(String::from),
        skills_required: get_str_list_param(params, "skills_required", "skillsRequired"),
        attachment_refs: get_str_list_param(params, "attachment_refs", "attachmentRefs"),
    };

    let project = state.api.update_project(&ctx, &project_id, &update)?;
    Ok(serde_json::to_value(project)?)
}

pub async fn cancel_project(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let project_id = require_str_param(params, "project_id", "projectId")?;

    let project = state.api.cancel_project(&ctx, &project_id)?;
    Ok(serde_json::to_value(project)?)
}

pub async fn assign_project(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let project_id = require_str_param(params, "project_id", "projectId")?;
    let student_id = require_str_param(params, "student_id", "studentId")?;

    let project = state.api.assign_project(&ctx, &project_id, &student_id)?;
    Ok(serde_json::to_value(project)?)
}

pub async fn approve_assignment(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let project_id = require_str_param(params, "project_id", "projectId")?;

    let work = state.api.approve_assignment(&ctx, &project_id)?;
    Ok(serde_json::to_value(work)?)
}

pub async fn reject_assignment(state: &AppState, params: &Value) -> worklink::Result<Value> {
    let ctx = authenticate(state, params)?;
    let project_id = require_str_param(params, "project_id", "projectId")?;

    let project = state.api.reject_assignment(&ctx, &project_id)?;
    Ok(serde_json::to_value(project)?)
}
