use serde_json::json;

use crate::filter::clamp_class_size;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{parse_opt_i64, parse_opt_string, parse_string_array};
use crate::ipc::types::{AppState, Request};
use crate::worksheet::{draft_supplies, scale_supplies};

fn class_size_param(state: &AppState, req: &Request) -> Result<u32, serde_json::Value> {
    match parse_opt_i64(req.params.get("classSize")) {
        Ok(Some(n)) => Ok(clamp_class_size(n)),
        Ok(None) => Ok(state.selection.class_size),
        Err(m) => Err(err(&req.id, "bad_params", format!("classSize {}", m), None)),
    }
}

fn handle_supplies_draft(state: &mut AppState, req: &Request) -> serde_json::Value {
    let overview = match parse_opt_string(req.params.get("overview")) {
        Ok(v) => v.unwrap_or_else(|| state.selection.overview_text.clone()),
        Err(m) => return err(&req.id, "bad_params", format!("overview {}", m), None),
    };
    let class_size = match class_size_param(state, req) {
        Ok(n) => n,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "classSize": class_size, "text": draft_supplies(&overview, class_size) }),
    )
}

fn handle_supplies_scale(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    let class_size = match class_size_param(state, req) {
        Ok(n) => n,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "classSize": class_size, "text": scale_supplies(text, class_size) }),
    )
}

fn handle_rubric_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(criterion) = req.params.get("criterion").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing criterion", None);
    };
    let added = state.worksheet.add_criterion(criterion);
    ok(
        &req.id,
        json!({ "added": added, "criteria": state.worksheet.rubric_criteria }),
    )
}

fn handle_rubric_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "criteria": state.worksheet.rubric_criteria }),
    )
}

fn handle_rubric_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.worksheet.rubric_criteria.clear();
    ok(&req.id, json!({ "criteria": [] }))
}

fn handle_habits_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "habits": state.worksheet.studio_habits,
            "checked": state.worksheet.checked_habits(),
        }),
    )
}

fn handle_habits_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let checked = match parse_string_array(req.params.get("checked")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("checked {}", m), None),
    };
    let unknown = state.worksheet.set_checked_habits(&checked);
    if !unknown.is_empty() {
        return err(
            &req.id,
            "bad_params",
            "unknown studio habit",
            Some(json!({ "unknown": unknown })),
        );
    }
    ok(
        &req.id,
        json!({
            "habits": state.worksheet.studio_habits,
            "checked": state.worksheet.checked_habits(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "supplies.draft" => Some(handle_supplies_draft(state, req)),
        "supplies.scale" => Some(handle_supplies_scale(state, req)),
        "rubric.add" => Some(handle_rubric_add(state, req)),
        "rubric.list" => Some(handle_rubric_list(state, req)),
        "rubric.clear" => Some(handle_rubric_clear(state, req)),
        "studioHabits.get" => Some(handle_habits_get(state, req)),
        "studioHabits.set" => Some(handle_habits_set(state, req)),
        _ => None,
    }
}
