use serde_json::json;

use crate::filter::{
    apply_patch, choose, compute_all, video_text, ChoiceError, SelectionPatch, Selector,
};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{loaded_catalog, parse_opt_string, required_str};
use crate::ipc::types::{AppState, Request};

fn handle_selection_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "selection": state.selection,
            "choices": state.choices,
        }),
    )
}

fn handle_selection_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("patch") else {
        return err(&req.id, "bad_params", "missing patch", None);
    };
    let patch: SelectionPatch = match serde_json::from_value(raw.clone()) {
        Ok(p) => p,
        Err(e) => return err(&req.id, "bad_params", format!("patch {}", e), None),
    };
    let catalog = match loaded_catalog(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let out = apply_patch(&catalog, &mut state.selection, &mut state.choices, patch);
    let videos = out.options.get(&Selector::Videos).map(|v| video_text(v));
    ok(
        &req.id,
        json!({
            "selection": state.selection,
            "choices": state.choices,
            "changed": out.changed,
            "options": out.options,
            "reset": out.reset,
            "videoText": videos,
        }),
    )
}

fn handle_selection_choose(state: &mut AppState, req: &Request) -> serde_json::Value {
    let selector_name = match required_str(req, "selector") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(selector) = Selector::parse(&selector_name) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown selector: {}", selector_name),
            None,
        );
    };
    let value = match parse_opt_string(req.params.get("value")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("value {}", m), None),
    };
    let catalog = match loaded_catalog(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match choose(&catalog, &state.selection, &mut state.choices, selector, value) {
        Ok(()) => ok(&req.id, json!({ "choices": state.choices })),
        Err(e @ ChoiceError::NotChoosable(_)) => err(&req.id, "bad_params", e.to_string(), None),
        Err(e @ ChoiceError::NotOffered { .. }) => err(
            &req.id,
            "not_offered",
            e.to_string(),
            Some(json!({ "selector": selector })),
        ),
    }
}

fn handle_options_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let catalog = match loaded_catalog(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let options = compute_all(&catalog, &state.selection);
    let videos = options.get(&Selector::Videos).map(|v| video_text(v));
    ok(
        &req.id,
        json!({
            "options": options,
            "videoText": videos,
            "choices": state.choices,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "selection.get" => Some(handle_selection_get(state, req)),
        "selection.update" => Some(handle_selection_update(state, req)),
        "selection.choose" => Some(handle_selection_choose(state, req)),
        "options.compute" => Some(handle_options_compute(state, req)),
        _ => None,
    }
}
