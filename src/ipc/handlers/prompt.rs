use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::prompt::{compose_prompt, Slot};

/// Approved channel names from the loaded catalog, empty before a load.
pub fn approved_channels(state: &AppState) -> Vec<String> {
    state
        .catalog
        .as_ref()
        .map(|c| {
            c.catalog
                .channel_names()
                .into_iter()
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn handle_prompt_compose(state: &mut AppState, req: &Request) -> serde_json::Value {
    let slot = match required_str(req, "slot") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let channels = approved_channels(state);
    let channel_refs: Vec<&str> = channels.iter().map(String::as_str).collect();
    match compose_prompt(&slot, &state.selection, &channel_refs) {
        Some(prompt) => ok(&req.id, json!({ "slot": slot, "prompt": prompt })),
        None => ok(
            &req.id,
            json!({
                "slot": slot,
                "prompt": null,
                "notice": "No AI prompt is available for this field.",
            }),
        ),
    }
}

fn handle_prompt_slots(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let slots: Vec<&str> = Slot::ALL.iter().map(|s| s.name()).collect();
    ok(&req.id, json!({ "slots": slots }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "prompt.compose" => Some(handle_prompt_compose(state, req)),
        "prompt.slots" => Some(handle_prompt_slots(state, req)),
        _ => None,
    }
}
