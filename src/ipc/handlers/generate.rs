use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::generate::spawn_request;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::prompt::approved_channels;
use crate::ipc::helpers::{parse_opt_string, required_str};
use crate::ipc::types::{AppState, Request};
use crate::prompt::Slot;

pub const FINISHED_EVENT: &str = "generate.finished";

fn handle_generate_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    let control = match required_str(req, "control") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let slot_name = match required_str(req, "slot") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(slot) = Slot::parse(&slot_name) else {
        return err(
            &req.id,
            "no_prompt",
            "No AI prompt is available for this field.",
            Some(json!({ "slot": slot_name })),
        );
    };
    let channels = approved_channels(state);
    let channel_refs: Vec<&str> = channels.iter().map(String::as_str).collect();
    let prompt = crate::prompt::compose(slot, &state.selection, &channel_refs);

    let ticket = match state.in_flight.begin(&control) {
        Ok(t) => t,
        Err(busy) => {
            return err(
                &req.id,
                "busy",
                busy.to_string(),
                Some(json!({ "control": busy.control, "requestId": busy.request_id })),
            )
        }
    };
    let request_id = ticket.request_id.clone();
    info!(control = %control, slot = slot.name(), request_id = %request_id, "generation started");

    let outbox = state.outbox.clone();
    spawn_request(
        Arc::clone(&state.backend),
        state.in_flight.clone(),
        ticket,
        prompt,
        move |ticket, result| {
            let event = match result {
                Ok(text) => json!({
                    "event": FINISHED_EVENT,
                    "control": ticket.control,
                    "requestId": ticket.request_id,
                    "ok": true,
                    "text": text,
                }),
                Err(e) => json!({
                    "event": FINISHED_EVENT,
                    "control": ticket.control,
                    "requestId": ticket.request_id,
                    "ok": false,
                    "error": { "code": e.code(), "message": e.to_string() },
                }),
            };
            outbox.send(&event);
        },
    );
    ok(
        &req.id,
        json!({ "control": control, "slot": slot.name(), "requestId": request_id }),
    )
}

fn handle_generate_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    let control = match required_str(req, "control") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let cancelled = state.in_flight.cancel(&control);
    ok(
        &req.id,
        json!({ "control": control, "cancelledRequestId": cancelled }),
    )
}

fn handle_generate_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let control = match parse_opt_string(req.params.get("control")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("control {}", m), None),
    };
    let mut result = json!({ "inFlight": state.in_flight.controls() });
    if let Some(c) = control {
        result["busy"] = json!(state.in_flight.is_busy(&c));
        result["control"] = json!(c);
    }
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "generate.start" => Some(handle_generate_start(state, req)),
        "generate.cancel" | "controls.unmount" => Some(handle_generate_cancel(state, req)),
        "generate.status" => Some(handle_generate_status(state, req)),
        _ => None,
    }
}
