use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::catalog::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::selection::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::prompt::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::generate::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::worksheet::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
