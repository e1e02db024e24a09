use std::sync::Arc;

use serde_json::json;
use tracing::error;

use crate::catalog::{Catalog, CatalogError};
use crate::filter::{compute_selector, Selector};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{loaded_catalog, parse_opt_string, required_str};
use crate::ipc::types::{AppState, LoadedCatalog, Request};
use crate::records::RecordKind;
use crate::tabular::SourceLocation;
use crate::taxonomy::taxonomy_json;

fn handle_catalog_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut sources = state.config.sources.locations();
    if let Some(overrides) = req.params.get("sources") {
        if !overrides.is_object() {
            return err(&req.id, "bad_params", "sources must be an object", None);
        }
        for kind in RecordKind::ALL {
            let loc = match parse_opt_string(overrides.get(kind.code())) {
                Ok(v) => v,
                Err(m) => {
                    return err(&req.id, "bad_params", format!("sources.{} {}", kind, m), None)
                }
            };
            if let Some(loc) = loc {
                let slot = match kind {
                    RecordKind::Standards => &mut sources.standards,
                    RecordKind::Questions => &mut sources.questions,
                    RecordKind::Accommodations => &mut sources.accommodations,
                    RecordKind::Videos => &mut sources.videos,
                };
                *slot = SourceLocation::parse(&loc);
            }
        }
    }

    let catalog = match Catalog::load(Arc::clone(&state.fetcher), &sources) {
        Ok(c) => c,
        Err(CatalogError::LoadFailed { kind, source }) => {
            error!(%kind, error = %source, "catalog load failed");
            return err(
                &req.id,
                "catalog_load_failed",
                source.to_string(),
                Some(json!({ "source": kind.code(), "kind": source.kind() })),
            );
        }
    };

    // A reload swaps the whole catalog; choices that vanished with it are cleared.
    let mut reset = Vec::new();
    for sel in Selector::ALL {
        let opts = compute_selector(&catalog, &state.selection, sel);
        if state.choices.reconcile(sel, &opts) {
            reset.push(sel);
        }
    }

    let loaded_at = chrono::Utc::now().to_rfc3339();
    let counts = catalog.counts_json();
    let revision = catalog.revision().to_string();
    state.catalog = Some(LoadedCatalog {
        catalog: Arc::new(catalog),
        loaded_at: loaded_at.clone(),
    });
    ok(
        &req.id,
        json!({
            "counts": counts,
            "revision": revision,
            "loadedAt": loaded_at,
            "reset": reset,
        }),
    )
}

fn handle_catalog_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    match &state.catalog {
        Some(loaded) => ok(
            &req.id,
            json!({
                "loaded": true,
                "counts": loaded.catalog.counts_json(),
                "revision": loaded.catalog.revision(),
                "loadedAt": loaded.loaded_at,
            }),
        ),
        None => ok(&req.id, json!({ "loaded": false })),
    }
}

fn handle_catalog_records(state: &mut AppState, req: &Request) -> serde_json::Value {
    let code = match required_str(req, "kind") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(kind) = RecordKind::parse(&code) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown record kind {}", code),
            Some(json!({ "kinds": RecordKind::ALL.map(RecordKind::code) })),
        );
    };
    let catalog = match loaded_catalog(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "kind": kind.code(),
            "revision": catalog.revision(),
            "records": catalog.records_json(kind),
        }),
    )
}

fn handle_taxonomy_get(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, taxonomy_json())
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.load" => Some(handle_catalog_load(state, req)),
        "catalog.status" => Some(handle_catalog_status(state, req)),
        "catalog.records" => Some(handle_catalog_records(state, req)),
        "taxonomy.get" => Some(handle_taxonomy_get(state, req)),
        _ => None,
    }
}
