mod test_support;

use serde_json::json;
use std::time::Duration;
use test_support::{
    error_code, next_event, request, request_collecting, request_ok, spawn_sidecar,
    spawn_sidecar_with_env, GenerateStub,
};

fn await_event(
    events: &mut Vec<serde_json::Value>,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
) -> serde_json::Value {
    if events.is_empty() {
        next_event(reader)
    } else {
        events.remove(0)
    }
}

#[test]
fn generated_text_arrives_as_event() {
    let stub = GenerateStub::start(200, r#"{"reply":"1. Mix primaries\n2. Paint a wheel"}"#, Duration::ZERO);
    let url = stub.url();
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with_env(&[("ARTPLANNER_GENERATE_URL", url.as_str())]);

    let mut events = Vec::new();
    let started = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "1",
        "generate.start",
        json!({ "control": "objectives", "slot": "lessonObjectives" }),
    );
    assert_eq!(started["ok"], json!(true), "{}", started);
    let request_id = started["result"]["requestId"].as_str().expect("requestId").to_string();

    let event = await_event(&mut events, &mut reader);
    assert_eq!(event["event"], json!("generate.finished"));
    assert_eq!(event["control"], json!("objectives"));
    assert_eq!(event["requestId"], json!(request_id));
    assert_eq!(event["ok"], json!(true));
    assert_eq!(event["text"], json!("1. Mix primaries\n2. Paint a wheel"));

    let status = request_ok(&mut stdin, &mut reader, "2", "generate.status", json!({}));
    assert_eq!(status["inFlight"], json!([]));

    let bodies = stub.received_bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0]["prompt"].as_str().is_some_and(|p| !p.is_empty()));

    let _ = child.kill();
}

#[test]
fn upstream_error_is_reported_on_event() {
    let stub = GenerateStub::start(500, r#"{"error":"quota exceeded"}"#, Duration::ZERO);
    let url = stub.url();
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with_env(&[("ARTPLANNER_GENERATE_URL", url.as_str())]);

    let mut events = Vec::new();
    let started = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "1",
        "generate.start",
        json!({ "control": "hook", "slot": "lessonHook" }),
    );
    assert_eq!(started["ok"], json!(true), "{}", started);

    let event = await_event(&mut events, &mut reader);
    assert_eq!(event["ok"], json!(false));
    assert_eq!(event["error"]["code"], json!("generation_failed"));
    assert!(event["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("quota exceeded"));

    // The control is free again after a failure.
    let status = request_ok(&mut stdin, &mut reader, "2", "generate.status", json!({}));
    assert_eq!(status["inFlight"], json!([]));

    let _ = child.kill();
}

#[test]
fn second_start_on_busy_control_is_rejected() {
    let stub = GenerateStub::start(200, r#"{"reply":"done"}"#, Duration::from_millis(600));
    let url = stub.url();
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with_env(&[("ARTPLANNER_GENERATE_URL", url.as_str())]);

    let mut events = Vec::new();
    let first = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "1",
        "generate.start",
        json!({ "control": "vocab", "slot": "vocabularyTerms" }),
    );
    let first_id = first["result"]["requestId"].as_str().expect("requestId").to_string();

    let second = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "2",
        "generate.start",
        json!({ "control": "vocab", "slot": "vocabularyTerms" }),
    );
    assert_eq!(error_code(&second), Some("busy"));
    assert_eq!(second["error"]["details"]["requestId"], json!(first_id));

    let status = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "3",
        "generate.status",
        json!({ "control": "vocab" }),
    );
    if events.is_empty() {
        assert_eq!(status["result"]["busy"], json!(true));
        assert_eq!(status["result"]["inFlight"], json!(["vocab"]));
    }

    let event = await_event(&mut events, &mut reader);
    assert_eq!(event["requestId"], json!(first_id));
    assert_eq!(event["text"], json!("done"));

    let _ = child.kill();
}

#[test]
fn cancelled_request_never_delivers() {
    let stub = GenerateStub::start(200, r#"{"reply":"late"}"#, Duration::from_millis(500));
    let url = stub.url();
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with_env(&[("ARTPLANNER_GENERATE_URL", url.as_str())]);

    let mut events = Vec::new();
    let first = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "1",
        "generate.start",
        json!({ "control": "overview", "slot": "lessonOverview" }),
    );
    let first_id = first["result"]["requestId"].as_str().expect("requestId").to_string();

    let cancelled = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "2",
        "controls.unmount",
        json!({ "control": "overview" }),
    );
    assert_eq!(cancelled["result"]["cancelledRequestId"], json!(first_id));

    let second = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "3",
        "generate.start",
        json!({ "control": "overview", "slot": "lessonOverview" }),
    );
    let second_id = second["result"]["requestId"].as_str().expect("requestId").to_string();
    assert_ne!(first_id, second_id);

    // Both requests reach the stub; only the live one may surface.
    let event = await_event(&mut events, &mut reader);
    assert_eq!(event["requestId"], json!(second_id));
    assert!(events.is_empty());

    let _ = child.kill();
}

#[test]
fn cancel_without_request_is_a_noop() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let out = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "generate.cancel",
        json!({ "control": "rubric" }),
    );
    assert_eq!(out["cancelledRequestId"], json!(null));
    let _ = child.kill();
}

#[test]
fn unknown_slot_does_not_reach_backend() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "generate.start",
        json!({ "control": "mystery", "slot": "unknownSlot" }),
    );
    assert_eq!(error_code(&resp), Some("no_prompt"));
    assert_eq!(resp["error"]["message"], json!("No AI prompt is available for this field."));

    let status = request_ok(&mut stdin, &mut reader, "2", "generate.status", json!({}));
    assert_eq!(status["inFlight"], json!([]));

    let _ = child.kill();
}

#[test]
fn slow_backend_times_out() {
    let stub = GenerateStub::start(200, r#"{"reply":"too late"}"#, Duration::from_secs(3));
    let url = stub.url();
    let (mut child, mut stdin, mut reader) = spawn_sidecar_with_env(&[
        ("ARTPLANNER_GENERATE_URL", url.as_str()),
        ("ARTPLANNER_GENERATE_TIMEOUT_SECS", "1"),
    ]);

    let mut events = Vec::new();
    let started = request_collecting(
        &mut stdin,
        &mut reader,
        &mut events,
        "1",
        "generate.start",
        json!({ "control": "history", "slot": "artHistoryConnections" }),
    );
    assert_eq!(started["ok"], json!(true), "{}", started);

    let event = await_event(&mut events, &mut reader);
    assert_eq!(event["ok"], json!(false));
    assert_eq!(event["error"]["code"], json!("generation_timeout"));

    let _ = child.kill();
}
