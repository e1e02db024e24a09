#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/.netlify/functions/generateAiContent";

pub const STANDARDS_CSV: &str = "\
anchor_std_code,discipline,process,grade_levels,text
va:cr1.1.3a,Visual_Arts,Creating,\"3rd, 4th\",Elaborate on an imaginative idea.
va:cr1.1.kb,visual_arts,creating,kindergarten,Engage in exploration and imaginative play with materials.
va:re7.1.3a,visual_arts,responding,3rd,Speculate about processes an artist uses to create a work of art.
ma:cr1.1.3,media_arts,creating,\"3rd,4th,5th\",Develop multiple ideas for media artworks using a variety of tools.
va:cr2.1.8a,visual_arts,creating,8th,
";

pub const QUESTIONS_CSV: &str = "\
question,artistic_process
What conditions and places most enhance creative thinking?,\"creating, connecting\"
How does knowing the contexts of art help us understand a work?,Responding
";

pub const ACCOMMODATIONS_CSV: &str = "\
accommodation_text
Provide pre-cut shapes for students with fine motor needs
Offer extended time for studio work
";

pub const VIDEOS_CSV: &str = "\
channel_name,link,grade_levels
Art for Kids Hub,https://www.youtube.com/@ArtforKidsHub,elementary
The Art Assignment,https://www.youtube.com/@theartassignment,\"middle_school, high_school\"
Smarthistory,https://www.youtube.com/@smarthistory,all_levels
";

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

/// Writes the four reference CSVs and returns a `sources` object for catalog.load.
pub fn write_fixtures(dir: &Path) -> serde_json::Value {
    let files = [
        ("standards", STANDARDS_CSV),
        ("questions", QUESTIONS_CSV),
        ("accommodations", ACCOMMODATIONS_CSV),
        ("videos", VIDEOS_CSV),
    ];
    let mut sources = serde_json::Map::new();
    for (name, body) in files {
        let path = dir.join(format!("{}.csv", name));
        std::fs::write(&path, body).expect("write fixture");
        sources.insert(name.to_string(), json!(path.to_string_lossy()));
    }
    serde_json::Value::Object(sources)
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_sidecar_with_env(&[])
}

pub fn spawn_sidecar_with_env(envs: &[(&str, &str)]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_artplannerd");
    let mut cmd = Command::new(exe);
    cmd.env_remove("ARTPLANNER_CONFIG")
        .env("ARTPLANNER_GENERATE_URL", "http://127.0.0.1:9/unused")
        .env("ARTPLANNER_LOG", "warn");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn artplannerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_value(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read line");
    assert!(!line.trim().is_empty(), "sidecar closed stdout");
    serde_json::from_str(line.trim()).expect("parse json line")
}

/// Sends a request and returns its response. Event lines that arrive first
/// are pushed onto `events`.
pub fn request_collecting(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    events: &mut Vec<serde_json::Value>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    loop {
        let value = read_value(reader);
        if value.get("event").is_some() {
            events.push(value);
            continue;
        }
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
        return value;
    }
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let mut events = Vec::new();
    request_collecting(stdin, reader, &mut events, id, method, params)
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_default()
}

pub fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

/// Blocks until the next event line, skipping nothing else.
pub fn next_event(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let value = read_value(reader);
    assert!(value.get("event").is_some(), "expected event, got {}", value);
    value
}

/// Mock generation proxy. Every POST is answered with `status` and `body`
/// after `delay`. Keep the value alive for as long as the sidecar uses it.
pub struct GenerateStub {
    server: MockServer,
    runtime: Runtime,
}

impl GenerateStub {
    pub fn start(status: u16, body: &str, delay: Duration) -> Self {
        let runtime = Runtime::new().expect("tokio runtime");
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .respond_with(
                    ResponseTemplate::new(status)
                        .set_body_raw(body.to_owned(), "application/json")
                        .set_delay(delay),
                )
                .mount(&server)
                .await;
            server
        });
        Self { server, runtime }
    }

    /// Value for `ARTPLANNER_GENERATE_URL`.
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), GENERATE_PATH)
    }

    /// JSON bodies of every request the stub has received so far.
    pub fn received_bodies(&self) -> Vec<serde_json::Value> {
        let requests = self
            .runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default();
        requests
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("request body is json"))
            .collect()
    }
}
