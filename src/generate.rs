use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation failed: {0}")]
    Failed(String),
    #[error("generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("generation backend unreachable: {0}")]
    Transport(String),
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Failed(_) => "generation_failed",
            GenerationError::Timeout(_) => "generation_timeout",
            GenerationError::Transport(_) => "generation_failed",
        }
    }
}

/// The text-generation boundary: one prompt in, one text out.
pub trait GenerationBackend: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Maps a proxy response to the generated text. Success carries `reply`
/// (older deployments answer `text`); failure carries `error`.
pub fn interpret_response(status: u16, body: &str) -> Result<String, GenerationError> {
    let parsed: Option<GenerateResponse> = serde_json::from_str(body).ok();
    let ok = (200..300).contains(&status);
    match parsed {
        Some(resp) if ok => resp
            .reply
            .or(resp.text)
            .ok_or_else(|| GenerationError::Failed("response has no reply".to_string())),
        Some(resp) => Err(GenerationError::Failed(
            resp.error.unwrap_or_else(|| format!("HTTP {}", status)),
        )),
        None if ok => Err(GenerationError::Failed("response is not JSON".to_string())),
        None => Err(GenerationError::Failed(format!("HTTP {}", status))),
    }
}

pub struct HttpBackend {
    client: reqwest::blocking::Client,
    url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }
}

impl GenerationBackend for HttpBackend {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&GenerateRequest { prompt })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout)
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout)
            } else {
                GenerationError::Transport(e.to_string())
            }
        })?;
        interpret_response(status, &body)
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    pub control: String,
    pub request_id: String,
    cancelled: Arc<AtomicBool>,
}

impl Ticket {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("control `{control}` already has request {request_id} in flight")]
pub struct Busy {
    pub control: String,
    pub request_id: String,
}

/// One outstanding generation request per control. Requests for different
/// controls are independent.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<Mutex<HashMap<String, Ticket>>>,
}

impl InFlight {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Ticket>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn begin(&self, control: &str) -> Result<Ticket, Busy> {
        let mut map = self.lock();
        if let Some(t) = map.get(control) {
            return Err(Busy {
                control: control.to_string(),
                request_id: t.request_id.clone(),
            });
        }
        let ticket = Ticket {
            control: control.to_string(),
            request_id: Uuid::new_v4().to_string(),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        map.insert(control.to_string(), ticket.clone());
        Ok(ticket)
    }

    /// Cancels the control's outstanding request, if any. Its result will be dropped.
    pub fn cancel(&self, control: &str) -> Option<String> {
        let t = self.lock().remove(control)?;
        t.cancelled.store(true, Ordering::SeqCst);
        Some(t.request_id)
    }

    /// Releases the control. Returns false when the ticket was cancelled or
    /// superseded, meaning the result must be discarded.
    pub fn finish(&self, ticket: &Ticket) -> bool {
        let mut map = self.lock();
        let current = map
            .get(&ticket.control)
            .map(|t| t.request_id == ticket.request_id)
            .unwrap_or(false);
        if current {
            map.remove(&ticket.control);
        }
        current && !ticket.is_cancelled()
    }

    pub fn is_busy(&self, control: &str) -> bool {
        self.lock().contains_key(control)
    }

    pub fn controls(&self) -> Vec<String> {
        let mut out: Vec<String> = self.lock().keys().cloned().collect();
        out.sort();
        out
    }
}

/// Runs `ticket`'s request on a worker thread and hands the outcome to
/// `deliver` unless the ticket was cancelled in the meantime.
pub fn spawn_request<F>(
    backend: Arc<dyn GenerationBackend>,
    in_flight: InFlight,
    ticket: Ticket,
    prompt: String,
    deliver: F,
) -> std::thread::JoinHandle<()>
where
    F: FnOnce(&Ticket, Result<String, GenerationError>) + Send + 'static,
{
    std::thread::spawn(move || {
        if ticket.is_cancelled() {
            in_flight.finish(&ticket);
            tracing::debug!(control = %ticket.control, request_id = %ticket.request_id, "cancelled before sending");
            return;
        }
        let result = backend.generate(&prompt);
        if in_flight.finish(&ticket) {
            if let Err(e) = &result {
                tracing::warn!(control = %ticket.control, request_id = %ticket.request_id, error = %e, "generation failed");
            }
            deliver(&ticket, result);
        } else {
            tracing::debug!(control = %ticket.control, request_id = %ticket.request_id, "discarding stale generation result");
        }
    })
}
