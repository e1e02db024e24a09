use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::filter::{DependentChoices, SelectionState};
use crate::generate::{GenerationBackend, InFlight};
use crate::tabular::Fetcher;
use crate::worksheet::Worksheet;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Line-oriented JSON writer shared by replies and background events.
#[derive(Clone)]
pub struct Outbox {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Outbox {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn send(&self, value: &serde_json::Value) {
        let line = serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string());
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

pub struct LoadedCatalog {
    pub catalog: Arc<Catalog>,
    pub loaded_at: String,
}

pub struct AppState {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher>,
    pub backend: Arc<dyn GenerationBackend>,
    pub catalog: Option<LoadedCatalog>,
    pub selection: SelectionState,
    pub choices: DependentChoices,
    pub worksheet: Worksheet,
    pub in_flight: InFlight,
    pub outbox: Outbox,
}

impl AppState {
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        backend: Arc<dyn GenerationBackend>,
        outbox: Outbox,
    ) -> Self {
        let selection = SelectionState {
            class_size: crate::filter::clamp_class_size(config.default_class_size as i64),
            ..SelectionState::default()
        };
        Self {
            config,
            fetcher,
            backend,
            catalog: None,
            selection,
            choices: DependentChoices::default(),
            worksheet: Worksheet::default(),
            in_flight: InFlight::default(),
            outbox,
        }
    }
}
