use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source unavailable: {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },
    #[error("malformed source: {location}: {reason}")]
    MalformedSource { location: String, reason: String },
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::SourceUnavailable { .. } => "source_unavailable",
            LoadError::MalformedSource { .. } => "malformed_source",
        }
    }
}

/// Where a delimited-text resource lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
}

impl SourceLocation {
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        let lower = t.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceLocation::Url(t.to_string())
        } else if let Some(rest) = t.strip_prefix("file://") {
            SourceLocation::File(PathBuf::from(rest))
        } else {
            SourceLocation::File(PathBuf::from(t))
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Url(u) => write!(f, "{}", u),
            SourceLocation::File(p) => write!(f, "{}", p.to_string_lossy()),
        }
    }
}

/// Raw byte access to a source. Decoding is left to [`load`], so a bad
/// encoding is classified the same way for every transport.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>, LoadError>;
}

/// Fetches URLs over HTTP and reads local paths from disk.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>, LoadError> {
        let unavailable = |reason: String| LoadError::SourceUnavailable {
            location: location.to_string(),
            reason,
        };
        match location {
            SourceLocation::Url(url) => {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .map_err(|e| unavailable(e.to_string()))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(unavailable(format!("HTTP {}", status.as_u16())));
                }
                resp.bytes()
                    .map(|b| b.to_vec())
                    .map_err(|e| unavailable(e.to_string()))
            }
            SourceLocation::File(path) => std::fs::read(path).map_err(|e| unavailable(e.to_string())),
        }
    }
}

/// One data row, keyed by the (trimmed) header it sits under, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(line: usize, cells: Vec<(String, String)>) -> Self {
        Self { line, cells }
    }

    #[cfg(test)]
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn rows(&self) -> impl Iterator<Item = &RawRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Structural parse only: the first record is the header row; cells are left
/// as-is apart from header trimming. All-blank rows are dropped.
pub fn parse_table(location: &str, text: &str) -> Result<RawTable, LoadError> {
    let malformed = |reason: String| LoadError::MalformedSource {
        location: location.to_string(),
        reason,
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header_record = match records.next() {
        Some(Ok(r)) => r,
        Some(Err(e)) => return Err(malformed(e.to_string())),
        None => return Err(malformed("missing header row".to_string())),
    };
    let headers: Vec<String> = header_record.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(malformed("header row has no column names".to_string()));
    }

    let mut rows = Vec::new();
    for rec in records {
        let rec = rec.map_err(|e| malformed(e.to_string()))?;
        if rec.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let line = rec.position().map(|p| p.line() as usize).unwrap_or(0);
        let cells = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h.clone(), rec.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(RawRow::new(line, cells));
    }
    Ok(RawTable { headers, rows })
}

pub fn load(fetcher: &dyn Fetcher, location: &SourceLocation) -> Result<RawTable, LoadError> {
    let bytes = fetcher.fetch(location)?;
    let text = String::from_utf8(bytes).map_err(|e| LoadError::MalformedSource {
        location: location.to_string(),
        reason: format!("not valid UTF-8: {}", e.utf8_error()),
    })?;
    parse_table(&location.to_string(), &text)
}
