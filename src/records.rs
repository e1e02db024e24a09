use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::tabular::RawRow;
use crate::taxonomy::{ArtisticProcess, Discipline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePolicy {
    Preserve,
    Lowercase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub case: CasePolicy,
    pub multi_value: bool,
}

const fn policy(case: CasePolicy, multi_value: bool) -> FieldPolicy {
    FieldPolicy { case, multi_value }
}

/// Per-column normalization. Columns not listed keep their case and stay single-valued.
pub const FIELD_POLICIES: [(&str, FieldPolicy); 10] = [
    ("grade_levels", policy(CasePolicy::Lowercase, true)),
    ("artistic_process", policy(CasePolicy::Lowercase, true)),
    ("discipline", policy(CasePolicy::Lowercase, false)),
    ("process", policy(CasePolicy::Lowercase, false)),
    ("text", policy(CasePolicy::Preserve, false)),
    ("question", policy(CasePolicy::Preserve, false)),
    ("accommodation_text", policy(CasePolicy::Preserve, false)),
    ("channel_name", policy(CasePolicy::Preserve, false)),
    ("link", policy(CasePolicy::Preserve, false)),
    ("anchor_std_code", policy(CasePolicy::Preserve, false)),
];

pub fn field_policy(key: &str) -> FieldPolicy {
    FIELD_POLICIES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, p)| *p)
        .unwrap_or(policy(CasePolicy::Preserve, false))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Single(String),
    Multi(BTreeSet<String>),
}

/// A row after trimming and case/shape policy, keyed by the lowercased column name.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub line: usize,
    known: BTreeMap<String, Cell>,
    passthrough: BTreeMap<String, String>,
}

impl NormalizedRow {
    pub fn from_raw(raw: &RawRow) -> Self {
        let mut known = BTreeMap::new();
        let mut passthrough = BTreeMap::new();
        for (header, value) in raw.cells() {
            let key = header.trim().to_ascii_lowercase();
            let value = value.trim();
            let is_known = FIELD_POLICIES.iter().any(|(k, _)| *k == key)
                || matches!(key.as_str(), "code" | "id");
            if !is_known {
                passthrough.insert(header.trim().to_string(), value.to_string());
                continue;
            }
            let p = field_policy(&key);
            let fold = |s: &str| match p.case {
                CasePolicy::Lowercase => s.to_lowercase(),
                CasePolicy::Preserve => s.to_string(),
            };
            let cell = if p.multi_value {
                Cell::Multi(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(fold)
                        .collect(),
                )
            } else {
                Cell::Single(fold(value))
            };
            known.entry(key).or_insert(cell);
        }
        Self {
            line: raw.line,
            known,
            passthrough,
        }
    }

    fn single(&self, key: &str) -> Option<&str> {
        match self.known.get(key) {
            Some(Cell::Single(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    fn required(&self, key: &'static str) -> Result<String, RowRejection> {
        self.single(key)
            .map(str::to_string)
            .ok_or(RowRejection::MissingField(key))
    }

    fn set(&self, key: &str) -> BTreeSet<String> {
        match self.known.get(key) {
            Some(Cell::Multi(s)) => s.clone(),
            _ => BTreeSet::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowRejection {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("empty value set in `{0}`")]
    EmptySet(&'static str),
    #[error("unknown discipline `{0}`")]
    UnknownDiscipline(String),
    #[error("unknown artistic process `{0}`")]
    UnknownProcess(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Standards,
    Questions,
    Accommodations,
    Videos,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Standards,
        RecordKind::Questions,
        RecordKind::Accommodations,
        RecordKind::Videos,
    ];

    pub fn code(self) -> &'static str {
        match self {
            RecordKind::Standards => "standards",
            RecordKind::Questions => "questions",
            RecordKind::Accommodations => "accommodations",
            RecordKind::Videos => "videos",
        }
    }

    pub fn parse(code: &str) -> Option<RecordKind> {
        RecordKind::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standard {
    pub code: Option<String>,
    pub discipline: Discipline,
    pub process: ArtisticProcess,
    pub grade_levels: BTreeSet<String>,
    pub text: String,
    pub extra: BTreeMap<String, String>,
}

impl Standard {
    /// Stable option key: the code when the sheet has one, else the text.
    pub fn key(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.text)
    }

    pub fn label(&self) -> String {
        match &self.code {
            Some(code) => format!("{} — {}", code.to_uppercase(), self.text),
            None => self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssentialQuestion {
    pub question: String,
    pub artistic_process: BTreeSet<String>,
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    pub accommodation_text: String,
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    pub channel_name: String,
    pub link: String,
    pub grade_levels: BTreeSet<String>,
    pub extra: BTreeMap<String, String>,
}

pub trait FromRow: Sized {
    const KIND: RecordKind;

    fn from_row(row: &NormalizedRow) -> Result<Self, RowRejection>;
}

impl FromRow for Standard {
    const KIND: RecordKind = RecordKind::Standards;

    fn from_row(row: &NormalizedRow) -> Result<Self, RowRejection> {
        let text = row.required("text")?;
        let discipline_raw = row.required("discipline")?;
        let discipline = Discipline::parse(&discipline_raw)
            .ok_or(RowRejection::UnknownDiscipline(discipline_raw))?;
        let process_raw = row.required("process")?;
        let process =
            ArtisticProcess::parse(&process_raw).ok_or(RowRejection::UnknownProcess(process_raw))?;
        let grade_levels = row.set("grade_levels");
        if grade_levels.is_empty() {
            return Err(RowRejection::EmptySet("grade_levels"));
        }
        let code = ["anchor_std_code", "code", "id"]
            .iter()
            .find_map(|k| row.single(k))
            .map(str::to_string);
        Ok(Standard {
            code,
            discipline,
            process,
            grade_levels,
            text,
            extra: row.passthrough.clone(),
        })
    }
}

impl FromRow for EssentialQuestion {
    const KIND: RecordKind = RecordKind::Questions;

    fn from_row(row: &NormalizedRow) -> Result<Self, RowRejection> {
        let question = row.required("question")?;
        let artistic_process = row.set("artistic_process");
        if artistic_process.is_empty() {
            return Err(RowRejection::EmptySet("artistic_process"));
        }
        Ok(EssentialQuestion {
            question,
            artistic_process,
            extra: row.passthrough.clone(),
        })
    }
}

impl FromRow for Accommodation {
    const KIND: RecordKind = RecordKind::Accommodations;

    fn from_row(row: &NormalizedRow) -> Result<Self, RowRejection> {
        Ok(Accommodation {
            accommodation_text: row.required("accommodation_text")?,
            extra: row.passthrough.clone(),
        })
    }
}

impl FromRow for VideoResource {
    const KIND: RecordKind = RecordKind::Videos;

    fn from_row(row: &NormalizedRow) -> Result<Self, RowRejection> {
        Ok(VideoResource {
            channel_name: row.required("channel_name")?,
            link: row.required("link")?,
            grade_levels: row.set("grade_levels"),
            extra: row.passthrough.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Normalized<R> {
    pub records: Vec<R>,
    pub dropped: usize,
}

/// Typed records in source order. Rows that fail validation are logged and skipped.
pub fn normalize<'a, R, I>(rows: I) -> Normalized<R>
where
    R: FromRow,
    I: IntoIterator<Item = &'a RawRow>,
{
    let mut records = Vec::new();
    let mut dropped = 0usize;
    for raw in rows {
        let row = NormalizedRow::from_raw(raw);
        match R::from_row(&row) {
            Ok(r) => records.push(r),
            Err(reason) => {
                dropped += 1;
                let kind = R::KIND;
                debug!(%kind, line = row.line, %reason, "dropping row");
            }
        }
    }
    Normalized { records, dropped }
}
