use std::sync::{mpsc, Arc};
use std::thread;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::records::{
    normalize, Accommodation, EssentialQuestion, RecordKind, Standard, VideoResource,
};
use crate::tabular::{load, Fetcher, LoadError, RawTable, SourceLocation};
use crate::taxonomy::{ArtisticProcess, Discipline, ALL_LEVELS};

/// Result cap for video suggestions, in catalog order.
pub const VIDEO_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog load failed ({kind}): {source}")]
    LoadFailed {
        kind: RecordKind,
        #[source]
        source: LoadError,
    },
}

#[derive(Debug, Clone)]
pub struct CatalogSources {
    pub standards: SourceLocation,
    pub questions: SourceLocation,
    pub accommodations: SourceLocation,
    pub videos: SourceLocation,
}

impl CatalogSources {
    pub fn get(&self, kind: RecordKind) -> &SourceLocation {
        match kind {
            RecordKind::Standards => &self.standards,
            RecordKind::Questions => &self.questions,
            RecordKind::Accommodations => &self.accommodations,
            RecordKind::Videos => &self.videos,
        }
    }
}

/// The four fetched tables and a content hash over all of them.
struct FetchedTables {
    standards: RawTable,
    questions: RawTable,
    accommodations: RawTable,
    videos: RawTable,
    revision: String,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    standards: Vec<Standard>,
    questions: Vec<EssentialQuestion>,
    accommodations: Vec<Accommodation>,
    videos: Vec<VideoResource>,
    revision: String,
}

impl Catalog {
    #[cfg(test)]
    pub fn from_parts(
        standards: Vec<Standard>,
        questions: Vec<EssentialQuestion>,
        accommodations: Vec<Accommodation>,
        videos: Vec<VideoResource>,
    ) -> Self {
        Self {
            standards,
            questions,
            accommodations,
            videos,
            revision: String::new(),
        }
    }

    /// Fetches all four sources concurrently. The first failure fails the
    /// whole load at once; nothing partial is returned.
    pub fn load(fetcher: Arc<dyn Fetcher>, sources: &CatalogSources) -> Result<Catalog, CatalogError> {
        let tables = fetch_all(fetcher, sources)?;
        let standards = normalize::<Standard, _>(tables.standards.rows());
        let questions = normalize::<EssentialQuestion, _>(tables.questions.rows());
        let accommodations = normalize::<Accommodation, _>(tables.accommodations.rows());
        let videos = normalize::<VideoResource, _>(tables.videos.rows());
        info!(
            standards = standards.records.len(),
            questions = questions.records.len(),
            accommodations = accommodations.records.len(),
            videos = videos.records.len(),
            dropped = standards.dropped + questions.dropped + accommodations.dropped + videos.dropped,
            revision = %tables.revision,
            "catalog loaded"
        );
        Ok(Catalog {
            standards: standards.records,
            questions: questions.records,
            accommodations: accommodations.records,
            videos: videos.records,
            revision: tables.revision,
        })
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    #[cfg(test)]
    pub fn standards(&self) -> &[Standard] {
        &self.standards
    }

    pub fn standards_matching(
        &self,
        discipline: Discipline,
        process: ArtisticProcess,
        grade: &str,
    ) -> Vec<&Standard> {
        self.standards
            .iter()
            .filter(|s| {
                s.discipline == discipline && s.process == process && s.grade_levels.contains(grade)
            })
            .collect()
    }

    pub fn questions_matching(&self, process: &str) -> Vec<&EssentialQuestion> {
        self.questions
            .iter()
            .filter(|q| q.artistic_process.contains(process))
            .collect()
    }

    /// `band` may be empty (no band), in which case only wildcard videos match.
    pub fn videos_matching(&self, band: &str) -> Vec<&VideoResource> {
        self.videos
            .iter()
            .filter(|v| {
                (!band.is_empty() && v.grade_levels.contains(band))
                    || v.grade_levels.contains(ALL_LEVELS)
            })
            .take(VIDEO_LIMIT)
            .collect()
    }

    pub fn accommodation_texts(&self) -> Vec<&str> {
        self.accommodations
            .iter()
            .map(|a| a.accommodation_text.as_str())
            .collect()
    }

    /// Every approved channel name, used to constrain generated video suggestions.
    pub fn channel_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for v in &self.videos {
            if !out.contains(&v.channel_name.as_str()) {
                out.push(v.channel_name.as_str());
            }
        }
        out
    }

    /// Every loaded record of one kind, pass-through columns included.
    pub fn records_json(&self, kind: RecordKind) -> Value {
        match kind {
            RecordKind::Standards => json!(self.standards),
            RecordKind::Questions => json!(self.questions),
            RecordKind::Accommodations => json!(self.accommodations),
            RecordKind::Videos => json!(self.videos),
        }
    }

    pub fn counts_json(&self) -> Value {
        json!({
            "standards": self.standards.len(),
            "questions": self.questions.len(),
            "accommodations": self.accommodations.len(),
            "videos": self.videos.len(),
        })
    }
}

fn fetch_all(fetcher: Arc<dyn Fetcher>, sources: &CatalogSources) -> Result<FetchedTables, CatalogError> {
    let (tx, rx) = mpsc::channel::<(RecordKind, Result<RawTable, LoadError>)>();

    // Detached: the first failure returns at once and later results go to a
    // closed channel.
    for kind in RecordKind::ALL {
        let tx = tx.clone();
        let fetcher = Arc::clone(&fetcher);
        let location = sources.get(kind).clone();
        thread::spawn(move || {
            debug!(%kind, %location, "fetching source");
            let result = load(fetcher.as_ref(), &location);
            if let Ok(table) = &result {
                if table.is_empty() {
                    warn!(%kind, %location, "source has no data rows");
                } else {
                    debug!(%kind, rows = table.len(), columns = table.headers.len(), "source fetched");
                }
            }
            let _ = tx.send((kind, result));
        });
    }
    drop(tx);

    let mut tables: [Option<RawTable>; 4] = Default::default();
    for (kind, result) in rx.iter() {
        let table = result.map_err(|source| CatalogError::LoadFailed { kind, source })?;
        tables[kind as usize] = Some(table);
    }

    let mut hasher = Sha256::new();
    for table in tables.iter().flatten() {
        digest_table(&mut hasher, table);
    }
    let revision = format!("{:x}", hasher.finalize());

    let [standards, questions, accommodations, videos] = tables;
    match (standards, questions, accommodations, videos) {
        (Some(standards), Some(questions), Some(accommodations), Some(videos)) => Ok(FetchedTables {
            standards,
            questions,
            accommodations,
            videos,
            revision,
        }),
        _ => unreachable!("every source thread reports exactly once"),
    }
}

/// Feeds the structural content of `table` into the revision hash. Unit and
/// record separators keep cell boundaries unambiguous.
fn digest_table(hasher: &mut Sha256, table: &RawTable) {
    for h in &table.headers {
        hasher.update(h.as_bytes());
        hasher.update([0x1f]);
    }
    hasher.update([0x1e]);
    for row in table.rows() {
        for (_, value) in row.cells() {
            hasher.update(value.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
    }
    hasher.update([0x1d]);
}
