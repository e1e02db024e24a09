use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::taxonomy::{
    grade_band, ArtisticProcess, AssessmentType, Discipline, GradeBand, LESSON_OBJECTIVE_PRESETS,
    WRITE_MY_OWN, WRITE_MY_OWN_LABEL,
};

pub const DEFAULT_CLASS_SIZE: u32 = 25;
pub const MIN_CLASS_SIZE: u32 = 1;
pub const MAX_CLASS_SIZE: u32 = 60;
pub const NO_MATCHING_STANDARDS: &str = "No matching standards for this selection";

pub fn clamp_class_size(n: i64) -> u32 {
    n.clamp(MIN_CLASS_SIZE as i64, MAX_CLASS_SIZE as i64) as u32
}

/// Current form values. Classification fields hold taxonomy codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub grade: String,
    pub discipline: String,
    pub process: String,
    pub assessment_type: String,
    pub lesson_title: String,
    pub big_idea: String,
    pub objectives_text: String,
    pub overview_text: String,
    pub class_size: u32,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            grade: "pre_k".to_string(),
            discipline: Discipline::VisualArts.code().to_string(),
            process: ArtisticProcess::Creating.code().to_string(),
            assessment_type: AssessmentType::Formative.code().to_string(),
            lesson_title: String::new(),
            big_idea: String::new(),
            objectives_text: String::new(),
            overview_text: String::new(),
            class_size: DEFAULT_CLASS_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionField {
    Grade,
    Discipline,
    Process,
    AssessmentType,
    LessonTitle,
    BigIdea,
    ObjectivesText,
    OverviewText,
    ClassSize,
}

/// The dependent controls the engine computes options for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Selector {
    Standards,
    Questions,
    Videos,
    Activities,
    Accommodations,
    LessonObjectives,
}

impl Selector {
    pub const ALL: [Selector; 6] = [
        Selector::Standards,
        Selector::Questions,
        Selector::Videos,
        Selector::Activities,
        Selector::Accommodations,
        Selector::LessonObjectives,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standards" => Some(Selector::Standards),
            "questions" => Some(Selector::Questions),
            "videos" => Some(Selector::Videos),
            "activities" => Some(Selector::Activities),
            "accommodations" => Some(Selector::Accommodations),
            "lessonObjectives" => Some(Selector::LessonObjectives),
            _ => None,
        }
    }
}

/// Which dependent selectors a field change invalidates.
pub fn dependents(field: SelectionField) -> &'static [Selector] {
    match field {
        SelectionField::Grade => &[Selector::Standards, Selector::Videos],
        SelectionField::Discipline => &[Selector::Standards],
        SelectionField::Process => &[Selector::Standards, Selector::Questions],
        SelectionField::AssessmentType => &[Selector::Activities],
        _ => &[],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selectable: bool,
}

impl SelectOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selectable: true,
        }
    }

    fn placeholder(label: &str) -> Self {
        Self {
            value: String::new(),
            label: label.to_string(),
            selectable: false,
        }
    }

    fn write_my_own() -> Self {
        Self::new(WRITE_MY_OWN, WRITE_MY_OWN_LABEL)
    }
}

pub type OptionSets = BTreeMap<Selector, Vec<SelectOption>>;

pub fn compute_selector(catalog: &Catalog, state: &SelectionState, selector: Selector) -> Vec<SelectOption> {
    match selector {
        Selector::Standards => {
            let matches = match (
                Discipline::parse(&state.discipline),
                ArtisticProcess::parse(&state.process),
            ) {
                (Some(d), Some(p)) => catalog.standards_matching(d, p, &state.grade),
                _ => Vec::new(),
            };
            let mut out: Vec<SelectOption> = if matches.is_empty() {
                vec![SelectOption::placeholder(NO_MATCHING_STANDARDS)]
            } else {
                matches
                    .iter()
                    .map(|s| SelectOption::new(s.key(), s.label()))
                    .collect()
            };
            out.push(SelectOption::write_my_own());
            out
        }
        Selector::Questions => {
            let mut out: Vec<SelectOption> = catalog
                .questions_matching(&state.process)
                .iter()
                .map(|q| SelectOption::new(q.question.as_str(), q.question.as_str()))
                .collect();
            out.push(SelectOption::write_my_own());
            out
        }
        Selector::Videos => {
            let band = grade_band(&state.grade).map(GradeBand::code).unwrap_or("");
            catalog
                .videos_matching(band)
                .iter()
                .map(|v| {
                    SelectOption::new(v.link.as_str(), format!("• {}: {}", v.channel_name, v.link))
                })
                .collect()
        }
        Selector::Activities => {
            let activities = AssessmentType::parse(&state.assessment_type)
                .map(AssessmentType::activities)
                .unwrap_or(&[]);
            let mut out: Vec<SelectOption> = activities
                .iter()
                .map(|a| SelectOption::new(*a, *a))
                .collect();
            out.push(SelectOption::write_my_own());
            out
        }
        Selector::Accommodations => {
            let mut out: Vec<SelectOption> = catalog
                .accommodation_texts()
                .into_iter()
                .map(|t| SelectOption::new(t, t))
                .collect();
            out.push(SelectOption::write_my_own());
            out
        }
        Selector::LessonObjectives => {
            let mut out: Vec<SelectOption> = LESSON_OBJECTIVE_PRESETS
                .iter()
                .map(|o| SelectOption::new(*o, *o))
                .collect();
            out.push(SelectOption::write_my_own());
            out
        }
    }
}

/// Full option sets. A pure function of the catalog and the selection.
pub fn compute_all(catalog: &Catalog, state: &SelectionState) -> OptionSets {
    Selector::ALL
        .into_iter()
        .map(|sel| (sel, compute_selector(catalog, state, sel)))
        .collect()
}

/// Video suggestions as the bullet list the form shows.
pub fn video_text(options: &[SelectOption]) -> String {
    options
        .iter()
        .map(|o| o.label.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The value chosen in each dependent control, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentChoices {
    pub standard: Option<String>,
    pub question: Option<String>,
    pub activity: Option<String>,
    pub accommodation: Option<String>,
    pub lesson_objective: Option<String>,
}

impl DependentChoices {
    fn slot_mut(&mut self, selector: Selector) -> Option<&mut Option<String>> {
        match selector {
            Selector::Standards => Some(&mut self.standard),
            Selector::Questions => Some(&mut self.question),
            Selector::Activities => Some(&mut self.activity),
            Selector::Accommodations => Some(&mut self.accommodation),
            Selector::LessonObjectives => Some(&mut self.lesson_objective),
            Selector::Videos => None,
        }
    }

    /// Drops the choice for `selector` when it is no longer offered.
    /// Returns true when a reset happened.
    pub fn reconcile(&mut self, selector: Selector, options: &[SelectOption]) -> bool {
        let Some(slot) = self.slot_mut(selector) else {
            return false;
        };
        let still_valid = match slot.as_deref() {
            None => true,
            Some(v) => options.iter().any(|o| o.selectable && o.value == v),
        };
        if !still_valid {
            *slot = None;
        }
        !still_valid
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("{0:?} has no selectable value")]
    NotChoosable(Selector),
    #[error("`{value}` is not a current option for {selector:?}")]
    NotOffered { selector: Selector, value: String },
}

pub fn choose(
    catalog: &Catalog,
    state: &SelectionState,
    choices: &mut DependentChoices,
    selector: Selector,
    value: Option<String>,
) -> Result<(), ChoiceError> {
    let options = compute_selector(catalog, state, selector);
    let slot = choices
        .slot_mut(selector)
        .ok_or(ChoiceError::NotChoosable(selector))?;
    match value {
        None => *slot = None,
        Some(v) => {
            if !options.iter().any(|o| o.selectable && o.value == v) {
                return Err(ChoiceError::NotOffered { selector, value: v });
            }
            *slot = Some(v);
        }
    }
    Ok(())
}

/// A partial update from the form. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPatch {
    pub grade: Option<String>,
    pub discipline: Option<String>,
    pub process: Option<String>,
    pub assessment_type: Option<String>,
    pub lesson_title: Option<String>,
    pub big_idea: Option<String>,
    pub objectives_text: Option<String>,
    pub overview_text: Option<String>,
    pub class_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recomputed {
    pub changed: Vec<SelectionField>,
    pub options: OptionSets,
    pub reset: Vec<Selector>,
}

fn set_if_changed(
    target: &mut String,
    value: Option<String>,
    field: SelectionField,
    fold: bool,
    changed: &mut Vec<SelectionField>,
) {
    let Some(v) = value else {
        return;
    };
    let v = if fold {
        v.trim().to_ascii_lowercase()
    } else {
        v
    };
    if *target != v {
        *target = v;
        changed.push(field);
    }
}

/// Applies `patch`, recomputes only the selectors downstream of what actually
/// changed, and clears dependent choices that fell out of their option set.
pub fn apply_patch(
    catalog: &Catalog,
    state: &mut SelectionState,
    choices: &mut DependentChoices,
    patch: SelectionPatch,
) -> Recomputed {
    let mut changed = Vec::new();
    set_if_changed(&mut state.grade, patch.grade, SelectionField::Grade, true, &mut changed);
    set_if_changed(
        &mut state.discipline,
        patch.discipline,
        SelectionField::Discipline,
        true,
        &mut changed,
    );
    set_if_changed(&mut state.process, patch.process, SelectionField::Process, true, &mut changed);
    set_if_changed(
        &mut state.assessment_type,
        patch.assessment_type,
        SelectionField::AssessmentType,
        true,
        &mut changed,
    );
    set_if_changed(
        &mut state.lesson_title,
        patch.lesson_title,
        SelectionField::LessonTitle,
        false,
        &mut changed,
    );
    set_if_changed(&mut state.big_idea, patch.big_idea, SelectionField::BigIdea, false, &mut changed);
    set_if_changed(
        &mut state.objectives_text,
        patch.objectives_text,
        SelectionField::ObjectivesText,
        false,
        &mut changed,
    );
    set_if_changed(
        &mut state.overview_text,
        patch.overview_text,
        SelectionField::OverviewText,
        false,
        &mut changed,
    );
    if let Some(n) = patch.class_size {
        let n = clamp_class_size(n);
        if state.class_size != n {
            state.class_size = n;
            changed.push(SelectionField::ClassSize);
        }
    }

    let mut affected: Vec<Selector> = changed.iter().flat_map(|f| dependents(*f).iter().copied()).collect();
    affected.sort();
    affected.dedup();

    let mut options = OptionSets::new();
    let mut reset = Vec::new();
    for sel in affected {
        let opts = compute_selector(catalog, state, sel);
        if choices.reconcile(sel, &opts) {
            reset.push(sel);
        }
        options.insert(sel, opts);
    }
    Recomputed {
        changed,
        options,
        reset,
    }
}
