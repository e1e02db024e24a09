use serde::Serialize;

use crate::filter::SelectionState;
use crate::taxonomy::{grade_label, STUDIO_HABITS};

/// Form elements that have a generation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    EssentialQuestions,
    LessonOverview,
    LessonObjectives,
    LessonHook,
    VocabularyTerms,
    MaterialsList,
    StudioHabitsChecklist,
    RubricCriteria,
    ArtHistoryConnections,
    YoutubeResources,
}

impl Slot {
    pub const ALL: [Slot; 10] = [
        Slot::EssentialQuestions,
        Slot::LessonOverview,
        Slot::LessonObjectives,
        Slot::LessonHook,
        Slot::VocabularyTerms,
        Slot::MaterialsList,
        Slot::StudioHabitsChecklist,
        Slot::RubricCriteria,
        Slot::ArtHistoryConnections,
        Slot::YoutubeResources,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Slot::EssentialQuestions => "essentialQuestions",
            Slot::LessonOverview => "lessonOverview",
            Slot::LessonObjectives => "lessonObjectives",
            Slot::LessonHook => "lessonHook",
            Slot::VocabularyTerms => "vocabularyTerms",
            Slot::MaterialsList => "materialsList",
            Slot::StudioHabitsChecklist => "studioHabitsChecklist",
            Slot::RubricCriteria => "rubricCriteria",
            Slot::ArtHistoryConnections => "artHistoryConnections",
            Slot::YoutubeResources => "youtubeResources",
        }
    }

    /// Case-insensitive on the slot name, so `LessonHook` and `lessonHook` both resolve.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|slot| slot.name().eq_ignore_ascii_case(s))
    }
}

/// Fields pulled out of the selection, with fallbacks for blanks.
struct Fields<'a> {
    title: &'a str,
    grade: &'a str,
    big_idea: &'a str,
    objectives: &'a str,
    overview: &'a str,
    class_size: u32,
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let t = value.trim();
    if t.is_empty() {
        fallback
    } else {
        t
    }
}

impl<'a> Fields<'a> {
    fn from_state(state: &'a SelectionState) -> Self {
        let grade = grade_label(&state.grade).unwrap_or(state.grade.as_str());
        Self {
            title: non_blank_or(&state.lesson_title, "an art lesson"),
            grade: non_blank_or(grade, "the selected grade"),
            big_idea: non_blank_or(&state.big_idea, "the lesson's big idea"),
            objectives: non_blank_or(&state.objectives_text, "the lesson objectives"),
            overview: non_blank_or(&state.overview_text, "the lesson overview"),
            class_size: state.class_size,
        }
    }
}

/// Builds the generation prompt for `slot_name`. Returns `None` when no
/// prompt exists for that element, which is a normal outcome.
/// `channel_names` is the approved channel list used by the video slot.
pub fn compose_prompt(slot_name: &str, state: &SelectionState, channel_names: &[&str]) -> Option<String> {
    let slot = Slot::parse(slot_name)?;
    Some(compose(slot, state, channel_names))
}

pub fn compose(slot: Slot, state: &SelectionState, channel_names: &[&str]) -> String {
    let f = Fields::from_state(state);
    match slot {
        Slot::EssentialQuestions => format!(
            "Write 3 open-ended essential questions for an art lesson titled \"{}\" for {} students. \
             The big idea is: {}. Return one question per line with no numbering.",
            f.title, f.grade, f.big_idea
        ),
        Slot::LessonOverview => format!(
            "Write a short lesson overview (3-4 sentences) for an art lesson titled \"{}\" for {} students. \
             Big idea: {}. Objectives: {}.",
            f.title, f.grade, f.big_idea, f.objectives
        ),
        Slot::LessonObjectives => format!(
            "Write 3 measurable learning objectives for an art lesson titled \"{}\" for {} students. \
             Start each objective with \"Students will be able to\" and put each on its own line.",
            f.title, f.grade
        ),
        Slot::LessonHook => format!(
            "Suggest an engaging 5-minute opening hook for an art lesson titled \"{}\" for {} students. \
             Big idea: {}. Lesson overview: {}.",
            f.title, f.grade, f.big_idea, f.overview
        ),
        Slot::VocabularyTerms => format!(
            "List 6-8 key art vocabulary terms with a one-sentence, age-appropriate definition each \
             for an art lesson titled \"{}\" for {} students. Lesson overview: {}.",
            f.title, f.grade, f.overview
        ),
        Slot::MaterialsList => format!(
            "Create a materials list for a class of {} {} students for an art lesson titled \"{}\". \
             Lesson overview: {}. Format each item as \"• item x quantity\".",
            f.class_size, f.grade, f.title, f.overview
        ),
        Slot::StudioHabitsChecklist => format!(
            "For an art lesson titled \"{}\" for {} students, explain in one sentence each how the lesson \
             builds these Studio Habits of Mind: {}. Objectives: {}.",
            f.title,
            f.grade,
            STUDIO_HABITS.join(", "),
            f.objectives
        ),
        Slot::RubricCriteria => format!(
            "Write 4 rubric criteria for assessing student work in an art lesson titled \"{}\" for {} students. \
             Align the criteria with these objectives: {}. Put each criterion on its own line.",
            f.title, f.grade, f.objectives
        ),
        Slot::ArtHistoryConnections => format!(
            "Suggest 3 artists or art movements that connect to an art lesson titled \"{}\" for {} students. \
             Big idea: {}. For each, give one sentence on the connection.",
            f.title, f.grade, f.big_idea
        ),
        Slot::YoutubeResources => {
            let allowed = if channel_names.is_empty() {
                "(no approved channels)".to_string()
            } else {
                channel_names.join(", ")
            };
            format!(
                "Suggest up to 3 YouTube videos for an art lesson titled \"{}\" for {} students. \
                 Big idea: {}. Only suggest videos from these approved channels: {}. \
                 Format each as \"• Channel: video title\".",
                f.title, f.grade, f.big_idea, allowed
            )
        }
    }
}
