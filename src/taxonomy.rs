use serde::Serialize;
use serde_json::{json, Value};

pub const WRITE_MY_OWN: &str = "write_my_own";
pub const WRITE_MY_OWN_LABEL: &str = "Write My Own";
pub const ALL_LEVELS: &str = "all_levels";

/// Grade codes in display order, with their labels.
pub const GRADE_LEVELS: [(&str, &str); 13] = [
    ("pre_k", "Pre-K"),
    ("kindergarten", "Kindergarten"),
    ("1st", "1st Grade"),
    ("2nd", "2nd Grade"),
    ("3rd", "3rd Grade"),
    ("4th", "4th Grade"),
    ("5th", "5th Grade"),
    ("6th", "6th Grade"),
    ("7th", "7th Grade"),
    ("8th", "8th Grade"),
    ("hs_proficient", "High School Proficient"),
    ("hs_accomplished", "High School Accomplished"),
    ("hs_advanced", "High School Advanced"),
];

pub const STUDIO_HABITS: [&str; 8] = [
    "Develop Craft",
    "Engage & Persist",
    "Envision",
    "Express",
    "Observe",
    "Reflect",
    "Stretch & Explore",
    "Understand Art Worlds",
];

pub const LESSON_OBJECTIVE_PRESETS: [&str; 3] = [
    "Students will be able to identify and apply primary colors in a painting.",
    "Students will create a self-portrait using proportions and shading techniques.",
    "Students will analyze and interpret an artwork based on the elements of art.",
];

pub fn grade_label(code: &str) -> Option<&'static str> {
    GRADE_LEVELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    Elementary,
    MiddleSchool,
    HighSchool,
}

impl GradeBand {
    pub fn code(self) -> &'static str {
        match self {
            GradeBand::Elementary => "elementary",
            GradeBand::MiddleSchool => "middle_school",
            GradeBand::HighSchool => "high_school",
        }
    }
}

/// Coarse band for video matching. Codes outside the grade table have no band.
pub fn grade_band(code: &str) -> Option<GradeBand> {
    match code {
        "pre_k" | "kindergarten" | "1st" | "2nd" | "3rd" | "4th" | "5th" => {
            Some(GradeBand::Elementary)
        }
        "6th" | "7th" | "8th" => Some(GradeBand::MiddleSchool),
        "hs_proficient" | "hs_accomplished" | "hs_advanced" => Some(GradeBand::HighSchool),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    VisualArts,
    MediaArts,
}

impl Discipline {
    pub const ALL: [Discipline; 2] = [Discipline::VisualArts, Discipline::MediaArts];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visual_arts" => Some(Discipline::VisualArts),
            "media_arts" => Some(Discipline::MediaArts),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Discipline::VisualArts => "visual_arts",
            Discipline::MediaArts => "media_arts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Discipline::VisualArts => "Visual Arts",
            Discipline::MediaArts => "Media Arts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtisticProcess {
    Creating,
    Presenting,
    Responding,
    Connecting,
}

impl ArtisticProcess {
    pub const ALL: [ArtisticProcess; 4] = [
        ArtisticProcess::Creating,
        ArtisticProcess::Presenting,
        ArtisticProcess::Responding,
        ArtisticProcess::Connecting,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creating" => Some(ArtisticProcess::Creating),
            "presenting" => Some(ArtisticProcess::Presenting),
            "responding" => Some(ArtisticProcess::Responding),
            "connecting" => Some(ArtisticProcess::Connecting),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ArtisticProcess::Creating => "creating",
            ArtisticProcess::Presenting => "presenting",
            ArtisticProcess::Responding => "responding",
            ArtisticProcess::Connecting => "connecting",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtisticProcess::Creating => "Creating",
            ArtisticProcess::Presenting => "Presenting",
            ArtisticProcess::Responding => "Responding",
            ArtisticProcess::Connecting => "Connecting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Formative,
    Summative,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 2] = [AssessmentType::Formative, AssessmentType::Summative];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "formative" => Some(AssessmentType::Formative),
            "summative" => Some(AssessmentType::Summative),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            AssessmentType::Formative => "formative",
            AssessmentType::Summative => "summative",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssessmentType::Formative => "Formative",
            AssessmentType::Summative => "Summative",
        }
    }

    pub fn activities(self) -> &'static [&'static str] {
        match self {
            AssessmentType::Formative => &[
                "Exit Ticket",
                "Peer Critique",
                "Sketchbook Check",
                "Think-Pair-Share",
            ],
            AssessmentType::Summative => &[
                "Final Project",
                "Portfolio Review",
                "Rubric-based Assessment",
                "Artist Statement",
            ],
        }
    }
}

/// Everything the form needs to populate its static controls.
pub fn taxonomy_json() -> Value {
    let grades: Vec<Value> = GRADE_LEVELS
        .iter()
        .map(|(code, label)| {
            json!({
                "code": code,
                "label": label,
                "band": grade_band(code).map(GradeBand::code),
            })
        })
        .collect();
    let disciplines: Vec<Value> = Discipline::ALL
        .iter()
        .map(|d| json!({ "code": d.code(), "label": d.label() }))
        .collect();
    let processes: Vec<Value> = ArtisticProcess::ALL
        .iter()
        .map(|p| json!({ "code": p.code(), "label": p.label() }))
        .collect();
    let assessment_types: Vec<Value> = AssessmentType::ALL
        .iter()
        .map(|t| {
            json!({
                "code": t.code(),
                "label": t.label(),
                "activities": t.activities(),
            })
        })
        .collect();
    json!({
        "gradeLevels": grades,
        "disciplines": disciplines,
        "artisticProcesses": processes,
        "assessmentTypes": assessment_types,
        "studioHabits": STUDIO_HABITS,
        "lessonObjectivePresets": LESSON_OBJECTIVE_PRESETS,
    })
}
