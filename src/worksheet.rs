use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::taxonomy::STUDIO_HABITS;

const SUPPLY_ITEMS: [&str; 4] = ["Paper", "Brushes", "Paint sets", "Water cups"];

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"x \d+").expect("static regex"));

/// Starter supply list sized to the class.
pub fn draft_supplies(overview: &str, class_size: u32) -> String {
    let mut out = format!(
        "Generating supplies for {} students based on: \"{}\"",
        class_size,
        overview.trim()
    );
    for item in SUPPLY_ITEMS {
        out.push_str(&format!("\n• {} x {}", item, class_size));
    }
    out
}

/// Rewrites every `x <n>` quantity in `text` to the class size.
pub fn scale_supplies(text: &str, class_size: u32) -> String {
    QUANTITY_RE
        .replace_all(text, format!("x {}", class_size).as_str())
        .into_owned()
}

/// Session-only worksheet parts that are not driven by the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Worksheet {
    pub rubric_criteria: Vec<String>,
    pub studio_habits: Vec<HabitCheck>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitCheck {
    pub name: &'static str,
    pub checked: bool,
}

impl Default for Worksheet {
    fn default() -> Self {
        Self {
            rubric_criteria: Vec::new(),
            studio_habits: STUDIO_HABITS
                .iter()
                .map(|name| HabitCheck {
                    name,
                    checked: true,
                })
                .collect(),
        }
    }
}

impl Worksheet {
    /// Appends a trimmed criterion. Blank input is ignored.
    pub fn add_criterion(&mut self, criterion: &str) -> bool {
        let c = criterion.trim();
        if c.is_empty() {
            return false;
        }
        self.rubric_criteria.push(c.to_string());
        true
    }

    /// Marks exactly the named habits as checked. Returns names that are not habits.
    pub fn set_checked_habits(&mut self, names: &[String]) -> Vec<String> {
        let unknown: Vec<String> = names
            .iter()
            .filter(|n| !STUDIO_HABITS.contains(&n.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return unknown;
        }
        for habit in &mut self.studio_habits {
            habit.checked = names.iter().any(|n| n == habit.name);
        }
        unknown
    }

    pub fn checked_habits(&self) -> Vec<&'static str> {
        self.studio_habits
            .iter()
            .filter(|h| h.checked)
            .map(|h| h.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_lists_items_for_class_size() {
        let d = draft_supplies(" Tempera landscapes ", 25);
        assert!(d.starts_with("Generating supplies for 25 students based on: \"Tempera landscapes\""));
        assert!(d.contains("• Paper x 25"));
        assert!(d.contains("• Water cups x 25"));
    }

    #[test]
    fn scale_rewrites_every_quantity() {
        let d = draft_supplies("Clay", 25);
        let scaled = scale_supplies(&d, 18);
        assert!(!scaled.contains("x 25"));
        assert_eq!(scaled.matches("x 18").count(), 4);
        assert!(scaled.contains("for 25 students"));
    }

    #[test]
    fn blank_criteria_are_ignored() {
        let mut w = Worksheet::default();
        assert!(!w.add_criterion("   "));
        assert!(w.add_criterion("  Uses value contrast "));
        assert_eq!(w.rubric_criteria, vec!["Uses value contrast".to_string()]);
    }

    #[test]
    fn habits_start_checked_and_can_be_narrowed() {
        let mut w = Worksheet::default();
        assert_eq!(w.checked_habits().len(), 8);
        let unknown = w.set_checked_habits(&["Observe".to_string(), "Reflect".to_string()]);
        assert!(unknown.is_empty());
        assert_eq!(w.checked_habits(), vec!["Observe", "Reflect"]);

        let unknown = w.set_checked_habits(&["Juggle".to_string()]);
        assert_eq!(unknown, vec!["Juggle".to_string()]);
        assert_eq!(w.checked_habits(), vec!["Observe", "Reflect"]);
    }
}
