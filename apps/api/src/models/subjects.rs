//! Subject selection: the 3–4 A-levels every request is built from.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Form slots: three mandatory, one optional.
pub const SELECTION_SLOTS: usize = 4;
pub const MIN_SUBJECTS: usize = 3;

pub const TOO_FEW_SUBJECTS: &str = "Please select at least 3 subjects.";
pub const DUPLICATE_SUBJECT: &str = "Each subject can only be chosen once.";

/// A validated selection: trimmed, non-blank, unique, 3 or 4 entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SubjectSelection {
    subjects: Vec<String>,
}

impl SubjectSelection {
    /// Validates raw form slots. Blank slots are skipped.
    pub fn from_slots<S: AsRef<str>>(slots: &[S]) -> Result<Self, AppError> {
        if slots.len() > SELECTION_SLOTS {
            return Err(AppError::Validation(format!(
                "At most {SELECTION_SLOTS} subjects can be selected."
            )));
        }

        let subjects: Vec<String> = slots
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if subjects.len() < MIN_SUBJECTS {
            return Err(AppError::Validation(TOO_FEW_SUBJECTS.to_string()));
        }

        for (i, subject) in subjects.iter().enumerate() {
            if subjects[..i].iter().any(|s| s.eq_ignore_ascii_case(subject)) {
                return Err(AppError::Validation(DUPLICATE_SUBJECT.to_string()));
            }
        }

        Ok(Self { subjects })
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.subjects
            .iter()
            .any(|s| s.eq_ignore_ascii_case(subject.trim()))
    }

    /// Form slots padded with empty strings to the fixed slot count.
    pub fn to_slots(&self) -> Vec<String> {
        let mut slots = self.subjects.clone();
        slots.resize(SELECTION_SLOTS, String::new());
        slots
    }

    /// Comma-separated list for prompts.
    pub fn joined(&self) -> String {
        self.subjects.join(", ")
    }

    /// The selection with `replaced` swapped for `new_subject`, order preserved.
    pub fn substitute(&self, replaced: &str, new_subject: &str) -> Vec<String> {
        self.subjects
            .iter()
            .map(|s| {
                if s.eq_ignore_ascii_case(replaced.trim()) {
                    new_subject.trim().to_string()
                } else {
                    s.clone()
                }
            })
            .collect()
    }
}

impl TryFrom<Vec<String>> for SubjectSelection {
    type Error = AppError;

    fn try_from(slots: Vec<String>) -> Result<Self, Self::Error> {
        SubjectSelection::from_slots(&slots)
    }
}

impl From<SubjectSelection> for Vec<String> {
    fn from(selection: SubjectSelection) -> Self {
        selection.to_slots()
    }
}
