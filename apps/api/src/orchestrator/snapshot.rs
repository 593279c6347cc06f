//! Saved snapshot format.
//!
//! One JSON document with exactly four top-level keys. There is no version
//! field: any document that does not match this shape is corrupt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::reveal::{RevealState, Stage};
use crate::catalog::UniversityFilter;
use crate::errors::AppError;
use crate::models::report::{AnalysisReport, UniversityCourse};
use crate::models::subjects::SubjectSelection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Snapshot {
    pub subjects: SubjectSelection,
    pub analysis_result: AnalysisReport,
    pub visible_sections: RevealState,
    pub cached_courses: BTreeMap<String, Vec<UniversityCourse>>,
}

impl Snapshot {
    pub fn encode(&self) -> Result<String, AppError> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize snapshot: {e}")))
    }

    /// Parses and checks a stored snapshot.
    pub fn decode(raw: &str) -> Result<Self, AppError> {
        let snapshot: Snapshot =
            serde_json::from_str(raw).map_err(|e| AppError::CorruptSnapshot(e.to_string()))?;
        snapshot.check()?;
        Ok(snapshot)
    }

    fn check(&self) -> Result<(), AppError> {
        if !self.visible_sections.is_open(Stage::Two) || !self.visible_sections.is_consistent() {
            return Err(AppError::CorruptSnapshot(
                "visibleSections is not a reachable reveal state".to_string(),
            ));
        }
        for key in self.cached_courses.keys() {
            let canonical = UniversityFilter::parse(key)
                .map(|filter| filter.key() == key)
                .unwrap_or(false);
            if !canonical {
                return Err(AppError::CorruptSnapshot(format!(
                    "cachedCourses has unknown key '{key}'"
                )));
            }
        }
        Ok(())
    }
}
