use serde::Serialize;

use super::reveal::RevealState;
use crate::models::report::{
    Career, CareerPersona, EarningPotential, FutureStory, SkipVerdict, UniversityCourse,
};

/// Where the current analysis cycle stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What the student can currently see. Report facets are only filled in once
/// their section has been revealed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub cycle: u64,
    pub subjects: Vec<String>,
    pub error: Option<String>,
    pub visible_sections: RevealState,
    pub cached_universities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_persona: Option<CareerPersona>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub future_story: Option<FutureStory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university_courses: Option<Vec<UniversityCourse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popular_careers: Option<Vec<Career>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earning_potential: Option<EarningPotential>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skippable_subjects: Option<Vec<SkipVerdict>>,
}
