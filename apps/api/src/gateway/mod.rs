//! Report Fetch Gateway: one schema-constrained model call per report facet.
//!
//! The gateway is stateless: no caching, no retries. Every successful return
//! has already been validated against the schema sent with the request.
//! All model calls go through llm_client.

pub mod prompts;
pub mod schemas;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use tracing::debug;

use crate::catalog::UniversityFilter;
use crate::errors::{AppError, GENERIC_SERVICE_MESSAGE};
use crate::llm_client::prompts::{ADVISOR_SYSTEM, MARKDOWN_NOTE};
use crate::llm_client::LlmClient;
use crate::models::report::{
    CourseRequirements, NarrativeBundle, ScenarioStory, SkipVerdict, UniversityCourse,
};
use prompts::{
    COURSES_PROMPT_TEMPLATE, NARRATIVE_PROMPT_TEMPLATE, REQUIREMENTS_PROMPT_TEMPLATE,
    SKIP_PROMPT_TEMPLATE, WHAT_IF_PROMPT_TEMPLATE,
};
use schemas::{CourseList, SkipList};

const NARRATIVE_TEMPERATURE: f32 = 0.7;
const COURSES_TEMPERATURE: f32 = 0.4;
const SKIP_TEMPERATURE: f32 = 0.3;
const WHAT_IF_TEMPERATURE: f32 = 0.8;
const REQUIREMENTS_TEMPERATURE: f32 = 0.2;

/// Source of structured report data. Implemented by `GeminiGateway` in
/// production and by counting mocks in tests.
#[async_trait]
pub trait ReportGateway: Send + Sync {
    async fn narrative_bundle(&self, subjects: &[String]) -> Result<NarrativeBundle, AppError>;

    async fn university_courses(
        &self,
        subjects: &[String],
        filter: &UniversityFilter,
    ) -> Result<Vec<UniversityCourse>, AppError>;

    async fn skip_verdicts(&self, subjects: &[String]) -> Result<Vec<SkipVerdict>, AppError>;

    /// `new_combination` is the selection with `replaced` swapped out, in
    /// the order the scenario will report it.
    async fn what_if_story(
        &self,
        subjects: &[String],
        replaced: &str,
        new_subject: &str,
        new_combination: &[String],
    ) -> Result<ScenarioStory, AppError>;

    async fn course_requirements(
        &self,
        course: &str,
        university: &str,
    ) -> Result<CourseRequirements, AppError>;
}

/// Gateway backed by the Gemini API.
#[derive(Clone)]
pub struct GeminiGateway {
    llm: LlmClient,
}

impl GeminiGateway {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

pub fn build_narrative_prompt(subjects: &[String]) -> String {
    NARRATIVE_PROMPT_TEMPLATE
        .replace("{subjects}", &subjects.join(", "))
        .replace("{markdown_note}", MARKDOWN_NOTE)
}

pub fn build_courses_prompt(subjects: &[String], filter: &UniversityFilter) -> String {
    let (scope, scope_rule) = match filter {
        UniversityFilter::All => (
            "at Russell Group universities".to_string(),
            "Spread the courses across different Russell Group universities.".to_string(),
        ),
        UniversityFilter::Institution(name) => (
            format!("at {name}"),
            format!(
                "Every course MUST be offered by {name}. If fewer than 5 suitable courses exist there, return only those that do."
            ),
        ),
    };

    COURSES_PROMPT_TEMPLATE
        .replace("{subjects}", &subjects.join(", "))
        .replace("{scope}", &scope)
        .replace("{scope_rule}", &scope_rule)
}

pub fn build_skip_prompt(subjects: &[String]) -> String {
    SKIP_PROMPT_TEMPLATE.replace("{subjects}", &subjects.join(", "))
}

pub fn build_what_if_prompt(
    subjects: &[String],
    replaced: &str,
    new_subject: &str,
    new_combination: &[String],
) -> String {
    WHAT_IF_PROMPT_TEMPLATE
        .replace("{subjects}", &subjects.join(", "))
        .replace("{replaced}", replaced)
        .replace("{new_subject}", new_subject)
        .replace("{new_combination}", &new_combination.join(", "))
        .replace("{markdown_note}", MARKDOWN_NOTE)
}

pub fn build_requirements_prompt(course: &str, university: &str) -> String {
    REQUIREMENTS_PROMPT_TEMPLATE
        .replace("{course}", course)
        .replace("{university}", university)
}

#[async_trait]
impl ReportGateway for GeminiGateway {
    async fn narrative_bundle(&self, subjects: &[String]) -> Result<NarrativeBundle, AppError> {
        let prompt = build_narrative_prompt(subjects);
        self.llm
            .call_json::<NarrativeBundle>(
                &prompt,
                ADVISOR_SYSTEM,
                &schemas::narrative_schema(),
                NARRATIVE_TEMPERATURE,
            )
            .await
            .map_err(|e| AppError::from_llm(e, GENERIC_SERVICE_MESSAGE))
    }

    async fn university_courses(
        &self,
        subjects: &[String],
        filter: &UniversityFilter,
    ) -> Result<Vec<UniversityCourse>, AppError> {
        let prompt = build_courses_prompt(subjects, filter);
        let list = self
            .llm
            .call_json::<CourseList>(
                &prompt,
                ADVISOR_SYSTEM,
                &schemas::courses_schema(),
                COURSES_TEMPERATURE,
            )
            .await
            .map_err(|e| AppError::from_llm(e, GENERIC_SERVICE_MESSAGE))?;
        debug!(
            "Fetched {} courses for filter '{}'",
            list.courses.len(),
            filter.key()
        );
        Ok(list.courses)
    }

    async fn skip_verdicts(&self, subjects: &[String]) -> Result<Vec<SkipVerdict>, AppError> {
        let prompt = build_skip_prompt(subjects);
        let list = self
            .llm
            .call_json::<SkipList>(&prompt, ADVISOR_SYSTEM, &schemas::skip_schema(), SKIP_TEMPERATURE)
            .await
            .map_err(|e| AppError::from_llm(e, GENERIC_SERVICE_MESSAGE))?;
        Ok(list.verdicts)
    }

    async fn what_if_story(
        &self,
        subjects: &[String],
        replaced: &str,
        new_subject: &str,
        new_combination: &[String],
    ) -> Result<ScenarioStory, AppError> {
        let prompt = build_what_if_prompt(subjects, replaced, new_subject, new_combination);
        self.llm
            .call_json::<ScenarioStory>(
                &prompt,
                ADVISOR_SYSTEM,
                &schemas::what_if_schema(),
                WHAT_IF_TEMPERATURE,
            )
            .await
            .map_err(|e| AppError::from_llm(e, GENERIC_SERVICE_MESSAGE))
    }

    async fn course_requirements(
        &self,
        course: &str,
        university: &str,
    ) -> Result<CourseRequirements, AppError> {
        let prompt = build_requirements_prompt(course, university);
        self.llm
            .call_json::<CourseRequirements>(
                &prompt,
                ADVISOR_SYSTEM,
                &schemas::requirements_schema(),
                REQUIREMENTS_TEMPERATURE,
            )
            .await
            .map_err(|e| AppError::from_llm(e, GENERIC_SERVICE_MESSAGE))
    }
}
