use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerPersona {
    pub title: String,
    pub description: String,
}

/// Three-part narrative connecting the chosen subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureStory {
    pub introduction: String,
    pub body: String,
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Career {
    pub career_name: String,
    pub summary: String,
    /// Example employers.
    pub companies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerEarning {
    pub career_name: String,
    pub earning_info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningPotential {
    pub summary: String,
    pub career_specifics: Vec<CareerEarning>,
    pub outlook: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityCourse {
    pub course_name: String,
    pub university_name: String,
    pub url: String,
    pub typical_offer: String,
    pub required_subjects: Vec<String>,
    pub recommended_subjects: Vec<String>,
    pub gcse_requirements: String,
}

/// Whether a subject can be dropped and still lead to related degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipVerdict {
    pub subject: String,
    pub can_skip: bool,
    pub reason: String,
}

/// The narrative, careers and earnings facets, fetched together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeBundle {
    pub career_persona: CareerPersona,
    pub future_story: FutureStory,
    pub popular_careers: Vec<Career>,
    pub earning_potential: EarningPotential,
}

/// One complete analysis. Immutable once built; replaced wholesale each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub career_persona: CareerPersona,
    pub future_story: FutureStory,
    pub popular_careers: Vec<Career>,
    pub earning_potential: EarningPotential,
    pub university_courses: Vec<UniversityCourse>,
    /// `None` when skip analysis is turned off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skippable_subjects: Option<Vec<SkipVerdict>>,
}

impl AnalysisReport {
    pub fn assemble(
        bundle: NarrativeBundle,
        university_courses: Vec<UniversityCourse>,
        skippable_subjects: Option<Vec<SkipVerdict>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            career_persona: bundle.career_persona,
            future_story: bundle.future_story,
            popular_careers: bundle.popular_careers,
            earning_potential: bundle.earning_potential,
            university_courses,
            skippable_subjects,
        })
    }
}

/// A detached "what if I swapped one subject" result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfScenario {
    pub substituted_subject: String,
    pub new_subject: String,
    pub new_combination: Vec<String>,
    pub scenario_story: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStory {
    pub scenario_story: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRequirements {
    pub requirements: String,
    pub link: String,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_uses_camel_case_keys() {
        let json = serde_json::to_value(fixtures::report().as_ref()).unwrap();
        assert!(json.get("futureStory").is_some());
        assert!(json.get("universityCourses").is_some());
        assert_eq!(
            json["earningPotential"]["careerSpecifics"][0]["careerName"],
            "Data Scientist"
        );
        assert_eq!(json["universityCourses"][0]["typicalOffer"], "AAA");
    }

    #[test]
    fn test_skippable_subjects_omitted_when_disabled() {
        let report = AnalysisReport::assemble(fixtures::bundle(), vec![], None);
        let json = serde_json::to_value(report.as_ref()).unwrap();
        assert!(json.get("skippableSubjects").is_none());

        let recovered: AnalysisReport = serde_json::from_value(json).unwrap();
        assert!(recovered.skippable_subjects.is_none());
    }

    #[test]
    fn test_skip_verdict_requires_can_skip() {
        let bad = r#"{"subject": "Physics", "reason": "needed"}"#;
        assert!(serde_json::from_str::<SkipVerdict>(bad).is_err());
    }
}
