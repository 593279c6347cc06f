//! Output schemas, one per gateway operation. Property names match the serde
//! names of the types in `models::report`.

use serde::Deserialize;

use crate::llm_client::schema::Schema;
use crate::models::report::{SkipVerdict, UniversityCourse};

pub fn narrative_schema() -> Schema {
    Schema::object(vec![
        (
            "careerPersona",
            Schema::object(vec![
                (
                    "title",
                    Schema::described("Aspirational persona title, e.g. 'The Creative Engineer'"),
                ),
                ("description", Schema::string()),
            ]),
        ),
        (
            "futureStory",
            Schema::object(vec![
                ("introduction", Schema::string()),
                ("body", Schema::string()),
                ("conclusion", Schema::string()),
            ]),
        ),
        (
            "popularCareers",
            Schema::array(Schema::object(vec![
                ("careerName", Schema::string()),
                ("summary", Schema::string()),
                ("companies", Schema::string_list()),
            ])),
        ),
        (
            "earningPotential",
            Schema::object(vec![
                ("summary", Schema::string()),
                (
                    "careerSpecifics",
                    Schema::array(Schema::object(vec![
                        ("careerName", Schema::string()),
                        ("earningInfo", Schema::string()),
                    ])),
                ),
                ("outlook", Schema::string()),
            ]),
        ),
    ])
}

fn course_schema() -> Schema {
    Schema::object(vec![
        ("courseName", Schema::string()),
        ("universityName", Schema::string()),
        ("url", Schema::described("Official course page URL")),
        ("typicalOffer", Schema::described("Typical A-level offer, e.g. A*AA")),
        ("requiredSubjects", Schema::string_list()),
        ("recommendedSubjects", Schema::string_list()),
        ("gcseRequirements", Schema::string()),
    ])
}

pub fn courses_schema() -> Schema {
    Schema::object(vec![("courses", Schema::array(course_schema()))])
}

pub fn skip_schema() -> Schema {
    Schema::object(vec![(
        "verdicts",
        Schema::array(Schema::object(vec![
            ("subject", Schema::string()),
            ("canSkip", Schema::boolean()),
            ("reason", Schema::string()),
        ])),
    )])
}

pub fn what_if_schema() -> Schema {
    Schema::object(vec![(
        "scenarioStory",
        Schema::described("A brief, inspirational story (1-2 paragraphs) for the new combination"),
    )])
}

pub fn requirements_schema() -> Schema {
    Schema::object(vec![
        (
            "requirements",
            Schema::described("Typical A-level grade requirements, e.g. A*AA or ABB"),
        ),
        ("link", Schema::described("Direct URL of the official course page")),
    ])
}

/// Envelope for `courses_schema`.
#[derive(Debug, Deserialize)]
pub struct CourseList {
    pub courses: Vec<UniversityCourse>,
}

/// Envelope for `skip_schema`.
#[derive(Debug, Deserialize)]
pub struct SkipList {
    pub verdicts: Vec<SkipVerdict>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parse_structured;
    use crate::models::report::{fixtures, NarrativeBundle};

    #[test]
    fn test_narrative_schema_accepts_serialized_bundle() {
        let text = serde_json::to_string(&fixtures::bundle()).unwrap();
        let parsed: NarrativeBundle = parse_structured(&text, &narrative_schema()).unwrap();
        assert_eq!(parsed, fixtures::bundle());
    }

    #[test]
    fn test_courses_schema_accepts_serialized_course() {
        let course = fixtures::course("Physics", "University of Oxford");
        let text = serde_json::json!({ "courses": [course] }).to_string();
        let parsed: CourseList = parse_structured(&text, &courses_schema()).unwrap();
        assert_eq!(parsed.courses[0].course_name, "Physics");
    }

    #[test]
    fn test_courses_schema_rejects_bare_array() {
        let course = fixtures::course("Physics", "University of Oxford");
        let text = serde_json::json!([course]).to_string();
        let result: Result<CourseList, _> = parse_structured(&text, &courses_schema());
        assert!(result.unwrap_err().is_schema_failure());
    }

    #[test]
    fn test_skip_schema_requires_boolean_verdict() {
        let text = r#"{"verdicts": [{"subject": "Physics", "canSkip": "no", "reason": "x"}]}"#;
        let result: Result<SkipList, _> = parse_structured(text, &skip_schema());
        assert!(result.unwrap_err().is_schema_failure());
    }

    #[test]
    fn test_every_object_lists_all_properties_as_required() {
        let rendered = narrative_schema().to_json();
        let required = rendered["required"].as_array().unwrap();
        assert_eq!(required.len(), 4);
        let persona_required = rendered["properties"]["careerPersona"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(persona_required.len(), 2);
    }
}
