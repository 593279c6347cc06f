//! Fixed reference lists served to the front end and used to validate filters.

use serde::Serialize;

use crate::errors::AppError;

/// Cache key and display label for the unfiltered course list.
pub const ALL_UNIVERSITIES: &str = "All Universities";

pub const A_LEVEL_SUBJECTS: &[&str] = &[
    "Accounting",
    "Ancient History",
    "Art and Design",
    "Biology",
    "Business Studies",
    "Chemistry",
    "Classical Civilisation",
    "Computer Science",
    "Dance",
    "Design and Technology",
    "Drama and Theatre",
    "Economics",
    "English Language",
    "English Literature",
    "Environmental Science",
    "Film Studies",
    "French",
    "Further Mathematics",
    "Geography",
    "German",
    "Government and Politics",
    "History",
    "History of Art",
    "Italian",
    "Latin",
    "Law",
    "Mandarin",
    "Mathematics",
    "Media Studies",
    "Music",
    "Music Technology",
    "Philosophy",
    "Physical Education",
    "Physics",
    "Psychology",
    "Religious Studies",
    "Sociology",
    "Spanish",
    "Statistics",
];

pub const RUSSELL_GROUP_UNIVERSITIES: &[&str] = &[
    "Cardiff University",
    "Durham University",
    "Imperial College London",
    "King's College London",
    "London School of Economics and Political Science",
    "Newcastle University",
    "Queen Mary University of London",
    "Queen's University Belfast",
    "University College London",
    "University of Birmingham",
    "University of Bristol",
    "University of Cambridge",
    "University of Edinburgh",
    "University of Exeter",
    "University of Glasgow",
    "University of Leeds",
    "University of Liverpool",
    "University of Manchester",
    "University of Nottingham",
    "University of Oxford",
    "University of Sheffield",
    "University of Southampton",
    "University of Warwick",
    "University of York",
];

/// Which institutions a course list covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniversityFilter {
    All,
    Institution(&'static str),
}

impl UniversityFilter {
    /// Resolves a user-supplied filter. Blank input means "all"; institution
    /// names match the catalog case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_UNIVERSITIES) {
            return Ok(UniversityFilter::All);
        }
        RUSSELL_GROUP_UNIVERSITIES
            .iter()
            .find(|name| name.eq_ignore_ascii_case(trimmed))
            .map(|name| UniversityFilter::Institution(name))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "'{trimmed}' is not a Russell Group university."
                ))
            })
    }

    /// The exact key this filter is cached under.
    pub fn key(&self) -> &'static str {
        match self {
            UniversityFilter::All => ALL_UNIVERSITIES,
            UniversityFilter::Institution(name) => name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub subjects: &'static [&'static str],
    pub universities: &'static [&'static str],
    pub all_universities_key: &'static str,
}

pub fn catalog() -> Catalog {
    Catalog {
        subjects: A_LEVEL_SUBJECTS,
        universities: RUSSELL_GROUP_UNIVERSITIES,
        all_universities_key: ALL_UNIVERSITIES,
    }
}
