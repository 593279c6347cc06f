//! Counting in-memory gateway for orchestrator and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::ReportGateway;
use crate::catalog::UniversityFilter;
use crate::errors::AppError;
use crate::models::report::{
    fixtures, CourseRequirements, NarrativeBundle, ScenarioStory, SkipVerdict, UniversityCourse,
};

/// Pauses a call until released. For narratives `key` is a subject in the
/// selection; for course lists it is the university filter key.
pub struct Hold {
    pub key: String,
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Hold {
    fn new(key: &str) -> (Self, Arc<Notify>, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let hold = Hold {
            key: key.to_string(),
            started: started.clone(),
            release: release.clone(),
        };
        (hold, started, release)
    }
}

#[derive(Default)]
pub struct MockGateway {
    pub narrative_calls: AtomicUsize,
    pub course_calls: AtomicUsize,
    pub skip_calls: AtomicUsize,
    pub what_if_calls: AtomicUsize,
    pub requirement_calls: AtomicUsize,
    course_calls_by_key: Mutex<HashMap<String, usize>>,
    what_if_combinations: Mutex<Vec<Vec<String>>>,
    pub fail_narrative: AtomicBool,
    pub fail_courses: AtomicBool,
    course_delay: Option<Duration>,
    hold: Option<Hold>,
    course_hold: Option<Hold>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course_delay(mut self, delay: Duration) -> Self {
        self.course_delay = Some(delay);
        self
    }

    /// Returns the gateway plus (started, release) handles for the held subject.
    pub fn holding(mut self, subject: &str) -> (Self, Arc<Notify>, Arc<Notify>) {
        let (hold, started, release) = Hold::new(subject);
        self.hold = Some(hold);
        (self, started, release)
    }

    /// Same as `holding`, but pauses the course list for one filter key.
    pub fn holding_courses(mut self, university: &str) -> (Self, Arc<Notify>, Arc<Notify>) {
        let (hold, started, release) = Hold::new(university);
        self.course_hold = Some(hold);
        (self, started, release)
    }

    pub fn total_calls(&self) -> usize {
        self.narrative_calls.load(Ordering::SeqCst)
            + self.course_calls.load(Ordering::SeqCst)
            + self.skip_calls.load(Ordering::SeqCst)
            + self.what_if_calls.load(Ordering::SeqCst)
            + self.requirement_calls.load(Ordering::SeqCst)
    }

    pub fn course_calls_for(&self, key: &str) -> usize {
        self.course_calls_by_key
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Combinations passed to `what_if_story`, in call order.
    pub fn what_if_combinations(&self) -> Vec<Vec<String>> {
        self.what_if_combinations.lock().unwrap().clone()
    }

    fn failure() -> AppError {
        AppError::Service {
            message: "mock failure".to_string(),
            detail: "mock gateway configured to fail".to_string(),
        }
    }
}

#[async_trait]
impl ReportGateway for MockGateway {
    async fn narrative_bundle(&self, subjects: &[String]) -> Result<NarrativeBundle, AppError> {
        self.narrative_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.hold {
            if subjects.iter().any(|s| s == &hold.key) {
                hold.started.notify_one();
                hold.release.notified().await;
            }
        }
        if self.fail_narrative.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let mut bundle = fixtures::bundle();
        bundle.career_persona.title = format!("Persona for {}", subjects.join("/"));
        Ok(bundle)
    }

    async fn university_courses(
        &self,
        subjects: &[String],
        filter: &UniversityFilter,
    ) -> Result<Vec<UniversityCourse>, AppError> {
        self.course_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .course_calls_by_key
            .lock()
            .unwrap()
            .entry(filter.key().to_string())
            .or_default() += 1;
        if let Some(hold) = &self.course_hold {
            if filter.key() == hold.key {
                hold.started.notify_one();
                hold.release.notified().await;
            }
        }
        if let Some(delay) = self.course_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_courses.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let university = match filter {
            UniversityFilter::All => "University of Leeds",
            UniversityFilter::Institution(name) => *name,
        };
        Ok(subjects
            .iter()
            .map(|s| fixtures::course(s, university))
            .collect())
    }

    async fn skip_verdicts(&self, subjects: &[String]) -> Result<Vec<SkipVerdict>, AppError> {
        self.skip_calls.fetch_add(1, Ordering::SeqCst);
        Ok(fixtures::verdicts(subjects))
    }

    async fn what_if_story(
        &self,
        _subjects: &[String],
        replaced: &str,
        new_subject: &str,
        new_combination: &[String],
    ) -> Result<ScenarioStory, AppError> {
        self.what_if_calls.fetch_add(1, Ordering::SeqCst);
        self.what_if_combinations
            .lock()
            .unwrap()
            .push(new_combination.to_vec());
        Ok(ScenarioStory {
            scenario_story: format!("Swapping {replaced} for {new_subject} opens new doors."),
        })
    }

    async fn course_requirements(
        &self,
        course: &str,
        university: &str,
    ) -> Result<CourseRequirements, AppError> {
        self.requirement_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CourseRequirements {
            requirements: format!("A*AA for {course}"),
            link: format!("https://example.ac.uk/{}", university.len()),
        })
    }
}
