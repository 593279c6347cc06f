//! Analysis Orchestrator: the single authority over what one student sees.
//!
//! Flow per cycle: validate selection → begin cycle (clear everything) →
//! narrative + "All Universities" courses + skip verdicts concurrently →
//! commit all-or-nothing → stage 2 open. Later actions reveal stages 3 and 4,
//! fill the per-university course cache, or run detached what-if scenarios.
//!
//! Session state sits behind a mutex that is never held across a gateway call.
//! Every completion re-checks the cycle id it started with; a mismatch means a
//! newer cycle (or a snapshot load) has replaced the state and the result is
//! dropped.

pub mod course_cache;
pub mod reveal;
pub mod snapshot;
pub mod view;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::catalog::{UniversityFilter, ALL_UNIVERSITIES};
use crate::errors::AppError;
use crate::gateway::ReportGateway;
use crate::models::report::{AnalysisReport, CourseRequirements, UniversityCourse, WhatIfScenario};
use crate::models::subjects::SubjectSelection;
use crate::storage::SnapshotStore;
use course_cache::CourseCache;
use reveal::{RevealState, Stage};
use snapshot::Snapshot;
use view::{Phase, SessionView};

pub const ANALYSIS_FAILED: &str =
    "An error occurred while generating the analysis. Please try again.";
pub const WHAT_IF_INVALID: &str =
    "Please select a subject to replace and a different new subject.";
pub const WHAT_IF_FAILED: &str = "Could not generate the new story. Please try again.";
pub const REQUIREMENTS_FAILED: &str =
    "Could not fetch the entry requirements for this course. Please try again.";
pub const NOT_READY: &str = "Generate an analysis first.";

#[derive(Debug, Default)]
struct Session {
    phase: Phase,
    cycle: u64,
    selection: Option<SubjectSelection>,
    report: Option<Arc<AnalysisReport>>,
    reveal: RevealState,
    courses: CourseCache,
    error: Option<String>,
}

impl Session {
    fn begin_cycle(&mut self, selection: SubjectSelection) -> u64 {
        self.cycle += 1;
        self.phase = Phase::Loading;
        self.selection = Some(selection);
        self.report = None;
        self.reveal = RevealState::default();
        self.courses = CourseCache::new();
        self.error = None;
        self.cycle
    }

    fn commit(&mut self, report: Arc<AnalysisReport>) {
        self.courses = CourseCache::seeded(ALL_UNIVERSITIES, report.university_courses.clone());
        self.report = Some(report);
        self.reveal = RevealState::initial_ready();
        self.phase = Phase::Ready;
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.cycle += 1;
        self.phase = Phase::Ready;
        self.selection = Some(snapshot.subjects);
        self.report = Some(Arc::new(snapshot.analysis_result));
        self.reveal = snapshot.visible_sections;
        self.courses = CourseCache::from_map(snapshot.cached_courses);
        self.error = None;
    }

    /// The report and selection, if an analysis is on screen.
    fn ready(&self) -> Result<(&SubjectSelection, &Arc<AnalysisReport>), AppError> {
        match (&self.selection, &self.report) {
            (Some(selection), Some(report)) => Ok((selection, report)),
            _ => Err(AppError::AnalysisNotReady(NOT_READY.to_string())),
        }
    }

    fn view(&self) -> SessionView {
        let report = self.report.as_ref();
        let stage = |s: Stage| report.filter(|_| self.reveal.is_open(s));

        SessionView {
            phase: self.phase,
            cycle: self.cycle,
            subjects: self
                .selection
                .as_ref()
                .map(SubjectSelection::to_slots)
                .unwrap_or_default(),
            error: self.error.clone(),
            visible_sections: self.reveal,
            cached_universities: self.courses.keys(),
            career_persona: stage(Stage::Two).map(|r| r.career_persona.clone()),
            future_story: stage(Stage::Two).map(|r| r.future_story.clone()),
            university_courses: stage(Stage::Two).map(|r| {
                self.courses
                    .get(ALL_UNIVERSITIES)
                    .cloned()
                    .unwrap_or_else(|| r.university_courses.clone())
            }),
            popular_careers: stage(Stage::Three).map(|r| r.popular_careers.clone()),
            earning_potential: stage(Stage::Three).map(|r| r.earning_potential.clone()),
            skippable_subjects: stage(Stage::Four).and_then(|r| r.skippable_subjects.clone()),
        }
    }
}

/// One student's analysis state plus the collaborators needed to advance it.
pub struct Orchestrator {
    gateway: Arc<dyn ReportGateway>,
    store: Arc<dyn SnapshotStore>,
    snapshot_key: String,
    include_skip_analysis: bool,
    session: Mutex<Session>,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn ReportGateway>,
        store: Arc<dyn SnapshotStore>,
        snapshot_key: String,
        include_skip_analysis: bool,
    ) -> Self {
        Self {
            gateway,
            store,
            snapshot_key,
            include_skip_analysis,
            session: Mutex::new(Session::default()),
        }
    }

    pub async fn view(&self) -> SessionView {
        self.session.lock().await.view()
    }

    /// Validates the selection and runs a fresh analysis cycle.
    pub async fn start_analysis<S: AsRef<str>>(
        &self,
        slots: &[S],
    ) -> Result<Arc<AnalysisReport>, AppError> {
        let selection = match SubjectSelection::from_slots(slots) {
            Ok(selection) => selection,
            Err(e) => {
                self.session.lock().await.error = Some(e.user_message());
                return Err(e);
            }
        };

        let cycle = self.session.lock().await.begin_cycle(selection.clone());
        info!(cycle, subjects = %selection.joined(), "Starting analysis");

        let subjects = selection.subjects();
        let all = UniversityFilter::All;
        let skip = async {
            if self.include_skip_analysis {
                self.gateway.skip_verdicts(subjects).await.map(Some)
            } else {
                Ok(None)
            }
        };
        let outcome = tokio::try_join!(
            self.gateway.narrative_bundle(subjects),
            self.gateway.university_courses(subjects, &all),
            skip,
        );

        let mut session = self.session.lock().await;
        if session.cycle != cycle {
            debug!(cycle, current = session.cycle, "Discarding stale analysis result");
            return Err(AppError::Superseded {
                current: session.cycle,
            });
        }

        match outcome {
            Ok((bundle, courses, verdicts)) => {
                let report = AnalysisReport::assemble(bundle, courses, verdicts);
                session.commit(report.clone());
                info!(
                    cycle,
                    courses = report.university_courses.len(),
                    careers = report.popular_careers.len(),
                    "Analysis ready"
                );
                Ok(report)
            }
            Err(e) => {
                error!(cycle, "Analysis failed: {e}");
                session.phase = Phase::Failed;
                session.error = Some(ANALYSIS_FAILED.to_string());
                Err(e.with_user_message(ANALYSIS_FAILED))
            }
        }
    }

    /// Opens a result section. No I/O.
    pub async fn reveal_next(&self, stage: Stage) -> Result<RevealState, AppError> {
        let mut session = self.session.lock().await;
        session.ready()?;
        session.reveal.open(stage)?;
        debug!(level = session.reveal.level(), "Reveal state advanced");
        Ok(session.reveal)
    }

    /// Course list for one university filter, fetched at most once per cycle.
    pub async fn fetch_courses_for(&self, university: &str) -> Result<Vec<UniversityCourse>, AppError> {
        let filter = UniversityFilter::parse(university)?;

        let (slot, subjects, cycle) = {
            let mut session = self.session.lock().await;
            let subjects = session.ready()?.0.subjects().to_vec();
            (session.courses.slot(filter.key()), subjects, session.cycle)
        };

        if let Some(courses) = slot.get() {
            debug!(university = filter.key(), "Course cache hit");
            return Ok(courses.clone());
        }

        let courses = slot
            .get_or_try_init(|| self.gateway.university_courses(&subjects, &filter))
            .await
            .map_err(|e| {
                warn!(university = filter.key(), "Course fetch failed: {e}");
                e.with_user_message(format!(
                    "Could not fetch courses for {}. Please try again.",
                    filter.key()
                ))
            })?
            .clone();

        let current = self.session.lock().await.cycle;
        if current != cycle {
            debug!(cycle, current, "Discarding stale course list");
            return Err(AppError::Superseded { current });
        }

        Ok(courses)
    }

    /// Builds a detached scenario for swapping one subject. Never touches state.
    pub async fn run_what_if(
        &self,
        replaced: &str,
        new_subject: &str,
    ) -> Result<WhatIfScenario, AppError> {
        let replaced = replaced.trim();
        let new_subject = new_subject.trim();
        if replaced.is_empty() || new_subject.is_empty() || replaced.eq_ignore_ascii_case(new_subject)
        {
            return Err(AppError::Validation(WHAT_IF_INVALID.to_string()));
        }

        let (subjects, substituted, new_combination) = {
            let session = self.session.lock().await;
            let (selection, _) = session.ready()?;
            let substituted = selection
                .subjects()
                .iter()
                .find(|s| s.eq_ignore_ascii_case(replaced))
                .cloned()
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "{replaced} is not part of the current selection."
                    ))
                })?;
            if selection.contains(new_subject) {
                return Err(AppError::Validation(format!(
                    "{new_subject} is already part of the current selection."
                )));
            }
            (
                selection.subjects().to_vec(),
                substituted,
                selection.substitute(replaced, new_subject),
            )
        };

        let story = self
            .gateway
            .what_if_story(&subjects, &substituted, new_subject, &new_combination)
            .await
            .map_err(|e| {
                warn!("What-if scenario failed: {e}");
                e.with_user_message(WHAT_IF_FAILED)
            })?;

        Ok(WhatIfScenario {
            substituted_subject: substituted,
            new_subject: new_subject.to_string(),
            new_combination,
            scenario_story: story.scenario_story,
        })
    }

    /// Restarts the cycle with a scenario's combination.
    pub async fn promote_scenario(
        &self,
        scenario: &WhatIfScenario,
    ) -> Result<Arc<AnalysisReport>, AppError> {
        info!(
            from = %scenario.substituted_subject,
            to = %scenario.new_subject,
            "Promoting what-if scenario"
        );
        self.start_analysis(&scenario.new_combination).await
    }

    /// Writes the current state under this session's snapshot key.
    pub async fn save_snapshot(&self) -> Result<(), AppError> {
        let encoded = {
            let session = self.session.lock().await;
            let (selection, report) = session.ready()?;
            Snapshot {
                subjects: selection.clone(),
                analysis_result: report.as_ref().clone(),
                visible_sections: session.reveal,
                cached_courses: session.courses.to_map(),
            }
            .encode()?
        };
        self.store.put(&self.snapshot_key, &encoded).await?;
        info!(key = %self.snapshot_key, bytes = encoded.len(), "Snapshot saved");
        Ok(())
    }

    /// Replaces all state with the stored snapshot. A corrupt snapshot is
    /// deleted and the current state is left exactly as it was.
    pub async fn load_snapshot(&self) -> Result<SessionView, AppError> {
        let raw = self
            .store
            .get(&self.snapshot_key)
            .await?
            .ok_or_else(|| AppError::NotFound("No saved analysis found.".to_string()))?;

        let snapshot = match Snapshot::decode(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(key = %self.snapshot_key, "Discarding unreadable snapshot: {e}");
                if let Err(remove_err) = self.store.remove(&self.snapshot_key).await {
                    error!("Failed to remove corrupt snapshot: {remove_err}");
                }
                return Err(e);
            }
        };

        let mut session = self.session.lock().await;
        session.restore(snapshot);
        info!(cycle = session.cycle, "Snapshot restored");
        Ok(session.view())
    }

    pub async fn has_snapshot(&self) -> Result<bool, AppError> {
        Ok(self.store.get(&self.snapshot_key).await?.is_some())
    }
}

/// Requirement lookups need no session state.
pub async fn lookup_requirements(
    gateway: &dyn ReportGateway,
    course: &str,
    university: &str,
) -> Result<CourseRequirements, AppError> {
    let course = course.trim();
    let university = university.trim();
    if course.is_empty() || university.is_empty() {
        return Err(AppError::Validation(
            "Please choose a course and a university.".to_string(),
        ));
    }
    gateway
        .course_requirements(course, university)
        .await
        .map_err(|e| e.with_user_message(REQUIREMENTS_FAILED))
}
