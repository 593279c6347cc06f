// Task prompts for each report facet.
// The advisory role lives in llm_client::prompts::ADVISOR_SYSTEM.

/// Narrative + careers + earnings. Replace: {subjects}, {markdown_note}
pub const NARRATIVE_PROMPT_TEMPLATE: &str = r#"A student is considering the A-level combination: {subjects}.

Produce the following, written directly to the student:
1. careerPersona: a creative, aspirational persona title (e.g. "The Creative Engineer") and a one-paragraph description of the strengths this combination builds.
2. futureStory: an inspirational story about where these subjects can lead, split into an introduction, a body (two short paragraphs) and a conclusion.
3. popularCareers: 3 to 5 careers this combination commonly leads to. For each give careerName, a one-sentence summary and 2 to 4 well-known UK employers in companies.
4. earningPotential: a summary of typical graduate earnings five years after graduation based on LEO data, careerSpecifics with one entry per career above (careerName, earningInfo), and an outlook paragraph on long-term prospects.

{markdown_note}"#;

/// Course list. Replace: {subjects}, {scope}, {scope_rule}
pub const COURSES_PROMPT_TEMPLATE: &str = r#"A student is taking the A-levels: {subjects}.

List 5 undergraduate degree courses {scope} that suit this combination: 4 popular choices and 1 less obvious one.
{scope_rule}

For each course give:
- courseName: the official course title
- universityName: the institution offering it
- url: the official course page on the university website
- typicalOffer: the typical A-level offer, e.g. "A*AA"
- requiredSubjects: A-level subjects that are required (empty list if none)
- recommendedSubjects: A-level subjects that are recommended or useful (empty list if none)
- gcseRequirements: any GCSE requirement, or "Standard requirements apply"

Return them under the key "courses"."#;

/// Skip-subject verdicts. Replace: {subjects}
pub const SKIP_PROMPT_TEMPLATE: &str = r#"A student is taking the A-levels: {subjects}.

For each of these subjects, decide whether a student could still study a closely related degree at a Russell Group university WITHOUT having taken that subject at A-level.
Give one verdict per subject, in the same order, with:
- subject: the subject name exactly as written above
- canSkip: true if it is often possible to start a related degree without the A-level
- reason: one or two sentences explaining why, citing typical entry requirements

Return them under the key "verdicts"."#;

/// What-if substitution. Replace: {subjects}, {replaced}, {new_subject}, {new_combination}, {markdown_note}
pub const WHAT_IF_PROMPT_TEMPLATE: &str = r#"A student's current A-levels are {subjects}. They are thinking about replacing "{replaced}" with "{new_subject}".

In scenarioStory, write a brief, inspirational story (1 to 2 paragraphs) describing the new opportunities and pathways the combination {new_combination} opens up, and what they would be giving up by dropping {replaced}.

{markdown_note}"#;

/// Entry requirements for one course. Replace: {course}, {university}
pub const REQUIREMENTS_PROMPT_TEMPLATE: &str = r#"What are the typical A-level entry requirements for the course "{course}" at "{university}"?

Give:
- requirements: the typical offer and any required subjects, e.g. "A*AA including Mathematics and Physics"
- link: the direct URL of the official course page on the university website"#;
