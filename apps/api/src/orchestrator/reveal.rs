//! Progressive-disclosure gates for the result sections.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A gated result section. Stage 1 (the subject form) is always visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum Stage {
    /// Future story and university courses.
    Two,
    /// Careers and earning potential.
    Three,
    /// Skip-subject verdicts and what-if.
    Four,
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            2 => Ok(Stage::Two),
            3 => Ok(Stage::Three),
            4 => Ok(Stage::Four),
            other => Err(format!("stage must be 2, 3 or 4 (got {other})")),
        }
    }
}

/// The three gates. Only ever opened, in order, within one analysis cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevealState {
    section2: bool,
    section3: bool,
    section4: bool,
}

impl RevealState {
    /// State right after a successful analysis: stage 2 open.
    pub fn initial_ready() -> Self {
        Self {
            section2: true,
            ..Self::default()
        }
    }

    pub fn is_open(&self, stage: Stage) -> bool {
        match stage {
            Stage::Two => self.section2,
            Stage::Three => self.section3,
            Stage::Four => self.section4,
        }
    }

    /// Number of open gates (0..=3).
    pub fn level(&self) -> u8 {
        [self.section2, self.section3, self.section4]
            .iter()
            .filter(|open| **open)
            .count() as u8
    }

    /// No later gate is open while an earlier one is closed.
    pub fn is_consistent(&self) -> bool {
        (!self.section4 || self.section3) && (!self.section3 || self.section2)
    }

    /// Opens `stage`. Already-open stages are a no-op; skipping ahead is rejected.
    pub fn open(&mut self, stage: Stage) -> Result<(), AppError> {
        let prerequisite_open = match stage {
            Stage::Two => true,
            Stage::Three => self.section2,
            Stage::Four => self.section3,
        };
        if !prerequisite_open {
            return Err(AppError::Validation(
                "Reveal the earlier sections first.".to_string(),
            ));
        }
        match stage {
            Stage::Two => self.section2 = true,
            Stage::Three => self.section3 = true,
            Stage::Four => self.section4 = true,
        }
        Ok(())
    }
}
