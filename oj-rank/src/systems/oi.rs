//! OI-style grading: the judge's score for a problem is used as is.

use super::ScoringSystem;
use crate::data_processing::{Problem, ProblemAttempt};

#[derive(Clone, Copy, Debug, Default)]
pub struct OiScoring;

impl ScoringSystem for OiScoring {
    fn score_problem(&self, attempt: Option<&ProblemAttempt>, problem: &Problem) -> f64 {
        match attempt {
            Some(&ProblemAttempt::Oi(score)) => score,
            Some(ProblemAttempt::Acm(_)) => {
                tracing::debug!("Ignoring attempt outcomes on OI problem {}", problem.id);
                0.
            }
            None => 0.,
        }
    }
}
