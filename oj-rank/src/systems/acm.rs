//! ACM-style grading: a problem is worth its full points when the first attempt
//! is accepted, half (rounded down) when the second is, and nothing otherwise.

use super::ScoringSystem;
use crate::data_processing::{Outcome, Problem, ProblemAttempt};

#[derive(Clone, Copy, Debug, Default)]
pub struct AcmScoring;

impl AcmScoring {
    pub fn points_for(outcomes: &[Outcome], max_points: f64) -> f64 {
        match outcomes.iter().position(|&o| o == Outcome::Accepted) {
            Some(0) => max_points,
            Some(1) => (max_points / 2.).floor(),
            _ => 0.,
        }
    }
}

impl ScoringSystem for AcmScoring {
    fn score_problem(&self, attempt: Option<&ProblemAttempt>, problem: &Problem) -> f64 {
        match attempt {
            Some(ProblemAttempt::Acm(outcomes)) => Self::points_for(outcomes, problem.max_points),
            Some(ProblemAttempt::Oi(_)) => {
                tracing::debug!("Ignoring a recorded score on ACM problem {}", problem.id);
                0.
            }
            None => 0.,
        }
    }
}
