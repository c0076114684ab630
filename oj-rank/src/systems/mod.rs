mod acm;
mod oi;

pub use acm::AcmScoring;
pub use oi::OiScoring;

use crate::data_processing::{
    Problem, ProblemAttempt, ProblemId, ProblemSet, RankRow, RankTable, RuleType,
};
use crate::error::Error;
use std::collections::{BTreeMap, HashMap};

/// A grading policy, applied independently to every (submitter, problem) pair.
pub trait ScoringSystem: std::fmt::Debug {
    /// Points earned on `problem`; `attempt` is `None` when the submitter never tried it.
    fn score_problem(&self, attempt: Option<&ProblemAttempt>, problem: &Problem) -> f64;
}

/// A rank row together with its derived points.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredRow {
    pub row: RankRow,
    /// One entry per problem of the contest, including untried ones.
    pub points: BTreeMap<ProblemId, f64>,
    pub total: f64,
}

impl ScoredRow {
    pub fn username(&self) -> &str {
        &self.row.submitter.username
    }

    pub fn points_for(&self, problem: ProblemId) -> f64 {
        self.points.get(&problem).copied().unwrap_or(0.)
    }
}

pub type ScoredTable = HashMap<String, ScoredRow>;

pub fn get_scoring_system(rule_type: RuleType) -> Box<dyn ScoringSystem> {
    match rule_type {
        RuleType::Acm => Box::new(AcmScoring),
        RuleType::Oi => Box::new(OiScoring),
    }
}

pub fn get_scoring_system_by_name(name: &str) -> Result<Box<dyn ScoringSystem>, Error> {
    name.parse().map(get_scoring_system)
}

pub fn score_row(row: RankRow, problems: &ProblemSet, system: &dyn ScoringSystem) -> ScoredRow {
    let points: BTreeMap<ProblemId, f64> = problems
        .iter()
        .map(|problem| (problem.id, system.score_problem(row.attempt(problem.id), problem)))
        .collect();
    let total = problems.iter().map(|problem| points[&problem.id]).sum();
    ScoredRow { row, points, total }
}

pub fn score_table(
    table: RankTable,
    problems: &ProblemSet,
    system: &dyn ScoringSystem,
) -> ScoredTable {
    table
        .into_iter()
        .map(|(username, row)| (username, score_row(row, problems, system)))
        .collect()
}

/// Scores a frozen ranking under the contest's rule type.
#[tracing::instrument(name = "Scoring contest ranks", skip(table, problems))]
pub fn score(table: RankTable, problems: &ProblemSet, rule_type: RuleType) -> ScoredTable {
    let system = get_scoring_system(rule_type);
    score_table(table, problems, &*system)
}
