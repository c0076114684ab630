#[cfg(test)]
pub(crate) mod mock;
mod oj_api;
mod pages;

pub use oj_api::{
    ContestProblem, PAGE_LIMIT, PageFetcher, fetch_contest_problems, fetch_contests,
};
pub use pages::{RankPage, RankPages};

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// The service's primary key for a problem.
pub type ProblemId = u64;

/// Aggregated rows of one contest, keyed by submitter identity.
pub type RankTable = HashMap<String, RankRow>;

/// How a contest is graded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleType {
    /// Only the position of the first accepted attempt matters.
    Acm,
    /// The judge reports a score per problem, used unmodified.
    Oi,
}

impl RuleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acm => "ACM",
            Self::Oi => "OI",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACM" => Ok(Self::Acm),
            "OI" => Ok(Self::Oi),
            _ => Err(Error::UnknownRuleType(s.to_owned())),
        }
    }
}

/// A contest as listed by the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContestInfo {
    pub id: u64,
    pub title: String,
    pub rule_type: RuleType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submitter {
    /// Unique within a contest; the aggregation key.
    pub username: String,
    pub display_name: Option<String>,
}

impl Submitter {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected,
}

/// What the service knows about one submitter on one problem.
#[derive(Clone, Debug, PartialEq)]
pub enum ProblemAttempt {
    /// Submission outcomes in chronological order.
    Acm(Vec<Outcome>),
    /// The current best score.
    Oi(f64),
}

impl ProblemAttempt {
    /// Reconstructs the attempt sequence from the counters the service reports:
    /// `rejections` failed submissions, then one acceptance if `accepted`.
    pub fn from_counts(rejections: usize, accepted: bool) -> Self {
        let mut outcomes = vec![Outcome::Rejected; rejections];
        if accepted {
            outcomes.push(Outcome::Accepted);
        }
        Self::Acm(outcomes)
    }

    /// Folds newer data for the same problem into this entry.
    fn merge(&mut self, newer: ProblemAttempt) {
        match (self, newer) {
            (Self::Acm(outcomes), Self::Acm(more)) => outcomes.extend(more),
            (slot, newer) => *slot = newer,
        }
    }
}

/// One decoded record of a rank page.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRecord {
    pub submitter: Submitter,
    pub entries: Vec<(ProblemId, ProblemAttempt)>,
}

/// One submitter's record across all problems of a contest.
#[derive(Clone, Debug, PartialEq)]
pub struct RankRow {
    pub submitter: Submitter,
    pub problems: BTreeMap<ProblemId, ProblemAttempt>,
}

impl RankRow {
    pub fn new(submitter: Submitter) -> Self {
        Self {
            submitter,
            problems: BTreeMap::new(),
        }
    }

    /// Merges a record for the same submitter: attempt sequences are appended,
    /// recorded scores are replaced by the latest value.
    pub fn merge(&mut self, record: RawRecord) {
        if record.submitter.display_name.is_some() {
            self.submitter.display_name = record.submitter.display_name;
        }
        for (problem, attempt) in record.entries {
            match self.problems.get_mut(&problem) {
                Some(existing) => existing.merge(attempt),
                None => {
                    self.problems.insert(problem, attempt);
                }
            }
        }
    }

    pub fn attempt(&self, problem: ProblemId) -> Option<&ProblemAttempt> {
        self.problems.get(&problem)
    }
}

/// A column of the report.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    pub id: ProblemId,
    /// Column header.
    pub label: String,
    /// Points for a first-attempt acceptance under ACM rules.
    pub max_points: f64,
}

/// The problems of a contest in their declared order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProblemSet {
    problems: Vec<Problem>,
}

fn problem_ids(table: &RankTable) -> BTreeSet<ProblemId> {
    table
        .values()
        .flat_map(|row| row.problems.keys().copied())
        .collect()
}

impl ProblemSet {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    /// Every problem that appears in the table, in numeric order,
    /// labelled `problem1`, `problem2`, ...
    pub fn from_table(table: &RankTable, full_points: f64) -> Self {
        let problems = problem_ids(table)
            .into_iter()
            .enumerate()
            .map(|(idx, id)| Problem {
                id,
                label: format!("problem{}", idx + 1),
                max_points: full_points,
            })
            .collect();
        Self { problems }
    }

    /// Problems in the order the contest declares them. Problems that show up
    /// in the table without being listed are appended so no data is dropped.
    pub fn from_listing(
        listing: Vec<ContestProblem>,
        table: &RankTable,
        rule_type: RuleType,
        full_points: f64,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let mut problems = Vec::with_capacity(listing.len());
        for listed in listing {
            if !seen.insert(listed.id) {
                tracing::warn!("Problem {} is listed twice", listed.id);
                continue;
            }
            let max_points = match rule_type {
                RuleType::Acm => full_points,
                RuleType::Oi => listed.total_score,
            };
            problems.push(Problem {
                id: listed.id,
                label: listed.display_id,
                max_points,
            });
        }
        for id in problem_ids(table) {
            if seen.insert(id) {
                tracing::warn!("Problem {} has rank data but isn't listed", id);
                problems.push(Problem {
                    id,
                    label: id.to_string(),
                    max_points: full_points,
                });
            }
        }
        Self { problems }
    }

    /// Splits a points budget evenly among all problems.
    pub fn spread(mut self, budget: f64) -> Self {
        let share = if self.problems.is_empty() {
            0.
        } else {
            budget / self.problems.len() as f64
        };
        for problem in &mut self.problems {
            problem.max_points = share;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Problem> {
        self.problems.iter()
    }
}

impl<'a> IntoIterator for &'a ProblemSet {
    type Item = &'a Problem;
    type IntoIter = std::slice::Iter<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// What the transport hands back for one request.
#[derive(Clone, Debug)]
pub struct ApiReply {
    pub status: u16,
    pub body: serde_json::Value,
}

/// An authenticated request function against the judging service.
/// Implementations own cookies, credentials and any CSRF handling.
pub trait RankSource {
    fn request(&self, method: Method, path: &str, params: &[(&str, String)])
    -> Result<ApiReply, Error>;
}

impl<S: RankSource + ?Sized> RankSource for &S {
    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<ApiReply, Error> {
        (**self).request(method, path, params)
    }
}

impl<S: RankSource + ?Sized> RankSource for Box<S> {
    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<ApiReply, Error> {
        (**self).request(method, path, params)
    }
}
