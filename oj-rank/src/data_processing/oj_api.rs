use super::{
    ApiReply, ContestInfo, Method, ProblemAttempt, ProblemId, RankPage, RankPages, RankSource,
    RawRecord, RuleType, Submitter,
};
use crate::error::Error;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::convert::TryFrom;

/// The largest page the rank endpoint will serve.
pub const PAGE_LIMIT: usize = 250;

const RANK_PATH: &str = "/api/contest_rank";
const CONTESTS_PATH: &str = "/api/contests";
const CONTEST_PROBLEMS_PATH: &str = "/api/contest/problem";

/// General response from the OnlineJudge API: `error` is null on success,
/// otherwise `data` usually holds a human-readable message.
#[derive(Deserialize)]
struct OJResponse {
    error: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

/// Paginated payload, returned whenever `limit` is part of the query.
#[derive(Deserialize)]
struct OJPage<T> {
    results: Vec<T>,
    total: usize,
}

#[derive(Deserialize)]
struct OJUser {
    username: String,
    #[serde(default)]
    real_name: Option<String>,
}

/// A rank entry of an ACM contest.
#[derive(Deserialize)]
struct OJAcmRank {
    user: OJUser,
    #[serde(default)]
    submission_info: HashMap<String, OJAcmProblem>,
}

#[derive(Deserialize)]
struct OJAcmProblem {
    is_ac: bool,
    #[serde(default)]
    error_number: usize,
}

/// A rank entry of an OI contest: problem id to best score.
#[derive(Deserialize)]
struct OJOiRank {
    user: OJUser,
    #[serde(default)]
    submission_info: HashMap<String, f64>,
}

/// A problem as listed for a contest.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ContestProblem {
    pub id: ProblemId,
    /// The short name shown to contestants, e.g. "A" or "1001".
    #[serde(rename = "_id")]
    pub display_id: String,
    pub title: String,
    #[serde(default)]
    pub total_score: f64,
}

impl From<OJUser> for Submitter {
    fn from(user: OJUser) -> Self {
        Self {
            username: user.username,
            display_name: user.real_name.filter(|name| !name.trim().is_empty()),
        }
    }
}

fn parse_problem_id(key: &str) -> Result<ProblemId, Error> {
    key.parse()
        .map_err(|_| Error::Transport(format!("Problem id '{}' is not numeric", key)))
}

fn collect_entries(
    info: impl IntoIterator<Item = (String, ProblemAttempt)>,
) -> Result<Vec<(ProblemId, ProblemAttempt)>, Error> {
    let mut entries = info
        .into_iter()
        .map(|(key, attempt)| Ok((parse_problem_id(&key)?, attempt)))
        .collect::<Result<Vec<_>, Error>>()?;
    entries.sort_by_key(|&(id, _)| id);
    Ok(entries)
}

impl TryFrom<OJAcmRank> for RawRecord {
    type Error = Error;

    fn try_from(rank: OJAcmRank) -> Result<Self, Self::Error> {
        let entries = collect_entries(rank.submission_info.into_iter().map(|(key, info)| {
            (key, ProblemAttempt::from_counts(info.error_number, info.is_ac))
        }))?;
        Ok(Self {
            submitter: rank.user.into(),
            entries,
        })
    }
}

impl TryFrom<OJOiRank> for RawRecord {
    type Error = Error;

    fn try_from(rank: OJOiRank) -> Result<Self, Self::Error> {
        let entries = collect_entries(
            rank.submission_info
                .into_iter()
                .map(|(key, score)| (key, ProblemAttempt::Oi(score))),
        )?;
        Ok(Self {
            submitter: rank.user.into(),
            entries,
        })
    }
}

fn is_auth_failure(error: &str, message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    error == "permission-denied" || message.contains("login") || message.contains("session")
}

/// Checks the status and envelope of a reply, and decodes its `data` into `T`.
fn unpack<T: DeserializeOwned>(reply: ApiReply, what: &str) -> Result<T, Error> {
    match reply.status {
        200..=299 => {}
        401 | 403 => {
            return Err(Error::Auth(format!(
                "{} was refused with HTTP status {}",
                what, reply.status
            )));
        }
        status => {
            return Err(Error::Transport(format!(
                "{} failed with HTTP status {}",
                what, status
            )));
        }
    }
    let packet: OJResponse = serde_json::from_value(reply.body).map_err(|e| {
        Error::Transport(format!(
            "{} response doesn't match the expected JSON schema: {}",
            what, e
        ))
    })?;
    if let Some(error) = packet.error {
        let message = packet.data.as_str().unwrap_or(&error);
        return Err(if is_auth_failure(&error, message) {
            Error::Auth(format!("{}: {}", what, message))
        } else {
            Error::Transport(format!("{} reported '{}': {}", what, error, message))
        });
    }
    serde_json::from_value(packet.data).map_err(|e| {
        Error::Transport(format!(
            "{} data doesn't match the expected JSON schema: {}",
            what, e
        ))
    })
}

fn decode_records<T>(page: OJPage<T>) -> Result<(Vec<RawRecord>, usize), Error>
where
    RawRecord: TryFrom<T, Error = Error>,
{
    let records = page
        .results
        .into_iter()
        .map(RawRecord::try_from)
        .collect::<Result<_, _>>()?;
    Ok((records, page.total))
}

/// Requests pages of a contest's ranking, one bounded request at a time.
pub struct PageFetcher<S> {
    source: S,
    limit: usize,
}

impl<S: RankSource> PageFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            limit: PAGE_LIMIT,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Retrieves the page of `contest`'s ranking that starts at `offset`.
    /// Failures are never retried here.
    #[tracing::instrument(
        name = "Fetching a rank page",
        skip(self, contest),
        fields(contest_id = contest.id, limit = self.limit)
    )]
    pub fn fetch(&self, contest: &ContestInfo, offset: usize) -> Result<RankPage, Error> {
        let params = [
            ("offset", offset.to_string()),
            ("limit", self.limit.to_string()),
            ("contest_id", contest.id.to_string()),
        ];
        let reply = self.source.request(Method::Get, RANK_PATH, &params)?;
        let what = format!("Rank page of contest {} at offset {}", contest.id, offset);
        let (records, total) = match contest.rule_type {
            RuleType::Acm => decode_records(unpack::<OJPage<OJAcmRank>>(reply, &what)?)?,
            RuleType::Oi => decode_records(unpack::<OJPage<OJOiRank>>(reply, &what)?)?,
        };
        tracing::debug!("Received {} of {} records", records.len(), total);
        Ok(RankPage {
            offset,
            records,
            total,
        })
    }

    /// A fresh pass over all pages of the contest, starting from offset 0.
    pub fn pages<'a>(&'a self, contest: &'a ContestInfo) -> RankPages<'a, S> {
        RankPages::new(self, contest)
    }
}

/// Lists the contests of the given rule type that the session can see.
#[tracing::instrument(name = "Listing contests", skip(source))]
pub fn fetch_contests(
    source: &impl RankSource,
    rule_type: RuleType,
) -> Result<Vec<ContestInfo>, Error> {
    let params = [
        ("offset", "0".to_owned()),
        ("limit", "100".to_owned()),
        ("keyword", String::new()),
        ("rule_type", rule_type.to_string()),
        ("status", String::new()),
    ];
    let reply = source.request(Method::Get, CONTESTS_PATH, &params)?;
    let page: OJPage<ContestInfo> = unpack(reply, "Contest listing")?;
    Ok(page.results)
}

/// Lists a contest's problems in their declared order.
#[tracing::instrument(name = "Listing contest problems", skip(source))]
pub fn fetch_contest_problems(
    source: &impl RankSource,
    contest_id: u64,
) -> Result<Vec<ContestProblem>, Error> {
    let params = [("contest_id", contest_id.to_string())];
    let reply = source.request(Method::Get, CONTEST_PROBLEMS_PATH, &params)?;
    unpack(reply, &format!("Problem listing of contest {}", contest_id))
}
