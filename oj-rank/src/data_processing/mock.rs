//! In-memory stand-ins for the judging service.

use super::{ApiReply, Method, ProblemId, RankSource};
use crate::error::Error;
use serde_json::{Value, json};
use std::cell::RefCell;

type Params = Vec<(String, String)>;

fn owned(params: &[(&str, String)]) -> Params {
    params
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

fn param(params: &[(&str, String)], key: &str) -> usize {
    params
        .iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0)
}

/// Serves a fixed list of rank records through the paginated rank endpoint.
pub struct MockRanks {
    records: Vec<Value>,
    /// Totals to report on successive calls; the last one repeats.
    totals: Vec<usize>,
    requests: RefCell<Vec<Params>>,
}

impl MockRanks {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            totals: vec![],
            requests: RefCell::new(vec![]),
        }
    }

    pub fn with_totals(mut self, totals: Vec<usize>) -> Self {
        self.totals = totals;
        self
    }

    pub fn requests(&self) -> Vec<Params> {
        self.requests.borrow().clone()
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|params| params.iter().find(|(k, _)| k == "offset"))
            .map(|(_, v)| v.parse().unwrap())
            .collect()
    }
}

impl RankSource for MockRanks {
    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<ApiReply, Error> {
        assert_eq!(method, Method::Get);
        assert_eq!(path, "/api/contest_rank");
        let call = self.requests.borrow().len();
        self.requests.borrow_mut().push(owned(params));

        let offset = param(params, "offset");
        let limit = param(params, "limit");
        let start = offset.min(self.records.len());
        let end = (offset + limit).min(self.records.len());
        let total = match self.totals.get(call).or(self.totals.last()) {
            Some(&total) => total,
            None => self.records.len(),
        };
        Ok(ApiReply {
            status: 200,
            body: json!({
                "error": null,
                "data": {"results": &self.records[start..end], "total": total},
            }),
        })
    }
}

/// Answers every request with the same reply.
pub struct FixedReply {
    reply: ApiReply,
    last: RefCell<Option<(String, Params)>>,
}

impl FixedReply {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            reply: ApiReply { status, body },
            last: RefCell::new(None),
        }
    }

    pub fn last_request(&self) -> Option<(String, Params)> {
        self.last.borrow().clone()
    }
}

impl RankSource for FixedReply {
    fn request(
        &self,
        _method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<ApiReply, Error> {
        *self.last.borrow_mut() = Some((path.to_owned(), owned(params)));
        Ok(self.reply.clone())
    }
}

/// An ACM rank entry: `(problem, error_number, is_ac)` per problem.
pub fn acm_record(username: &str, problems: &[(ProblemId, usize, bool)]) -> Value {
    let info: serde_json::Map<String, Value> = problems
        .iter()
        .map(|&(id, error_number, is_ac)| {
            let entry = json!({"is_ac": is_ac, "error_number": error_number, "ac_time": 0});
            (id.to_string(), entry)
        })
        .collect();
    json!({
        "user": {"id": 1, "username": username, "real_name": null},
        "submission_info": info,
    })
}

/// An OI rank entry: `(problem, score)` per problem.
pub fn oi_record(username: &str, problems: &[(ProblemId, f64)]) -> Value {
    let info: serde_json::Map<String, Value> = problems
        .iter()
        .map(|&(id, score)| (id.to_string(), json!(score)))
        .collect();
    let total: f64 = problems.iter().map(|&(_, score)| score).sum();
    json!({
        "user": {"id": 1, "username": username, "real_name": null},
        "submission_info": info,
        "total_score": total,
    })
}
