use crate::data_processing::{ContestInfo, PageFetcher, RankRow, RankSource, RankTable, RawRecord};
use crate::error::Error;

/// Inconsistencies in the service's answers that don't stop the aggregation.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("reported total changed from {previous} to {current} at offset {offset}")]
    TotalChanged {
        offset: usize,
        previous: usize,
        current: usize,
    },
    #[error("pagination ended after {fetched} of {total} reported records")]
    ShortPagination { fetched: usize, total: usize },
}

/// The complete ranking of one contest.
#[derive(Debug)]
pub struct Aggregation {
    pub table: RankTable,
    /// The last total reported by the service.
    pub total: usize,
    /// Records received over all pages, before merging.
    pub fetched: usize,
    pub pages: usize,
    pub violations: Vec<InvariantViolation>,
}

impl Aggregation {
    pub fn into_table(self) -> RankTable {
        self.table
    }
}

fn merge_record(table: &mut RankTable, record: RawRecord) {
    table
        .entry(record.submitter.username.clone())
        .or_insert_with(|| RankRow::new(record.submitter.clone()))
        .merge(record);
}

/// Pulls every page of the contest's ranking and merges them into one row per
/// submitter. Any fetch error aborts the whole aggregation.
#[tracing::instrument(
    name = "Aggregating contest ranks",
    skip(fetcher, contest),
    fields(contest_id = contest.id, rule_type = %contest.rule_type)
)]
pub fn aggregate<S: RankSource>(
    fetcher: &PageFetcher<S>,
    contest: &ContestInfo,
) -> Result<Aggregation, Error> {
    let mut table = RankTable::new();
    let mut violations = vec![];
    let mut pages = 0;

    let mut walk = fetcher.pages(contest);
    loop {
        let previous = walk.total();
        let Some(page) = walk.next() else { break };
        let page = page?;
        pages += 1;
        if let Some(previous) = previous {
            if previous != page.total {
                let violation = InvariantViolation::TotalChanged {
                    offset: page.offset,
                    previous,
                    current: page.total,
                };
                tracing::warn!("Contest {}: {}", contest.id, violation);
                violations.push(violation);
            }
        }
        for record in page.records {
            merge_record(&mut table, record);
        }
    }

    let total = walk.total().unwrap_or(0);
    let fetched = walk.fetched();
    if fetched < total {
        let violation = InvariantViolation::ShortPagination { fetched, total };
        tracing::warn!("Contest {}: {}", contest.id, violation);
        violations.push(violation);
    }
    tracing::info!(
        "Aggregated {} submitters from {} records over {} pages",
        table.len(),
        fetched,
        pages
    );

    Ok(Aggregation {
        table,
        total,
        fetched,
        pages,
        violations,
    })
}
