use super::{ContestInfo, PageFetcher, RankSource, RawRecord};
use crate::error::Error;
use std::iter::FusedIterator;

/// One batch of rank records, as served by the rank endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct RankPage {
    pub offset: usize,
    pub records: Vec<RawRecord>,
    /// The number of records the service claimed to have when serving this page.
    pub total: usize,
}

/// Walks a contest's ranking page by page. The first page is always requested;
/// afterwards the walk stops as soon as the offset or the number of records
/// received reaches the most recently reported total, or a page comes back
/// empty. The first error is yielded and ends the walk.
pub struct RankPages<'a, S> {
    fetcher: &'a PageFetcher<S>,
    contest: &'a ContestInfo,
    offset: usize,
    fetched: usize,
    total: Option<usize>,
    finished: bool,
}

impl<'a, S: RankSource> RankPages<'a, S> {
    pub(super) fn new(fetcher: &'a PageFetcher<S>, contest: &'a ContestInfo) -> Self {
        Self {
            fetcher,
            contest,
            offset: 0,
            fetched: 0,
            total: None,
            finished: false,
        }
    }

    /// Records received so far.
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// The latest total reported by the service, if any page arrived yet.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    fn reached_end(&self) -> bool {
        match self.total {
            Some(total) => self.offset >= total || self.fetched >= total,
            None => false,
        }
    }
}

impl<S: RankSource> Iterator for RankPages<'_, S> {
    type Item = Result<RankPage, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.reached_end() {
            self.finished = true;
            return None;
        }
        match self.fetcher.fetch(self.contest, self.offset) {
            Ok(page) => {
                self.fetched += page.records.len();
                self.total = Some(page.total);
                self.offset += self.fetcher.limit();
                if page.records.is_empty() {
                    self.finished = true;
                }
                Some(Ok(page))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: RankSource> FusedIterator for RankPages<'_, S> {}
