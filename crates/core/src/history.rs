//! Pure helpers over search history: query validation, distinct recent
//! queries, and aggregate statistics.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::ValidationErrors;
use crate::policy::MAX_QUERY_LENGTH;
use crate::types::Timestamp;

/// Borrowed view of one history entry, enough to compute aggregates.
#[derive(Debug, Clone, Copy)]
pub struct HistoryRecord<'a> {
    pub query: &'a str,
    pub category: Option<&'a str>,
    pub result_count: u32,
    pub timestamp: Timestamp,
}

/// Read-time aggregate over a user's full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatistics {
    pub total_searches: usize,
    pub unique_queries: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub average_result_count: u32,
    pub most_recent_search: Option<Timestamp>,
}

impl Default for HistoryStatistics {
    fn default() -> Self {
        Self {
            total_searches: 0,
            unique_queries: 0,
            category_counts: BTreeMap::new(),
            average_result_count: 0,
            most_recent_search: None,
        }
    }
}

/// Check a raw search query. Length is measured in characters after
/// trimming.
pub fn validate_query(query: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let len = query.trim().chars().count();
    errors.check(len == 0, "query is required");
    errors.check(
        len > MAX_QUERY_LENGTH,
        format!("query must be at most {MAX_QUERY_LENGTH} characters"),
    );
    errors
}

/// Distinct queries in the order given, compared case-insensitively.
///
/// The first spelling seen is the one returned. Feed entries newest-first
/// to get the most recent distinct queries.
pub fn unique_recent_queries<'a, I>(queries: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for query in queries {
        if unique.len() >= limit {
            break;
        }
        if seen.insert(query.to_lowercase()) {
            unique.push(query.to_string());
        }
    }
    unique
}

/// Aggregate statistics over every record supplied.
///
/// `average_result_count` is rounded to the nearest integer; entries with
/// no category are not counted in `category_counts`.
pub fn compute_statistics(records: &[HistoryRecord<'_>]) -> HistoryStatistics {
    if records.is_empty() {
        return HistoryStatistics::default();
    }

    let unique_queries = records
        .iter()
        .map(|r| r.query.to_lowercase())
        .collect::<HashSet<_>>()
        .len();

    let mut category_counts = BTreeMap::new();
    for category in records.iter().filter_map(|r| r.category) {
        *category_counts.entry(category.to_string()).or_insert(0) += 1;
    }

    let total: u64 = records.iter().map(|r| u64::from(r.result_count)).sum();
    let average_result_count = (total as f64 / records.len() as f64).round() as u32;

    HistoryStatistics {
        total_searches: records.len(),
        unique_queries,
        category_counts,
        average_result_count,
        most_recent_search: records.iter().map(|r| r.timestamp).max(),
    }
}
