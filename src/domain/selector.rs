//! Selection queries over a branch set.
//!
//! Every query maps the input names through the parser and discards
//! non-matching entries before ordering by date. Callers pass `today`
//! explicitly where a query is anchored to the calendar.

use chrono::NaiveDate;

use crate::domain::branch::{parse_branch, BranchDescriptor, BranchKind};

fn matching(names: &[String], kind: BranchKind) -> Vec<BranchDescriptor> {
    names
        .iter()
        .filter_map(|n| parse_branch(n))
        .filter(|b| b.kind == kind)
        .collect()
}

fn descending_by_date(names: &[String], kind: BranchKind) -> Vec<BranchDescriptor> {
    let mut matches = matching(names, kind);
    matches.sort_by(|a, b| b.date.cmp(&a.date));
    matches
}

/// The branch of `kind` with the maximum date, if any. Ties are broken by
/// input order (stable sort).
pub fn latest_of_kind(names: &[String], kind: BranchKind) -> Option<BranchDescriptor> {
    descending_by_date(names, kind).into_iter().next()
}

/// The second-latest branch of `kind`; `None` with fewer than two matches.
pub fn previous_of_kind(names: &[String], kind: BranchKind) -> Option<BranchDescriptor> {
    descending_by_date(names, kind).into_iter().nth(1)
}

/// The branch of `kind` dated `today` or later with the minimum date.
/// Branches dated strictly before `today` are never returned, so a stale
/// dev/release branch cannot be picked as a merge destination.
pub fn closest_upcoming(
    names: &[String],
    kind: BranchKind,
    today: NaiveDate,
) -> Option<BranchDescriptor> {
    let mut upcoming: Vec<BranchDescriptor> = matching(names, kind)
        .into_iter()
        .filter(|b| b.date >= today)
        .collect();
    upcoming.sort_by(|a, b| a.date.cmp(&b.date));
    upcoming.into_iter().next()
}

/// The latest `limit` branches of `kind`, newest first.
pub fn latest_n(names: &[String], kind: BranchKind, limit: usize) -> Vec<BranchDescriptor> {
    let mut matches = descending_by_date(names, kind);
    matches.truncate(limit);
    matches
}
