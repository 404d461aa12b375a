//! Searching, filtering, sorting and paging of pending-change lists.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use crate::changes::{extract_changes, ExtractorProfile};
use crate::models::{ApprovalStatus, ChangeKind, PendingChangeRecord};
use crate::utils::{cmp_ignore_case, contains_ignore_case};

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeSortColumn {
    #[default]
    ModifiedAt,
    ModifiedBy,
    Subject,
}

impl ChangeSortColumn {
    pub fn next(&self) -> Self {
        match self {
            ChangeSortColumn::ModifiedAt => ChangeSortColumn::ModifiedBy,
            ChangeSortColumn::ModifiedBy => ChangeSortColumn::Subject,
            ChangeSortColumn::Subject => ChangeSortColumn::ModifiedAt,
        }
    }
}

impl FromStr for ChangeSortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "modifiedat" | "modified" | "date" => Ok(ChangeSortColumn::ModifiedAt),
            "modifiedby" | "by" | "user" => Ok(ChangeSortColumn::ModifiedBy),
            "subject" | "id" => Ok(ChangeSortColumn::Subject),
            other => Err(format!(
                "unknown sort column '{}' (expected modified-at, modified-by or subject)",
                other
            )),
        }
    }
}

/// What to show from a pending-change list
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub search: String,
    pub status: Option<ApprovalStatus>,
    pub sort: ChangeSortColumn,
    pub ascending: bool,
    /// 1-based
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: Some(ApprovalStatus::Pending),
            sort: ChangeSortColumn::ModifiedAt,
            // Newest first
            ascending: false,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    /// Matching items across all pages
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Cut one page out of an already filtered and sorted list.
/// A page past the end is empty.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = items.len();
    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();
    Page {
        items,
        page,
        per_page,
        total,
    }
}

/// Apply a query to the records of one family
pub fn list_changes<'a>(
    records: &'a [PendingChangeRecord],
    kind: ChangeKind,
    query: &ListQuery,
) -> Page<&'a PendingChangeRecord> {
    let mut rows: Vec<&PendingChangeRecord> = records
        .iter()
        .filter(|r| query.status.map_or(true, |wanted| wanted == r.approval_status))
        .collect();

    if !query.search.trim().is_empty() {
        let needle = query.search.trim().to_lowercase();
        let profile = ExtractorProfile::for_kind(kind);
        rows.retain(|r| record_matches_search(r, &needle, &profile));
    }

    rows.sort_by(|a, b| {
        let cmp = match query.sort {
            ChangeSortColumn::ModifiedAt => modified_time(a).cmp(&modified_time(b)),
            ChangeSortColumn::ModifiedBy => cmp_ignore_case(&a.modified_by_display(), &b.modified_by_display()),
            ChangeSortColumn::Subject => cmp_ignore_case(&a.subject_display(), &b.subject_display()),
        }
        .then_with(|| cmp_ids(a, b));

        if query.ascending {
            cmp
        } else {
            cmp.reverse()
        }
    });

    paginate(rows, query.page, query.per_page)
}

/// Searches subject id, modifier and the labels of changed fields
fn record_matches_search(record: &PendingChangeRecord, needle: &str, profile: &ExtractorProfile) -> bool {
    contains_ignore_case(&record.subject_display(), needle)
        || contains_ignore_case(&record.modified_by_display(), needle)
        || extract_changes(&record.updated_data, profile)
            .iter()
            .any(|change| contains_ignore_case(&change.field, needle))
}

fn modified_time(record: &PendingChangeRecord) -> Option<DateTime<FixedOffset>> {
    record
        .modified_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
}

fn cmp_ids(a: &PendingChangeRecord, b: &PendingChangeRecord) -> Ordering {
    cmp_ignore_case(&a.id.as_key(), &b.id.as_key())
}
