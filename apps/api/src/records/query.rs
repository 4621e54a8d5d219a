//! Filtering, sorting and paging over entity records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::record::{EntityRecord, RecordKind};
use crate::pipeline::progress::RoundStatus;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    #[default]
    CreatedAt,
    UpdatedAt,
    Round,
    Status,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordQuery {
    pub kind: Option<RecordKind>,
    pub status: Option<RoundStatus>,
    pub pipeline_id: Option<Uuid>,
    pub tag: Option<String>,
    /// Case-insensitive substring over name and email.
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub order: SortOrder,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordPage {
    pub records: Vec<EntityRecord>,
    pub pagination: Pagination,
}

impl RecordQuery {
    pub fn matches(&self, record: &EntityRecord) -> bool {
        if self.kind.is_some_and(|k| k != record.kind) {
            return false;
        }
        if self.status.is_some_and(|s| s != record.progress.status) {
            return false;
        }
        if self.pipeline_id.is_some_and(|p| p != record.pipeline_id) {
            return false;
        }
        if let Some(tag) = self.tag.as_deref().filter(|t| !t.trim().is_empty()) {
            if !record.tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim())) {
                return false;
            }
        }
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let in_name = record.name.to_lowercase().contains(&needle);
            let in_email = record
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&needle));
            if !in_name && !in_email {
                return false;
            }
        }
        true
    }

    pub fn sort(&self, records: &mut [EntityRecord]) {
        records.sort_by(|a, b| {
            let ord = match self.sort {
                SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Round => a.progress.current_round.cmp(&b.progress.current_round),
                SortField::Status => a.progress.status.as_str().cmp(b.progress.status.as_str()),
            };
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Filters, sorts and slices `records` into one page.
    pub fn apply(&self, records: Vec<EntityRecord>) -> RecordPage {
        let mut matching: Vec<EntityRecord> =
            records.into_iter().filter(|r| self.matches(r)).collect();
        self.sort(&mut matching);

        let page = self.page();
        let page_size = self.page_size();
        let total = matching.len() as u32;
        let total_pages = total.div_ceil(page_size);

        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let records = matching
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        RecordPage {
            records,
            pagination: Pagination {
                page,
                page_size,
                total,
                total_pages,
            },
        }
    }
}
