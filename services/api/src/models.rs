//! API models for request and response payloads

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

pub mod city;
pub mod event;
pub mod message;
pub mod venue;
pub mod vote;

/// Largest page size accepted by listing endpoints
pub const MAX_PAGE_SIZE: u32 = 100;

/// Kind of record that can carry votes and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Event,
    Venue,
}

impl TargetKind {
    /// Value stored in `target_kind` columns
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Event => "event",
            TargetKind::Venue => "venue",
        }
    }

    /// Table holding records of this kind
    pub fn table(&self) -> &'static str {
        match self {
            TargetKind::Event => "events",
            TargetKind::Venue => "venues",
        }
    }

    /// Name used in user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            TargetKind::Event => "Event",
            TargetKind::Venue => "Venue",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vote or message target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub kind: TargetKind,
    pub id: Uuid,
}

impl Target {
    pub fn event(id: Uuid) -> Self {
        Target {
            kind: TargetKind::Event,
            id,
        }
    }

    pub fn venue(id: Uuid) -> Self {
        Target {
            kind: TargetKind::Venue,
            id,
        }
    }
}

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamp raw query values: page starts at 1, limit in `1..=MAX_PAGE_SIZE`
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

/// Pagination block returned with listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = i64::from(request.limit);
        Pagination {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

/// Public projection of a record's author
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(
            PageRequest::new(None, None, 20),
            PageRequest { page: 1, limit: 20 }
        );
        assert_eq!(
            PageRequest::new(Some(0), Some(0), 20),
            PageRequest { page: 1, limit: 1 }
        );
        assert_eq!(PageRequest::new(Some(3), Some(500), 20).limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(Some(3), Some(10), 20).offset(), 20);
    }

    #[test]
    fn test_pagination_pages_round_up() {
        let request = PageRequest::new(Some(1), Some(10), 20);
        assert_eq!(Pagination::new(request, 0).pages, 0);
        assert_eq!(Pagination::new(request, 10).pages, 1);
        assert_eq!(Pagination::new(request, 11).pages, 2);
    }

    #[test]
    fn test_target_kind_names() {
        assert_eq!(TargetKind::Event.table(), "events");
        assert_eq!(TargetKind::Venue.as_str(), "venue");
        assert_eq!(Target::venue(Uuid::nil()).kind, TargetKind::Venue);
    }
}
