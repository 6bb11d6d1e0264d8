//! Offset/limit pagination and the video listing query.

use serde::Serialize;
use uuid::Uuid;

use crate::{Error, Result};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: 1, limit: DEFAULT_PAGE_LIMIT } }
}

impl PageRequest {
  /// Validate optional query parameters. `page` must be ≥ 1 and `limit` in
  /// `1..=MAX_PAGE_LIMIT`.
  pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if page == 0 {
      return Err(Error::invalid("page must be at least 1"));
    }
    if limit == 0 || limit > MAX_PAGE_LIMIT {
      return Err(Error::invalid(format!(
        "limit must be between 1 and {MAX_PAGE_LIMIT}"
      )));
    }
    Ok(Self { page, limit })
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.limit)
  }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub page:  u32,
  pub limit: u32,
  pub total: u64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
    Self { items, page: request.page, limit: request.limit, total }
  }

  /// Replace the items while keeping the paging metadata.
  pub fn map_items<U>(self, items: Vec<U>) -> Page<U> {
    Page { items, page: self.page, limit: self.limit, total: self.total }
  }
}

// ─── Video listing ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
  #[default]
  CreatedAt,
  Views,
  Likes,
  Duration,
  Title,
}

impl VideoSort {
  pub fn parse(raw: &str) -> Result<Self> {
    match raw {
      "created_at" | "createdAt" => Ok(Self::CreatedAt),
      "views" => Ok(Self::Views),
      "likes" => Ok(Self::Likes),
      "duration" => Ok(Self::Duration),
      "title" => Ok(Self::Title),
      other => Err(Error::invalid(format!("unknown sort field: {other:?}"))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  pub fn parse(raw: &str) -> Result<Self> {
    match raw.to_ascii_lowercase().as_str() {
      "asc" => Ok(Self::Asc),
      "desc" => Ok(Self::Desc),
      other => Err(Error::invalid(format!("unknown sort order: {other:?}"))),
    }
  }
}

/// Parameters for [`VideoStore::list_videos`](crate::store::VideoStore::list_videos).
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
  /// Case-insensitive substring matched against title and description.
  pub text:           Option<String>,
  pub owner_id:       Option<Uuid>,
  pub sort:           VideoSort,
  pub order:          SortOrder,
  pub published_only: bool,
  pub page:           PageRequest,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_to_first_page_of_ten() {
    let p = PageRequest::new(None, None).unwrap();
    assert_eq!(p, PageRequest { page: 1, limit: 10 });
    assert_eq!(p.offset(), 0);
  }

  #[test]
  fn offset_skips_previous_pages() {
    let p = PageRequest::new(Some(3), Some(20)).unwrap();
    assert_eq!(p.offset(), 40);
  }

  #[test]
  fn rejects_out_of_range_values() {
    assert!(PageRequest::new(Some(0), None).is_err());
    assert!(PageRequest::new(None, Some(0)).is_err());
    assert!(PageRequest::new(None, Some(MAX_PAGE_LIMIT + 1)).is_err());
  }

  #[test]
  fn sort_parsing() {
    assert_eq!(VideoSort::parse("views").unwrap(), VideoSort::Views);
    assert_eq!(VideoSort::parse("createdAt").unwrap(), VideoSort::CreatedAt);
    assert!(VideoSort::parse("owner_id; DROP TABLE videos").is_err());
    assert_eq!(SortOrder::parse("ASC").unwrap(), SortOrder::Asc);
  }
}
