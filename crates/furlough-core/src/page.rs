//! Pagination and sort-order parameters shared by every listing.

use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_SIZE: u32 = 10;

/// A 1-based page request. Always has `page >= 1` and `size >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u32,
  pub size: u32,
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: DEFAULT_PAGE, size: DEFAULT_SIZE } }
}

impl PageRequest {
  /// Build from raw query-string values. Absent, non-numeric and non-positive
  /// values silently fall back to the defaults.
  pub fn from_query(page: Option<&str>, size: Option<&str>) -> Self {
    Self {
      page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
      size: parse_positive(size).unwrap_or(DEFAULT_SIZE),
    }
  }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.size) }

  pub fn limit(&self) -> u64 { u64::from(self.size) }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
  raw
    .and_then(|s| s.trim().parse::<u32>().ok())
    .filter(|n| *n > 0)
}

/// Sort direction over creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  /// Absent means [`SortOrder::Desc`]; a value other than `asc`/`desc`
  /// (case-insensitive) yields `on_invalid`.
  pub fn from_query(raw: Option<&str>, on_invalid: SortOrder) -> Self {
    match raw.map(str::to_ascii_lowercase).as_deref() {
      None | Some("") | Some("desc") => Self::Desc,
      Some("asc") => Self::Asc,
      Some(_) => on_invalid,
    }
  }

  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

/// Pagination summary returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
  pub page:         u32,
  pub size:         u32,
  pub total_item:   u64,
  pub total_page:   u64,
  pub has_next:     bool,
  pub has_previous: bool,
}

impl PageMetadata {
  pub fn new(request: PageRequest, total_item: u64) -> Self {
    let total_page = total_item.div_ceil(u64::from(request.size));
    Self {
      page: request.page,
      size: request.size,
      total_item,
      total_page,
      has_next: u64::from(request.page) < total_page,
      has_previous: request.page > 1,
    }
  }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub meta:  PageMetadata,
}
