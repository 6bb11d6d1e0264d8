//! Query-string parameters shared by the listing handlers.

use serde::Deserialize;
use vidtube_core::{Result, page::PageRequest};

/// `?page=&limit=` on paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page:  Option<u32>,
  pub limit: Option<u32>,
}

impl PageParams {
  pub fn to_request(&self) -> Result<PageRequest> {
    PageRequest::new(self.page, self.limit)
  }
}
