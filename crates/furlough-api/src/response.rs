//! The JSON envelope every endpoint answers with.

use furlough_core::{
  FieldError,
  page::{Page, PageMetadata},
};
use serde::Serialize;

/// `{ message, data?, paging?, errors? }`
#[derive(Debug, Serialize)]
pub struct WebResponse<T> {
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:    Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub paging:  Option<PageMetadata>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub errors:  Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub message: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub fields:  Vec<FieldError>,
}

impl<T> WebResponse<T> {
  pub fn ok(message: impl Into<String>, data: T) -> Self {
    Self { message: message.into(), data: Some(data), paging: None, errors: None }
  }
}

impl<T> WebResponse<Vec<T>> {
  pub fn paged(message: impl Into<String>, page: Page<T>) -> Self {
    Self {
      message: message.into(),
      data:    Some(page.items),
      paging:  Some(page.meta),
      errors:  None,
    }
  }
}

impl WebResponse<()> {
  /// A success with nothing but a message.
  pub fn done(message: impl Into<String>) -> Self {
    Self { message: message.into(), data: None, paging: None, errors: None }
  }

  pub fn failure(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
    let message = message.into();
    Self {
      message: message.clone(),
      data:    None,
      paging:  None,
      errors:  Some(ErrorBody { message, fields }),
    }
  }
}
