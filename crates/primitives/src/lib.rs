//! Core types for the widget canvas: widgets, requests, and pages.

/// Page requests and paged results.
pub mod page;
/// Incoming widget requests and their field validation.
pub mod request;
/// Widget identity, geometry, and persisted records.
pub mod widget;

pub use page::{Page, PageRequest};
pub use request::{FieldError, ValidRequest, ValidationErrors, WidgetRequest};
pub use widget::{Geometry, Widget, WidgetDraft, WidgetId};
