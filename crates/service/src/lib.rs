//! Z-index consistency engine and widget service.
//!
//! [`ordering`] decides where a widget goes and which neighbours move;
//! [`WidgetService`] applies those decisions to a [`easel_store::WidgetStore`]
//! inside one write transaction per mutation.

mod error;
pub mod ordering;
mod service;

pub use error::{ErrorResponse, Result, ServiceError};
pub use ordering::OrderingError;
pub use service::{ListingLimits, WidgetService};
