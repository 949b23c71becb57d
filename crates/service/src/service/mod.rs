//! Widget operations on top of a storage backend.
//!
//! # Critical section
//!
//! Every mutation runs inside one [`WriteTxn`]: existence check, conflict scan,
//! shift, and save. Two creates racing for the same `z` would otherwise both
//! compute their shift sets from the same state and commit duplicates. An error
//! anywhere before commit drops the transaction, which undoes any shift that
//! was already applied.

use std::sync::Arc;

use chrono::Utc;
use easel_primitives::{Page, PageRequest, Widget, WidgetDraft, WidgetId, WidgetRequest};
use easel_store::{WidgetStore, WriteTxn};
use tracing::{debug, info};

use crate::error::{Result, ServiceError};
use crate::ordering::{ShiftChain, resolve_target_z};

/// Paging bounds applied by [`WidgetService::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLimits {
	pub max_page_size: u32,
	/// Page size used when a client does not ask for one.
	pub default_page_size: u32,
}

impl Default for ListingLimits {
	fn default() -> Self {
		Self {
			max_page_size: 500,
			default_page_size: 10,
		}
	}
}

/// Create, update, delete, and query widgets while keeping `z` unique.
#[derive(Clone)]
pub struct WidgetService {
	store: Arc<dyn WidgetStore>,
	limits: ListingLimits,
}

impl WidgetService {
	pub fn new(store: Arc<dyn WidgetStore>) -> Self {
		Self::with_limits(store, ListingLimits::default())
	}

	pub fn with_limits(store: Arc<dyn WidgetStore>, limits: ListingLimits) -> Self {
		info!(backend = %store.kind(), max_page_size = limits.max_page_size, "widget service ready");
		Self { store, limits }
	}

	pub fn limits(&self) -> ListingLimits {
		self.limits
	}

	/// Creates a widget, shifting the chain above its `z` when occupied.
	pub fn create(&self, request: &WidgetRequest) -> Result<Widget> {
		let valid = request.validate()?;

		let mut txn = self.store.begin_write()?;
		let z = place(txn.as_mut(), valid.z, None)?;
		let widget = txn.save(WidgetDraft::new(valid.geometry, z))?;
		txn.commit()?;

		info!(id = %widget.id, z = widget.z, "created widget");
		Ok(widget)
	}

	/// Replaces the geometry and `z` of an existing widget.
	///
	/// Fails with [`ServiceError::NotFound`] before anything is modified when
	/// `id` is unknown.
	pub fn update(&self, id: WidgetId, request: &WidgetRequest) -> Result<Widget> {
		let valid = request.validate()?;

		let mut txn = self.store.begin_write()?;
		let previous = txn.find_by_id(id)?.ok_or(ServiceError::NotFound(id))?;
		let z = place(txn.as_mut(), valid.z, Some(id))?;
		let draft = WidgetDraft::new(valid.geometry, z).replacing(id, Utc::now());
		let widget = txn.save(draft)?;
		txn.commit()?;

		info!(id = %id, from_z = previous.z, z = widget.z, "updated widget");
		Ok(widget)
	}

	/// Removes a widget and returns it as it was. Other widgets keep their `z`.
	pub fn delete(&self, id: WidgetId) -> Result<Widget> {
		let mut txn = self.store.begin_write()?;
		let widget = txn.find_by_id(id)?.ok_or(ServiceError::NotFound(id))?;
		txn.delete(&widget)?;
		txn.commit()?;

		info!(id = %id, z = widget.z, "deleted widget");
		Ok(widget)
	}

	pub fn get(&self, id: WidgetId) -> Result<Widget> {
		self.store.find_by_id(id)?.ok_or(ServiceError::NotFound(id))
	}

	/// Returns one page of widgets ascending by `z`.
	pub fn list(&self, request: PageRequest) -> Result<Page<Widget>> {
		if request.size == 0 || request.size > self.limits.max_page_size {
			return Err(ServiceError::InvalidPageSize {
				requested: request.size,
				max: self.limits.max_page_size,
			});
		}

		let (items, total) = self.store.paged_list(request.offset(), request.size)?;
		debug!(page = request.page, size = request.size, total, "listed widgets");
		Ok(Page::new(items, request, total))
	}

	/// Page request for `page` with the configured default size when `size` is absent.
	pub fn page_request(&self, page: Option<u32>, size: Option<u32>) -> PageRequest {
		PageRequest::new(
			page.unwrap_or(0),
			size.unwrap_or(self.limits.default_page_size),
		)
	}
}

/// Resolves the target `z` and frees it by shifting the chain above it.
fn place(txn: &mut dyn WriteTxn, requested: Option<i32>, exclude: Option<WidgetId>) -> Result<i32> {
	let current_max = match requested {
		Some(_) => 0,
		None => txn.max_z()?,
	};
	let target = resolve_target_z(requested, current_max)?;

	let mut chain = ShiftChain::new(target, exclude);
	txn.scan_from_z(target, &mut |w| chain.push(w))?;
	let shift = chain.finish()?;

	debug!(target, shifted = shift.len(), "resolved placement");
	if !shift.is_empty() {
		txn.increase_z(&shift)?;
	}
	Ok(target)
}
