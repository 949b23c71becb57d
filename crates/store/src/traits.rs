use std::ops::ControlFlow;

use easel_primitives::{Widget, WidgetDraft, WidgetId};

use crate::{BackendKind, Result};

/// Shared handle to a widget backend.
///
/// Methods on this trait are reads against the last committed state. They are
/// safe to call from any thread while a write transaction is open elsewhere.
pub trait WidgetStore: Send + Sync {
	fn kind(&self) -> BackendKind;

	/// Looks up a committed widget by id.
	fn find_by_id(&self, id: WidgetId) -> Result<Option<Widget>>;

	/// Returns up to `limit` widgets ascending by `z`, skipping `offset`, plus
	/// the total number of live widgets.
	///
	/// An `offset` past the end yields an empty slice, not an error.
	fn paged_list(&self, offset: u64, limit: u32) -> Result<(Vec<Widget>, u64)>;

	/// Enters the single-writer critical section.
	///
	/// Blocks until any other open transaction on this backend finishes.
	fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>>;
}

/// Exclusive write access to a backend.
///
/// Reads through the transaction observe its own uncommitted changes.
/// Dropping the transaction without calling [`WriteTxn::commit`] discards them.
pub trait WriteTxn {
	/// Largest live `z`, or 0 when the set is empty.
	fn max_z(&mut self) -> Result<i32>;

	/// Visits widgets with `z >= z` in ascending `z` order until `visit` breaks.
	fn scan_from_z(
		&mut self,
		z: i32,
		visit: &mut dyn FnMut(&Widget) -> ControlFlow<()>,
	) -> Result<()>;

	/// Collects every widget with `z >= z`, ascending, boundary included.
	fn widgets_from_z(&mut self, z: i32) -> Result<Vec<Widget>> {
		let mut out = Vec::new();
		self.scan_from_z(z, &mut |w| {
			out.push(w.clone());
			ControlFlow::Continue(())
		})?;
		Ok(out)
	}

	fn find_by_id(&mut self, id: WidgetId) -> Result<Option<Widget>>;

	/// Inserts a draft without an id under a fresh id, or replaces the record
	/// carrying the draft's id.
	///
	/// Fails with [`crate::StoreError::Missing`] when replacing an unknown id.
	fn save(&mut self, draft: WidgetDraft) -> Result<Widget>;

	/// Removes the record with `widget.id`.
	fn delete(&mut self, widget: &Widget) -> Result<()>;

	/// Increments `z` by one on every listed widget as one operation.
	///
	/// Ids with no record are ignored.
	fn increase_z(&mut self, ids: &[WidgetId]) -> Result<()>;

	/// Publishes every change made through this transaction at once.
	fn commit(self: Box<Self>) -> Result<()>;
}
