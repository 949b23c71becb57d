//! In-memory backend with copy-on-write read snapshots.
//!
//! # Mental model
//!
//! * The writer owns an ordered map keyed by `(z, id)` behind a mutex.
//! * Readers load an immutable [`SnapshotView`] from an `ArcSwap` and never touch
//!   the ordered map.
//! * A committed transaction rebuilds the view from the ordered map and swaps it
//!   in with a single store, so readers see the state before or after the whole
//!   transaction and nothing in between.
//!
//! # Invariants
//!
//! * The published view has pairwise-distinct `z` values. The ordered map may
//!   transiently hold two widgets at the same `z` inside a transaction (an
//!   updated widget's old record next to a shifted neighbour), which is why the
//!   key includes the id.
//! * The ordered map equals the published view whenever no transaction is open.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use easel_primitives::{Widget, WidgetDraft, WidgetId};
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::{BackendKind, Result, StoreError, WidgetStore, WriteTxn};

/// Immutable published state of a [`SnapshotStore`].
#[derive(Debug, Default)]
pub struct SnapshotView {
	/// Ascending by `z`.
	widgets: Vec<Widget>,
	by_id: FxHashMap<WidgetId, usize>,
}

impl SnapshotView {
	pub fn get(&self, id: WidgetId) -> Option<&Widget> {
		self.by_id.get(&id).map(|&idx| &self.widgets[idx])
	}

	pub fn len(&self) -> usize {
		self.widgets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.widgets.is_empty()
	}

	/// Widgets in ascending `z` order.
	pub fn widgets(&self) -> &[Widget] {
		&self.widgets
	}

	fn page(&self, offset: u64, limit: u32) -> &[Widget] {
		let Ok(start) = usize::try_from(offset) else {
			return &[];
		};
		if start >= self.widgets.len() {
			return &[];
		}
		let end = start.saturating_add(limit as usize).min(self.widgets.len());
		&self.widgets[start..end]
	}
}

/// Writer-side ordered widget set.
#[derive(Debug, Default)]
struct OrderedWidgets {
	by_z: BTreeMap<(i32, WidgetId), Widget>,
	z_of: FxHashMap<WidgetId, i32>,
}

impl OrderedWidgets {
	fn from_view(view: &SnapshotView) -> Self {
		let mut out = Self::default();
		for widget in view.widgets() {
			out.insert(widget.clone());
		}
		out
	}

	fn get(&self, id: WidgetId) -> Option<&Widget> {
		let z = *self.z_of.get(&id)?;
		self.by_z.get(&(z, id))
	}

	fn insert(&mut self, widget: Widget) {
		self.z_of.insert(widget.id, widget.z);
		self.by_z.insert((widget.z, widget.id), widget);
	}

	fn remove(&mut self, id: WidgetId) -> Option<Widget> {
		let z = self.z_of.remove(&id)?;
		self.by_z.remove(&(z, id))
	}

	fn max_z(&self) -> i32 {
		self.by_z.last_key_value().map_or(0, |(&(z, _), _)| z)
	}

	/// Builds the read view, rejecting states with a repeated `z`.
	fn to_view(&self) -> Result<SnapshotView> {
		let mut widgets: Vec<Widget> = Vec::with_capacity(self.by_z.len());
		let mut by_id = FxHashMap::default();
		by_id.reserve(self.by_z.len());

		for widget in self.by_z.values() {
			if let Some(prev) = widgets.last() {
				if prev.z == widget.z {
					return Err(StoreError::DuplicateZ {
						z: widget.z,
						first: prev.id,
						second: widget.id,
					});
				}
			}
			by_id.insert(widget.id, widgets.len());
			widgets.push(widget.clone());
		}

		Ok(SnapshotView { widgets, by_id })
	}
}

/// In-memory widget backend.
pub struct SnapshotStore {
	state: Mutex<OrderedWidgets>,
	published: ArcSwap<SnapshotView>,
	next_id: AtomicU64,
}

impl Default for SnapshotStore {
	fn default() -> Self {
		Self::new()
	}
}

impl SnapshotStore {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(OrderedWidgets::default()),
			published: ArcSwap::from_pointee(SnapshotView::default()),
			next_id: AtomicU64::new(1),
		}
	}

	/// Pins the current published view.
	///
	/// The returned view stays unchanged for as long as it is held, regardless
	/// of later commits.
	pub fn snapshot(&self) -> Arc<SnapshotView> {
		self.published.load_full()
	}

	fn next_id(&self) -> Result<WidgetId> {
		self.next_id
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
			.map(WidgetId)
			.map_err(|_| StoreError::IdOverflow)
	}
}

impl WidgetStore for SnapshotStore {
	fn kind(&self) -> BackendKind {
		BackendKind::Snapshot
	}

	fn find_by_id(&self, id: WidgetId) -> Result<Option<Widget>> {
		Ok(self.published.load().get(id).cloned())
	}

	fn paged_list(&self, offset: u64, limit: u32) -> Result<(Vec<Widget>, u64)> {
		let view = self.published.load();
		Ok((view.page(offset, limit).to_vec(), view.len() as u64))
	}

	fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>> {
		Ok(Box::new(SnapshotTxn {
			store: self,
			state: self.state.lock(),
			dirty: false,
			committed: false,
		}))
	}
}

struct SnapshotTxn<'a> {
	store: &'a SnapshotStore,
	state: MutexGuard<'a, OrderedWidgets>,
	dirty: bool,
	committed: bool,
}

impl WriteTxn for SnapshotTxn<'_> {
	fn max_z(&mut self) -> Result<i32> {
		Ok(self.state.max_z())
	}

	fn scan_from_z(
		&mut self,
		z: i32,
		visit: &mut dyn FnMut(&Widget) -> ControlFlow<()>,
	) -> Result<()> {
		for widget in self.state.by_z.range((z, WidgetId(0))..).map(|(_, w)| w) {
			if visit(widget).is_break() {
				break;
			}
		}
		Ok(())
	}

	fn find_by_id(&mut self, id: WidgetId) -> Result<Option<Widget>> {
		Ok(self.state.get(id).cloned())
	}

	fn save(&mut self, draft: WidgetDraft) -> Result<Widget> {
		let id = match draft.id {
			Some(id) => {
				self.state.remove(id).ok_or(StoreError::Missing(id))?;
				id
			}
			None => self.store.next_id()?,
		};
		let widget = draft.into_widget(id);
		self.state.insert(widget.clone());
		self.dirty = true;
		trace!(id = %id, z = widget.z, "snapshot save");
		Ok(widget)
	}

	fn delete(&mut self, widget: &Widget) -> Result<()> {
		self.state
			.remove(widget.id)
			.ok_or(StoreError::Missing(widget.id))?;
		self.dirty = true;
		Ok(())
	}

	fn increase_z(&mut self, ids: &[WidgetId]) -> Result<()> {
		let ids: FxHashSet<WidgetId> = ids.iter().copied().collect();
		let mut moved = Vec::with_capacity(ids.len());
		for id in ids {
			let Some(mut widget) = self.state.remove(id) else {
				continue;
			};
			self.dirty = true;
			widget.z = widget.z.checked_add(1).ok_or(StoreError::ZOverflow(id))?;
			moved.push(widget);
		}
		for widget in moved {
			self.state.insert(widget);
		}
		Ok(())
	}

	fn commit(mut self: Box<Self>) -> Result<()> {
		if self.dirty {
			let view = self.state.to_view()?;
			debug!(widgets = view.len(), "publishing snapshot");
			self.store.published.store(Arc::new(view));
		}
		self.committed = true;
		Ok(())
	}
}

impl Drop for SnapshotTxn<'_> {
	fn drop(&mut self) {
		if self.dirty && !self.committed {
			debug!("rolling back snapshot transaction");
			*self.state = OrderedWidgets::from_view(&self.store.published.load());
		}
	}
}

#[cfg(test)]
mod tests;
