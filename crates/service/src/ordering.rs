//! Z-index placement decisions.
//!
//! Pure functions over values read from a backend. Nothing here touches storage:
//! the service feeds the engine and applies what it returns.
//!
//! # Shift chains
//!
//! Inserting at `z = Z` only displaces the contiguous run of widgets at
//! `Z, Z+1, ...` up to the first gap. Each widget in that run moves up by one;
//! everything past the gap stays put. A widget being updated is never part of
//! its own chain: meeting it ends the run, since its old slot becomes free.

use std::ops::ControlFlow;

use easel_primitives::{Widget, WidgetId};

/// Placement cannot be represented in `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
	#[error("z-index {0} cannot be advanced")]
	Overflow(i32),
}

/// Picks the `z` for a create or update.
///
/// A missing request places the widget in front of everything: `current_max + 1`,
/// where `current_max` is 0 for an empty set.
pub fn resolve_target_z(requested: Option<i32>, current_max: i32) -> Result<i32, OrderingError> {
	match requested {
		Some(z) => Ok(z),
		None => current_max
			.checked_add(1)
			.ok_or(OrderingError::Overflow(current_max)),
	}
}

/// Incremental form of [`compute_shift_set`].
///
/// Feed widgets in ascending `z` order starting at the target; stop as soon as
/// [`ShiftChain::push`] breaks.
#[derive(Debug, Clone)]
pub struct ShiftChain {
	next_z: i32,
	exclude: Option<WidgetId>,
	ids: Vec<WidgetId>,
	overflow: bool,
}

impl ShiftChain {
	pub fn new(target_z: i32, exclude: Option<WidgetId>) -> Self {
		Self {
			next_z: target_z,
			exclude,
			ids: Vec::new(),
			overflow: false,
		}
	}

	/// Offers the next widget of the ascending run.
	pub fn push(&mut self, widget: &Widget) -> ControlFlow<()> {
		if widget.z != self.next_z || self.exclude == Some(widget.id) {
			return ControlFlow::Break(());
		}
		self.ids.push(widget.id);
		match self.next_z.checked_add(1) {
			Some(next) => {
				self.next_z = next;
				ControlFlow::Continue(())
			}
			None => {
				self.overflow = true;
				ControlFlow::Break(())
			}
		}
	}

	/// Ids to shift up by one, ascending by current `z`.
	pub fn finish(self) -> Result<Vec<WidgetId>, OrderingError> {
		if self.overflow {
			return Err(OrderingError::Overflow(i32::MAX));
		}
		Ok(self.ids)
	}
}

/// Computes the minimal set of widgets to shift so `target_z` becomes free.
///
/// `run` must be ascending by `z` and start at or after `target_z`. Scanning stops
/// at the first gap or at `exclude`, so only the leading contiguous chain is read.
pub fn compute_shift_set<'a>(
	target_z: i32,
	run: impl IntoIterator<Item = &'a Widget>,
	exclude: Option<WidgetId>,
) -> Result<Vec<WidgetId>, OrderingError> {
	let mut chain = ShiftChain::new(target_z, exclude);
	for widget in run {
		if chain.push(widget).is_break() {
			break;
		}
	}
	chain.finish()
}
