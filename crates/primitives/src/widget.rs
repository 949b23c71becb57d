use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a widget.
///
/// Assigned by the storage backend on first save and never reused, even after
/// the widget is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(pub u64);

impl WidgetId {
	/// Returns the raw numeric value.
	#[inline]
	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for WidgetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Position and size of a widget on the canvas.
///
/// `width` and `height` are at least 1 once a request has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
	pub x: i32,
	pub y: i32,
	pub width: i32,
	pub height: i32,
}

/// A persisted widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
	pub id: WidgetId,
	#[serde(flatten)]
	pub geometry: Geometry,
	/// Stacking coordinate, unique across all live widgets.
	pub z: i32,
	/// Set on update only; `None` for widgets that were never updated.
	pub last_modified: Option<DateTime<Utc>>,
}

impl Widget {
	/// Returns a draft carrying this widget's id and fields.
	pub fn to_draft(&self) -> WidgetDraft {
		WidgetDraft {
			id: Some(self.id),
			geometry: self.geometry,
			z: self.z,
			last_modified: self.last_modified,
		}
	}
}

/// A widget that has not been written to a backend yet.
///
/// With `id == None` a save inserts a new record and assigns an id; with an id
/// it replaces the record that already carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetDraft {
	pub id: Option<WidgetId>,
	pub geometry: Geometry,
	pub z: i32,
	pub last_modified: Option<DateTime<Utc>>,
}

impl WidgetDraft {
	/// Creates a draft for a widget that does not exist yet.
	pub fn new(geometry: Geometry, z: i32) -> Self {
		Self {
			id: None,
			geometry,
			z,
			last_modified: None,
		}
	}

	/// Binds the draft to an existing id and stamps the modification time.
	pub fn replacing(mut self, id: WidgetId, modified: DateTime<Utc>) -> Self {
		self.id = Some(id);
		self.last_modified = Some(modified);
		self
	}

	/// Converts into a stored widget under `id`.
	pub fn into_widget(self, id: WidgetId) -> Widget {
		Widget {
			id,
			geometry: self.geometry,
			z: self.z,
			last_modified: self.last_modified,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn widget_serializes_flat_camel_case() {
		let widget = WidgetDraft::new(
			Geometry {
				x: -3,
				y: 4,
				width: 10,
				height: 20,
			},
			7,
		)
		.into_widget(WidgetId(42));

		let json = serde_json::to_value(&widget).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"id": 42,
				"x": -3,
				"y": 4,
				"width": 10,
				"height": 20,
				"z": 7,
				"lastModified": null,
			})
		);
	}

	#[test]
	fn replacing_sets_id_and_timestamp() {
		let now = Utc::now();
		let geometry = Geometry {
			x: 0,
			y: 0,
			width: 1,
			height: 1,
		};
		let draft = WidgetDraft::new(geometry, 1).replacing(WidgetId(9), now);
		assert_eq!(draft.id, Some(WidgetId(9)));
		assert_eq!(draft.last_modified, Some(now));
	}
}
