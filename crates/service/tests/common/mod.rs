#![allow(dead_code)]

use std::sync::Arc;

use easel_primitives::{PageRequest, Widget, WidgetId, WidgetRequest};
use easel_service::WidgetService;
use easel_store::{StoreSpec, WidgetStore};
use tempfile::TempDir;

/// A service over one backend, plus whatever keeps the backend alive.
pub struct Harness {
	pub name: &'static str,
	pub service: WidgetService,
	pub store: Arc<dyn WidgetStore>,
	_dir: Option<TempDir>,
}

pub fn snapshot() -> Harness {
	let store = StoreSpec::Snapshot.open().expect("open snapshot store");
	Harness {
		name: "snapshot",
		service: WidgetService::new(store.clone()),
		store,
		_dir: None,
	}
}

pub fn durable() -> Harness {
	let dir = tempfile::tempdir().expect("create tempdir");
	let store = StoreSpec::Durable {
		path: dir.path().join("widgets.db"),
	}
	.open()
	.expect("open durable store");
	Harness {
		name: "durable",
		service: WidgetService::new(store.clone()),
		store,
		_dir: Some(dir),
	}
}

/// Runs `check` once against each backend.
pub fn for_each_backend(check: impl Fn(&Harness)) {
	for harness in [snapshot(), durable()] {
		check(&harness);
	}
}

pub fn request(z: Option<i32>) -> WidgetRequest {
	WidgetRequest::new(0, 0, 10, 10, z)
}

impl Harness {
	pub fn create(&self, z: Option<i32>) -> Widget {
		self.service
			.create(&request(z))
			.unwrap_or_else(|err| panic!("[{}] create failed: {err}", self.name))
	}

	/// All widgets as `(id, z)` ascending by `z`.
	pub fn layout(&self) -> Vec<(u64, i32)> {
		self.all().iter().map(|w| (w.id.get(), w.z)).collect()
	}

	pub fn all(&self) -> Vec<Widget> {
		let page = self
			.service
			.list(PageRequest::new(0, self.service.limits().max_page_size))
			.expect("list widgets");
		page.items
	}

	pub fn z_of(&self, id: u64) -> i32 {
		self.service.get(WidgetId(id)).expect("widget exists").z
	}
}

/// Panics when two widgets share a `z`.
pub fn assert_unique_z(widgets: &[Widget], context: &str) {
	for pair in widgets.windows(2) {
		assert!(
			pair[0].z < pair[1].z,
			"{context}: widgets {} and {} out of order or sharing z ({} / {})",
			pair[0].id,
			pair[1].id,
			pair[0].z,
			pair[1].z
		);
	}
}
