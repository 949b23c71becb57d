use std::sync::Arc;
use std::thread;

use easel_primitives::Geometry;
use pretty_assertions::assert_eq;

use super::*;

fn draft(z: i32) -> WidgetDraft {
	WidgetDraft::new(
		Geometry {
			x: 0,
			y: 0,
			width: 10,
			height: 10,
		},
		z,
	)
}

fn insert(store: &SnapshotStore, zs: &[i32]) -> Vec<Widget> {
	let mut txn = store.begin_write().unwrap();
	let saved = zs.iter().map(|&z| txn.save(draft(z)).unwrap()).collect();
	txn.commit().unwrap();
	saved
}

fn zs(store: &SnapshotStore) -> Vec<(u64, i32)> {
	store
		.snapshot()
		.widgets()
		.iter()
		.map(|w| (w.id.get(), w.z))
		.collect()
}

#[test]
fn test_ids_start_at_one_and_increase() {
	let store = SnapshotStore::new();
	let saved = insert(&store, &[5, 1, 3]);
	let ids: Vec<u64> = saved.iter().map(|w| w.id.get()).collect();
	assert_eq!(ids, vec![1, 2, 3]);
	assert_eq!(zs(&store), vec![(2, 1), (3, 3), (1, 5)]);
}

#[test]
fn test_ids_not_reused_after_delete() {
	let store = SnapshotStore::new();
	let saved = insert(&store, &[1]);

	let mut txn = store.begin_write().unwrap();
	txn.delete(&saved[0]).unwrap();
	txn.commit().unwrap();

	let again = insert(&store, &[1]);
	assert_eq!(again[0].id, WidgetId(2));
}

#[test]
fn test_max_z_defaults_to_zero() {
	let store = SnapshotStore::new();
	let mut txn = store.begin_write().unwrap();
	assert_eq!(txn.max_z().unwrap(), 0);
	txn.save(draft(-4)).unwrap();
	assert_eq!(txn.max_z().unwrap(), -4);
	txn.save(draft(12)).unwrap();
	assert_eq!(txn.max_z().unwrap(), 12);
}

#[test]
fn test_widgets_from_z_is_inclusive_and_ascending() {
	let store = SnapshotStore::new();
	insert(&store, &[4, 1, 2, 7]);
	let mut txn = store.begin_write().unwrap();
	let from: Vec<i32> = txn
		.widgets_from_z(2)
		.unwrap()
		.iter()
		.map(|w| w.z)
		.collect();
	assert_eq!(from, vec![2, 4, 7]);
	assert!(txn.widgets_from_z(8).unwrap().is_empty());
}

#[test]
fn test_scan_stops_when_visitor_breaks() {
	let store = SnapshotStore::new();
	insert(&store, &[1, 2, 3, 4]);
	let mut txn = store.begin_write().unwrap();
	let mut seen = Vec::new();
	txn.scan_from_z(2, &mut |w| {
		seen.push(w.z);
		if w.z == 3 {
			ControlFlow::Break(())
		} else {
			ControlFlow::Continue(())
		}
	})
	.unwrap();
	assert_eq!(seen, vec![2, 3]);
}

#[test]
fn test_increase_z_moves_only_listed_ids() {
	let store = SnapshotStore::new();
	let saved = insert(&store, &[1, 2, 3, 5]);

	let mut txn = store.begin_write().unwrap();
	txn.increase_z(&[saved[1].id, saved[2].id, saved[2].id, WidgetId(99)])
		.unwrap();
	txn.commit().unwrap();

	assert_eq!(zs(&store), vec![(1, 1), (2, 3), (3, 4), (4, 5)]);
}

#[test]
fn test_save_with_unknown_id_fails() {
	let store = SnapshotStore::new();
	let mut txn = store.begin_write().unwrap();
	let err = txn.save(draft(1).replacing(WidgetId(3), chrono::Utc::now()));
	assert!(matches!(err, Err(StoreError::Missing(WidgetId(3)))));
}

#[test]
fn test_uncommitted_changes_invisible_to_readers() {
	let store = SnapshotStore::new();
	insert(&store, &[1]);

	let mut txn = store.begin_write().unwrap();
	txn.save(draft(2)).unwrap();
	assert_eq!(store.paged_list(0, 10).unwrap().1, 1);
	txn.commit().unwrap();
	assert_eq!(store.paged_list(0, 10).unwrap().1, 2);
}

#[test]
fn test_drop_without_commit_rolls_back() {
	let store = SnapshotStore::new();
	let saved = insert(&store, &[1, 2]);

	{
		let mut txn = store.begin_write().unwrap();
		txn.increase_z(&[saved[0].id, saved[1].id]).unwrap();
		txn.save(draft(1)).unwrap();
	}

	assert_eq!(zs(&store), vec![(1, 1), (2, 2)]);
	let mut txn = store.begin_write().unwrap();
	assert_eq!(txn.max_z().unwrap(), 2);
	assert_eq!(txn.widgets_from_z(1).unwrap().len(), 2);
}

#[test]
fn test_commit_rejects_duplicate_z_and_rolls_back() {
	let store = SnapshotStore::new();
	insert(&store, &[1]);

	let mut txn = store.begin_write().unwrap();
	txn.save(draft(1)).unwrap();
	let err = txn.commit().unwrap_err();
	assert!(matches!(err, StoreError::DuplicateZ { z: 1, .. }));

	assert_eq!(zs(&store), vec![(1, 1)]);
	let mut txn = store.begin_write().unwrap();
	assert_eq!(txn.widgets_from_z(1).unwrap().len(), 1);
}

#[test]
fn test_transient_duplicate_allowed_inside_transaction() {
	let store = SnapshotStore::new();
	let saved = insert(&store, &[1, 2]);

	// Shift the widget at 1 onto 2 while the widget at 2 is being moved to 1.
	let mut txn = store.begin_write().unwrap();
	txn.increase_z(&[saved[0].id]).unwrap();
	txn.save(WidgetDraft {
		z: 1,
		..saved[1].to_draft()
	})
	.unwrap();
	txn.commit().unwrap();

	assert_eq!(zs(&store), vec![(2, 1), (1, 2)]);
}

#[test]
fn test_pinned_snapshot_survives_later_commits() {
	let store = SnapshotStore::new();
	assert!(store.snapshot().is_empty());
	let saved = insert(&store, &[1, 2]);
	let pinned = store.snapshot();

	let mut txn = store.begin_write().unwrap();
	txn.increase_z(&[saved[0].id, saved[1].id]).unwrap();
	txn.delete(&saved[0]).unwrap();
	txn.commit().unwrap();

	assert_eq!(pinned.len(), 2);
	assert_eq!(pinned.get(saved[0].id).map(|w| w.z), Some(1));
	assert_eq!(store.snapshot().len(), 1);
	assert_eq!(store.find_by_id(saved[1].id).unwrap().map(|w| w.z), Some(3));
}

#[test]
fn test_paged_list_bounds() {
	let store = SnapshotStore::new();
	insert(&store, &[3, 1, 2]);

	let (items, total) = store.paged_list(1, 5).unwrap();
	assert_eq!(items.iter().map(|w| w.z).collect::<Vec<_>>(), vec![2, 3]);
	assert_eq!(total, 3);

	let (items, total) = store.paged_list(3, 5).unwrap();
	assert!(items.is_empty());
	assert_eq!(total, 3);

	let (items, _) = store.paged_list(u64::MAX, u32::MAX).unwrap();
	assert!(items.is_empty());
}

#[test]
fn test_increase_z_overflow_rejected() {
	let store = SnapshotStore::new();
	let saved = insert(&store, &[i32::MAX]);
	let mut txn = store.begin_write().unwrap();
	assert!(matches!(
		txn.increase_z(&[saved[0].id]),
		Err(StoreError::ZOverflow(_))
	));
	drop(txn);
	assert_eq!(zs(&store), vec![(1, i32::MAX)]);
}

#[test]
fn test_readers_never_see_duplicate_z_during_shifts() {
	let store = Arc::new(SnapshotStore::new());
	let writer = {
		let store = Arc::clone(&store);
		thread::spawn(move || {
			for _ in 0..200 {
				let mut txn = store.begin_write().unwrap();
				let ids: Vec<WidgetId> = txn
					.widgets_from_z(1)
					.unwrap()
					.iter()
					.map(|w| w.id)
					.collect();
				txn.increase_z(&ids).unwrap();
				txn.save(draft(1)).unwrap();
				txn.commit().unwrap();
			}
		})
	};

	let reader = {
		let store = Arc::clone(&store);
		thread::spawn(move || {
			for _ in 0..2_000 {
				let view = store.snapshot();
				for pair in view.widgets().windows(2) {
					assert!(pair[0].z < pair[1].z, "published view out of order");
				}
			}
		})
	};

	writer.join().unwrap();
	reader.join().unwrap();
	assert_eq!(store.snapshot().len(), 200);
}
