//! SQLite-backed widget store.
//!
//! Writes run on one long-lived connection guarded by a mutex, each inside a
//! `BEGIN IMMEDIATE` transaction so the conflict scan, the bulk shift, and the
//! save of one service call commit or roll back together. Reads borrow a
//! read-only connection from a small idle pool; in WAL mode they never wait
//! for the writer.
//!
//! `z` carries an index but no `UNIQUE` constraint: SQLite checks uniqueness
//! row by row during an `UPDATE`, and both the bulk shift and an update that
//! moves a widget down its own chain pass through states where two rows share
//! a `z` before the transaction completes. Uniqueness is checked once, right
//! before `COMMIT`.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use easel_primitives::{Geometry, Widget, WidgetDraft, WidgetId};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use tracing::{debug, trace, warn};

use crate::{BackendKind, Result, StoreError, WidgetStore, WriteTxn};

const SCHEMA_VERSION: i64 = 1;
const BUSY_TIMEOUT_MS: u64 = 5_000;
/// Read-only connections kept open between reads.
const MAX_IDLE_READERS: usize = 4;

const WIDGET_COLUMNS: &str = "id, x, y, z, width, height, last_modified";

/// Widget store persisted in a SQLite database file.
pub struct DurableStore {
	path: PathBuf,
	writer: Mutex<Connection>,
	readers: Mutex<Vec<Connection>>,
}

impl DurableStore {
	/// Opens or creates the database at `path`, creating parent directories.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
				path: parent.to_path_buf(),
				source,
			})?;
		}

		let conn = open_connection(&path, true)?;
		initialize_schema(&conn)?;
		debug!(path = %path.display(), "opened durable widget store");

		Ok(Self {
			path,
			writer: Mutex::new(conn),
			readers: Mutex::new(Vec::new()),
		})
	}

	/// Runs `f` in a read transaction on an idle reader connection, opening one
	/// when none is idle.
	fn with_read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
		let idle = self.readers.lock().pop();
		let conn = match idle {
			Some(conn) => conn,
			None => open_connection(&self.path, false)?,
		};

		conn.execute_batch("BEGIN DEFERRED")?;
		let out = f(&conn);
		match conn.execute_batch("COMMIT") {
			Ok(()) => {
				let mut readers = self.readers.lock();
				if readers.len() < MAX_IDLE_READERS {
					readers.push(conn);
				}
			}
			Err(err) => warn!(error = %err, "failed to close read transaction"),
		}
		out
	}
}

impl WidgetStore for DurableStore {
	fn kind(&self) -> BackendKind {
		BackendKind::Durable
	}

	fn find_by_id(&self, id: WidgetId) -> Result<Option<Widget>> {
		self.with_read(|conn| select_by_id(conn, id))
	}

	fn paged_list(&self, offset: u64, limit: u32) -> Result<(Vec<Widget>, u64)> {
		self.with_read(|conn| {
			let total: i64 = conn.query_row("SELECT COUNT(*) FROM widgets", [], |row| row.get(0))?;
			let total = total.max(0) as u64;
			if offset >= total || limit == 0 {
				return Ok((Vec::new(), total));
			}

			let mut stmt = conn.prepare_cached(&format!(
				"SELECT {WIDGET_COLUMNS} FROM widgets ORDER BY z ASC, id ASC LIMIT ?1 OFFSET ?2"
			))?;
			let offset = i64::try_from(offset).unwrap_or(i64::MAX);
			let rows = stmt.query_map(params![i64::from(limit), offset], widget_from_row)?;
			let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
			Ok((items, total))
		})
	}

	fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>> {
		let conn = self.writer.lock();
		conn.execute_batch("BEGIN IMMEDIATE")?;
		Ok(Box::new(DurableTxn {
			conn,
			committed: false,
		}))
	}
}

struct DurableTxn<'a> {
	conn: MutexGuard<'a, Connection>,
	committed: bool,
}

impl WriteTxn for DurableTxn<'_> {
	fn max_z(&mut self) -> Result<i32> {
		let max = self
			.conn
			.query_row("SELECT COALESCE(MAX(z), 0) FROM widgets", [], |row| {
				row.get(0)
			})?;
		Ok(max)
	}

	fn scan_from_z(
		&mut self,
		z: i32,
		visit: &mut dyn FnMut(&Widget) -> ControlFlow<()>,
	) -> Result<()> {
		let mut stmt = self.conn.prepare_cached(&format!(
			"SELECT {WIDGET_COLUMNS} FROM widgets WHERE z >= ?1 ORDER BY z ASC, id ASC"
		))?;
		let mut rows = stmt.query(params![z])?;
		while let Some(row) = rows.next()? {
			let widget = widget_from_row(row)?;
			if visit(&widget).is_break() {
				break;
			}
		}
		Ok(())
	}

	fn find_by_id(&mut self, id: WidgetId) -> Result<Option<Widget>> {
		select_by_id(&self.conn, id)
	}

	fn save(&mut self, draft: WidgetDraft) -> Result<Widget> {
		let Geometry {
			x,
			y,
			width,
			height,
		} = draft.geometry;

		let id = match draft.id {
			Some(id) => {
				let changed = self.conn.execute(
					"UPDATE widgets SET x = ?2, y = ?3, z = ?4, width = ?5, height = ?6, \
					 last_modified = ?7 WHERE id = ?1",
					params![
						id_param(id)?,
						x,
						y,
						draft.z,
						width,
						height,
						draft.last_modified
					],
				)?;
				if changed == 0 {
					return Err(StoreError::Missing(id));
				}
				id
			}
			None => {
				self.conn.execute(
					"INSERT INTO widgets (x, y, z, width, height, last_modified) \
					 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
					params![x, y, draft.z, width, height, draft.last_modified],
				)?;
				let rowid = self.conn.last_insert_rowid();
				WidgetId(u64::try_from(rowid).map_err(|_| StoreError::IdOverflow)?)
			}
		};

		trace!(id = %id, z = draft.z, "durable save");
		Ok(draft.into_widget(id))
	}

	fn delete(&mut self, widget: &Widget) -> Result<()> {
		let removed = self.conn.execute(
			"DELETE FROM widgets WHERE id = ?1",
			params![id_param(widget.id)?],
		)?;
		if removed == 0 {
			return Err(StoreError::Missing(widget.id));
		}
		Ok(())
	}

	fn increase_z(&mut self, ids: &[WidgetId]) -> Result<()> {
		if ids.is_empty() {
			return Ok(());
		}
		let ids_json = serde_json::to_string(ids)?;
		let overflowing: Option<i64> = self
			.conn
			.query_row(
				"SELECT id FROM widgets WHERE z = ?2 AND id IN (SELECT value FROM json_each(?1)) LIMIT 1",
				params![ids_json, i32::MAX],
				|row| row.get(0),
			)
			.optional()?;
		if let Some(id) = overflowing {
			return Err(StoreError::ZOverflow(WidgetId(id as u64)));
		}

		let shifted = self.conn.execute(
			"UPDATE widgets SET z = z + 1 WHERE id IN (SELECT value FROM json_each(?1))",
			params![ids_json],
		)?;
		trace!(requested = ids.len(), shifted, "durable increase_z");
		Ok(())
	}

	fn commit(mut self: Box<Self>) -> Result<()> {
		let duplicate = self
			.conn
			.query_row(
				"SELECT z, MIN(id), MAX(id) FROM widgets GROUP BY z HAVING COUNT(*) > 1 \
				 ORDER BY z LIMIT 1",
				[],
				|row| Ok((row.get::<_, i32>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
			)
			.optional()?;
		if let Some((z, first, second)) = duplicate {
			return Err(StoreError::DuplicateZ {
				z,
				first: WidgetId(first as u64),
				second: WidgetId(second as u64),
			});
		}

		self.conn.execute_batch("COMMIT")?;
		self.committed = true;
		Ok(())
	}
}

impl Drop for DurableTxn<'_> {
	fn drop(&mut self) {
		if !self.committed {
			debug!("rolling back durable transaction");
			if let Err(err) = self.conn.execute_batch("ROLLBACK") {
				warn!(error = %err, "rollback failed");
			}
		}
	}
}

fn select_by_id(conn: &Connection, id: WidgetId) -> Result<Option<Widget>> {
	let mut stmt = conn.prepare_cached(&format!(
		"SELECT {WIDGET_COLUMNS} FROM widgets WHERE id = ?1"
	))?;
	let Ok(id) = i64::try_from(id.get()) else {
		return Ok(None);
	};
	Ok(stmt.query_row(params![id], widget_from_row).optional()?)
}

fn widget_from_row(row: &Row<'_>) -> rusqlite::Result<Widget> {
	let id: i64 = row.get(0)?;
	let id = u64::try_from(id).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, id))?;
	Ok(Widget {
		id: WidgetId(id),
		geometry: Geometry {
			x: row.get(1)?,
			y: row.get(2)?,
			width: row.get(4)?,
			height: row.get(5)?,
		},
		z: row.get(3)?,
		last_modified: row.get(6)?,
	})
}

fn id_param(id: WidgetId) -> Result<i64> {
	i64::try_from(id.get()).map_err(|_| StoreError::Missing(id))
}

fn initialize_schema(conn: &Connection) -> Result<()> {
	let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
	match version {
		0 => {
			conn.execute_batch(&format!(
				"BEGIN IMMEDIATE;
				 CREATE TABLE IF NOT EXISTS widgets (
				   id INTEGER PRIMARY KEY AUTOINCREMENT,
				   x INTEGER NOT NULL,
				   y INTEGER NOT NULL,
				   z INTEGER NOT NULL,
				   width INTEGER NOT NULL CHECK (width >= 1),
				   height INTEGER NOT NULL CHECK (height >= 1),
				   last_modified TEXT
				 );
				 CREATE INDEX IF NOT EXISTS widgets_by_z ON widgets (z);
				 PRAGMA user_version = {SCHEMA_VERSION};
				 COMMIT;"
			))?;
			Ok(())
		}
		SCHEMA_VERSION => Ok(()),
		got => Err(StoreError::SchemaVersionMismatch {
			expected: SCHEMA_VERSION,
			got,
		}),
	}
}

fn open_connection(path: &Path, writable: bool) -> Result<Connection> {
	let flags = if writable {
		OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
	} else {
		OpenFlags::SQLITE_OPEN_READ_ONLY
	} | OpenFlags::SQLITE_OPEN_NO_MUTEX;

	let conn = Connection::open_with_flags(path, flags)?;
	if writable {
		conn.pragma_update(None, "journal_mode", "WAL")?;
		conn.pragma_update(None, "synchronous", "NORMAL")?;
	}
	conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
	Ok(conn)
}
