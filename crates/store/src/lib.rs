//! Storage backends for the widget set.
//!
//! # Purpose
//!
//! Own the authoritative set of widgets and expose the primitive operations the
//! z-ordering engine needs: max-z lookup, ascending scan from a z value, point
//! lookup, save, delete, a bulk "shift up by one", and ordered paging.
//!
//! # Mental model
//!
//! * Reads go through [`WidgetStore`] directly and never wait for a writer.
//! * Mutations go through a [`WriteTxn`] obtained from [`WidgetStore::begin_write`].
//!   The transaction is the single-writer critical section: it spans the conflict
//!   scan, the shift, and the save of one service call.
//! * Nothing a transaction does is visible to readers before [`WriteTxn::commit`].
//!   Dropping a transaction without committing rolls every change back.
//!
//! # Backends
//!
//! | Type | Storage | Reads | Writes |
//! |---|---|---|---|
//! | [`SnapshotStore`] | In-memory ordered map | Wait-free `ArcSwap` snapshot load | Writer mutex, snapshot republished on commit |
//! | [`DurableStore`] | SQLite file (WAL) | Pooled read-only connections | Writer connection, `BEGIN IMMEDIATE`, `z` checked before `COMMIT` |
//!
//! # Invariants
//!
//! * Every committed state has pairwise-distinct `z` values.
//! * Ids are assigned on first save and never reused.

mod durable;
mod error;
mod snapshot;
mod traits;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub use durable::DurableStore;
pub use error::{Result, StoreError};
use serde::{Deserialize, Serialize};
pub use snapshot::{SnapshotStore, SnapshotView};
pub use traits::{WidgetStore, WriteTxn};

/// Which backend implementation holds the widget set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
	/// In-memory store with copy-on-write snapshots.
	#[default]
	#[serde(alias = "memory", alias = "in-memory")]
	Snapshot,
	/// SQLite-backed store that survives restarts.
	#[serde(alias = "sql", alias = "sqlite")]
	Durable,
}

impl BackendKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Snapshot => "snapshot",
			Self::Durable => "durable",
		}
	}
}

impl fmt::Display for BackendKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for BackendKind {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"snapshot" | "memory" | "in-memory" => Ok(Self::Snapshot),
			"durable" | "sql" | "sqlite" => Ok(Self::Durable),
			other => Err(format!(
				"unknown backend '{other}' (expected 'snapshot' or 'durable')"
			)),
		}
	}
}

/// Deployment-time backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSpec {
	Snapshot,
	Durable {
		/// Database file; created along with missing parent directories.
		path: PathBuf,
	},
}

impl StoreSpec {
	pub fn kind(&self) -> BackendKind {
		match self {
			Self::Snapshot => BackendKind::Snapshot,
			Self::Durable { .. } => BackendKind::Durable,
		}
	}

	/// Instantiates the backend.
	pub fn open(&self) -> Result<Arc<dyn WidgetStore>> {
		tracing::info!(backend = %self.kind(), "opening widget store");
		Ok(match self {
			Self::Snapshot => Arc::new(SnapshotStore::new()),
			Self::Durable { path } => Arc::new(DurableStore::open(path)?),
		})
	}
}
