use std::path::PathBuf;

use easel_primitives::WidgetId;
use thiserror::Error;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("sqlite error: {0}")]
	Sqlite(#[from] rusqlite::Error),
	#[error("json encode failed: {0}")]
	Json(#[from] serde_json::Error),
	#[error("io error at {path:?}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	/// A replace, delete, or lookup referenced an id with no record.
	#[error("widget {0} does not exist")]
	Missing(WidgetId),
	/// Publishing would expose two widgets with the same `z`.
	#[error("z-index {z} held by widgets {first} and {second}")]
	DuplicateZ {
		z: i32,
		first: WidgetId,
		second: WidgetId,
	},
	/// A shift would move a widget past `i32::MAX`.
	#[error("z-index of widget {0} cannot be increased")]
	ZOverflow(WidgetId),
	#[error("widget id space exhausted")]
	IdOverflow,
	#[error("schema version mismatch: expected {expected}, got {got}")]
	SchemaVersionMismatch { expected: i64, got: i64 },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
