//! Operations shared by single commands and batch mode.
//!
//! Batch input is one JSON object per line, tagged by `op`:
//!
//! ```text
//! {"op":"create","request":{"x":0,"y":0,"width":10,"height":10,"z":1}}
//! {"op":"update","id":1,"request":{"x":0,"y":0,"width":10,"height":10}}
//! {"op":"delete","id":1}
//! {"op":"get","id":1}
//! {"op":"list","page":0,"size":10}
//! ```
//!
//! Each line produces one JSON line on the output: the result, or an
//! [`ErrorResponse`] envelope. A failing line does not stop the batch.

use std::io::{BufRead, Write};

use easel_primitives::{Page, Widget, WidgetId, WidgetRequest};
use easel_service::{ErrorResponse, ServiceError, WidgetService};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
	Create {
		request: WidgetRequest,
	},
	Update {
		id: WidgetId,
		request: WidgetRequest,
	},
	Delete {
		id: WidgetId,
	},
	Get {
		id: WidgetId,
	},
	List {
		#[serde(default)]
		page: Option<u32>,
		#[serde(default)]
		size: Option<u32>,
	},
}

/// Successful result of an [`Operation`].
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Output {
	Widget(Widget),
	Page(Page<Widget>),
}

impl Operation {
	pub fn execute(self, service: &WidgetService) -> Result<Output, ServiceError> {
		Ok(match self {
			Self::Create { request } => Output::Widget(service.create(&request)?),
			Self::Update { id, request } => Output::Widget(service.update(id, &request)?),
			Self::Delete { id } => Output::Widget(service.delete(id)?),
			Self::Get { id } => Output::Widget(service.get(id)?),
			Self::List { page, size } => Output::Page(service.list(service.page_request(page, size))?),
		})
	}
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
	pub executed: usize,
	pub failed: usize,
}

/// Runs every line of `input` against `service`, writing one result line each.
///
/// Only I/O failures on `input` or `output` abort the batch.
pub fn run(service: &WidgetService, input: impl BufRead, output: &mut impl Write) -> anyhow::Result<Summary> {
	let mut summary = Summary::default();

	for (index, line) in input.lines().enumerate() {
		let line = line?;
		if line.trim().is_empty() {
			continue;
		}
		summary.executed += 1;

		let result = match serde_json::from_str::<Operation>(&line) {
			Ok(operation) => {
				debug!(line = index + 1, ?operation, "batch operation");
				operation.execute(service).map_err(|err| ErrorResponse::from(&err))
			}
			Err(err) => Err(ErrorResponse::new(format!(
				"Malformed command on line {}: {err}",
				index + 1
			))),
		};

		match result {
			Ok(out) => serde_json::to_writer(&mut *output, &out)?,
			Err(response) => {
				summary.failed += 1;
				warn!(line = index + 1, message = %response.message, "batch operation failed");
				serde_json::to_writer(&mut *output, &response)?;
			}
		}
		writeln!(output)?;
	}

	output.flush()?;
	Ok(summary)
}
