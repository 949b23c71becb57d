use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use easel_primitives::{WidgetId, WidgetRequest};
use easel_store::BackendKind;

use crate::batch::Operation;

#[derive(Parser, Debug)]
#[command(name = "easel")]
#[command(about = "Widget store with unique z-ordering")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults to $XDG_CONFIG_HOME/easel/config.toml)
	#[arg(long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Storage backend, overriding the configuration file
	#[arg(long, global = true, value_name = "snapshot|durable")]
	pub backend: Option<BackendKind>,

	/// Database file for the durable backend
	#[arg(long, global = true, value_name = "PATH")]
	pub db: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Create a widget
	Create(WidgetArgs),
	/// Replace the geometry and z of a widget
	Update {
		id: u64,
		#[command(flatten)]
		widget: WidgetArgs,
	},
	/// Delete a widget
	Delete { id: u64 },
	/// Show a widget
	Get { id: u64 },
	/// List widgets ordered by z
	List {
		/// Zero-based page index
		#[arg(long)]
		page: Option<u32>,
		/// Widgets per page
		#[arg(long)]
		size: Option<u32>,
	},
	/// Run JSON commands read line by line from stdin
	Batch,
}

impl Command {
	/// The single operation this command runs, or `None` for `batch`.
	pub fn into_operation(self) -> Option<Operation> {
		Some(match self {
			Self::Create(widget) => Operation::Create {
				request: widget.into(),
			},
			Self::Update { id, widget } => Operation::Update {
				id: WidgetId(id),
				request: widget.into(),
			},
			Self::Delete { id } => Operation::Delete { id: WidgetId(id) },
			Self::Get { id } => Operation::Get { id: WidgetId(id) },
			Self::List { page, size } => Operation::List { page, size },
			Self::Batch => return None,
		})
	}
}

/// Geometry and placement flags. Missing values are reported by validation.
#[derive(Args, Debug, Default)]
pub struct WidgetArgs {
	#[arg(long, allow_negative_numbers = true)]
	pub x: Option<i32>,
	#[arg(long, allow_negative_numbers = true)]
	pub y: Option<i32>,
	#[arg(long, allow_negative_numbers = true)]
	pub width: Option<i32>,
	#[arg(long, allow_negative_numbers = true)]
	pub height: Option<i32>,
	/// Stacking position; omitted places the widget in front of all others
	#[arg(long, allow_negative_numbers = true)]
	pub z: Option<i32>,
}

impl From<WidgetArgs> for WidgetRequest {
	fn from(args: WidgetArgs) -> Self {
		Self {
			width: args.width,
			height: args.height,
			x: args.x,
			y: args.y,
			z: args.z,
		}
	}
}

#[cfg(test)]
mod tests;
