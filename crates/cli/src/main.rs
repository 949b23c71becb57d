//! Easel command-line front end.
//!
//! Opens the configured widget store once and runs either a single operation or
//! a batch of JSON commands from stdin against it. Results go to stdout as JSON;
//! logs go to stderr.

mod batch;
mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use easel_config::Config;
use easel_service::{ErrorResponse, WidgetService};
use tracing::info;

fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();

	let mut config = Config::discover(cli.config.as_deref()).context("failed to load configuration")?;
	if let Some(backend) = cli.backend {
		config.storage.backend = backend;
	}
	if let Some(db) = cli.db {
		config.storage.path = db;
	}

	let level = if cli.verbose {
		tracing::Level::DEBUG
	} else {
		config.log.level.parse().unwrap_or(tracing::Level::INFO)
	};
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(level)
		.with_writer(io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let store = config
		.storage
		.store_spec()
		.open()
		.context("failed to open widget store")?;
	let service = WidgetService::with_limits(store, config.listing.limits());

	let stdout = io::stdout();
	let mut out = stdout.lock();

	let Some(operation) = cli.command.into_operation() else {
		let summary = batch::run(&service, io::stdin().lock(), &mut out)?;
		info!(executed = summary.executed, failed = summary.failed, "batch finished");
		return Ok(ExitCode::SUCCESS);
	};

	match operation.execute(&service) {
		Ok(output) => {
			serde_json::to_writer_pretty(&mut out, &output)?;
			writeln!(out)?;
			Ok(ExitCode::SUCCESS)
		}
		Err(err) => {
			let response = ErrorResponse::from(&err);
			let mut stderr = io::stderr().lock();
			serde_json::to_writer_pretty(&mut stderr, &response)?;
			writeln!(stderr)?;
			Ok(ExitCode::FAILURE)
		}
	}
}
