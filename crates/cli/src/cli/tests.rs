use clap::Parser;
use pretty_assertions::assert_eq;

use super::*;

fn parse(args: &[&str]) -> Cli {
	Cli::try_parse_from(std::iter::once("easel").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_create_flags_become_request() {
	let cli = parse(&["create", "--x", "-4", "--y", "2", "--width", "10", "--height", "5", "--z", "-1"]);
	assert_eq!(
		cli.command.into_operation(),
		Some(Operation::Create {
			request: WidgetRequest::new(-4, 2, 10, 5, Some(-1)),
		})
	);
}

#[test]
fn test_missing_flags_left_for_validation() {
	let cli = parse(&["update", "7", "--width", "3"]);
	assert_eq!(
		cli.command.into_operation(),
		Some(Operation::Update {
			id: WidgetId(7),
			request: WidgetRequest {
				width: Some(3),
				..WidgetRequest::default()
			},
		})
	);
}

#[test]
fn test_global_flags_after_subcommand() {
	let cli = parse(&["list", "--size", "3", "--backend", "sqlite", "--db", "w.db", "-v"]);
	assert_eq!(cli.backend, Some(BackendKind::Durable));
	assert_eq!(cli.db, Some(PathBuf::from("w.db")));
	assert!(cli.verbose);
	assert_eq!(
		cli.command.into_operation(),
		Some(Operation::List {
			page: None,
			size: Some(3),
		})
	);
}

#[test]
fn test_batch_has_no_single_operation() {
	assert_eq!(parse(&["batch"]).command.into_operation(), None);
}

#[test]
fn test_unknown_backend_rejected() {
	assert!(Cli::try_parse_from(["easel", "--backend", "redis", "get", "1"]).is_err());
}
