use clap::Parser;
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

fn parse(args: &[&str]) -> Cli {
	Cli::try_parse_from(std::iter::once("hostfacts").chain(args.iter().copied())).unwrap()
}

#[test]
fn bare_invocation_runs() {
	let cli = parse(&[]);
	assert_eq!(cli.command(), Command::Run { dry_run: false });
	assert_eq!(cli.global, GlobalArgs::default());
}

#[rstest]
#[case(&["run", "--dry-run"], Command::Run { dry_run: true })]
#[case(&["list"], Command::List)]
#[case(&["show", "sip_status", "top_user"], Command::Show { names: vec!["sip_status".into(), "top_user".into()] })]
fn subcommands(#[case] args: &[&str], #[case] expected: Command) {
	assert_eq!(parse(args).command(), expected);
}

#[test]
fn global_flags_after_subcommand() {
	let cli = parse(&[
		"run",
		"--facts-dir",
		"/opt/facts",
		"--managed-install-dir",
		"/var/munki",
		"-j",
		"2",
		"--timeout",
		"15",
		"-vv",
		"--log-format",
		"json",
	]);
	assert_eq!(cli.global.facts_dir, Some(PathBuf::from("/opt/facts")));
	assert_eq!(cli.global.managed_install_dir, Some(PathBuf::from("/var/munki")));
	assert_eq!(cli.global.jobs, Some(2));
	assert_eq!(cli.global.timeout, Some(15));
	assert_eq!(cli.global.verbose, 2);
	assert_eq!(cli.global.log_format, LogFormat::Json);
}

#[test]
fn show_requires_a_name() {
	assert!(Cli::try_parse_from(["hostfacts", "show"]).is_err());
}
