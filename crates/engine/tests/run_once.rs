//! End-to-end runs against external producer scripts.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use hostfacts_engine::{ApplyOutcome, EngineError, ProducerError, Settings, StaticPreference, run_once};
use plist::{Dictionary, Value};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Host {
	_root: TempDir,
	facts: PathBuf,
	managed: PathBuf,
}

impl Host {
	fn new() -> Self {
		let root = tempfile::tempdir().unwrap();
		let facts = root.path().join("facts");
		let managed = root.path().join("Managed Installs");
		fs::create_dir(&facts).unwrap();
		fs::create_dir(&managed).unwrap();
		Self {
			_root: root,
			facts,
			managed,
		}
	}

	fn producer(&self, name: &str, body: &str) {
		let path = self.facts.join(name);
		fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
		fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
	}

	fn document(&self) -> PathBuf {
		self.managed.join("ConditionalItems.plist")
	}

	fn settings(&self) -> Settings {
		Settings {
			facts_dir: Some(self.facts.clone()),
			managed_install_dir: Some(self.managed.clone()),
			timeout_secs: 10,
			..Settings::default()
		}
	}

	fn seed(&self, pairs: &[(&str, &str)]) {
		let dict: Dictionary = pairs.iter().map(|(k, v)| (k.to_string(), Value::String(v.to_string()))).collect();
		Value::Dictionary(dict).to_file_xml(self.document()).unwrap();
	}

	fn read(&self) -> Vec<(String, String)> {
		read_strings(&self.document())
	}
}

fn read_strings(path: &Path) -> Vec<(String, String)> {
	let dict = Value::from_file(path).unwrap().into_dictionary().unwrap();
	dict.into_iter()
		.map(|(k, v)| (k, v.into_string().unwrap_or_default()))
		.collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
	items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn failing_producer_is_excluded_and_null_becomes_empty() {
	let host = Host::new();
	host.producer("p1", r#"echo '{"a": "1"}'"#);
	host.producer("p2", "echo 'no such key' >&2; exit 1");
	host.producer("p3", r#"echo '{"b": null}'"#);

	let report = run_once(&host.settings(), &StaticPreference(None)).await.unwrap();

	let failures = report.failures();
	assert_eq!(failures.len(), 1);
	assert_eq!(failures[0].producer, "p2");
	assert!(matches!(failures[0].error(), Some(ProducerError::Exit { .. })));
	assert_eq!(report.apply, Some(ApplyOutcome::Written { facts: 2, retained: 0 }));
	assert_eq!(host.read(), pairs(&[("a", "1"), ("b", "")]));
}

#[tokio::test]
async fn hung_producer_is_stopped_at_timeout() {
	let host = Host::new();
	let marker = host.facts.join("hang.done");
	host.producer("fast", r#"echo '{"a": "1"}'"#);
	host.producer("hang", &format!("sleep 2\ntouch '{}'\necho '{{\"late\": \"yes\"}}'", marker.display()));
	let settings = Settings {
		timeout_secs: 1,
		..host.settings()
	};

	let report = run_once(&settings, &StaticPreference(None)).await.unwrap();

	let failures = report.failures();
	assert_eq!(failures.len(), 1);
	assert_eq!(failures[0].producer, "hang");
	assert_eq!(failures[0].error(), Some(&ProducerError::TimedOut(std::time::Duration::from_secs(1))));
	assert_eq!(host.read(), pairs(&[("a", "1")]));

	tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
	assert!(!marker.exists());
}

#[tokio::test]
async fn prior_keys_are_overwritten_or_kept() {
	let host = Host::new();
	host.seed(&[("x", "old"), ("site", "hq")]);
	host.producer("facts", r#"echo '{"x": "new", "y": "z"}'"#);

	run_once(&host.settings(), &StaticPreference(None)).await.unwrap();
	assert_eq!(host.read(), pairs(&[("x", "new"), ("site", "hq"), ("y", "z")]));
}

#[tokio::test]
async fn run_without_facts_leaves_document_alone() {
	let host = Host::new();
	host.seed(&[("x", "old")]);
	host.producer("silent", "exit 0");
	let before = fs::read(host.document()).unwrap();

	let report = run_once(&host.settings(), &StaticPreference(None)).await.unwrap();
	assert_eq!(report.apply, Some(ApplyOutcome::Skipped));
	assert_eq!(fs::read(host.document()).unwrap(), before);
}

#[tokio::test]
async fn corrupt_document_is_replaced() {
	let host = Host::new();
	fs::write(host.document(), b"\x00\x01 not a plist").unwrap();
	host.producer("p1", r#"echo '{"a": "1"}'"#);

	run_once(&host.settings(), &StaticPreference(None)).await.unwrap();
	assert_eq!(host.read(), pairs(&[("a", "1")]));
}

#[tokio::test]
async fn same_facts_twice_give_same_document() {
	let host = Host::new();
	host.seed(&[("keep", "me")]);
	host.producer("p1", r#"echo '{"a": "1", "b": "2"}'"#);

	run_once(&host.settings(), &StaticPreference(None)).await.unwrap();
	let once = fs::read(host.document()).unwrap();
	run_once(&host.settings(), &StaticPreference(None)).await.unwrap();
	assert_eq!(fs::read(host.document()).unwrap(), once);
}

#[tokio::test]
async fn later_producer_wins_on_shared_fact() {
	let host = Host::new();
	host.producer("b_second", r#"echo '{"shared": "second"}'"#);
	host.producer("a_first", r#"echo '{"shared": "first"}'"#);

	let report = run_once(&host.settings(), &StaticPreference(None)).await.unwrap();
	let order: Vec<_> = report.outcomes.iter().map(|o| o.producer.as_str()).collect();
	assert_eq!(order, ["a_first", "b_second"]);
	assert_eq!(host.read(), pairs(&[("shared", "second")]));
}

#[tokio::test]
async fn document_dir_comes_from_preference() {
	let host = Host::new();
	host.producer("p1", r#"echo '{"a": "1"}'"#);
	let settings = Settings {
		managed_install_dir: None,
		..host.settings()
	};

	let report = run_once(&settings, &StaticPreference(Some(host.managed.clone()))).await.unwrap();
	assert_eq!(report.document, host.document());
	assert_eq!(host.read(), pairs(&[("a", "1")]));
}

#[tokio::test]
async fn dry_run_does_not_write() {
	let host = Host::new();
	host.producer("p1", r#"echo '{"a": "1"}'"#);
	let settings = Settings {
		dry_run: true,
		..host.settings()
	};

	let report = run_once(&settings, &StaticPreference(None)).await.unwrap();
	assert_eq!(report.apply, None);
	assert_eq!(report.merged.len(), 1);
	assert!(!host.document().exists());
}

#[tokio::test]
async fn disabled_producer_does_not_run() {
	let host = Host::new();
	host.producer("p1", r#"echo '{"a": "1"}'"#);
	host.producer("p2", r#"echo '{"b": "2"}'"#);
	let settings = Settings {
		disabled: vec!["p2".to_string()],
		..host.settings()
	};

	let report = run_once(&settings, &StaticPreference(None)).await.unwrap();
	assert_eq!(report.outcomes.len(), 1);
	assert_eq!(host.read(), pairs(&[("a", "1")]));
}

#[tokio::test]
async fn missing_facts_dir_is_an_empty_run() {
	let host = Host::new();
	host.seed(&[("x", "old")]);
	let settings = Settings {
		facts_dir: Some(host.facts.join("absent")),
		..host.settings()
	};

	let report = run_once(&settings, &StaticPreference(None)).await.unwrap();
	assert!(report.outcomes.is_empty());
	assert_eq!(report.apply, Some(ApplyOutcome::Skipped));
	assert_eq!(host.read(), pairs(&[("x", "old")]));
}

#[tokio::test]
async fn unwritable_document_surfaces_store_error() {
	let host = Host::new();
	host.producer("p1", r#"echo '{"a": "1"}'"#);
	let settings = Settings {
		managed_install_dir: Some(host.managed.join("missing")),
		..host.settings()
	};

	let err = run_once(&settings, &StaticPreference(None)).await.unwrap_err();
	assert!(matches!(err, EngineError::Store(_)));
}

#[tokio::test]
async fn zero_jobs_is_a_config_error() {
	let host = Host::new();
	let settings = Settings { jobs: 0, ..host.settings() };
	let err = run_once(&settings, &StaticPreference(None)).await.unwrap_err();
	assert!(matches!(err, EngineError::Config(_)));
}
