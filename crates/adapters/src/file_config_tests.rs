// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use sv_core::registry::InstancePath;
use tempfile::NamedTempFile;

use super::*;

const SAMPLE: &str = r#"
[[groups]]
name = "ingest"
enabled = true

  [[groups.modules]]
  name = "worker"
  executable = "/usr/bin/worker"

    [[groups.modules.instances]]
    name = "worker-0"
    argv = ["worker-0", "--id", "0"]
    enabled = true
    max_restarts_per_minute = 5

      [[groups.modules.instances.input_interfaces]]
      id = "in1"

      [[groups.modules.instances.output_interfaces]]
      id = "out1"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), content).unwrap();
    file
}

#[test]
fn load_initial_builds_the_registry_tree() {
    let file = write_config(SAMPLE);
    let adapter = FileConfigAdapter::new(file.path());

    let registry = adapter.load_initial().unwrap();

    let path = InstancePath::new("ingest", "worker", "worker-0");
    let instance = registry.get_instance(&path).unwrap();
    assert!(instance.enabled);
    assert_eq!(instance.max_restarts_per_minute, 5);
    assert_eq!(instance.exec_argv, vec!["worker-0", "--id", "0"]);
    assert_eq!(instance.input_interfaces.len(), 1);
    assert_eq!(instance.output_interfaces.len(), 1);
    assert_eq!(
        registry.executable_for(&path),
        Some(std::path::Path::new("/usr/bin/worker"))
    );
}

#[test]
fn load_initial_rejects_malformed_toml() {
    let file = write_config("not valid toml {{{");
    let adapter = FileConfigAdapter::new(file.path());

    assert!(adapter.load_initial().is_err());
}

#[test]
fn load_initial_rejects_missing_file() {
    let adapter = FileConfigAdapter::new("/no/such/config.toml");

    assert!(adapter.load_initial().is_err());
}

#[test]
fn commit_persists_pids_to_sibling_json_file() {
    let file = write_config(SAMPLE);
    let adapter = FileConfigAdapter::new(file.path());
    let path = InstancePath::new("ingest", "worker", "worker-0");

    adapter.persist_pid(&path, 4242).unwrap();
    adapter.commit().unwrap();

    let pid_file = adapter.pid_file();
    let content = std::fs::read_to_string(pid_file).unwrap();
    let parsed: std::collections::HashMap<String, i32> = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.get("ingest/worker/worker-0"), Some(&4242));
}

#[test]
fn subscribe_changes_accepts_but_never_invokes_callback() {
    let file = write_config(SAMPLE);
    let adapter = FileConfigAdapter::new(file.path());

    adapter
        .subscribe_changes(Box::new(|_delta| {
            panic!("file-backed adapter never calls back");
        }))
        .unwrap();
}
