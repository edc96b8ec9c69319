// flowguard/tests/driver_tests.rs
//
// End-to-end CLI tests: build a tiny synthetic `specs/` tree in a tempdir,
// run the `flowguard` binary against it, and assert on exit code and the
// two emitted report files.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

struct ProjectEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl ProjectEnv {
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().to_path_buf();
        Self { _tmp: tmp, root }
    }

    fn write(&self, relative: &str, contents: &str) {
        let path = self.root.join("specs").join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write fixture");
    }

    fn flowguard(&self) -> Command {
        let mut cmd = Command::cargo_bin("flowguard").expect("flowguard binary");
        cmd.arg(self.root.to_str().expect("utf8 path"));
        cmd
    }

    fn report(&self, name: &str) -> String {
        fs::read_to_string(self.root.join(name)).unwrap_or_else(|e| panic!("reading {name}: {e}"))
    }
}

fn good_domain_yaml() -> &'static str {
    "name: orders\n\
     flows:\n\
     \x20 - id: create\n\
     \x20   name: Create order\n\
     \x20   type: traditional\n"
}

fn good_flow_yaml() -> &'static str {
    "trigger:\n\
     \x20 id: trigger\n\
     \x20 type: trigger\n\
     \x20 spec:\n\
     \x20   event: order.create\n\
     \x20 connections:\n\
     \x20   - target_node_id: done\n\
     \x20     source_handle: success\n\
     nodes:\n\
     \x20 - id: done\n\
     \x20   type: terminal\n\
     \x20   spec: {}\n"
}

fn broken_flow_yaml() -> &'static str {
    // No trigger at all -> flow-scope error (graph completeness).
    "trigger: null\nnodes: []\n"
}

#[test]
fn check_runs_successfully_on_a_clean_project() {
    let env = ProjectEnv::new();
    env.write("domains/orders/domain.yaml", good_domain_yaml());
    env.write("domains/orders/flows/create.yaml", good_flow_yaml());

    env.flowguard().assert().success().stdout(predicate::str::contains("Quality score"));

    let compat = env.report("tool-compatibility-report.yaml");
    assert!(compat.contains("tool-compatibility-report"));
    assert!(compat.contains("FULLY_COMPATIBLE"));

    let quality = env.report("spec-quality-report.yaml");
    assert!(quality.contains("spec-quality-report"));
}

#[test]
fn check_still_exits_zero_when_a_flow_has_validation_errors() {
    // The driver's own exit code reflects whether it ran, not whether the
    // corpus it inspected is clean -- that verdict lives inside the reports.
    let env = ProjectEnv::new();
    env.write("domains/orders/domain.yaml", good_domain_yaml());
    env.write("domains/orders/flows/create.yaml", broken_flow_yaml());

    env.flowguard().assert().success();

    let quality = env.report("spec-quality-report.yaml");
    assert!(quality.contains("errors:"));
}

#[test]
fn check_reports_json_output_when_requested() {
    let env = ProjectEnv::new();
    env.write("domains/orders/domain.yaml", good_domain_yaml());
    env.write("domains/orders/flows/create.yaml", good_flow_yaml());

    let mut cmd = Command::cargo_bin("flowguard").expect("flowguard binary");
    cmd.arg(env.root.to_str().unwrap()).arg("--format").arg("json");
    cmd.assert().success().stdout(predicate::str::contains("\"compatibility\""));
}

#[test]
fn flow_subcommand_validates_a_single_file_in_isolation() {
    let env = ProjectEnv::new();
    env.write("domains/orders/domain.yaml", good_domain_yaml());
    env.write("domains/orders/flows/create.yaml", good_flow_yaml());

    let flow_path = env.root.join("specs/domains/orders/flows/create.yaml");
    let mut cmd = Command::cargo_bin("flowguard").expect("flowguard binary");
    cmd.arg("flow").arg(flow_path).arg("--domain").arg("orders");
    cmd.assert().success().stdout(predicate::str::contains("error_count: 0"));
}
