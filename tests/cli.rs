// Copyright 2023 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! Tests of the command line front end.

mod common;

use std::path::Path;

use common::{lookup, read_yaml, run_macrolink};

#[test]
fn run_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("output.yaml");
    let status = run_macrolink(Path::new("tests/files/assemble_termini.yaml"), &output);
    assert!(status.success());

    let yaml = read_yaml(&output);
    assert_eq!(lookup(&yaml, "config.precision").as_u64(), Some(3));
    assert_eq!(lookup(&yaml, "report.assemble.feasible").as_bool(), Some(true));
    assert_eq!(lookup(&yaml, "report.assemble.cost").as_f64(), Some(7.0));
    assert_eq!(
        lookup(&yaml, "report.assemble.traversals.1.chain").as_str(),
        Some("B")
    );
    assert_eq!(
        lookup(&yaml, "report.assemble.traversals.0.orientation").as_str(),
        Some("forward")
    );
}

#[test]
fn run_fails_on_invalid_job() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("output.yaml");
    let status = run_macrolink(Path::new("tests/files/invalid_config.yaml"), &output);
    assert!(!status.success());
}
