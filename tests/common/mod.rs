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

//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use serde_yaml::Value;

/// Path to the compiled `macrolink` binary.
pub fn macrolink_binary() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_BIN_EXE_macrolink"));
    if !path.exists() {
        path = PathBuf::from("target/debug/macrolink");
    }
    path
}

/// Run `macrolink run` on a job file and return the exit status.
pub fn run_macrolink(input: &Path, output: &Path) -> ExitStatus {
    Command::new(macrolink_binary())
        .arg("-o")
        .arg(output)
        .arg("run")
        .arg("-i")
        .arg(input)
        .status()
        .expect("failed to execute macrolink binary")
}

/// Read a YAML file into a generic value.
pub fn read_yaml(path: &Path) -> Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("cannot read {}: {err}", path.display()));
    serde_yaml::from_str(&text)
        .unwrap_or_else(|err| panic!("invalid YAML in {}: {err}", path.display()))
}

/// Follow a dotted path such as `report.assemble.cost` into a YAML value.
pub fn lookup<'a>(value: &'a Value, path: &str) -> &'a Value {
    path.split('.').fold(value, |node, key| match key.parse::<usize>() {
        Ok(index) => &node[index],
        Err(_) => &node[key],
    })
}
