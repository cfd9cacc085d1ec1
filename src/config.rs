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

//! Thresholds and tolerances for all analyses.
//!
//! A single [`Config`] value is handed to the GLN engine, the graph builder and
//! the assembler. It is read from the `config` section of a YAML job file,
//! where every field is optional:
//!
//! ~~~yaml
//! epsilon: 1.0e-4
//! precision: 2
//! loops: both
//! thresholds: { trivial: 0.69, extended: 0.55, supercoiled: 1.5 }
//! graph: { max_bridge_length: 10.0, closures: false }
//! assembly: { cost_ceiling_per_chain: 10.0, min_separation_fraction: 0.1 }
//! ~~~

use std::path::Path;

use anyhow::Context as AnyhowContext;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::vector::{Tolerance, DEFAULT_EPSILON};
use crate::MAX_CHAINS;

/// GLN thresholds separating the lasso classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
#[validate(schema(function = "validate_thresholds"))]
pub struct Thresholds {
    /// Below this the loop is not pierced (`g`)
    #[validate(range(min = 0.0))]
    pub trivial: f64,
    /// Whole-loop GLN separating `L2+` from `L3+` (`h`)
    #[validate(range(min = 0.0))]
    pub extended: f64,
    /// At or above this the loop is supercoiled (`sl`)
    #[validate(range(min = 0.0))]
    pub supercoiled: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            trivial: 0.69,
            extended: 0.55,
            supercoiled: 1.5,
        }
    }
}

fn validate_thresholds(thresholds: &Thresholds) -> Result<(), ValidationError> {
    if thresholds.trivial >= thresholds.supercoiled {
        return Err(ValidationError::new(
            "trivial threshold must be below the supercoiled threshold",
        ));
    }
    Ok(())
}

/// Which polymer is closed into a loop when computing sub-loop GLNs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopSide {
    /// Both combinations
    #[default]
    Both,
    /// Only the first polymer acts as the loop
    First,
    /// Only the second polymer acts as the loop
    Second,
}

impl LoopSide {
    pub const fn includes_first(&self) -> bool {
        matches!(self, Self::Both | Self::First)
    }

    pub const fn includes_second(&self) -> bool {
        matches!(self, Self::Both | Self::Second)
    }
}

/// Settings for building the bridge/backbone graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Bridges longer than this (Å) are reported
    #[validate(range(min = 0.0))]
    pub max_bridge_length: f64,
    /// Shortest natural distance between sequence neighbours (Å)
    #[validate(range(min = 0.0))]
    pub backbone_min: f64,
    /// Longest natural distance between sequence neighbours (Å)
    #[validate(range(min = 0.0))]
    pub backbone_max: f64,
    /// Ignore bridges between residues `i` and `i+1` of the same chain
    pub skip_sequence_neighbours: bool,
    /// Join the termini of every bridged chain through a synthetic closure node
    pub closures: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_bridge_length: 10.0,
            backbone_min: 2.0,
            backbone_max: 4.2,
            skip_sequence_neighbours: true,
            closures: false,
        }
    }
}

/// Settings for the macrolink assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblyConfig {
    /// Joints longer than this (Å) are reported
    #[validate(range(min = 0.0))]
    pub max_joint_distance: f64,
    /// Residue pairs closer than this (Å) are candidate bridges
    #[validate(range(min = 0.0))]
    pub candidate_cutoff: f64,
    /// Give up on a permutation once its cost exceeds this times the number of chains
    #[validate(range(min = 0.0))]
    pub cost_ceiling_per_chain: f64,
    /// Bridge ends on a chain must be further apart than this fraction of its span
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_separation_fraction: f64,
    /// Largest number of chains accepted
    #[validate(custom(function = "validate_max_chains"))]
    pub max_chains: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_joint_distance: 10.0,
            candidate_cutoff: 10.0,
            cost_ceiling_per_chain: 10.0,
            min_separation_fraction: 0.1,
            max_chains: MAX_CHAINS,
        }
    }
}

fn validate_max_chains(max_chains: usize) -> Result<(), ValidationError> {
    if !(2..=MAX_CHAINS).contains(&max_chains) {
        return Err(ValidationError::new("max_chains must be between 2 and 5"));
    }
    Ok(())
}

/// Complete set of analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Builder)]
#[serde(default, deny_unknown_fields)]
#[builder(default)]
pub struct Config {
    /// Absolute tolerance for geometric comparisons
    #[validate(range(min = 0.0))]
    pub epsilon: f64,
    /// Decimals kept when reporting GLN values
    #[validate(range(max = 15))]
    pub precision: u32,
    /// Loop side(s) analysed by the GLN engine
    pub loops: LoopSide,
    #[validate(nested)]
    pub thresholds: Thresholds,
    #[validate(nested)]
    pub graph: GraphConfig,
    #[validate(nested)]
    pub assembly: AssemblyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            precision: 2,
            loops: LoopSide::default(),
            thresholds: Thresholds::default(),
            graph: GraphConfig::default(),
            assembly: AssemblyConfig::default(),
        }
    }
}

impl Config {
    /// Read and validate a configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Could not open configuration file {}", path.display()))?;
        let config: Self = serde_yaml::from_reader(file)?;
        config.check()?;
        Ok(config)
    }

    /// Validate all fields.
    pub fn check(&self) -> crate::Result<()> {
        self.validate()?;
        Ok(())
    }

    pub const fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.epsilon)
    }

    /// Round a value to the reporting precision.
    pub fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.precision as i32);
        (value * scale).round() / scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.check().is_ok());
        assert_approx_eq!(f64, config.thresholds.trivial, 0.69);
        assert_approx_eq!(f64, config.thresholds.extended, 0.55);
        assert_approx_eq!(f64, config.thresholds.supercoiled, 1.5);
        assert_approx_eq!(f64, config.tolerance().epsilon(), 1e-4);
        assert_eq!(config.loops, LoopSide::Both);
        assert_eq!(config.assembly.max_chains, 5);
    }

    #[test]
    fn partial_yaml() {
        let yaml = "precision: 3\nthresholds: { trivial: 0.5 }\nloops: second\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.precision, 3);
        assert_approx_eq!(f64, config.thresholds.trivial, 0.5);
        assert_approx_eq!(f64, config.thresholds.supercoiled, 1.5);
        assert!(!config.loops.includes_first());
        assert!(config.loops.includes_second());
        assert_eq!(config.graph, GraphConfig::default());
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(serde_yaml::from_str::<Config>("tresholds: {}").is_err());
    }

    #[test]
    fn invalid_values() {
        let mut config = Config::default();
        config.thresholds.trivial = 2.0;
        assert!(config.check().is_err());

        let mut config = Config::default();
        config.assembly.max_chains = 6;
        assert!(matches!(config.check(), Err(crate::Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.assembly.min_separation_fraction = -0.1;
        assert!(config.check().is_err());
    }

    #[test]
    fn builder_and_rounding() {
        let config = ConfigBuilder::default().precision(1).build().unwrap();
        assert_approx_eq!(f64, config.round(0.6849), 0.7);
        assert_approx_eq!(f64, config.round(-1.04), -1.0);
        assert_approx_eq!(f64, Config::default().round(0.685001), 0.69);
    }
}
