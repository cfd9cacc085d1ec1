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

//! # Job files
//!
//! A job is a YAML document with one task and an optional `config` section:
//!
//! ~~~yaml
//! config:
//!   precision: 3
//! task:
//!   cycles:
//!     chains:
//!       - name: A
//!         samples: [[1, 0.0, 0.0, 0.0], [2, 3.8, 0.0, 0.0], ...]
//!     bridges:
//!       - first: { chain: A, site: 2 }
//!         second: { chain: A, site: 6 }
//! ~~~
//!
//! Running a job gives a [`Report`] which is written back as YAML.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::gln::{GlnAnalysis, GlnEngine};
use crate::macrolink::{Assembler, Assembly, Joint, Traversal};
use crate::topology::{Bridge, BridgeKind, BridgeUsage, Cycle, CycleFinder, TopologyGraph};
use crate::{Chain, Config, Polymer, Sample, Tolerance, Warning};

/// Polymer given as samples, optionally cut to a label range and closed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolymerInput {
    pub samples: Vec<Sample>,
    /// First label kept
    #[serde(default)]
    pub begin: Option<i64>,
    /// Last label kept
    #[serde(default)]
    pub end: Option<i64>,
    /// Append the first sample to form a loop
    #[serde(default)]
    pub close: bool,
}

impl PolymerInput {
    pub fn build(&self, tolerance: &Tolerance) -> crate::Result<Polymer> {
        let mut polymer = Polymer::new(self.samples.iter().copied(), tolerance)?;
        if self.begin.is_some() || self.end.is_some() {
            let begin = self.begin.or(polymer.first().map(|s| s.label)).unwrap_or_default();
            let end = self.end.or(polymer.last().map(|s| s.label)).unwrap_or_default();
            polymer = polymer.restrict(begin, end);
        }
        Ok(if self.close { polymer.close() } else { polymer })
    }
}

/// Named chain given as samples in sequence order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainInput {
    pub name: String,
    pub samples: Vec<Sample>,
}

/// Strategy for joining chains into a macrolink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyMode {
    /// Join chain termini
    #[default]
    Termini,
    /// Join nearby residue pairs
    Closest,
}

/// Analysis to perform.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Linking numbers between two polymers
    Gln {
        first: PolymerInput,
        second: PolymerInput,
    },
    /// Loops closed by bridges between chains
    Cycles {
        chains: Vec<ChainInput>,
        bridges: Vec<Bridge>,
        #[serde(default)]
        usage: BridgeUsage,
        /// Require exactly one loop and report only that
        #[serde(default)]
        merge: bool,
        /// Polymer threading each loop, for GLN analysis
        #[serde(default)]
        threading: Option<PolymerInput>,
    },
    /// One closed curve through all chains
    Assemble {
        chains: Vec<ChainInput>,
        #[serde(default)]
        mode: AssemblyMode,
        /// Polymer threading the macrolink, for GLN analysis
        #[serde(default)]
        threading: Option<PolymerInput>,
    },
}

/// Complete job description.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    #[serde(default)]
    pub config: Config,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub task: Task,
}

/// Loop found in a bridge graph.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub shortcut: String,
    /// Shortcut with bridge kinds
    pub annotated_shortcut: String,
    /// Kinds of the bridges crossed, in order
    pub bridges: Vec<BridgeKind>,
    pub chains: Vec<String>,
    /// Residues along the loop, e.g. `A_57`
    pub atoms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gln: Option<GlnAnalysis>,
}

/// Outcome of a macrolink search.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyReport {
    pub mode: AssemblyMode,
    pub feasible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traversals: Vec<Traversal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub joints: Vec<Joint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gln: Option<GlnAnalysis>,
}

/// Result of running a job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Report {
    Gln(GlnAnalysis),
    Cycles {
        cycles: Vec<CycleReport>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<Warning>,
    },
    Assemble(AssemblyReport),
}

/// Configuration and report as written to the output file.
///
/// Enums in the report are written as single-key maps, e.g. `assemble: {...}`.
#[derive(Debug, Serialize)]
pub struct Output<'a> {
    pub config: &'a Config,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub report: &'a Report,
}

impl Job {
    /// Read and validate a job from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Could not open job file {}", path.display()))?;
        let job: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Could not parse job file {}", path.display()))?;
        job.config.check()?;
        Ok(job)
    }

    pub fn run(&self) -> Result<Report> {
        let tolerance = self.config.tolerance();
        let engine = GlnEngine::new(self.config.clone());
        match &self.task {
            Task::Gln { first, second } => {
                let first = first.build(&tolerance).context("Invalid first polymer")?;
                let second = second.build(&tolerance).context("Invalid second polymer")?;
                Ok(Report::Gln(engine.analyze(&first, &second)?))
            }
            Task::Cycles {
                chains,
                bridges,
                usage,
                merge,
                threading,
            } => {
                let chains = build_chains(chains, &tolerance)?;
                let threading = build_threading(threading.as_ref(), &tolerance)?;
                let graph = TopologyGraph::new(&chains, bridges, &self.config.graph)?;
                let finder = CycleFinder::new(&graph);
                let cycles = if *merge {
                    vec![finder.merge()?]
                } else {
                    finder.find(*usage)
                };
                log::info!("Found {} loop(s)", cycles.len());
                let cycles = cycles
                    .iter()
                    .map(|cycle| cycle_report(cycle, &engine, threading.as_ref()))
                    .collect::<Result<_>>()?;
                Ok(Report::Cycles {
                    cycles,
                    warnings: graph.warnings().to_vec(),
                })
            }
            Task::Assemble {
                chains,
                mode,
                threading,
            } => {
                let chains = build_chains(chains, &tolerance)?;
                let threading = build_threading(threading.as_ref(), &tolerance)?;
                let assembler = Assembler::new(&chains, self.config.assembly.clone())?;
                let assembly = match mode {
                    AssemblyMode::Termini => assembler.termini(),
                    AssemblyMode::Closest => assembler.closest(),
                };
                assembly_report(assembly, *mode, &engine, threading.as_ref()).map(Report::Assemble)
            }
        }
    }
}

fn build_chains(inputs: &[ChainInput], tolerance: &Tolerance) -> Result<Vec<Chain>> {
    inputs
        .iter()
        .map(|input| {
            let polymer = Polymer::new(input.samples.iter().copied(), tolerance)
                .with_context(|| format!("Invalid chain '{}'", input.name))?;
            Ok(Chain::new(input.name.clone(), polymer))
        })
        .collect()
}

fn build_threading(input: Option<&PolymerInput>, tolerance: &Tolerance) -> Result<Option<Polymer>> {
    input
        .map(|input| input.build(tolerance).context("Invalid threading polymer"))
        .transpose()
}

fn cycle_report(
    cycle: &Cycle,
    engine: &GlnEngine,
    threading: Option<&Polymer>,
) -> Result<CycleReport> {
    let gln = threading
        .map(|threading| engine.analyze(&cycle.to_polymer(), threading))
        .transpose()
        .with_context(|| format!("GLN analysis of loop {}", cycle.shortcut()))?;
    Ok(CycleReport {
        shortcut: cycle.shortcut(),
        annotated_shortcut: cycle.annotated_shortcut(),
        bridges: cycle.bridge_kinds(),
        chains: cycle.chain_names().iter().map(|name| name.to_string()).collect(),
        atoms: cycle.atom_names(),
        gln,
    })
}

fn assembly_report(
    assembly: Assembly,
    mode: AssemblyMode,
    engine: &GlnEngine,
    threading: Option<&Polymer>,
) -> Result<AssemblyReport> {
    let Some(arrangement) = assembly.into_arrangement() else {
        log::info!("No feasible macrolink");
        return Ok(AssemblyReport {
            mode,
            feasible: false,
            shortcut: None,
            cost: None,
            traversals: Vec::new(),
            joints: Vec::new(),
            warnings: Vec::new(),
            gln: None,
        });
    };
    let shortcut = arrangement.shortcut();
    log::info!("Macrolink {} with cost {:.2}", shortcut, arrangement.cost());
    let gln = threading
        .map(|threading| engine.analyze(&arrangement.to_polymer(), threading))
        .transpose()
        .context("GLN analysis of macrolink")?;
    Ok(AssemblyReport {
        mode,
        feasible: true,
        shortcut: Some(shortcut),
        cost: Some(engine.config().round(arrangement.cost())),
        traversals: arrangement.traversals().to_vec(),
        joints: arrangement.joints().to_vec(),
        warnings: arrangement.warnings().to_vec(),
        gln,
    })
}
