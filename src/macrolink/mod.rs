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

//! # Macrolink assembly
//!
//! Several chains are joined into one closed curve (a macrolink) by choosing an
//! order of the chains and, for each chain, where the curve enters and leaves it.
//! Two strategies are available:
//!
//! - [`Assembler::termini`] connects chains terminus to terminus, trying every
//!   order and every N/C orientation.
//! - [`Assembler::closest`] connects chains through pairs of nearby residues,
//!   trying increasingly distant pairs until every chain contributes a long
//!   enough stretch.
//!
//! The first chain always comes first as rotations of a closed curve are equivalent.

mod closest;
mod termini;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::AssemblyConfig;
use crate::{Chain, Error, Point, Polymer, Result, Sample, Warning};

/// End of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminus {
    N,
    C,
}

/// Direction in which the macrolink runs through a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Enter at the N-terminal side, leave at the C-terminal side
    Forward,
    /// Enter at the C-terminal side, leave at the N-terminal side
    Reverse,
}

impl Orientation {
    pub const fn entry(&self) -> Terminus {
        match self {
            Self::Forward => Terminus::N,
            Self::Reverse => Terminus::C,
        }
    }

    pub const fn exit(&self) -> Terminus {
        match self {
            Self::Forward => Terminus::C,
            Self::Reverse => Terminus::N,
        }
    }
}

/// Stretch of one chain that is part of the macrolink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Traversal {
    /// Chain name
    pub chain: String,
    /// Index of the chain in the assembler's chain list
    #[serde(skip)]
    pub index: usize,
    /// Residue where the macrolink enters the chain
    pub entry: i64,
    /// Residue where the macrolink leaves the chain
    pub exit: i64,
    pub orientation: Orientation,
    #[serde(skip)]
    entry_pos: Point,
    #[serde(skip)]
    exit_pos: Point,
}

impl Traversal {
    fn new(chains: &[Chain], index: usize, entry: &Sample, exit: &Sample) -> Self {
        let chain = &chains[index];
        let polymer = chain.polymer();
        let orientation = match (
            polymer.position_of(entry.label),
            polymer.position_of(exit.label),
        ) {
            (Some(i), Some(j)) if i > j => Orientation::Reverse,
            _ => Orientation::Forward,
        };
        Self {
            chain: chain.name().clone(),
            index,
            entry: entry.label,
            exit: exit.label,
            orientation,
            entry_pos: entry.pos,
            exit_pos: exit.pos,
        }
    }
}

/// Connection from the exit of one chain to the entry of the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Joint {
    pub from: String,
    pub to: String,
    pub distance: f64,
}

/// Closed path through all chains.
#[derive(Debug, Clone, Serialize)]
pub struct Arrangement<'a> {
    #[serde(skip)]
    chains: &'a [Chain],
    traversals: Vec<Traversal>,
    joints: Vec<Joint>,
    /// Summed length of all joints
    cost: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<Warning>,
}

impl<'a> Arrangement<'a> {
    /// Join consecutive traversals, wrapping around, and flag long joints.
    fn new(chains: &'a [Chain], traversals: Vec<Traversal>, max_joint_distance: f64) -> Self {
        let joints = traversals
            .iter()
            .circular_tuple_windows()
            .map(|(a, b)| Joint {
                from: format!("{}_{}", a.chain, a.exit),
                to: format!("{}_{}", b.chain, b.entry),
                distance: (a.exit_pos - b.entry_pos).norm(),
            })
            .collect_vec();
        let warnings = joints
            .iter()
            .filter(|joint| joint.distance > max_joint_distance)
            .map(|joint| {
                Warning::UnnaturalDistance {
                    from: joint.from.clone(),
                    to: joint.to.clone(),
                    distance: joint.distance,
                }
                .logged()
            })
            .collect();
        let cost = joints.iter().map(|joint| joint.distance).sum();
        Self {
            chains,
            traversals,
            joints,
            cost,
            warnings,
        }
    }

    /// Traversals in macrolink order
    pub fn traversals(&self) -> &[Traversal] {
        &self.traversals
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Joints longer than the configured bound
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Chain names in macrolink order
    pub fn chain_names(&self) -> Vec<&str> {
        self.traversals.iter().map(|t| t.chain.as_str()).collect()
    }

    /// Compact text form such as `A_1 ... A_30 <-> B_12 ... B_3 <-> A_1`.
    pub fn shortcut(&self) -> String {
        let mut text = String::new();
        for traversal in &self.traversals {
            text.push_str(&format!(
                "{}_{} ... {}_{} <-> ",
                traversal.chain, traversal.entry, traversal.chain, traversal.exit
            ));
        }
        if let Some(first) = self.traversals.first() {
            text.push_str(&format!("{}_{}", first.chain, first.entry));
        }
        text
    }

    /// The macrolink as a closed polymer, labelled from 1.
    pub fn to_polymer(&self) -> Polymer {
        let points = self
            .traversals
            .iter()
            .flat_map(|traversal| self.walk(traversal))
            .collect_vec();
        Polymer::from_points(points).close()
    }

    /// Positions from entry to exit of a traversal, both included.
    fn walk(&self, traversal: &Traversal) -> Vec<Point> {
        let Some(chain) = self.chains.get(traversal.index) else {
            return Vec::new();
        };
        let polymer = chain.polymer();
        let samples = polymer.samples();
        match (
            polymer.position_of(traversal.entry),
            polymer.position_of(traversal.exit),
        ) {
            (Some(i), Some(j)) if i <= j => samples[i..=j].iter().map(|s| s.pos).collect(),
            (Some(i), Some(j)) => samples[j..=i].iter().rev().map(|s| s.pos).collect(),
            _ => Vec::new(),
        }
    }
}

/// Outcome of a macrolink search.
#[must_use]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Assembly<'a> {
    /// Best arrangement found
    Feasible(Arrangement<'a>),
    /// No arrangement satisfies the constraints
    NoFeasibleArrangement,
}

impl<'a> Assembly<'a> {
    pub const fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible(_))
    }

    pub const fn arrangement(&self) -> Option<&Arrangement<'a>> {
        match self {
            Self::Feasible(arrangement) => Some(arrangement),
            Self::NoFeasibleArrangement => None,
        }
    }

    pub fn into_arrangement(self) -> Option<Arrangement<'a>> {
        match self {
            Self::Feasible(arrangement) => Some(arrangement),
            Self::NoFeasibleArrangement => None,
        }
    }
}

/// Searches for the best way to join a set of chains into a macrolink.
#[derive(Debug, Clone)]
pub struct Assembler<'a> {
    chains: &'a [Chain],
    /// N- and C-terminal sample of every chain
    termini: Vec<[Sample; 2]>,
    config: AssemblyConfig,
}

impl<'a> Assembler<'a> {
    /// Check the chain count and that every chain has residues.
    pub fn new(chains: &'a [Chain], config: AssemblyConfig) -> Result<Self> {
        if chains.len() < 2 {
            return Err(Error::TooFewChains(chains.len()));
        }
        if chains.len() > config.max_chains {
            return Err(Error::TooManyChains {
                given: chains.len(),
                max: config.max_chains,
            });
        }
        let termini = chains
            .iter()
            .map(|chain| match (chain.n_terminus(), chain.c_terminus()) {
                (Some(n), Some(c)) => Ok([*n, *c]),
                _ => Err(Error::TooShort(0)),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            chains,
            termini,
            config,
        })
    }

    pub const fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Chain orders with the first chain kept in front.
    fn orders(&self) -> impl Iterator<Item = Vec<usize>> {
        let k = self.chains.len();
        (1..k)
            .permutations(k - 1)
            .map(|rest| std::iter::once(0).chain(rest).collect())
    }

    fn terminus(&self, chain: usize, terminus: Terminus) -> &Sample {
        &self.termini[chain][terminus as usize]
    }

    fn arrangement(&self, traversals: Vec<Traversal>) -> Arrangement<'a> {
        Arrangement::new(self.chains, traversals, self.config.max_joint_distance)
    }
}
