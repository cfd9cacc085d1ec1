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

//! Closed loops of bridges and backbone
//!
//! All closed walks of a [`TopologyGraph`] are enumerated, walks made only of
//! bridges or only of backbone are dropped, and walks that are rotations or
//! mirror images of an earlier walk are collapsed into it.

use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use unordered_pair::UnorderedPair;

use super::bridge::{BridgeKind, Site};
use super::graph::{node_name, position, EdgeKind, Node, NodeId, TopologyGraph};
use crate::{Chain, Error, Polymer, Result};

/// Which of the given bridges a cycle must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeUsage {
    /// At least one bridge
    #[default]
    Any,
    /// Every bridge of the graph, in either direction
    All,
}

/// Closed walk as node ids; `edges[i]` joins `nodes[i]` and `nodes[i+1]` (cyclically).
#[derive(Debug, Clone)]
struct Walk {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeKind>,
}

impl Walk {
    fn from_path(start: NodeId, path: Vec<(EdgeKind, NodeId)>) -> Self {
        let (edges, targets): (Vec<_>, Vec<_>) = path.into_iter().unzip();
        let nodes = std::iter::once(start)
            .chain(targets.into_iter().dropping_back(1))
            .collect();
        Self { nodes, edges }
    }

    fn has_both_kinds(&self) -> bool {
        self.edges.contains(&EdgeKind::Bond) && self.edges.contains(&EdgeKind::Backbone)
    }

    /// Unordered node pairs of all bond steps
    fn bonds(&self) -> HashSet<UnorderedPair<NodeId>> {
        let n = self.nodes.len();
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| **edge == EdgeKind::Bond)
            .map(|(i, _)| UnorderedPair(self.nodes[i], self.nodes[(i + 1) % n]))
            .collect()
    }

    /// Smallest rotation of the walk or of its reversal.
    fn canonical_key(&self) -> Vec<(NodeId, EdgeKind)> {
        let forward = self
            .nodes
            .iter()
            .copied()
            .zip(self.edges.iter().copied())
            .collect_vec();
        let backward = self
            .nodes
            .iter()
            .take(1)
            .chain(self.nodes.iter().skip(1).rev())
            .copied()
            .zip(self.edges.iter().rev().copied())
            .collect_vec();
        let n = forward.len();
        [forward, backward]
            .iter()
            .flat_map(|steps| {
                (0..n).map(move |r| steps[r..].iter().chain(&steps[..r]).copied().collect_vec())
            })
            .min()
            .unwrap_or_default()
    }
}

/// Enumerates the loops of a topology graph.
#[derive(Debug, Clone, Copy)]
pub struct CycleFinder<'g, 'a> {
    graph: &'g TopologyGraph<'a>,
}

impl<'g, 'a> CycleFinder<'g, 'a> {
    pub const fn new(graph: &'g TopologyGraph<'a>) -> Self {
        Self { graph }
    }

    /// All closed walks without repeated nodes, from every start node.
    ///
    /// Depth-first with an explicit worklist; edges are followed in insertion order.
    fn closed_walks(&self) -> Vec<Walk> {
        let mut walks = Vec::new();
        for start in 0..self.graph.len() {
            let mut fringe: Vec<(NodeId, Vec<(EdgeKind, NodeId)>)> = vec![(start, Vec::new())];
            while let Some((state, path)) = fringe.pop() {
                if state == start && !path.is_empty() {
                    walks.push(Walk::from_path(start, path));
                    continue;
                }
                for &(next, kind) in self.graph.neighbors(state).iter().rev() {
                    if path.iter().any(|&(_, visited)| visited == next) {
                        continue;
                    }
                    let mut extended = path.clone();
                    extended.push((kind, next));
                    fringe.push((next, extended));
                }
            }
        }
        walks
    }

    /// Distinct loops containing both bridges and backbone, in discovery order.
    pub fn find(&self, usage: BridgeUsage) -> Vec<Cycle<'a>> {
        let walks = self.closed_walks();
        let num_walks = walks.len();
        let mut seen = HashSet::new();
        let cycles = walks
            .into_iter()
            .filter(Walk::has_both_kinds)
            .filter(|walk| match usage {
                BridgeUsage::Any => true,
                BridgeUsage::All => {
                    let bonds = walk.bonds();
                    self.graph.bridges().iter().all(|b| bonds.contains(b))
                }
            })
            .filter(|walk| seen.insert(walk.canonical_key()))
            .map(|walk| self.to_cycle(walk))
            .collect_vec();
        log::debug!(
            "found {} closed walks and {} distinct cycles",
            num_walks,
            cycles.len()
        );
        cycles
    }

    /// The single loop containing every bridge.
    pub fn merge(&self) -> Result<Cycle<'a>> {
        let mut cycles = self.find(BridgeUsage::All);
        match cycles.len() {
            0 => Err(Error::NoComponent),
            1 => cycles.pop().ok_or(Error::NoComponent),
            n => Err(Error::AmbiguousComponent(n)),
        }
    }

    fn to_cycle(&self, walk: Walk) -> Cycle<'a> {
        let nodes = self.graph.nodes();
        let n = walk.nodes.len();
        let kinds = walk
            .edges
            .iter()
            .enumerate()
            .map(|(i, edge)| match edge {
                EdgeKind::Bond => self
                    .graph
                    .bridge_kind(walk.nodes[i], walk.nodes[(i + 1) % n]),
                EdgeKind::Backbone => None,
            })
            .collect();
        Cycle {
            chains: self.graph.chains(),
            nodes: walk.nodes.iter().map(|&id| nodes[id]).collect(),
            edges: walk.edges,
            kinds,
        }
    }
}

/// Closed loop through bridged residues.
#[derive(Debug, Clone)]
pub struct Cycle<'a> {
    chains: &'a [Chain],
    nodes: Vec<Node>,
    /// `edges[i]` leads from `nodes[i]` to the next node, wrapping around
    edges: Vec<EdgeKind>,
    /// Bridge kind of each bond step
    kinds: Vec<Option<BridgeKind>>,
}

impl<'a> Cycle<'a> {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeKind] {
        &self.edges
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Names of the nodes, e.g. `A_57`
    pub fn node_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| node_name(self.chains, node))
            .collect()
    }

    /// Names of the visited chains in order of appearance.
    pub fn chain_names(&self) -> Vec<&'a str> {
        self.nodes
            .iter()
            .map(|node| node.chain)
            .unique()
            .filter_map(|i| self.chains.get(i))
            .map(|chain| chain.name().as_str())
            .collect()
    }

    /// True if the cycle crosses the bridge between `a` and `b` in either direction.
    pub fn contains_bond(&self, a: &Node, b: &Node) -> bool {
        let n = self.nodes.len();
        let bridge = UnorderedPair(*a, *b);
        self.edges.iter().enumerate().any(|(i, edge)| {
            *edge == EdgeKind::Bond
                && UnorderedPair(self.nodes[i], self.nodes[(i + 1) % n]) == bridge
        })
    }

    /// Compact text form such as `A_5 <-> B_7 ... B_30 <-> A_5`.
    ///
    /// Runs of backbone steps are shown as a single step.
    pub fn shortcut(&self) -> String {
        self.render(false)
    }

    /// Shortcut with the kind of every bridge, e.g. `A_5 <-SS-> B_7 ... B_30 <-OTHER-> A_5`.
    pub fn annotated_shortcut(&self) -> String {
        self.render(true)
    }

    /// Kinds of the bridges crossed, in order.
    pub fn bridge_kinds(&self) -> Vec<BridgeKind> {
        self.kinds.iter().flatten().copied().collect()
    }

    fn render(&self, annotate: bool) -> String {
        let n = self.nodes.len();
        let mut text = self
            .nodes
            .first()
            .map(|node| node_name(self.chains, node))
            .unwrap_or_default();
        for (i, edge) in self.edges.iter().enumerate() {
            let next = self.edges.get(i + 1);
            if *edge == EdgeKind::Backbone && next == Some(&EdgeKind::Backbone) {
                continue;
            }
            match (annotate, self.kinds.get(i).copied().flatten()) {
                (true, Some(kind)) => text.push_str(&format!(" <-{}-> ", kind)),
                _ => text.push_str(edge.separator()),
            }
            text.push_str(&node_name(self.chains, &self.nodes[(i + 1) % n]));
        }
        text
    }

    /// All points of the loop in order.
    ///
    /// Backbone steps visit every residue of the chain between the two ends,
    /// bond steps jump directly. The start is not repeated at the end.
    pub fn atoms(&self) -> Vec<Node> {
        let Some(&start) = self.nodes.first() else {
            return Vec::new();
        };
        let n = self.nodes.len();
        let mut atoms = vec![start];
        for (i, edge) in self.edges.iter().enumerate() {
            let (from, to) = (self.nodes[i], self.nodes[(i + 1) % n]);
            match (edge, from.site, to.site) {
                (EdgeKind::Backbone, Site::Residue(a), Site::Residue(b)) => {
                    atoms.extend(self.backbone_walk(to.chain, a, b))
                }
                _ => atoms.push(to),
            }
        }
        atoms.pop();
        atoms
    }

    /// Residues of `chain` after `from` up to and including `to`.
    fn backbone_walk(&self, chain: usize, from: i64, to: i64) -> Vec<Node> {
        let Some(chain_ref) = self.chains.get(chain) else {
            return Vec::new();
        };
        let mut labels = chain_ref
            .polymer()
            .samples()
            .iter()
            .map(|sample| sample.label)
            .filter(|&label| {
                if from < to {
                    from < label && label <= to
                } else {
                    to <= label && label < from
                }
            })
            .collect_vec();
        labels.sort_unstable();
        if from > to {
            labels.reverse();
        }
        labels
            .into_iter()
            .map(|label| Node::new(chain, Site::Residue(label)))
            .collect()
    }

    /// Names of all points of the loop, see [`Cycle::atoms`].
    pub fn atom_names(&self) -> Vec<String> {
        self.atoms()
            .iter()
            .map(|atom| node_name(self.chains, atom))
            .collect()
    }

    /// The loop as a closed polymer, labelled from 1.
    ///
    /// A closure point is placed midway between its two neighbours.
    pub fn to_polymer(&self) -> Polymer {
        let atoms = self.atoms();
        let n = atoms.len();
        let points = atoms.iter().enumerate().filter_map(|(k, atom)| match atom.site {
            Site::Residue(_) => position(self.chains, atom),
            Site::Closure => {
                let before = position(self.chains, &atoms[(k + n - 1) % n])?;
                let after = position(self.chains, &atoms[(k + 1) % n])?;
                Some((before + after) / 2.0)
            }
        });
        Polymer::from_points(points).close()
    }
}
