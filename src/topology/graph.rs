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

//! Graph of bridges and backbone connections

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use unordered_pair::UnorderedPair;

use super::bridge::{Bridge, BridgeKind, Site};
use crate::config::GraphConfig;
use crate::{Chain, Error, Point, Result, Warning};

/// Index of a node in a [`TopologyGraph`]
pub type NodeId = usize;

/// Kind of connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Chemical bridge
    Bond,
    /// Stretch of backbone between two bridged residues
    Backbone,
}

impl EdgeKind {
    /// Separator used in textual cycle representations
    pub const fn separator(&self) -> &'static str {
        match self {
            Self::Bond => " <-> ",
            Self::Backbone => " ... ",
        }
    }
}

/// Residue or closure point of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    /// Index of the chain in the graph's chain list
    pub chain: usize,
    pub site: Site,
}

impl Node {
    pub const fn new(chain: usize, site: Site) -> Self {
        Self { chain, site }
    }
}

/// Bridges and backbone connections between residues of a set of chains.
///
/// Nodes are interned into a dense arena and edges are stored as adjacency
/// lists in insertion order. The graph borrows the chains it is built from.
#[derive(Debug, Clone)]
pub struct TopologyGraph<'a> {
    chains: &'a [Chain],
    nodes: Vec<Node>,
    index: HashMap<Node, NodeId>,
    neighbors: Vec<Vec<(NodeId, EdgeKind)>>,
    /// Bond edges in the order they were given, without closure bridges
    bridges: Vec<UnorderedPair<NodeId>>,
    /// Kind of every bond edge
    kinds: HashMap<UnorderedPair<NodeId>, BridgeKind>,
    warnings: Vec<Warning>,
}

impl<'a> TopologyGraph<'a> {
    /// Build the graph from a list of bridges between residues of `chains`.
    ///
    /// Every bridge becomes a bond edge. On each chain, the bridged residues
    /// are sorted and consecutive ones are joined by a backbone edge.
    pub fn new(chains: &'a [Chain], bridges: &[Bridge], config: &GraphConfig) -> Result<Self> {
        let mut graph = Self {
            chains,
            nodes: Vec::new(),
            index: HashMap::new(),
            neighbors: Vec::new(),
            bridges: Vec::new(),
            kinds: HashMap::new(),
            warnings: Vec::new(),
        };

        let mut bridges: Vec<Bridge> = bridges
            .iter()
            .filter(|bridge| {
                let skip = config.skip_sequence_neighbours && bridge.joins_sequence_neighbours();
                if skip {
                    log::debug!(
                        "skipping bridge {}_{} - {}_{} between sequence neighbours",
                        bridge.first.chain,
                        bridge.first.site,
                        bridge.second.chain,
                        bridge.second.site
                    );
                }
                !skip
            })
            .cloned()
            .collect();

        if config.closures {
            let closures = graph.closure_bridges(&bridges)?;
            bridges.extend(closures);
        }

        let mut residues: BTreeMap<usize, Vec<i64>> = BTreeMap::new();
        for bridge in &bridges {
            let first = graph.resolve(&bridge.first.chain, bridge.first.site)?;
            let second = graph.resolve(&bridge.second.chain, bridge.second.site)?;
            graph.check_bridge_length(&first, &second, config.max_bridge_length);
            if let (Some(false), Some(distance)) = (bridge.distance_is_natural(), bridge.distance) {
                let warning = Warning::UnnaturalDistance {
                    from: graph.node_name(&first),
                    to: graph.node_name(&second),
                    distance,
                };
                graph.warnings.push(warning.logged());
            }
            for node in [first, second] {
                if let Some(label) = node.site.label() {
                    residues.entry(node.chain).or_default().push(label);
                }
            }
            let (i, j) = (graph.intern(first), graph.intern(second));
            graph.connect(i, j, EdgeKind::Bond);
            graph.kinds.insert(UnorderedPair(i, j), bridge.kind());
            if first.site != Site::Closure && second.site != Site::Closure {
                graph.bridges.push(UnorderedPair(i, j));
            }
        }

        for (chain, mut labels) in residues {
            labels.sort_unstable();
            labels.dedup();
            let backbone = &chains[chain];
            graph.warnings.extend(
                backbone.backbone_warnings(config.backbone_min, config.backbone_max),
            );
            for (a, b) in labels.into_iter().tuple_windows() {
                if backbone.within_termini(a) && backbone.within_termini(b) {
                    let i = graph.intern(Node::new(chain, Site::Residue(a)));
                    let j = graph.intern(Node::new(chain, Site::Residue(b)));
                    graph.connect(i, j, EdgeKind::Backbone);
                }
            }
        }

        log::debug!(
            "topology graph with {} nodes and {} bridges",
            graph.len(),
            graph.bridges.len()
        );
        Ok(graph)
    }

    /// Bridges joining the termini of every bridged chain to its closure point.
    fn closure_bridges(&self, bridges: &[Bridge]) -> Result<Vec<Bridge>> {
        let names = bridges
            .iter()
            .flat_map(|bridge| bridge.ends())
            .map(|end| end.chain.as_str())
            .unique()
            .collect_vec();
        let mut closures = Vec::with_capacity(2 * names.len());
        for name in names {
            let chain = self.chain_index(name).map(|i| &self.chains[i]);
            let termini = chain.and_then(|c| Some((c.n_terminus()?.label, c.c_terminus()?.label)));
            let Some((n_terminus, c_terminus)) = termini else {
                return Err(Error::missing_residue(name, "N-terminus"));
            };
            closures.push(Bridge::closure(name, n_terminus));
            closures.push(Bridge::closure(name, c_terminus));
        }
        Ok(closures)
    }

    fn chain_index(&self, name: &str) -> Option<usize> {
        self.chains.iter().position(|chain| chain.name() == name)
    }

    /// Look up a bridge end, failing if the chain or residue does not exist.
    fn resolve(&self, chain: &str, site: Site) -> Result<Node> {
        let index = self
            .chain_index(chain)
            .ok_or_else(|| Error::missing_residue(chain, site))?;
        if let Site::Residue(label) = site {
            if !self.chains[index].polymer().contains(label) {
                return Err(Error::missing_residue(chain, site));
            }
        }
        Ok(Node::new(index, site))
    }

    fn check_bridge_length(&mut self, first: &Node, second: &Node, max_length: f64) {
        if let (Some(a), Some(b)) = (self.position(first), self.position(second)) {
            let distance = (a - b).norm();
            if distance > max_length {
                let warning = Warning::UnnaturalDistance {
                    from: self.node_name(first),
                    to: self.node_name(second),
                    distance,
                };
                self.warnings.push(warning.logged());
            }
        }
    }

    /// Id of a node, adding it if new.
    fn intern(&mut self, node: Node) -> NodeId {
        if let Some(&id) = self.index.get(&node) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(node, id);
        self.neighbors.push(Vec::new());
        id
    }

    fn connect(&mut self, i: NodeId, j: NodeId, kind: EdgeKind) {
        self.neighbors[i].push((j, kind));
        self.neighbors[j].push((i, kind));
    }

    pub fn chains(&self) -> &'a [Chain] {
        self.chains
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Id of an existing node
    pub fn find(&self, node: &Node) -> Option<NodeId> {
        self.index.get(node).copied()
    }

    /// Outgoing edges of a node in insertion order.
    pub fn neighbors(&self, id: NodeId) -> &[(NodeId, EdgeKind)] {
        self.neighbors.get(id).map_or(&[], Vec::as_slice)
    }

    /// Bond edges of the given bridges; closure bridges are not included.
    pub fn bridges(&self) -> &[UnorderedPair<NodeId>] {
        &self.bridges
    }

    /// Kind of the bond edge between two nodes
    pub fn bridge_kind(&self, a: NodeId, b: NodeId) -> Option<BridgeKind> {
        self.kinds.get(&UnorderedPair(a, b)).copied()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Position of a residue node; closure points have none.
    pub fn position(&self, node: &Node) -> Option<Point> {
        position(self.chains, node)
    }

    /// Name such as `A_57` or `A_closure`.
    pub fn node_name(&self, node: &Node) -> String {
        node_name(self.chains, node)
    }
}

pub(crate) fn position(chains: &[Chain], node: &Node) -> Option<Point> {
    let label = node.site.label()?;
    chains
        .get(node.chain)?
        .polymer()
        .find(label)
        .map(|sample| sample.pos)
}

pub(crate) fn node_name(chains: &[Chain], node: &Node) -> String {
    let chain = chains.get(node.chain).map_or("?", |c| c.name().as_str());
    format!("{}_{}", chain, node.site)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Polymer, Sample, Tolerance};

    /// Straight chain with residues `first..=last` spaced 3.8 Å apart along x.
    fn chain(name: &str, first: i64, last: i64, offset: Point) -> Chain {
        let samples = (first..=last).map(|label| {
            Sample::new(label, offset + Point::new(3.8 * (label - first) as f64, 0.0, 0.0))
        });
        Chain::new(name, Polymer::new(samples, &Tolerance::default()).unwrap())
    }

    #[test]
    fn bonds_and_backbone() {
        let chains = vec![
            chain("A", 1, 20, Point::zeros()),
            chain("B", 1, 20, Point::new(0.0, 5.0, 0.0)),
        ];
        let bridges = vec![
            Bridge::between("A", 3, "B", 3),
            Bridge::between("A", 8, "B", 9),
            Bridge::between("A", 15, "B", 14),
        ];
        let graph = TopologyGraph::new(&chains, &bridges, &GraphConfig::default()).unwrap();
        assert_eq!(graph.len(), 6);
        assert_eq!(graph.bridges().len(), 3);
        assert!(graph.warnings().is_empty());

        let a3 = graph.find(&Node::new(0, Site::Residue(3))).unwrap();
        let a8 = graph.find(&Node::new(0, Site::Residue(8))).unwrap();
        let a15 = graph.find(&Node::new(0, Site::Residue(15))).unwrap();
        // bonds come first, then backbone edges
        let kinds = |id| graph.neighbors(id).iter().map(|(_, k)| *k).collect_vec();
        assert_eq!(kinds(a3), vec![EdgeKind::Bond, EdgeKind::Backbone]);
        assert!(graph.neighbors(a8).contains(&(a3, EdgeKind::Backbone)));
        assert!(graph.neighbors(a8).contains(&(a15, EdgeKind::Backbone)));
        assert!(!graph.neighbors(a3).contains(&(a15, EdgeKind::Backbone)));
        assert_eq!(graph.node_name(&graph.nodes()[a15]), "A_15");
    }

    #[test]
    fn missing_residue_and_chain() {
        let chains = vec![chain("A", 1, 10, Point::zeros())];
        let config = GraphConfig::default();
        let err = TopologyGraph::new(&chains, &[Bridge::between("A", 3, "A", 11)], &config)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingResidue { ref chain, ref residue } if chain == "A" && residue == "11"
        ));
        let err = TopologyGraph::new(&chains, &[Bridge::between("A", 3, "C", 5)], &config)
            .unwrap_err();
        assert!(matches!(err, Error::MissingResidue { ref chain, .. } if chain == "C"));
    }

    #[test]
    fn long_bridges_and_neighbours() {
        let chains = vec![
            chain("A", 1, 10, Point::zeros()),
            chain("B", 1, 10, Point::new(0.0, 12.0, 0.0)),
        ];
        let bridges = vec![
            Bridge::between("A", 2, "B", 2),
            Bridge::between("A", 5, "A", 6),
        ];
        let graph = TopologyGraph::new(&chains, &bridges, &GraphConfig::default()).unwrap();
        assert_eq!(graph.bridges().len(), 1);
        assert_eq!(graph.warnings().len(), 1);
        assert!(matches!(
            &graph.warnings()[0],
            Warning::UnnaturalDistance { from, to, .. } if from == "A_2" && to == "B_2"
        ));

        let config = GraphConfig {
            skip_sequence_neighbours: false,
            ..Default::default()
        };
        let graph = TopologyGraph::new(&chains, &bridges, &config).unwrap();
        assert_eq!(graph.bridges().len(), 2);
    }

    #[test]
    fn closure_nodes() {
        let chains = vec![chain("A", 1, 30, Point::zeros())];
        let config = GraphConfig {
            closures: true,
            ..Default::default()
        };
        let graph = TopologyGraph::new(&chains, &[Bridge::between("A", 5, "A", 20)], &config)
            .unwrap();
        // residues 1, 5, 20, 30 and the closure point
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.bridges().len(), 1);
        let closure = graph.find(&Node::new(0, Site::Closure)).unwrap();
        assert_eq!(graph.neighbors(closure).len(), 2);
        assert!(graph.position(&graph.nodes()[closure]).is_none());
        assert_eq!(graph.node_name(&graph.nodes()[closure]), "A_closure");
        let a1 = graph.find(&Node::new(0, Site::Residue(1))).unwrap();
        assert_eq!(graph.bridge_kind(closure, a1), Some(BridgeKind::Other));
    }

    #[test]
    fn recorded_distances_and_kinds() {
        let chains = vec![
            chain("A", 1, 10, Point::zeros()),
            chain("B", 1, 10, Point::new(0.0, 5.0, 0.0)),
        ];
        let bridges = vec![
            Bridge::between("A", 2, "B", 2)
                .with_distance(9.0)
                .with_kind(BridgeKind::Disulfide),
            Bridge::between("A", 5, "B", 5).with_distance(0.5),
            Bridge::between("A", 8, "B", 8).with_distance(2.05),
        ];
        let graph = TopologyGraph::new(&chains, &bridges, &GraphConfig::default()).unwrap();
        let names = graph
            .warnings()
            .iter()
            .map(|warning| match warning {
                Warning::UnnaturalDistance { from, to, distance } => {
                    (from.as_str(), to.as_str(), *distance)
                }
                _ => panic!("unexpected warning {warning}"),
            })
            .collect_vec();
        assert_eq!(names, vec![("A_2", "B_2", 9.0), ("A_5", "B_5", 0.5)]);

        let a2 = graph.find(&Node::new(0, Site::Residue(2))).unwrap();
        let b2 = graph.find(&Node::new(1, Site::Residue(2))).unwrap();
        let a5 = graph.find(&Node::new(0, Site::Residue(5))).unwrap();
        let b5 = graph.find(&Node::new(1, Site::Residue(5))).unwrap();
        assert_eq!(graph.bridge_kind(b2, a2), Some(BridgeKind::Disulfide));
        assert_eq!(graph.bridge_kind(a5, b5), Some(BridgeKind::Other));
        assert_eq!(graph.bridge_kind(a2, a5), None);
    }
}
