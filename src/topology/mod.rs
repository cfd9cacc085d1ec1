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

//! # Bridges, backbone and loops
//!
//! Residues joined by chemical [bridges](Bridge) and by the backbone of their
//! chains form a [`TopologyGraph`]. The [`CycleFinder`] enumerates the closed
//! loops of that graph, each of which can be lowered to an ordered list of
//! residues or to a closed [`Polymer`](crate::Polymer) for GLN analysis.
//!
//! ~~~
//! use macrolink::topology::{Bridge, BridgeUsage, CycleFinder, TopologyGraph};
//! use macrolink::{config::GraphConfig, Chain, Point, Polymer};
//!
//! let points = (0..10).map(|i| Point::new(3.8 * i as f64, 0.0, 0.0));
//! let chains = [Chain::new("A", Polymer::from_points(points))];
//! let bridges = [Bridge::between("A", 2, "A", 4)];
//! let graph = TopologyGraph::new(&chains, &bridges, &GraphConfig::default()).unwrap();
//! let cycles = CycleFinder::new(&graph).find(BridgeUsage::Any);
//! assert_eq!(cycles[0].shortcut(), "A_2 <-> A_4 ... A_2");
//! ~~~

mod bridge;
mod cycle;
mod graph;

pub use self::bridge::{
    Bridge, BridgeAtom, BridgeEnd, BridgeKind, Site, NATURAL_BRIDGE_MAX, NATURAL_BRIDGE_MIN,
};
pub use self::cycle::{BridgeUsage, Cycle, CycleFinder};
pub use self::graph::{EdgeKind, Node, NodeId, TopologyGraph};
