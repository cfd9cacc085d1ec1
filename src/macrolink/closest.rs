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

//! Assembly through pairs of nearby residues.

use std::collections::HashMap;

use itertools::{iproduct, Itertools};
use unordered_pair::UnorderedPair;

use super::{Assembler, Assembly, Traversal};
use crate::Sample;

/// Residue pair on two different chains that may serve as a joint.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    ends: [(usize, Sample); 2],
    distance: f64,
}

impl Candidate {
    /// Residue of this candidate on the given chain
    fn on(&self, chain: usize) -> Option<&Sample> {
        self.ends
            .iter()
            .find(|(index, _)| *index == chain)
            .map(|(_, sample)| sample)
    }
}

/// Candidates for every pair of chains, shortest first.
type Candidates = HashMap<UnorderedPair<usize>, Vec<Candidate>>;

impl<'a> Assembler<'a> {
    /// Residue pairs closer than the candidate cutoff, for every pair of chains.
    fn candidates(&self) -> Candidates {
        let cutoff = self.config.candidate_cutoff;
        (0..self.chains.len())
            .tuple_combinations()
            .map(|(a, b)| {
                let mut list = iproduct!(
                    self.chains[a].polymer().samples(),
                    self.chains[b].polymer().samples()
                )
                .filter_map(|(first, second)| {
                    let distance = (first.pos - second.pos).norm();
                    (distance < cutoff).then_some(Candidate {
                        ends: [(a, *first), (b, *second)],
                        distance,
                    })
                })
                .collect_vec();
                list.sort_by(|x, y| x.distance.total_cmp(&y.distance));
                log::trace!(
                    "{} joint candidates between {} and {}",
                    list.len(),
                    self.chains[a].name(),
                    self.chains[b].name()
                );
                (UnorderedPair(a, b), list)
            })
            .collect()
    }

    /// Join chains through nearby residue pairs with the smallest summed joint length.
    ///
    /// For each chain order, consecutive chains (wrapping around) are joined by
    /// candidate pairs picked in increasing rank, advancing one chain pair at a
    /// time. The first pick where every chain is traversed over more than the
    /// configured fraction of its span is taken. Ranks are abandoned once the
    /// candidates run out or the summed length exceeds the cost ceiling.
    pub fn closest(&self) -> Assembly<'a> {
        let candidates = self.candidates();
        let mut best: Option<(f64, Vec<Traversal>)> = None;
        for order in self.orders() {
            let Some((cost, traversals)) = self.closest_for_order(&order, &candidates) else {
                log::debug!("No feasible joints for chain order {:?}", order);
                continue;
            };
            if best.as_ref().map_or(true, |(lowest, _)| cost < *lowest) {
                best = Some((cost, traversals));
            }
        }
        match best {
            Some((cost, traversals)) => {
                log::debug!("Best closest-residue arrangement with cost {:.2}", cost);
                Assembly::Feasible(self.arrangement(traversals))
            }
            None => Assembly::NoFeasibleArrangement,
        }
    }

    /// Lowest ranked feasible joints for a fixed chain order.
    fn closest_for_order(
        &self,
        order: &[usize],
        candidates: &Candidates,
    ) -> Option<(f64, Vec<Traversal>)> {
        let k = order.len();
        let ceiling = self.config.cost_ceiling_per_chain * k as f64;
        let pairs = order.iter().circular_tuple_windows::<(_, _)>().collect_vec();
        let num_pairs = pairs.len();
        for rank in 0.. {
            // round robin: pairs in front get one rank ahead of the rest
            let picks = pairs
                .iter()
                .enumerate()
                .map(|(i, &(&a, &b))| {
                    let index = rank / num_pairs + usize::from(i < rank % num_pairs);
                    candidates.get(&UnorderedPair(a, b))?.get(index)
                })
                .collect::<Option<Vec<_>>>()?;

            let cost: f64 = picks.iter().map(|c| c.distance).sum();
            if cost > ceiling {
                log::trace!("Joint cost {:.2} exceeds {:.2} at rank {}", cost, ceiling, rank);
                return None;
            }
            let traversals = order
                .iter()
                .enumerate()
                .map(|(i, &chain)| {
                    let entry = picks[(i + k - 1) % k].on(chain)?;
                    let exit = picks[i].on(chain)?;
                    Some(Traversal::new(self.chains, chain, entry, exit))
                })
                .collect::<Option<Vec<_>>>()?;
            if traversals.iter().all(|t| self.is_separated(t)) {
                return Some((cost, traversals));
            }
        }
        None
    }

    /// True if entry and exit are further apart in sequence than the required share of the chain.
    fn is_separated(&self, traversal: &Traversal) -> bool {
        let span = self.chains[traversal.index].span() as f64;
        (traversal.exit - traversal.entry).abs() as f64 > self.config.min_separation_fraction * span
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::chain;
    use super::*;
    use crate::config::AssemblyConfig;
    use approx::assert_relative_eq;

    /// Chain A along x and chain B that only approaches A at both ends.
    fn hairpin(offset: f64) -> Vec<crate::Chain> {
        let a = (0..10).map(|i| [3.8 * i as f64, 0.0, 0.0]).collect_vec();
        let b = (0..10)
            .map(|i| match i {
                0 => [0.0, 5.0, offset],
                9 => [34.2, 6.0, offset],
                _ => [3.8 * i as f64, 20.0, offset],
            })
            .collect_vec();
        vec![chain("A", &a), chain("B", &b)]
    }

    /// Three chains joined corner to corner (A_10-B_1 = 3, B_10-C_1 = 4, C_10-A_1 = 5).
    ///
    /// B_8 sits 2 from A_10; all other residues are far from other chains.
    fn triangle() -> Vec<crate::Chain> {
        let corners = [
            ([0.0, 0.0, 0.0], [100.0, 0.0, 0.0]),
            ([100.0, 3.0, 0.0], [50.0, 80.0, 0.0]),
            ([50.0, 84.0, 0.0], [0.0, 5.0, 0.0]),
        ];
        ["A", "B", "C"]
            .iter()
            .zip(corners)
            .enumerate()
            .map(|(c, (name, (first, last)))| {
                let points = (0..10)
                    .map(|i| match (c, i) {
                        (_, 0) => first,
                        (_, 9) => last,
                        (1, 7) => [100.0, -2.0, 0.0],
                        _ => [1000.0 * (c + 1) as f64 + 3.8 * i as f64, 500.0, 0.0],
                    })
                    .collect_vec();
                chain(name, &points)
            })
            .collect()
    }

    #[test]
    fn three_chains() {
        let chains = triangle();
        let assembler = Assembler::new(&chains, AssemblyConfig::default()).unwrap();
        let candidates = assembler.candidates();
        let lengths = [(0, 1), (1, 2), (0, 2)]
            .map(|(a, b)| candidates[&UnorderedPair(a, b)].len());
        assert_eq!(lengths, [2, 1, 1]);

        // rank 0 in order A, B, C: 2 + 4 + 5 with B traversed from 8 to 10
        let arrangement = assembler.closest().into_arrangement().unwrap();
        assert_relative_eq!(arrangement.cost(), 11.0, epsilon = 1e-12);
        assert_eq!(
            arrangement.shortcut(),
            "A_1 ... A_10 <-> B_8 ... B_10 <-> C_1 ... C_10 <-> A_1"
        );
    }

    #[test]
    fn three_chains_next_rank() {
        // B_8 to B_10 is too short, so the A-B pair advances to A_10-B_1: 3 + 4 + 5.
        // In order A, C, B the A-C pair has no second candidate.
        let chains = triangle();
        let config = AssemblyConfig {
            min_separation_fraction: 0.5,
            ..Default::default()
        };
        let assembler = Assembler::new(&chains, config).unwrap();
        let arrangement = assembler.closest().into_arrangement().unwrap();
        assert_relative_eq!(arrangement.cost(), 12.0, epsilon = 1e-12);
        assert_eq!(arrangement.chain_names(), vec!["A", "B", "C"]);
        assert_eq!(
            arrangement.shortcut(),
            "A_1 ... A_10 <-> B_1 ... B_10 <-> C_1 ... C_10 <-> A_1"
        );
        let distances = arrangement.joints().iter().map(|j| j.distance).collect_vec();
        assert_eq!(distances, vec![3.0, 4.0, 5.0]);
        let polymer = arrangement.to_polymer();
        assert_eq!(polymer.len(), 31);
        assert!(polymer.is_closed());
    }

    #[test]
    fn three_chains_infeasible() {
        // rank 1 costs 12 which exceeds 3 x 3.9
        let chains = triangle();
        let config = AssemblyConfig {
            min_separation_fraction: 0.5,
            cost_ceiling_per_chain: 3.9,
            ..Default::default()
        };
        let assembler = Assembler::new(&chains, config).unwrap();
        assert!(matches!(
            assembler.closest(),
            Assembly::NoFeasibleArrangement
        ));
    }

    #[test]
    fn candidate_lists() {
        let chains = hairpin(0.0);
        let assembler = Assembler::new(&chains, AssemblyConfig::default()).unwrap();
        let candidates = assembler.candidates();
        let list = &candidates[&UnorderedPair(1, 0)];
        let labels = list
            .iter()
            .map(|c| (c.on(0).unwrap().label, c.on(1).unwrap().label))
            .collect_vec();
        assert_eq!(labels, vec![(1, 1), (10, 10), (2, 1), (9, 10), (3, 1), (8, 10)]);
        assert_relative_eq!(list[0].distance, 5.0, epsilon = 1e-12);
        assert_relative_eq!(list[1].distance, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn joined_at_both_ends() {
        let chains = hairpin(0.0);
        let assembler = Assembler::new(&chains, AssemblyConfig::default()).unwrap();
        let assembly = assembler.closest();
        let arrangement = assembly.arrangement().unwrap();
        assert_relative_eq!(arrangement.cost(), 11.0, epsilon = 1e-12);
        assert_eq!(
            arrangement.shortcut(),
            "A_1 ... A_10 <-> B_10 ... B_1 <-> A_1"
        );
        assert!(arrangement.warnings().is_empty());
        let polymer = arrangement.to_polymer();
        assert_eq!(polymer.len(), 21);
        assert!(polymer.is_closed());
    }

    #[test]
    fn infeasible() {
        // no residue pairs within the cutoff
        let chains = hairpin(50.0);
        let assembler = Assembler::new(&chains, AssemblyConfig::default()).unwrap();
        assert!(!assembler.closest().is_feasible());

        // the only separated pick costs 11 which exceeds 2 x 5
        let chains = hairpin(0.0);
        let config = AssemblyConfig {
            cost_ceiling_per_chain: 5.0,
            ..Default::default()
        };
        let assembler = Assembler::new(&chains, config).unwrap();
        assert!(matches!(
            assembler.closest(),
            Assembly::NoFeasibleArrangement
        ));
    }
}
