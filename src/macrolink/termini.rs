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

//! Terminus-to-terminus assembly.

use itertools::Itertools;
use ndarray::Array2;

use super::{Assembler, Assembly, Orientation, Terminus, Traversal};

/// Row or column of a terminus in the distance matrix.
const fn terminus_index(chain: usize, terminus: Terminus) -> usize {
    2 * chain + terminus as usize
}

impl<'a> Assembler<'a> {
    /// Distances between all chain termini.
    ///
    /// Row and column `2c` is the N-terminus of chain `c`, `2c + 1` its C-terminus.
    pub fn termini_distances(&self) -> Array2<f64> {
        let points = self
            .termini
            .iter()
            .flat_map(|[n, c]| [n.pos, c.pos])
            .collect_vec();
        Array2::from_shape_fn((points.len(), points.len()), |(i, j)| {
            (points[i] - points[j]).norm()
        })
    }

    /// Join chains end to end with the smallest summed joint length.
    ///
    /// Every order with the first chain in front and every orientation of each
    /// chain is tried; on ties the first arrangement enumerated wins.
    /// Joints longer than the configured maximum are kept but reported as warnings.
    pub fn termini(&self) -> Assembly<'a> {
        let distances = self.termini_distances();
        let k = self.chains.len();
        let mut best: Option<(f64, Vec<usize>, Vec<Orientation>)> = None;
        for order in self.orders() {
            let orientations = itertools::repeat_n([Orientation::Forward, Orientation::Reverse], k)
                .map(IntoIterator::into_iter)
                .multi_cartesian_product();
            for orientation in orientations {
                let cost: f64 = (0..k)
                    .map(|i| {
                        let j = (i + 1) % k;
                        distances[[
                            terminus_index(order[i], orientation[i].exit()),
                            terminus_index(order[j], orientation[j].entry()),
                        ]]
                    })
                    .sum();
                if best.as_ref().map_or(true, |(lowest, ..)| cost < *lowest) {
                    best = Some((cost, order.clone(), orientation));
                }
            }
        }
        let Some((cost, order, orientation)) = best else {
            return Assembly::NoFeasibleArrangement;
        };
        log::debug!(
            "Best terminus arrangement {:?} {:?} with cost {:.2}",
            order,
            orientation,
            cost
        );
        let traversals = order
            .iter()
            .zip(&orientation)
            .map(|(&chain, direction)| {
                Traversal::new(
                    self.chains,
                    chain,
                    self.terminus(chain, direction.entry()),
                    self.terminus(chain, direction.exit()),
                )
            })
            .collect();
        Assembly::Feasible(self.arrangement(traversals))
    }
}
