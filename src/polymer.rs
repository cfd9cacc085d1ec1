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

//! Polymers as ordered sequences of labelled points.
//!
//! A [`Polymer`] is validated once on construction and is immutable afterwards;
//! restricting, closing and reversing all produce new polymers.
//! A [`Chain`] is a polymer with a name, whose first and last samples are the
//! N- and C-terminus.

use std::collections::HashMap;

use derive_getters::Getters;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{Error, Point, Result, Tolerance, Warning};

/// Labelled point of a polymer, e.g. the C-alpha atom of a residue.
///
/// (De)serialized as `[label, x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i64, f64, f64, f64)", into = "(i64, f64, f64, f64)")]
pub struct Sample {
    /// Residue number or any other unique identifier
    pub label: i64,
    /// Position in space
    pub pos: Point,
}

impl Sample {
    pub const fn new(label: i64, pos: Point) -> Self {
        Self { label, pos }
    }
}

impl From<(i64, f64, f64, f64)> for Sample {
    fn from((label, x, y, z): (i64, f64, f64, f64)) -> Self {
        Self::new(label, Point::new(x, y, z))
    }
}

impl From<Sample> for (i64, f64, f64, f64) {
    fn from(sample: Sample) -> Self {
        (sample.label, sample.pos.x, sample.pos.y, sample.pos.z)
    }
}

/// Ordered sequence of samples with unique labels.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Polymer {
    samples: Vec<Sample>,
    /// Label to position in `samples`
    #[serde(skip)]
    index: HashMap<i64, usize>,
}

impl Polymer {
    /// Create a polymer from samples, rejecting repeated labels.
    pub fn new(samples: impl IntoIterator<Item = Sample>, tolerance: &Tolerance) -> Result<Self> {
        let samples: Vec<Sample> = samples.into_iter().collect();
        let mut index: HashMap<i64, usize> = HashMap::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            if let Some(&j) = index.get(&sample.label) {
                let coincident = tolerance.points_eq(&samples[j].pos, &sample.pos);
                return Err(Error::DuplicateLabel {
                    label: sample.label,
                    coincident,
                });
            }
            index.insert(sample.label, i);
        }
        Ok(Self { samples, index })
    }

    /// Build without validation; labels are known to be unique.
    fn from_unique(samples: Vec<Sample>) -> Self {
        let mut index = HashMap::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            index.entry(sample.label).or_insert(i);
        }
        Self { samples, index }
    }

    /// Create a polymer from points, labelled sequentially from 1.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Self::from_unique(
            points
                .into_iter()
                .zip(1..)
                .map(|(pos, label)| Sample::new(label, pos))
                .collect(),
        )
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Position of the sample with the given label in the sequence
    pub fn position_of(&self, label: i64) -> Option<usize> {
        self.index.get(&label).copied()
    }

    /// Sample with the given label
    pub fn find(&self, label: i64) -> Option<&Sample> {
        self.position_of(label).map(|i| &self.samples[i])
    }

    pub fn contains(&self, label: i64) -> bool {
        self.index.contains_key(&label)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Point> + '_ {
        self.samples.iter().map(|s| &s.pos)
    }

    /// Consecutive pairs of points
    pub fn segments(&self) -> impl Iterator<Item = (&Point, &Point)> + '_ {
        self.positions().tuple_windows()
    }

    /// Number of segments, i.e. one less than the number of samples.
    pub fn num_segments(&self) -> usize {
        self.len().saturating_sub(1)
    }

    /// Keep samples with labels in `[begin, end]`. A reversed range is swapped.
    pub fn restrict(&self, begin: i64, end: i64) -> Self {
        let (lower, upper) = if begin > end { (end, begin) } else { (begin, end) };
        Self::from_unique(
            self.samples
                .iter()
                .filter(|s| (lower..=upper).contains(&s.label))
                .copied()
                .collect(),
        )
    }

    /// True if the last sample repeats the first.
    pub fn is_closed(&self) -> bool {
        self.len() > 1 && self.samples.first() == self.samples.last()
    }

    /// Close the polymer into a loop by appending its first sample.
    ///
    /// Polymers with fewer than two samples are returned unchanged.
    pub fn close(mut self) -> Self {
        if self.len() < 2 || self.is_closed() {
            return self;
        }
        if let Some(&first) = self.samples.first() {
            self.samples.push(first);
        }
        self
    }

    /// Same samples in opposite order.
    pub fn reversed(&self) -> Self {
        Self::from_unique(self.samples.iter().rev().copied().collect())
    }

    /// First pair of labels `(self, other)` whose points coincide.
    pub fn overlap(&self, other: &Polymer, tolerance: &Tolerance) -> Option<(i64, i64)> {
        self.samples.iter().find_map(|a| {
            other
                .samples
                .iter()
                .find(|b| tolerance.points_eq(&a.pos, &b.pos))
                .map(|b| (a.label, b.label))
        })
    }
}

/// Named polymer chain.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Chain {
    /// Chain identifier, e.g. `A` or `1_A`
    name: String,
    /// Residues in sequence order
    polymer: Polymer,
}

impl Chain {
    pub fn new(name: impl Into<String>, polymer: Polymer) -> Self {
        Self {
            name: name.into(),
            polymer,
        }
    }

    /// First residue
    pub fn n_terminus(&self) -> Option<&Sample> {
        self.polymer.first()
    }

    /// Last residue
    pub fn c_terminus(&self) -> Option<&Sample> {
        self.polymer.last()
    }

    /// Label distance between the termini.
    pub fn span(&self) -> i64 {
        match (self.n_terminus(), self.c_terminus()) {
            (Some(n), Some(c)) => (c.label - n.label).abs(),
            _ => 0,
        }
    }

    /// True if `label` lies between the N- and C-terminal labels.
    pub fn within_termini(&self, label: i64) -> bool {
        match (self.n_terminus(), self.c_terminus()) {
            (Some(n), Some(c)) => {
                (n.label.min(c.label)..=n.label.max(c.label)).contains(&label)
            }
            _ => false,
        }
    }

    /// Identifier of a residue as used in messages, e.g. `A_57`.
    pub fn residue_name(&self, label: i64) -> String {
        format!("{}_{}", self.name, label)
    }

    /// Flag sequence neighbours (labels differing by one) at a distance outside `[lower, upper]`.
    ///
    /// Gaps in the numbering are missing residues and are not checked.
    pub fn backbone_warnings(&self, lower: f64, upper: f64) -> Vec<Warning> {
        self.polymer
            .samples()
            .iter()
            .tuple_windows()
            .filter(|(a, b)| (b.label - a.label).abs() == 1)
            .filter_map(|(a, b)| {
                let distance = (b.pos - a.pos).norm();
                (distance < lower || distance > upper).then(|| {
                    Warning::UnnaturalDistance {
                        from: self.residue_name(a.label),
                        to: self.residue_name(b.label),
                        distance,
                    }
                    .logged()
                })
            })
            .collect()
    }
}
