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

//! # Gaussian linking number
//!
//! The GLN between two polygonal curves is the sum of the linking
//! contributions of all segment pairs, each evaluated as the signed solid
//! angle spanned by the two segments.
//!
//! Closing one polymer into a loop and summing its contributions against each
//! segment of the other gives the linking number between the loop and every
//! contiguous sub-arc of the second polymer. These are kept as prefix sums in a
//! [`CumulativeLoop`], and the extreme sub-arc values are what the
//! [lasso classification](classify) is based on.
//!
//! ~~~
//! use macrolink::{gln::GlnEngine, Config, Point, Polymer};
//! let ring = Polymer::from_points([
//!     Point::new(-1.0, -1.0, 0.0),
//!     Point::new(1.0, -1.0, 0.0),
//!     Point::new(1.0, 1.0, 0.0),
//!     Point::new(-1.0, 1.0, 0.0),
//! ])
//! .close();
//! let thread = Polymer::from_points([
//!     Point::new(0.1, 0.2, -5.0),
//!     Point::new(0.0, 0.0, 5.0),
//! ]);
//! let analysis = GlnEngine::new(Config::default()).analyze(&ring, &thread).unwrap();
//! let summary = analysis.first_as_loop().as_ref().unwrap();
//! assert!(summary.whole.abs() > 0.3);
//! ~~~

mod classify;

use std::f64::consts::PI;

use derive_getters::Getters;
use ndarray::{Array2, Axis};
use serde::Serialize;

pub use self::classify::{classify, LassoClass};
use crate::vector::normalized_cross;
use crate::{Config, Error, Point, Polymer, Result, Tolerance, Warning};

/// Linking contribution of segment `a1→a2` with segment `b1→b2`.
///
/// Returns `None` if the geometry is degenerate, i.e. if any pair of the four
/// difference vectors is parallel.
pub fn segment_linking(
    a1: &Point,
    a2: &Point,
    b1: &Point,
    b2: &Point,
    tolerance: &Tolerance,
) -> Option<f64> {
    let a = b1 - a1;
    let b = b2 - a1;
    let c = b2 - a2;
    let d = b1 - a2;

    let n1 = normalized_cross(&a, &b)?.into_inner();
    let n2 = normalized_cross(&b, &c)?.into_inner();
    let n3 = normalized_cross(&c, &d)?.into_inner();
    let n4 = normalized_cross(&d, &a)?.into_inner();

    let sign = tolerance.sign((b2 - b1).cross(&(a2 - a1)).dot(&a));
    let solid_angle: f64 = [(n1, n2), (n2, n3), (n3, n4), (n4, n1)]
        .iter()
        .map(|(u, v)| tolerance.clamp_unit(u.dot(v)).asin())
        .sum();
    Some(sign * solid_angle / (4.0 * PI))
}

/// Linking contributions of all segment pairs of two polymers.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct SegmentMatrix {
    /// Element `(i, j)` is the contribution of segment `i` of the first and `j` of the second
    values: Array2<f64>,
    /// Segment pairs counted as zero
    warnings: Vec<Warning>,
}

impl SegmentMatrix {
    /// Evaluate every segment pair; O(N1·N2).
    pub fn new(first: &Polymer, second: &Polymer, tolerance: &Tolerance) -> Self {
        let mut values = Array2::zeros((first.num_segments(), second.num_segments()));
        let mut warnings = Vec::new();
        for (i, (a1, a2)) in first.segments().enumerate() {
            for (j, (b1, b2)) in second.segments().enumerate() {
                match segment_linking(a1, a2, b1, b2, tolerance) {
                    Some(value) => values[[i, j]] = value,
                    None => warnings.push(
                        Warning::DegenerateSegment {
                            first: i,
                            second: j,
                        }
                        .logged(),
                    ),
                }
            }
        }
        Self { values, warnings }
    }

    /// GLN of the two whole polymers
    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// Sub-arcs of the second polymer against the first polymer as a loop.
    pub fn first_as_loop(&self) -> CumulativeLoop {
        CumulativeLoop::from_segment_sums(&self.values.sum_axis(Axis(0)).to_vec())
    }

    /// Sub-arcs of the first polymer against the second polymer as a loop.
    pub fn second_as_loop(&self) -> CumulativeLoop {
        CumulativeLoop::from_segment_sums(&self.values.sum_axis(Axis(1)).to_vec())
    }
}

/// Both cumulative loop matrices of a segment matrix, first polymer as the loop first.
pub fn cumulative_loop_matrices(matrix: &SegmentMatrix) -> (CumulativeLoop, CumulativeLoop) {
    (matrix.first_as_loop(), matrix.second_as_loop())
}

/// GLN between a closed loop and every sub-arc `[i, j)` of a threading polymer.
///
/// Element `(i, j)` is the summed contribution of segments `i..j`, i.e. the arc
/// running from sample `i` to sample `j`. Elements with `j ≤ i` are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeLoop {
    values: Array2<f64>,
}

impl CumulativeLoop {
    /// Build from the loop's total contribution to each segment of the threading polymer.
    pub fn from_segment_sums(sums: &[f64]) -> Self {
        let n = sums.len() + 1;
        let mut values = Array2::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                values[[i, j]] = values[[i, j - 1]] + sums[j - 1];
            }
        }
        Self { values }
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of samples of the threading polymer
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// GLN of the arc from sample `begin` to sample `end`.
    pub fn get(&self, begin: usize, end: usize) -> Option<f64> {
        self.values.get((begin, end)).copied()
    }

    /// GLN of the whole threading polymer
    pub fn whole(&self) -> f64 {
        self.get(0, self.len().saturating_sub(1)).unwrap_or_default()
    }

    /// Largest and smallest values over all arcs.
    pub fn extrema(&self) -> Extrema {
        Extrema::scan(self.arcs())
    }

    /// Largest and smallest values over arcs starting at the first sample.
    pub fn prefix_extrema(&self) -> Extrema {
        Extrema::scan(self.arcs().filter(|((begin, _), _)| *begin == 0))
    }

    fn arcs(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.values
            .indexed_iter()
            .filter(|((i, j), _)| i < j)
            .map(|(index, value)| (index, *value))
    }
}

/// Value of an arc together with its first and last sample index.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Extremum {
    pub value: f64,
    pub begin: usize,
    pub end: usize,
}

/// Largest and smallest arc values.
///
/// Both start from the empty arc `(0, 0)` with value zero so that `max ≥ 0 ≥ min`.
/// Ties keep the first arc in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Extrema {
    pub max: Extremum,
    pub min: Extremum,
}

impl Extrema {
    fn scan(arcs: impl Iterator<Item = ((usize, usize), f64)>) -> Self {
        arcs.fold(Self::default(), |mut extrema, ((begin, end), value)| {
            if value > extrema.max.value {
                extrema.max = Extremum { value, begin, end };
            }
            if value < extrema.min.value {
                extrema.min = Extremum { value, begin, end };
            }
            extrema
        })
    }
}

/// Rounded GLN of an arc identified by the labels of its end samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArcGln {
    pub value: f64,
    pub from: i64,
    pub to: i64,
}

/// Rounded report for one polymer acting as the loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopSummary {
    /// GLN with the whole threading polymer
    pub whole: f64,
    pub max: ArcGln,
    pub min: ArcGln,
    /// Largest value over arcs starting at the first sample
    pub prefix_max: ArcGln,
    /// Smallest value over arcs starting at the first sample
    pub prefix_min: ArcGln,
    pub class: LassoClass,
}

/// Complete GLN analysis of two polymers.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct GlnAnalysis {
    /// Full precision segment contributions
    #[serde(skip)]
    segments: SegmentMatrix,
    /// First polymer closed into a loop, threaded by the second
    #[serde(skip_serializing_if = "Option::is_none")]
    first_as_loop: Option<LoopSummary>,
    /// Second polymer closed into a loop, threaded by the first
    #[serde(skip_serializing_if = "Option::is_none")]
    second_as_loop: Option<LoopSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<Warning>,
}

/// Computes linking matrices and lasso classes using a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct GlnEngine {
    config: Config,
}

impl GlnEngine {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Dense (N1-1)×(N2-1) matrix of segment contributions.
    pub fn full_matrix(&self, first: &Polymer, second: &Polymer) -> SegmentMatrix {
        SegmentMatrix::new(first, second, &self.config.tolerance())
    }

    /// Round the values of a cumulative loop and classify it.
    ///
    /// `threading` is the polymer whose sub-arcs index the matrix and must
    /// have as many samples as the matrix has rows.
    pub fn summarize(
        &self,
        cumulative: &CumulativeLoop,
        threading: &Polymer,
    ) -> Result<LoopSummary> {
        if cumulative.len() != threading.len() {
            return Err(Error::SizeMismatch {
                expected: cumulative.len(),
                found: threading.len(),
            });
        }
        let samples = threading.samples();
        let arc = |extremum: &Extremum| ArcGln {
            value: self.config.round(extremum.value),
            from: samples[extremum.begin].label,
            to: samples[extremum.end].label,
        };
        let extrema = cumulative.extrema();
        let prefix = cumulative.prefix_extrema();
        let whole = self.config.round(cumulative.whole());
        let max = arc(&extrema.max);
        let min = arc(&extrema.min);
        Ok(LoopSummary {
            whole,
            class: classify(&self.config.thresholds, max.value, min.value, whole),
            max,
            min,
            prefix_max: arc(&prefix.max),
            prefix_min: arc(&prefix.min),
        })
    }

    /// Full analysis of two polymers, each optionally acting as the loop.
    ///
    /// Polymers are used as given; close a polymer beforehand for it to act as a proper loop.
    pub fn analyze(&self, first: &Polymer, second: &Polymer) -> Result<GlnAnalysis> {
        for polymer in [first, second] {
            if polymer.len() < 2 {
                return Err(Error::TooShort(polymer.len()));
            }
        }
        if let Some((a, b)) = first.overlap(second, &self.config.tolerance()) {
            return Err(Error::Overlap {
                first: a,
                second: b,
            });
        }

        let segments = self.full_matrix(first, second);
        log::debug!(
            "GLN of {} x {} segments: {:.4}",
            first.num_segments(),
            second.num_segments(),
            segments.total()
        );

        let loops = self.config.loops;
        let first_as_loop = loops
            .includes_first()
            .then(|| self.summarize(&segments.first_as_loop(), second))
            .transpose()?;
        let second_as_loop = loops
            .includes_second()
            .then(|| self.summarize(&segments.second_as_loop(), first))
            .transpose()?;

        Ok(GlnAnalysis {
            warnings: segments.warnings().clone(),
            segments,
            first_as_loop,
            second_as_loop,
        })
    }
}
