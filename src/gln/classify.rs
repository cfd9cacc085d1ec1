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

//! Lasso classification from sub-loop linking numbers.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;

/// Topological class of a lasso, ordered by increasing entanglement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LassoClass {
    /// Loop not pierced
    #[serde(rename = "L0")]
    L0,
    /// Pierced once, from one side
    #[serde(rename = "L1")]
    L1,
    /// Pierced from both sides with a small net linking number
    #[serde(rename = "L2+")]
    L2Plus,
    /// Pierced from both sides with a large net linking number
    #[serde(rename = "L3+")]
    L3Plus,
    /// Supercoiled
    #[serde(rename = "LS")]
    Supercoiled,
}

impl std::fmt::Display for LassoClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::L0 => "L0",
            Self::L1 => "L1",
            Self::L2Plus => "L2+",
            Self::L3Plus => "L3+",
            Self::Supercoiled => "LS",
        };
        write!(f, "{}", name)
    }
}

/// Classify a loop from its largest and smallest sub-arc GLN and the whole-arc GLN.
///
/// The extremes are taken as the GLN engine reports them, i.e. `max ≥ 0 ≥ min`;
/// other inputs are clamped to that form first.
pub fn classify(thresholds: &Thresholds, max: f64, min: f64, whole: f64) -> LassoClass {
    let positive = max.max(0.0);
    let negative = min.min(0.0).abs();
    let largest = positive.max(negative);

    if largest >= thresholds.supercoiled {
        return LassoClass::Supercoiled;
    }
    if largest < thresholds.trivial {
        return LassoClass::L0;
    }
    if (positive >= thresholds.trivial) != (negative >= thresholds.trivial) {
        return LassoClass::L1;
    }
    if whole.abs() < thresholds.extended {
        LassoClass::L2Plus
    } else {
        LassoClass::L3Plus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lasso_classes() {
        let t = Thresholds::default();
        assert_eq!(classify(&t, 0.5, -0.3, 0.1), LassoClass::L0);
        assert_eq!(classify(&t, 0.0, 0.0, 0.0), LassoClass::L0);
        assert_eq!(classify(&t, 0.9, -0.2, 0.9), LassoClass::L1);
        assert_eq!(classify(&t, 0.1, -1.2, -1.1), LassoClass::L1);
        assert_eq!(classify(&t, 0.8, -0.8, 0.2), LassoClass::L2Plus);
        assert_eq!(classify(&t, 0.8, -0.8, -0.7), LassoClass::L3Plus);
        assert_eq!(classify(&t, 0.3, -1.7, 0.0), LassoClass::Supercoiled);
    }

    #[test]
    fn threshold_boundaries() {
        let t = Thresholds::default();
        // equal extremes are clamped to one side
        assert_eq!(classify(&t, 0.69, 0.69, 0.69), LassoClass::L1);
        assert_eq!(classify(&t, 1.5, 1.5, 1.5), LassoClass::Supercoiled);
        assert_eq!(classify(&t, 0.68, -0.68, 0.0), LassoClass::L0);
        assert_eq!(classify(&t, 0.69, -0.69, 0.55), LassoClass::L3Plus);
        assert_eq!(classify(&t, 0.69, -0.69, 0.54), LassoClass::L2Plus);
    }

    #[test]
    fn classification_is_idempotent() {
        let t = Thresholds::default();
        for (max, min, whole) in [(0.7, -0.1, 0.6), (1.0, -1.0, 0.0), (2.0, 0.0, 2.0)] {
            assert_eq!(classify(&t, max, min, whole), classify(&t, max, min, whole));
        }
    }

    #[test]
    fn ordering_and_names() {
        assert!(LassoClass::L0 < LassoClass::L1);
        assert!(LassoClass::L2Plus < LassoClass::L3Plus);
        assert!(LassoClass::L3Plus < LassoClass::Supercoiled);
        assert_eq!(LassoClass::L2Plus.to_string(), "L2+");
        assert_eq!(serde_yaml::to_string(&LassoClass::L3Plus).unwrap().trim(), "L3+");
        let class: LassoClass = serde_yaml::from_str("LS").unwrap();
        assert_eq!(class, LassoClass::Supercoiled);
    }
}
