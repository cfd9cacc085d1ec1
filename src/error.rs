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

//! Fatal errors and non-fatal warnings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conditions that abort an analysis.
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate label {label} in polymer{}", coincident_note(.coincident))]
    DuplicateLabel { label: i64, coincident: bool },

    #[error("no residue {residue} in chain '{chain}'")]
    MissingResidue { chain: String, residue: String },

    #[error("polymers overlap: sample {first} of the first coincides with {second} of the second")]
    Overlap { first: i64, second: i64 },

    #[error("loop matrix spans {expected} samples but the threading polymer has {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("polymer has {0} sample(s); at least two are needed to form a segment")]
    TooShort(usize),

    #[error("{0} chain(s) given; a macrolink needs at least two")]
    TooFewChains(usize),

    #[error("{given} chains given; at most {max} can be joined into a macrolink")]
    TooManyChains { given: usize, max: usize },

    #[error("the given bridges do not close any loop")]
    NoComponent,

    #[error("the given bridges close {0} different loops")]
    AmbiguousComponent(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),
}

impl Error {
    pub(crate) fn missing_residue(chain: impl Into<String>, residue: impl ToString) -> Self {
        Self::MissingResidue {
            chain: chain.into(),
            residue: residue.to_string(),
        }
    }
}

fn coincident_note(coincident: &bool) -> &'static str {
    if *coincident {
        " (identical coordinates)"
    } else {
        ""
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Suspicious but non-fatal conditions found during an analysis.
///
/// Warnings are logged when raised and returned alongside the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    /// A segment pair whose linking contribution is undefined and counted as zero.
    DegenerateSegment { first: usize, second: usize },
    /// Two connected points lie unusually close or far apart.
    UnnaturalDistance {
        from: String,
        to: String,
        distance: f64,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateSegment { first, second } => write!(
                f,
                "degenerate geometry for segments {first} and {second}; contribution set to zero"
            ),
            Self::UnnaturalDistance { from, to, distance } => {
                write!(f, "unnatural distance {distance:.3} between {from} and {to}")
            }
        }
    }
}

impl Warning {
    /// Log the warning and hand it back, e.g. for pushing onto a list.
    pub(crate) fn logged(self) -> Self {
        log::warn!("{}", self);
        self
    }
}
