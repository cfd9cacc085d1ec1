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

//! # Macrolink
//!
//! Topology analysis of entangled polymer chains:
//!
//! - [`gln`] computes Gaussian linking numbers between two space curves and
//!   classifies lassos from the sub-loop linking matrices.
//! - [`topology`] builds a graph of chemical bridges and backbone connections
//!   and enumerates the closed loops it contains.
//! - [`macrolink`] joins several chains into a single closed curve, either
//!   terminus-to-terminus or through nearby residue pairs.
//!
//! All operations are pure functions of their inputs. Structure parsing and
//! rendering are left to the caller; polymers enter as labelled points.

pub mod cli;
pub mod config;
mod error;
pub mod gln;
pub mod job;
pub mod macrolink;
pub mod polymer;
pub mod topology;
pub mod vector;

pub use config::Config;
pub use error::{Error, Result, Warning};
pub use polymer::{Chain, Polymer, Sample};
pub use vector::{Point, Tolerance};

/// Upper bound on the number of chains combined into one macrolink.
///
/// The assembler enumerates `(k-1)! * 2^k` arrangements, so this is kept small.
pub const MAX_CHAINS: usize = 5;
