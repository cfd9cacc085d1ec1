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

//! Chemical bridges between residues

use serde::{Deserialize, Serialize};

/// Shortest natural bridge length (Å)
pub const NATURAL_BRIDGE_MIN: f64 = 2.0;
/// Longest natural bridge length (Å)
pub const NATURAL_BRIDGE_MAX: f64 = 4.2;

/// Chemistry of a bridge.
///
/// The `*-like` variants have the right pair of elements but not one of the
/// canonical residue/atom combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeKind {
    /// Disulfide bond
    #[serde(rename = "SS")]
    Disulfide,
    #[serde(rename = "AMIDE")]
    Amide,
    #[serde(rename = "AMIDE-like")]
    AmideLike,
    #[serde(rename = "ESTER")]
    Ester,
    #[serde(rename = "ESTER-like")]
    EsterLike,
    #[serde(rename = "THIOESTER")]
    Thioester,
    #[serde(rename = "THIOESTER-like")]
    ThioesterLike,
    #[serde(rename = "OTHER")]
    Other,
}

impl BridgeKind {
    /// Classify a bridge from the atoms at its two ends.
    pub fn classify(first: &BridgeAtom, second: &BridgeAtom) -> Self {
        match (first.element(), second.element()) {
            (Some('S'), Some('S')) => Self::Disulfide,
            (Some('C'), Some('N')) => Self::amide(first, second),
            (Some('N'), Some('C')) => Self::amide(second, first),
            (Some('C'), Some('O')) => Self::ester(first, second),
            (Some('O'), Some('C')) => Self::ester(second, first),
            (Some('C'), Some('S')) => Self::thioester(first, second),
            (Some('S'), Some('C')) => Self::thioester(second, first),
            _ => Self::Other,
        }
    }

    fn amide(carbon: &BridgeAtom, nitrogen: &BridgeAtom) -> Self {
        let lysine = nitrogen.is("LYS", "NZ");
        if (carbon.is_acid_carbon() || carbon.c_terminal) && lysine
            || carbon.is_acid_carbon() && nitrogen.n_terminal
        {
            Self::Amide
        } else {
            Self::AmideLike
        }
    }

    fn ester(carbon: &BridgeAtom, oxygen: &BridgeAtom) -> Self {
        let hydroxyl = oxygen.is("THR", "OG1") || oxygen.is("SER", "OG");
        if (carbon.is_acid_carbon() || carbon.c_terminal) && hydroxyl {
            Self::Ester
        } else {
            Self::EsterLike
        }
    }

    fn thioester(carbon: &BridgeAtom, sulfur: &BridgeAtom) -> Self {
        if (carbon.is_acid_carbon() || carbon.c_terminal) && sulfur.is("CYS", "SG") {
            Self::Thioester
        } else {
            Self::ThioesterLike
        }
    }
}

impl std::fmt::Display for BridgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disulfide => "SS",
            Self::Amide => "AMIDE",
            Self::AmideLike => "AMIDE-like",
            Self::Ester => "ESTER",
            Self::EsterLike => "ESTER-like",
            Self::Thioester => "THIOESTER",
            Self::ThioesterLike => "THIOESTER-like",
            Self::Other => "OTHER",
        };
        write!(f, "{}", name)
    }
}

/// Atom at one end of a bridge, as needed for classification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeAtom {
    /// Residue name, e.g. `CYS`
    pub residue: String,
    /// Atom name, e.g. `SG`
    pub atom: String,
    /// The residue is the N-terminus of its chain
    #[serde(default)]
    pub n_terminal: bool,
    /// The residue is the C-terminus of its chain
    #[serde(default)]
    pub c_terminal: bool,
}

impl BridgeAtom {
    pub fn new(residue: impl Into<String>, atom: impl Into<String>) -> Self {
        Self {
            residue: residue.into(),
            atom: atom.into(),
            ..Default::default()
        }
    }

    /// First letter of the atom name
    fn element(&self) -> Option<char> {
        self.atom.trim().chars().next()
    }

    fn is(&self, residue: &str, atom: &str) -> bool {
        self.residue.trim() == residue && self.atom.trim() == atom
    }

    /// Carboxyl carbon of a glutamate or aspartate side chain
    fn is_acid_carbon(&self) -> bool {
        self.is("GLU", "CD") || self.is("ASP", "CG")
    }
}

/// Where a bridge attaches to a chain: a residue or the chain's synthetic closure point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SiteRepr", into = "SiteRepr")]
pub enum Site {
    Residue(i64),
    Closure,
}

impl Site {
    /// Residue label, if any
    pub const fn label(&self) -> Option<i64> {
        match self {
            Self::Residue(label) => Some(*label),
            Self::Closure => None,
        }
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Residue(label) => write!(f, "{}", label),
            Self::Closure => write!(f, "closure"),
        }
    }
}

/// A site is written as a residue number or as the string `closure`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SiteRepr {
    Label(i64),
    Name(String),
}

impl TryFrom<SiteRepr> for Site {
    type Error = String;
    fn try_from(repr: SiteRepr) -> Result<Self, Self::Error> {
        match repr {
            SiteRepr::Label(label) => Ok(Self::Residue(label)),
            SiteRepr::Name(name) if name == "closure" => Ok(Self::Closure),
            SiteRepr::Name(name) => Err(format!("invalid site '{}'", name)),
        }
    }
}

impl From<Site> for SiteRepr {
    fn from(site: Site) -> Self {
        match site {
            Site::Residue(label) => Self::Label(label),
            Site::Closure => Self::Name("closure".to_string()),
        }
    }
}

/// One end of a bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeEnd {
    /// Chain name
    pub chain: String,
    pub site: Site,
    /// Bridging atom, used to infer the bridge kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom: Option<BridgeAtom>,
}

impl BridgeEnd {
    pub fn new(chain: impl Into<String>, site: Site) -> Self {
        Self {
            chain: chain.into(),
            site,
            atom: None,
        }
    }

    pub fn with_atom(mut self, atom: BridgeAtom) -> Self {
        self.atom = Some(atom);
        self
    }
}

/// Bridge between two residues, possibly on different chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bridge {
    pub first: BridgeEnd,
    pub second: BridgeEnd,
    /// Recorded length of the bridge (Å)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Explicit kind; inferred from the atoms if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BridgeKind>,
}

impl Bridge {
    pub fn new(first: BridgeEnd, second: BridgeEnd) -> Self {
        Self {
            first,
            second,
            distance: None,
            kind: None,
        }
    }

    /// Bridge between two residues.
    pub fn between(chain1: &str, residue1: i64, chain2: &str, residue2: i64) -> Self {
        Self::new(
            BridgeEnd::new(chain1, Site::Residue(residue1)),
            BridgeEnd::new(chain2, Site::Residue(residue2)),
        )
    }

    /// Bridge from a residue to the closure point of the same chain.
    pub fn closure(chain: &str, residue: i64) -> Self {
        Self::new(
            BridgeEnd::new(chain, Site::Residue(residue)),
            BridgeEnd::new(chain, Site::Closure),
        )
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_kind(mut self, kind: BridgeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn ends(&self) -> [&BridgeEnd; 2] {
        [&self.first, &self.second]
    }

    /// Explicit kind, or the kind inferred from the atoms, or `Other`.
    pub fn kind(&self) -> BridgeKind {
        self.kind.unwrap_or_else(|| match (&self.first.atom, &self.second.atom) {
            (Some(a), Some(b)) => BridgeKind::classify(a, b),
            _ => BridgeKind::Other,
        })
    }

    /// Whether the recorded length is within the natural range; `None` if no length is recorded.
    pub fn distance_is_natural(&self) -> Option<bool> {
        self.distance
            .map(|d| (NATURAL_BRIDGE_MIN..=NATURAL_BRIDGE_MAX).contains(&d))
    }

    /// True if the bridge joins residues `i` and `i±1` of the same chain.
    pub fn joins_sequence_neighbours(&self) -> bool {
        match (self.first.site.label(), self.second.site.label()) {
            (Some(a), Some(b)) => self.first.chain == self.second.chain && (a - b).abs() == 1,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(residue: &str, atom: &str) -> BridgeAtom {
        BridgeAtom::new(residue, atom)
    }

    #[test]
    fn classification_table() {
        let cys = atom("CYS", "SG");
        let lys = atom("LYS", "NZ");
        let glu = atom("GLU", "CD");
        let asp = atom("ASP", "CG");
        let ser = atom("SER", "OG");
        let thr = atom("THR", "OG1");

        assert_eq!(BridgeKind::classify(&cys, &cys), BridgeKind::Disulfide);
        assert_eq!(BridgeKind::classify(&glu, &lys), BridgeKind::Amide);
        assert_eq!(BridgeKind::classify(&lys, &asp), BridgeKind::Amide);
        assert_eq!(BridgeKind::classify(&glu, &ser), BridgeKind::Ester);
        assert_eq!(BridgeKind::classify(&thr, &asp), BridgeKind::Ester);
        assert_eq!(BridgeKind::classify(&asp, &cys), BridgeKind::Thioester);
        assert_eq!(BridgeKind::classify(&cys, &glu), BridgeKind::Thioester);

        // right elements, wrong residues
        assert_eq!(
            BridgeKind::classify(&atom("ASN", "CG"), &lys),
            BridgeKind::AmideLike
        );
        assert_eq!(
            BridgeKind::classify(&atom("TYR", "OH"), &glu),
            BridgeKind::EsterLike
        );
        assert_eq!(
            BridgeKind::classify(&atom("MET", "SD"), &atom("ALA", "CB")),
            BridgeKind::ThioesterLike
        );
        assert_eq!(
            BridgeKind::classify(&atom("ZN", "ZN"), &cys),
            BridgeKind::Other
        );
        assert_eq!(BridgeKind::classify(&atom("X", ""), &cys), BridgeKind::Other);
    }

    #[test]
    fn terminal_residues() {
        let c_end = BridgeAtom {
            c_terminal: true,
            ..atom("GLY", "C")
        };
        let n_end = BridgeAtom {
            n_terminal: true,
            ..atom("MET", "N")
        };
        assert_eq!(
            BridgeKind::classify(&c_end, &atom("LYS", "NZ")),
            BridgeKind::Amide
        );
        assert_eq!(
            BridgeKind::classify(&n_end, &atom("GLU", "CD")),
            BridgeKind::Amide
        );
        assert_eq!(
            BridgeKind::classify(&atom("SER", "OG"), &c_end),
            BridgeKind::Ester
        );
        // head-to-tail is not a side chain amide
        assert_eq!(BridgeKind::classify(&c_end, &n_end), BridgeKind::AmideLike);
    }

    #[test]
    fn bridge_properties() {
        let bridge = Bridge::between("A", 10, "A", 11).with_distance(1.5);
        assert!(bridge.joins_sequence_neighbours());
        assert_eq!(bridge.distance_is_natural(), Some(false));
        assert_eq!(bridge.kind(), BridgeKind::Other);

        let bridge = Bridge::new(
            BridgeEnd::new("A", Site::Residue(3)).with_atom(atom("CYS", "SG")),
            BridgeEnd::new("B", Site::Residue(4)).with_atom(atom("CYS", "SG")),
        )
        .with_distance(2.05);
        assert!(!bridge.joins_sequence_neighbours());
        assert_eq!(bridge.distance_is_natural(), Some(true));
        assert_eq!(bridge.kind(), BridgeKind::Disulfide);
        assert_eq!(bridge.clone().with_kind(BridgeKind::Ester).kind(), BridgeKind::Ester);

        let closure = Bridge::closure("A", 1);
        assert!(!closure.joins_sequence_neighbours());
        assert_eq!(closure.distance_is_natural(), None);
    }

    #[test]
    fn bridge_from_yaml() {
        let yaml = r#"
first: { chain: A, site: 12, atom: { residue: GLU, atom: CD } }
second: { chain: A, site: closure }
kind: AMIDE-like
"#;
        let bridge: Bridge = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(bridge.first.site, Site::Residue(12));
        assert_eq!(bridge.second.site, Site::Closure);
        assert_eq!(bridge.kind(), BridgeKind::AmideLike);
        assert!(serde_yaml::from_str::<Site>("somewhere").is_err());
        assert_eq!(serde_yaml::to_string(&Site::Closure).unwrap().trim(), "closure");
    }
}
