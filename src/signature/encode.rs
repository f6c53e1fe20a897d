//! Per-atom and per-bond tokens used as labels when rendering an environment.

use crate::{Atom, Bond, BondDirection, BondOrder, Element, PatternAtom};
use petgraph::graph::{NodeIndex, UnGraph};

/// Structural features an atom token is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AtomFeatures {
    pub atomic_number: u8,
    pub aromatic: bool,
    /// Implicit plus explicit hydrogens.
    pub total_hydrogens: u32,
    pub implicit_hydrogens: u32,
    /// Explicit graph neighbours.
    pub degree: u32,
    /// Degree plus total hydrogens.
    pub connectivity: u32,
    pub charge: i32,
}

/// Reads the token features of an atom within its graph.
///
/// Concrete atoms derive them from the graph they sit in. Pattern atoms carry
/// them verbatim in their parsed descriptor, since the pattern only holds a
/// truncated view of the original neighbourhood.
pub trait FeatureSet: Sized {
    fn features(graph: &UnGraph<Self, Bond>, atom: NodeIndex) -> AtomFeatures;
}

impl FeatureSet for Atom {
    fn features(graph: &UnGraph<Self, Bond>, atom: NodeIndex) -> AtomFeatures {
        let data = &graph[atom];
        let degree = graph.neighbors(atom).count() as u32;
        let total_hydrogens = data.total_hydrogens() as u32;
        AtomFeatures {
            atomic_number: data.element.atomic_number(),
            aromatic: data.aromatic,
            total_hydrogens,
            implicit_hydrogens: data.implicit_hydrogens as u32,
            degree,
            connectivity: degree + total_hydrogens,
            charge: data.charge as i32,
        }
    }
}

impl FeatureSet for PatternAtom {
    fn features(graph: &UnGraph<Self, Bond>, atom: NodeIndex) -> AtomFeatures {
        let data = &graph[atom];
        AtomFeatures {
            atomic_number: data.element.atomic_number(),
            aromatic: data.aromatic,
            total_hydrogens: data.total_hydrogens,
            implicit_hydrogens: data.implicit_hydrogens,
            degree: data.degree,
            connectivity: data.connectivity,
            charge: data.charge,
        }
    }
}

/// Renders `[<symbol>;H<n>;h<n>;D<n>;X<n>[;<charge>][:<map>]]`, or `*` for a dummy atom.
pub fn atom_token(features: &AtomFeatures, map: u32) -> String {
    let element = Element::from_atomic_number(features.atomic_number).unwrap_or(Element::DUMMY);
    if element.is_dummy() {
        return "*".to_string();
    }

    let symbol = if features.aromatic {
        element.symbol().to_lowercase()
    } else if element.is_hydrogen() {
        "#1".to_string()
    } else {
        element.symbol().to_string()
    };

    let mut token = format!(
        "[{symbol};H{};h{};D{};X{}",
        features.total_hydrogens, features.implicit_hydrogens, features.degree, features.connectivity
    );
    match features.charge {
        0 => {}
        1 => token.push_str(";+"),
        -1 => token.push_str(";-"),
        charge if charge > 0 => token.push_str(&format!(";+{charge}")),
        charge => token.push_str(&format!(";-{}", charge.abs())),
    }
    if map != 0 {
        token.push_str(&format!(":{map}"));
    }
    token.push(']');
    token
}

/// Symbol of a bond. Directions only show when `use_stereo` is set.
pub fn bond_token(bond: &Bond, use_stereo: bool) -> &'static str {
    let direction = if use_stereo {
        bond.direction
    } else {
        BondDirection::None
    };
    match (bond.order, direction) {
        (BondOrder::Single, BondDirection::Down) => "\\",
        (BondOrder::Single, BondDirection::Up) => "/",
        (BondOrder::Single, BondDirection::None) => "-",
        (BondOrder::Double, _) => "=",
        (BondOrder::Triple, _) => "#",
        (BondOrder::Quadruple, _) => "$",
        (BondOrder::Aromatic, BondDirection::Down) => ":\\",
        (BondOrder::Aromatic, BondDirection::Up) => ":/",
        (BondOrder::Aromatic, BondDirection::None) => ":",
        (BondOrder::Dative, _) => "-",
        (BondOrder::Unspecified, _) => "~",
    }
}

/// Bond type name used in neighbour entries, e.g. `AROMATIC`.
pub fn bond_type_name(bond: &Bond) -> &'static str {
    bond.order.name()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(atomic_number: u8) -> AtomFeatures {
        AtomFeatures {
            atomic_number,
            ..Default::default()
        }
    }

    #[test]
    fn test_hydroxyl_token() {
        let oxygen = AtomFeatures {
            atomic_number: 8,
            total_hydrogens: 1,
            implicit_hydrogens: 1,
            degree: 1,
            connectivity: 2,
            ..Default::default()
        };
        assert_eq!(atom_token(&oxygen, 0), "[O;H1;h1;D1;X2]");
        assert_eq!(atom_token(&oxygen, 1), "[O;H1;h1;D1;X2:1]");
    }

    #[test]
    fn test_special_symbols() {
        assert_eq!(atom_token(&features(0), 1), "*");
        assert_eq!(atom_token(&features(1), 0), "[#1;H0;h0;D0;X0]");
        let aromatic = AtomFeatures {
            aromatic: true,
            ..features(7)
        };
        assert_eq!(atom_token(&aromatic, 0), "[n;H0;h0;D0;X0]");
    }

    #[test]
    fn test_charges() {
        let charged = |charge| AtomFeatures {
            charge,
            ..features(7)
        };
        assert_eq!(atom_token(&charged(1), 0), "[N;H0;h0;D0;X0;+]");
        assert_eq!(atom_token(&charged(-1), 0), "[N;H0;h0;D0;X0;-]");
        assert_eq!(atom_token(&charged(2), 0), "[N;H0;h0;D0;X0;+2]");
        assert_eq!(atom_token(&charged(-3), 0), "[N;H0;h0;D0;X0;-3]");
    }

    #[test]
    fn test_bond_tokens() {
        let up = Bond {
            order: BondOrder::Single,
            direction: BondDirection::Up,
        };
        assert_eq!(bond_token(&up, true), "/");
        assert_eq!(bond_token(&up, false), "-");
        let aromatic_down = Bond {
            order: BondOrder::Aromatic,
            direction: BondDirection::Down,
        };
        assert_eq!(bond_token(&aromatic_down, true), ":\\");
        assert_eq!(bond_token(&Bond::new(BondOrder::Quadruple), false), "$");
        assert_eq!(bond_token(&Bond::new(BondOrder::Dative), true), "-");
        assert_eq!(bond_token(&Bond::new(BondOrder::Unspecified), true), "~");
        assert_eq!(bond_type_name(&Bond::new(BondOrder::Aromatic)), "AROMATIC");
    }
}
