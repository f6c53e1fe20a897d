//! Assigns alternating single/double orders to aromatic bonds for Kekulé rendering.

use crate::{Bond, BondOrder, Element, FeatureSet};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::*;

/// Whether an aromatic atom needs one of its aromatic bonds to become double.
fn needs_double_bond<A: FeatureSet>(graph: &UnGraph<A, Bond>, atom: NodeIndex) -> bool {
    let features = A::features(graph, atom);
    if !features.aromatic {
        return false;
    }
    let Some(element) = Element::from_atomic_number(features.atomic_number) else {
        return false;
    };
    let excess: u32 = graph
        .edges(atom)
        .map(|edge| match edge.weight().order {
            BondOrder::Double => 1,
            BondOrder::Triple => 2,
            BondOrder::Quadruple => 3,
            _ => 0,
        })
        .sum();
    let used = features.connectivity + excess;
    element
        .default_valences()
        .iter()
        .map(|valence| *valence as u32)
        .find(|valence| *valence >= used)
        .is_some_and(|valence| valence - used == 1)
}

fn assign(
    candidates: &[NodeIndex],
    options: &HashMap<NodeIndex, Vec<(NodeIndex, EdgeIndex)>>,
    matched: &mut HashMap<NodeIndex, EdgeIndex>,
) -> bool {
    // Most constrained unmatched atom first.
    let next = candidates
        .iter()
        .copied()
        .filter(|atom| !matched.contains_key(atom))
        .min_by_key(|atom| {
            options[atom]
                .iter()
                .filter(|(partner, _)| !matched.contains_key(partner))
                .count()
        });
    let Some(atom) = next else {
        return true;
    };
    for &(partner, edge) in &options[&atom] {
        if matched.contains_key(&partner) {
            continue;
        }
        matched.insert(atom, edge);
        matched.insert(partner, edge);
        if assign(candidates, options, matched) {
            return true;
        }
        matched.remove(&atom);
        matched.remove(&partner);
    }
    false
}

/// Kekulé orders for every aromatic bond, or `None` when no assignment exists.
pub fn kekulize<A: FeatureSet>(graph: &UnGraph<A, Bond>) -> Option<HashMap<EdgeIndex, BondOrder>> {
    let candidates: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|atom| needs_double_bond(graph, *atom))
        .collect();

    let mut options: HashMap<NodeIndex, Vec<(NodeIndex, EdgeIndex)>> = HashMap::new();
    for &atom in &candidates {
        let partners = graph
            .edges(atom)
            .filter(|edge| edge.weight().order == BondOrder::Aromatic)
            .filter(|edge| candidates.contains(&edge.target()))
            .map(|edge| (edge.target(), edge.id()))
            .collect();
        options.insert(atom, partners);
    }

    let mut matched = HashMap::new();
    if !assign(&candidates, &options, &mut matched) {
        debug!("No Kekulé assignment for {} aromatic atoms", candidates.len());
        return None;
    }

    let doubles: Vec<EdgeIndex> = matched.values().copied().collect();
    Some(
        graph
            .edge_references()
            .filter(|edge| edge.weight().order == BondOrder::Aromatic)
            .map(|edge| {
                let order = if doubles.contains(&edge.id()) {
                    BondOrder::Double
                } else {
                    BondOrder::Single
                };
                (edge.id(), order)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    #[test]
    fn test_kekulize_benzene() {
        let benzene = parse_smiles("c1ccccc1").expect("Failed to parse SMILES");
        let orders = kekulize(&benzene).expect("benzene is kekulizable");
        let doubles = orders.values().filter(|order| **order == BondOrder::Double).count();
        assert_eq!(orders.len(), 6);
        assert_eq!(doubles, 3);
    }

    #[test]
    fn test_kekulize_pyrrole() {
        let pyrrole = parse_smiles("c1cc[nH]c1").expect("Failed to parse SMILES");
        let orders = kekulize(&pyrrole).expect("pyrrole is kekulizable");
        let doubles = orders.values().filter(|order| **order == BondOrder::Double).count();
        assert_eq!(doubles, 2);
    }

    #[test]
    fn test_kekulize_without_aromatic_bonds() {
        let ethane = parse_smiles("CC").expect("Failed to parse SMILES");
        assert_eq!(kekulize(&ethane), Some(HashMap::new()));
    }
}
