//! Morgan (ECFP-like) bits, reported per atom.

use crate::{rank_atoms, ring_bonds, BondInvariant, MoleculeGraph};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashSet};
use tracing::*;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a_update(hash: u64, value: u64) -> u64 {
    value
        .to_le_bytes()
        .iter()
        .fold(hash, |h, byte| (h ^ *byte as u64).wrapping_mul(FNV_PRIME))
}

fn fold_hash(hash: u64, nbits: usize) -> u32 {
    (hash % nbits as u64) as u32
}

fn initial_identifier(mol: &MoleculeGraph, atom: NodeIndex, in_ring: bool, use_chirality: bool) -> u64 {
    let data = &mol[atom];
    let degree = mol.neighbors(atom).count() as u64;
    let mut hash = FNV_OFFSET;
    hash = fnv1a_update(hash, data.element.atomic_number() as u64);
    hash = fnv1a_update(hash, degree + data.total_hydrogens() as u64);
    hash = fnv1a_update(hash, data.total_hydrogens() as u64);
    hash = fnv1a_update(hash, data.charge as i64 as u64);
    hash = fnv1a_update(hash, data.isotope as u64);
    hash = fnv1a_update(hash, in_ring as u64);
    if use_chirality {
        hash = fnv1a_update(hash, data.chirality as u64);
    }
    hash
}

/// An atom environment being grown layer by layer.
#[derive(Clone)]
struct Environment {
    identifier: u64,
    bonds: BTreeSet<EdgeIndex>,
    alive: bool,
}

/// Morgan bits of every atom, in layer order, folded to `nbits`.
///
/// Layer 0 contributes one bit per atom. A later layer contributes a bit for
/// an atom only if its environment grew and no other atom (in this or an
/// earlier layer) already covers the same bonds. Among atoms of one layer
/// covering the same bonds, the one with the lowest hash and then the lowest
/// canonical rank keeps the bit, so the outcome does not depend on atom order.
/// An atom whose environment stops growing contributes nothing further.
#[instrument(skip_all, fields(atoms = mol.node_count(), radius = radius, nbits = nbits))]
pub fn morgan_atom_bits(mol: &MoleculeGraph, radius: usize, nbits: usize, use_chirality: bool) -> Vec<Vec<u32>> {
    let n = mol.node_count();
    let mut bits: Vec<Vec<u32>> = vec![Vec::new(); n];
    if nbits == 0 {
        return bits;
    }

    let ring_atoms: HashSet<NodeIndex> = ring_bonds(mol)
        .into_iter()
        .filter_map(|edge| mol.edge_endpoints(edge))
        .flat_map(|(a, b)| [a, b])
        .collect();

    let mut environments: Vec<Environment> = mol
        .node_indices()
        .map(|atom| Environment {
            identifier: initial_identifier(mol, atom, ring_atoms.contains(&atom), use_chirality),
            bonds: BTreeSet::new(),
            alive: true,
        })
        .collect();
    for (atom, environment) in environments.iter().enumerate() {
        bits[atom].push(fold_hash(environment.identifier, nbits));
    }

    let ranks = rank_atoms(mol);
    let mut seen: HashSet<BTreeSet<EdgeIndex>> = HashSet::new();
    for layer in 0..radius {
        let mut grown: Vec<(BTreeSet<EdgeIndex>, u64, usize, usize)> = Vec::new();
        let mut next = environments.clone();
        for atom in mol.node_indices().filter(|atom| environments[atom.index()].alive) {
            let mut neighbors: Vec<(u8, u64)> = mol
                .edges(atom)
                .map(|edge| {
                    let other = if edge.source() == atom { edge.target() } else { edge.source() };
                    (edge.weight().invariant(), environments[other.index()].identifier)
                })
                .collect();
            neighbors.sort_unstable();

            let mut hash = fnv1a_update(FNV_OFFSET, layer as u64);
            hash = fnv1a_update(hash, environments[atom.index()].identifier);
            for (bond, identifier) in &neighbors {
                hash = fnv1a_update(hash, *bond as u64);
                hash = fnv1a_update(hash, *identifier);
            }

            let mut bonds = environments[atom.index()].bonds.clone();
            for edge in mol.edges(atom) {
                let other = if edge.source() == atom { edge.target() } else { edge.source() };
                bonds.insert(edge.id());
                bonds.extend(environments[other.index()].bonds.iter().copied());
            }

            next[atom.index()].identifier = hash;
            if bonds == environments[atom.index()].bonds {
                next[atom.index()].alive = false;
            } else {
                next[atom.index()].bonds = bonds.clone();
                grown.push((bonds, hash, ranks[atom.index()], atom.index()));
            }
        }

        grown.sort();
        for (bonds, hash, _, atom) in grown {
            if seen.insert(bonds) {
                bits[atom].push(fold_hash(hash, nbits));
            } else {
                next[atom].alive = false;
            }
        }
        environments = next;
    }
    trace!("Computed Morgan bits for {n} atoms");
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_smiles;

    #[test]
    fn test_every_atom_has_a_layer_zero_bit() {
        let mol = parse_smiles("CCO").expect("Failed to parse SMILES");
        let bits = morgan_atom_bits(&mol, 2, 2048, true);
        assert_eq!(bits.len(), 3);
        assert!(bits.iter().all(|atom_bits| !atom_bits.is_empty()));
        assert!(bits.iter().flatten().all(|bit| *bit < 2048));
    }

    #[test]
    fn test_equivalent_atoms_share_layer_zero_bit() {
        let mol = parse_smiles("OCCO").expect("Failed to parse SMILES");
        let bits = morgan_atom_bits(&mol, 0, 1 << 20, false);
        assert_eq!(bits[0], bits[3]);
        assert_eq!(bits[1], bits[2]);
        assert_ne!(bits[0], bits[1]);
    }

    #[test]
    fn test_duplicate_environments_emit_once() {
        // Both carbons of ethane cover the same single bond at layer 1.
        let mol = parse_smiles("CC").expect("Failed to parse SMILES");
        let bits = morgan_atom_bits(&mol, 2, 2048, false);
        let total: usize = bits.iter().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_bits_do_not_depend_on_atom_order() {
        // Two spiro centres whose environments meet at the same bonds in the
        // same layer with equal hashes.
        let mol = parse_smiles("C1CCC2(CC1)CCC1(CC2)CCCCC1").expect("Failed to parse SMILES");
        let order = [3, 5, 15, 7, 8, 12, 14, 4, 1, 10, 6, 11, 9, 13, 0, 2];
        let mut position = vec![0; order.len()];
        for (new, old) in order.iter().enumerate() {
            position[*old] = new;
        }
        let mut shuffled = MoleculeGraph::default();
        for old in order {
            shuffled.add_node(mol[NodeIndex::new(old)].clone());
        }
        for edge in mol.edge_indices() {
            let (a, b) = mol.edge_endpoints(edge).expect("edge endpoints");
            shuffled.add_edge(NodeIndex::new(position[a.index()]), NodeIndex::new(position[b.index()]), mol[edge]);
        }

        let mut before = morgan_atom_bits(&mol, 8, 2048, false);
        let mut after = morgan_atom_bits(&shuffled, 8, 2048, false);
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_no_bits_without_size() {
        let mol = parse_smiles("CC").expect("Failed to parse SMILES");
        assert!(morgan_atom_bits(&mol, 2, 0, false).iter().all(Vec::is_empty));
    }
}
