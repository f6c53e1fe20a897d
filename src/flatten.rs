//! Stereo-free, hydrogen-normalised copies of molecules.

use crate::{parse_smiles, rank_atoms, to_smiles, BondDirection, Chirality, MoleculeGraph, RenderOptions, SignatureError};
use anyhow::{Context, Result};

/// A copy of `mol` without chirality or bond directions.
pub fn strip_stereo(mol: &MoleculeGraph) -> MoleculeGraph {
    let mut copy = mol.clone();
    for atom in copy.node_weights_mut() {
        atom.chirality = Chirality::None;
    }
    for bond in copy.edge_weights_mut() {
        bond.direction = BondDirection::None;
    }
    copy
}

/// Strips stereo, then writes and re-reads canonical SMILES so hydrogen
/// bookkeeping and atom order come out the same for equivalent inputs.
pub fn flat_copy(mol: &MoleculeGraph) -> Result<MoleculeGraph> {
    let options = RenderOptions {
        all_bonds_explicit: false,
        ..Default::default()
    };
    let smiles = to_smiles(&strip_stereo(mol), &options);
    parse_smiles(&smiles).context(format!("Failed to re-read flattened molecule {smiles}"))
}

/// For every atom of `flat`, the index of the matching atom of `original`.
///
/// Atoms are matched through their canonical ranks, chirality ignored.
pub fn index_mapping(original: &MoleculeGraph, flat: &MoleculeGraph) -> Result<Vec<usize>> {
    if original.node_count() != flat.node_count() {
        return Err(SignatureError::InvalidInput(format!(
            "flattened molecule has {} atoms, original has {}",
            flat.node_count(),
            original.node_count()
        ))
        .into());
    }
    let original_ranks = rank_atoms(original);
    let mut by_rank = vec![0; original_ranks.len()];
    for (idx, rank) in original_ranks.iter().enumerate() {
        by_rank[*rank] = idx;
    }
    Ok(rank_atoms(flat).into_iter().map(|rank| by_rank[rank]).collect())
}
