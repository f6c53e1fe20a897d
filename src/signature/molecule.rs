//! Molecule signatures: the sorted atom signatures of a molecule, written as
//! one string joined by ` .. `.

use crate::{
    flat_copy, index_mapping, morgan_atom_bits, parse_smiles, AtomSignature, MoleculeGraph, Neighbor, Radius,
    SignatureError, SignatureOptions,
};
use anyhow::{Context, Result};
use petgraph::graph::NodeIndex;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use tracing::*;

const ATOM_SEP: &str = " .. ";

/// The sorted multiset of atom signatures of a molecule.
#[derive(Debug, Clone, Default)]
pub struct MoleculeSignature {
    atoms: Vec<AtomSignature>,
}

impl MoleculeSignature {
    /// Computes the signature of every atom of `mol`.
    ///
    /// Morgan bits are taken on `mol` as given; the atom signatures on a
    /// stereo-free copy whose atoms are mapped back to `mol` to pick up their
    /// bits. Atoms with an empty signature are left out.
    ///
    /// # Arguments
    ///
    /// * `mol` - The molecule, left untouched
    /// * `options` - Radius, Morgan size and rendering flags
    ///
    /// # Returns
    ///
    /// The sorted signature, or [`SignatureError::EmptySignature`] when no atom
    /// produced one.
    #[instrument(skip_all, fields(atoms = mol.node_count(), radius = %options.radius))]
    pub fn new(mol: &MoleculeGraph, options: &SignatureOptions) -> Result<Self> {
        let n = mol.node_count();
        if n == 0 {
            return Err(SignatureError::EmptySignature.into());
        }
        let bits: Vec<Option<Vec<u32>>> = if options.nbits > 0 {
            morgan_atom_bits(mol, options.radius.resolve(n), options.nbits, options.use_stereo)
                .into_iter()
                .map(Some)
                .collect()
        } else {
            vec![None; n]
        };

        let flat = flat_copy(mol)?;
        let mapping = index_mapping(mol, &flat)?;
        let bits: Vec<Option<Vec<u32>>> = mapping.iter().map(|original| bits[*original].clone()).collect();

        let compute = |idx: NodeIndex| AtomSignature::new(&flat, idx, bits[idx.index()].clone(), options);
        let indices: Vec<NodeIndex> = flat.node_indices().collect();
        #[cfg(feature = "parallel")]
        let computed: Vec<Result<AtomSignature>> = indices.into_par_iter().map(compute).collect();
        #[cfg(not(feature = "parallel"))]
        let computed: Vec<Result<AtomSignature>> = indices.into_iter().map(compute).collect();

        let mut atoms = Vec::with_capacity(computed.len());
        for signature in computed {
            let signature = signature?;
            if signature.is_empty() {
                debug!("Skipping empty atom signature");
            } else {
                atoms.push(signature);
            }
        }
        if atoms.is_empty() {
            return Err(SignatureError::EmptySignature.into());
        }
        atoms.sort();
        debug!("Computed {} atom signatures", atoms.len());
        Ok(Self { atoms })
    }

    /// Parses `smiles` and computes its signature.
    pub fn from_smiles(smiles: &str, options: &SignatureOptions) -> Result<Self> {
        let mol = parse_smiles(smiles)?;
        Self::new(&mol, options).context(format!("Failed to compute the signature of {smiles}"))
    }

    pub fn atoms(&self) -> &[AtomSignature] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn roots(&self) -> Vec<Option<&str>> {
        self.atoms.iter().map(AtomSignature::root).collect()
    }

    pub fn root_minus(&self) -> Vec<Option<&str>> {
        self.atoms.iter().map(AtomSignature::root_minus).collect()
    }

    pub fn neighbors(&self) -> Vec<&[Neighbor]> {
        self.atoms.iter().map(AtomSignature::neighbors).collect()
    }

    pub fn morgans(&self) -> Vec<Option<&[u32]>> {
        self.atoms.iter().map(AtomSignature::morgans).collect()
    }

    /// Decomposes every atom signature, see [`AtomSignature::decompose`].
    pub fn post_compute_neighbors(&mut self, radius: Radius) -> Result<()> {
        for (i, atom) in self.atoms.iter_mut().enumerate() {
            atom.decompose(radius)
                .context(format!("Failed to decompose atom signature {i}"))?;
        }
        Ok(())
    }

    pub fn to_list(&self, neighbors: bool, morgans: bool) -> Result<Vec<String>> {
        self.atoms
            .iter()
            .map(|atom| atom.to_string_with(neighbors, morgans))
            .collect()
    }

    pub fn to_string_with(&self, neighbors: bool, morgans: bool) -> Result<String> {
        Ok(self.to_list(neighbors, morgans)?.join(ATOM_SEP))
    }

    /// Reads atom signature strings; their order is kept as given.
    pub fn from_list<S: AsRef<str>>(signatures: &[S]) -> Result<Self> {
        let atoms = signatures
            .iter()
            .map(|signature| AtomSignature::from_string(signature.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { atoms })
    }

    pub fn from_string(signature: &str) -> Result<Self> {
        let parts: Vec<&str> = signature.split(ATOM_SEP).collect();
        Self::from_list(&parts)
    }

    /// Counts, for each of `nbits` Morgan bits, how many atom bits hit it.
    pub fn morgan_vector(&self, nbits: usize) -> Vec<u32> {
        let mut vector = vec![0; nbits];
        for bit in self.atoms.iter().filter_map(AtomSignature::morgans).flatten() {
            if let Some(count) = vector.get_mut(*bit as usize) {
                *count += 1;
            }
        }
        vector
    }
}

impl PartialEq for MoleculeSignature {
    fn eq(&self, other: &Self) -> bool {
        self.atoms == other.atoms && self.root_minus() == other.root_minus()
    }
}

impl Eq for MoleculeSignature {}

impl Display for MoleculeSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let atoms: Vec<String> = self.atoms.iter().map(AtomSignature::to_string).collect();
        write!(f, "{}", atoms.join(ATOM_SEP))
    }
}

impl FromStr for MoleculeSignature {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(radius: u32, nbits: usize) -> SignatureOptions {
        SignatureOptions {
            radius: Radius::Hops(radius),
            nbits,
            ..Default::default()
        }
    }

    #[test]
    fn test_ethanol() {
        let signature = MoleculeSignature::from_smiles("CCO", &options(0, 0)).expect("Failed to compute signature");
        assert_eq!(signature.len(), 3);
        assert_eq!(
            signature.to_string_with(false, false).expect("root view"),
            "[C;H2;h2;D2;X4:1] .. [C;H3;h3;D1;X4:1] .. [O;H1;h1;D1;X2:1]"
        );
        assert!(signature.morgans().iter().all(Option::is_none));
    }

    #[test]
    fn test_atom_order_does_not_matter() {
        let a = MoleculeSignature::from_smiles("OCC(=O)N", &options(2, 2048)).expect("Failed to compute signature");
        let b = MoleculeSignature::from_smiles("NC(=O)CO", &options(2, 2048)).expect("Failed to compute signature");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_morgan_bits_follow_atoms() {
        let signature = MoleculeSignature::from_smiles("CCO", &options(1, 2048)).expect("Failed to compute signature");
        assert!(signature.morgans().iter().all(|bits| bits.is_some_and(|bits| !bits.is_empty())));
        let vector = signature.morgan_vector(2048);
        let total: usize = signature.morgans().iter().flatten().map(|bits| bits.len()).sum();
        assert_eq!(vector.iter().map(|count| *count as usize).sum::<usize>(), total);
    }

    #[test]
    fn test_string_round_trip() {
        let signature = MoleculeSignature::from_smiles("c1ccccc1O", &options(1, 2048)).expect("Failed to compute signature");
        let text = signature.to_string();
        let parsed: MoleculeSignature = text.parse().expect("Failed to parse signature");
        assert_eq!(parsed, signature);
        assert_eq!(parsed.to_string(), text);
    }

    #[test]
    fn test_decomposition() {
        let mut signature = MoleculeSignature::from_smiles("CCO", &options(1, 0)).expect("Failed to compute signature");
        signature.post_compute_neighbors(Radius::Hops(1)).expect("Failed to decompose");
        let list = signature.to_list(true, false).expect("neighbor view");
        assert_eq!(list.len(), 3);
        assert!(list.iter().all(|entry| entry.contains(" && SINGLE <> ")));

        let parsed = MoleculeSignature::from_list(&list).expect("Failed to parse list");
        assert_eq!(parsed.root_minus(), signature.root_minus());
        assert_eq!(parsed.neighbors(), signature.neighbors());
    }

    #[test]
    fn test_empty_molecule() {
        let err = MoleculeSignature::new(&MoleculeGraph::default(), &options(2, 0)).expect_err("no atoms");
        assert_eq!(err.downcast_ref::<SignatureError>(), Some(&SignatureError::EmptySignature));
    }

    #[test]
    fn test_malformed_string() {
        assert!(MoleculeSignature::from_string("1-2 ## 3 ## [C]").is_err());
    }
}
