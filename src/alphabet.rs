//! Alphabets of atom signatures and occurrence vectors over them.

use crate::{AtomSignature, MoleculeSignature, Radius, RenderOptions, SignatureOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::*;

const ATOM_SEP: &str = " .. ";

/// A sorted, indexed set of neighbour-mode atom signatures, with the
/// parameters they were computed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureAlphabet {
    pub radius: Radius,
    pub nbits: usize,
    pub use_stereo: bool,
    pub boundary_bonds: bool,
    pub map_root: bool,
    pub rooted: bool,
    pub render: RenderOptions,
    /// Atom signature to its index; indices follow the key order.
    pub entries: BTreeMap<String, usize>,
}

impl Default for SignatureAlphabet {
    fn default() -> Self {
        let options = SignatureOptions::default();
        Self {
            radius: options.radius,
            nbits: 0,
            use_stereo: options.use_stereo,
            boundary_bonds: options.boundary_bonds,
            map_root: options.map_root,
            rooted: options.rooted,
            render: options.render,
            entries: BTreeMap::new(),
        }
    }
}

impl SignatureAlphabet {
    pub fn new(radius: Radius, nbits: usize) -> Self {
        Self {
            radius,
            nbits,
            ..Default::default()
        }
    }

    /// An empty alphabet whose signatures are computed with `options`.
    pub fn with_options(options: &SignatureOptions) -> Self {
        Self {
            radius: options.radius,
            nbits: options.nbits,
            use_stereo: options.use_stereo,
            boundary_bonds: options.boundary_bonds,
            map_root: options.map_root,
            rooted: options.rooted,
            render: options.render,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Options the alphabet's signatures are computed with.
    pub fn options(&self) -> SignatureOptions {
        SignatureOptions {
            radius: self.radius,
            nbits: self.nbits,
            use_stereo: self.use_stereo,
            boundary_bonds: self.boundary_bonds,
            map_root: self.map_root,
            rooted: self.rooted,
            render: self.render,
        }
    }

    /// Neighbour-mode atom signatures of `smiles`, Morgan bits included when
    /// the alphabet has a bit size.
    pub fn atom_signatures(&self, smiles: &str) -> Result<Vec<String>> {
        let mut signature = MoleculeSignature::from_smiles(smiles, &self.options())?;
        signature.post_compute_neighbors(self.radius)?;
        signature.to_list(true, self.nbits > 0)
    }

    fn reindex(&mut self, signatures: BTreeSet<String>) {
        self.entries = signatures.into_iter().enumerate().map(|(i, s)| (s, i)).collect();
    }

    /// Adds the atom signatures of every molecule in `smiles`.
    ///
    /// Molecules with wildcard atoms are skipped, and molecules that fail
    /// are logged and skipped.
    #[instrument(skip_all, fields(alphabet = self.entries.len()))]
    pub fn fill<'a>(&mut self, smiles: impl IntoIterator<Item = &'a str>) {
        let mut signatures: BTreeSet<String> = std::mem::take(&mut self.entries).into_keys().collect();
        for (i, smi) in smiles.into_iter().enumerate() {
            if i % 1000 == 0 {
                debug!("Processing alphabet iteration {i}, size {}", signatures.len());
            }
            if smi.contains('*') {
                continue;
            }
            match self.atom_signatures(smi) {
                Ok(atoms) => signatures.extend(atoms),
                Err(err) => warn!("No signature for molecule {i} {smi}: {err:#}"),
            }
        }
        self.reindex(signatures);
    }

    /// Adds the atom signatures of already computed molecule signatures.
    pub fn fill_from_signatures<'a>(&mut self, signatures: impl IntoIterator<Item = &'a str>) {
        let mut known: BTreeSet<String> = std::mem::take(&mut self.entries).into_keys().collect();
        for signature in signatures {
            known.extend(signature.split(ATOM_SEP).filter(|atom| !atom.is_empty()).map(str::to_string));
        }
        self.reindex(known);
    }

    /// Occurrence count of each alphabet entry in a molecule signature.
    ///
    /// Atom signatures missing from the alphabet are logged and skipped.
    pub fn to_vector(&self, signature: &str) -> Vec<u32> {
        let mut vector = vec![0; self.entries.len()];
        for atom in signature.split(ATOM_SEP) {
            match self.entries.get(atom).and_then(|index| vector.get_mut(*index)) {
                Some(count) => *count += 1,
                None => warn!("Atom signature not found in alphabet: {atom}"),
            }
        }
        vector
    }

    /// The molecule signature an occurrence vector stands for.
    pub fn vector_to_string(&self, vector: &[u32]) -> String {
        let mut atoms = Vec::new();
        for (signature, index) in &self.entries {
            let count = vector.get(*index).copied().unwrap_or(0);
            atoms.extend(std::iter::repeat(signature.as_str()).take(count as usize));
        }
        atoms.join(ATOM_SEP)
    }

    /// Entries whose Morgan bits contain `bit`.
    pub fn signatures_with_morgan_bit(&self, bit: u32) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|signature| {
                AtomSignature::from_string(signature)
                    .ok()
                    .and_then(|atom| atom.morgans().map(|bits| bits.contains(&bit)))
                    .unwrap_or(false)
            })
            .map(String::as_str)
            .collect()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .context(format!("Failed to write alphabet to {}", path.display()))?;
        info!("Saved alphabet of {} signatures to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open {}", path.display()))?;
        let mut alphabet: Self = serde_json::from_reader(BufReader::new(file))
            .context(format!("Failed to read alphabet from {}", path.display()))?;
        if !alphabet.entries.values().copied().eq(0..alphabet.entries.len()) {
            warn!("Alphabet indices in {} do not follow the key order, reindexing", path.display());
            let signatures = std::mem::take(&mut alphabet.entries).into_keys().collect();
            alphabet.reindex(signatures);
        }
        Ok(alphabet)
    }
}

impl Display for SignatureAlphabet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "radius: {}", self.radius)?;
        writeln!(f, "nbits: {}", self.nbits)?;
        writeln!(f, "use_stereo: {}", self.use_stereo)?;
        writeln!(f, "boundary_bonds: {}", self.boundary_bonds)?;
        writeln!(f, "map_root: {}", self.map_root)?;
        writeln!(f, "rooted: {}", self.rooted)?;
        writeln!(f, "isomericSmiles: {}", self.render.isomeric_smiles)?;
        writeln!(f, "allBondsExplicit: {}", self.render.all_bonds_explicit)?;
        writeln!(f, "allHsExplicit: {}", self.render.all_hs_explicit)?;
        writeln!(f, "kekuleSmiles: {}", self.render.kekule_smiles)?;
        write!(f, "alphabet length: {}", self.entries.len())
    }
}
