//! Atom signatures: the canonical text of an atom's bounded environment.

use crate::{
    atom_token, atoms_within, bond_token, bond_type_name, boundary_bonds, canonical_ranks, find_mapped_atom,
    fragment_containing, induced_subgraph, kekulize, parse_pattern, write_line, Bond, BondDirection, BondOrder,
    FeatureSet, Fragment, LabeledBond, MoleculeGraph, PatternGraph, Radius, RenderOptions, SignatureError,
    SignatureOptions,
};
use anyhow::{Context, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use tracing::*;

const BIT_SEP: &str = "-";
const MORGAN_SEP: &str = " ## ";
const NEIGHBOR_SEP: &str = " && ";
const BOND_SEP: &str = " <> ";

/// A bonded neighbour as seen from an atom: the bond type name and the
/// neighbour's own signature.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Neighbor {
    pub bond: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Only the environment at full radius is known.
    Root(String),
    /// The environment split into the atom at one radius less plus its
    /// neighbours. `root` is absent when read back from a neighbour-mode string.
    Decomposed {
        root: Option<String>,
        root_minus: String,
        neighbors: Vec<Neighbor>,
    },
}

/// Signature of one atom.
///
/// Equality and ordering look at the Morgan bits, the root and the neighbours;
/// `root_minus` is carried along but not compared.
#[derive(Debug, Clone)]
pub struct AtomSignature {
    morgans: Option<Vec<u32>>,
    state: SignatureState,
}

/// Text of a bond inside an atom signature.
fn signature_bond_text(bond: &Bond, kekule: Option<BondOrder>, both_aromatic: bool, render: &RenderOptions) -> &'static str {
    let shown = Bond {
        order: kekule.unwrap_or(bond.order),
        direction: bond.direction,
    };
    if render.all_bonds_explicit {
        return bond_token(&shown, render.isomeric_smiles);
    }
    let directed = render.isomeric_smiles && shown.direction != BondDirection::None;
    match shown.order {
        BondOrder::Single if directed => bond_token(&shown, true),
        BondOrder::Single if both_aromatic => "-",
        BondOrder::Single => "",
        BondOrder::Aromatic if both_aromatic && !directed => "",
        _ => bond_token(&shown, render.isomeric_smiles),
    }
}

/// Bond text once one end is replaced by a dummy atom, which is never aromatic.
fn dummy_bond(bond: &LabeledBond) -> LabeledBond {
    let text = if bond.text.is_empty() && bond.bond.order == BondOrder::Aromatic {
        ":"
    } else {
        bond.text
    };
    LabeledBond { bond: bond.bond, text }
}

/// Computes the signature string of `atom` at `radius`.
///
/// Only atoms up to one layer past `radius` are labeled, each by its token
/// taken on the whole graph, with map number 1 on `atom` when `map_root` is
/// set. The bonds of that outer layer are cut (leaving dummy atoms with
/// `boundary_bonds`), and the piece holding `atom` is written in canonical
/// order.
pub fn atom_signature<A: FeatureSet + Clone>(
    graph: &UnGraph<A, Bond>,
    atom: NodeIndex,
    radius: Radius,
    options: &SignatureOptions,
) -> Result<String> {
    if atom.index() >= graph.node_count() {
        return Err(SignatureError::InvalidInput(format!(
            "atom {} out of range for {} atoms",
            atom.index(),
            graph.node_count()
        ))
        .into());
    }
    let radius = radius.resolve(graph.node_count());
    let render = &options.render;

    let atoms = atoms_within(graph, atom, radius.saturating_add(1));
    let features: HashMap<NodeIndex, _> = atoms.iter().map(|idx| (*idx, A::features(graph, *idx))).collect();
    let aromatic = |idx: NodeIndex| features.get(&idx).is_some_and(|features| features.aromatic);
    // Ring assignments reach past the environment, so they come from the whole graph.
    let kekule = if render.kekule_smiles { kekulize(graph) } else { None };
    let local: Fragment<String, LabeledBond> = induced_subgraph(
        graph,
        &atoms,
        |idx, _| {
            let map = u32::from(idx == atom && options.map_root);
            features.get(&idx).map(|features| atom_token(features, map)).unwrap_or_default()
        },
        |edge, bond| {
            let both_aromatic = graph
                .edge_endpoints(edge)
                .is_some_and(|(a, b)| aromatic(a) && aromatic(b));
            let order = kekule.as_ref().and_then(|orders| orders.get(&edge).copied());
            LabeledBond {
                bond: *bond,
                text: signature_bond_text(bond, order, both_aromatic, render),
            }
        },
    );
    let center = local.index_of(atom).ok_or(SignatureError::EmptyFragment(atom.index()))?;

    let cut = boundary_bonds(&local.graph, center, radius);
    let dummy: &dyn Fn(NodeIndex, &LabeledBond) -> (String, LabeledBond) = &|_, bond| ("*".to_string(), dummy_bond(bond));
    let fragment = fragment_containing(&local.graph, center, &cut, options.boundary_bonds.then_some(dummy))
        .ok_or(SignatureError::EmptyFragment(atom.index()))?;
    let root = fragment
        .index_of(center)
        .ok_or(SignatureError::EmptyFragment(atom.index()))?;

    let ranks = canonical_ranks(&fragment.graph);
    let signature = write_line(&fragment.graph, &ranks, options.rooted.then_some(root));
    trace!("Atom {} at radius {radius}: {signature}", atom.index());
    Ok(signature)
}

/// Signatures of the neighbours of `atom` at `radius`, paired with the bond
/// type names and sorted.
pub fn neighbor_signatures<A: FeatureSet + Clone>(
    graph: &UnGraph<A, Bond>,
    atom: NodeIndex,
    radius: Radius,
    options: &SignatureOptions,
) -> Result<Vec<Neighbor>> {
    let mut neighbors = Vec::new();
    for edge in graph.edges(atom) {
        let other = if edge.source() == atom { edge.target() } else { edge.source() };
        let signature = atom_signature(graph, other, radius, options)?;
        if signature.is_empty() {
            return Err(SignatureError::EmptyNeighborSignature(other.index()).into());
        }
        neighbors.push(Neighbor {
            bond: bond_type_name(edge.weight()).to_string(),
            signature,
        });
    }
    neighbors.sort();
    Ok(neighbors)
}

fn parse_bits(bits: &str) -> Result<Vec<u32>, SignatureError> {
    bits.split(BIT_SEP)
        .map(|bit| {
            bit.parse::<u32>()
                .map_err(|_| SignatureError::MalformedSignatureString(format!("invalid Morgan bit '{bit}'")))
        })
        .collect()
}

fn parse_neighbor(entry: &str) -> Result<Neighbor, SignatureError> {
    let (bond, signature) = entry
        .split_once(BOND_SEP)
        .ok_or_else(|| SignatureError::MalformedSignatureString(format!("neighbor entry without bond: '{entry}'")))?;
    Ok(Neighbor {
        bond: bond.to_string(),
        signature: signature.to_string(),
    })
}

impl AtomSignature {
    /// Computes the signature of `atom` within `mol` at `options.radius`.
    pub fn new(mol: &MoleculeGraph, atom: NodeIndex, morgans: Option<Vec<u32>>, options: &SignatureOptions) -> Result<Self> {
        let root = atom_signature(mol, atom, options.radius, options)
            .context(format!("Failed to compute the signature of atom {}", atom.index()))?;
        Ok(Self {
            morgans,
            state: SignatureState::Root(root),
        })
    }

    pub fn morgans(&self) -> Option<&[u32]> {
        self.morgans.as_deref()
    }

    pub fn root(&self) -> Option<&str> {
        match &self.state {
            SignatureState::Root(root) => Some(root),
            SignatureState::Decomposed { root, .. } => root.as_deref(),
        }
    }

    pub fn root_minus(&self) -> Option<&str> {
        match &self.state {
            SignatureState::Root(_) => None,
            SignatureState::Decomposed { root_minus, .. } => Some(root_minus),
        }
    }

    /// Neighbour entries; empty until decomposed.
    pub fn neighbors(&self) -> &[Neighbor] {
        match &self.state {
            SignatureState::Root(_) => &[],
            SignatureState::Decomposed { neighbors, .. } => neighbors,
        }
    }

    pub fn state(&self) -> &SignatureState {
        &self.state
    }

    /// Whether the signature carries no environment text at all.
    pub fn is_empty(&self) -> bool {
        self.root().map_or(true, str::is_empty) && self.root_minus().map_or(true, str::is_empty)
    }

    fn render(&self, neighbors: bool, morgans: bool) -> Option<String> {
        let mut out = String::new();
        if let (true, Some(bits)) = (morgans, &self.morgans) {
            let bits: Vec<String> = bits.iter().map(u32::to_string).collect();
            out.push_str(&bits.join(BIT_SEP));
            out.push_str(MORGAN_SEP);
        }
        if neighbors {
            out.push_str(self.root_minus()?);
            out.push_str(NEIGHBOR_SEP);
            let entries: Vec<String> = self
                .neighbors()
                .iter()
                .map(|neighbor| format!("{}{BOND_SEP}{}", neighbor.bond, neighbor.signature))
                .collect();
            out.push_str(&entries.join(NEIGHBOR_SEP));
        } else {
            out.push_str(self.root()?);
        }
        Some(out)
    }

    /// Writes the signature, either as its root or as `root_minus` followed by
    /// the neighbour entries, optionally prefixed with the Morgan bits.
    pub fn to_string_with(&self, neighbors: bool, morgans: bool) -> Result<String> {
        match self.render(neighbors, morgans) {
            Some(text) => Ok(text),
            None if neighbors => Err(SignatureError::MissingView("neighbors").into()),
            None => Err(SignatureError::MissingView("root").into()),
        }
    }

    /// Reads a signature written by [`AtomSignature::to_string_with`].
    pub fn from_string(signature: &str) -> Result<Self> {
        if signature.is_empty() {
            return Err(SignatureError::MalformedSignatureString("empty signature".to_string()).into());
        }
        let parts: Vec<&str> = signature.split(MORGAN_SEP).collect();
        let (morgans, rest) = match parts.as_slice() {
            [rest] => (None, *rest),
            [bits, rest] => (Some(parse_bits(bits)?), *rest),
            _ => {
                return Err(SignatureError::MalformedSignatureString(format!(
                    "more than one '{}' in '{signature}'",
                    MORGAN_SEP.trim()
                ))
                .into())
            }
        };

        let state = match rest.split_once(NEIGHBOR_SEP) {
            Some((root_minus, entries)) => {
                let neighbors = if entries.is_empty() {
                    Vec::new()
                } else {
                    entries.split(NEIGHBOR_SEP).map(parse_neighbor).collect::<Result<_, _>>()?
                };
                SignatureState::Decomposed {
                    root: None,
                    root_minus: root_minus.to_string(),
                    neighbors,
                }
            }
            None => SignatureState::Root(rest.to_string()),
        };
        Ok(Self { morgans, state })
    }

    /// The root read back as a pattern graph.
    pub fn to_mol(&self) -> Result<PatternGraph> {
        let root = self.root().ok_or(SignatureError::MissingView("root"))?;
        parse_pattern(root)
    }

    /// Splits the root into the mapped atom at one radius less and the
    /// signatures of its neighbours, computed on the root pattern itself.
    pub fn decompose(&mut self, radius: Radius) -> Result<()> {
        let pattern = self.to_mol()?;
        let center = find_mapped_atom(&pattern, 1)?;
        let lower = radius.minus_one();
        let defaults = SignatureOptions::default();
        let root_minus = atom_signature(&pattern, center, lower, &defaults)?;
        let neighbors = neighbor_signatures(&pattern, center, lower, &defaults)?;
        self.state = SignatureState::Decomposed {
            root: self.root().map(str::to_string),
            root_minus,
            neighbors,
        };
        Ok(())
    }

    /// Same as [`AtomSignature::decompose`].
    pub fn post_compute_neighbors(&mut self, radius: Radius) -> Result<()> {
        self.decompose(radius)
    }
}

impl PartialEq for AtomSignature {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AtomSignature {}

impl PartialOrd for AtomSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AtomSignature {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.morgans, self.root(), self.neighbors()).cmp(&(&other.morgans, other.root(), other.neighbors()))
    }
}

impl Display for AtomSignature {
    /// Root form with Morgan bits, or the neighbour form when there is no root.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let text = self.render(self.root().is_none(), true).unwrap_or_default();
        write!(f, "{text}")
    }
}

impl FromStr for AtomSignature {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}
