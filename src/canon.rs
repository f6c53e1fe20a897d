//! Canonical atom ranking.
//!
//! Atoms start from the order of their labels, get refined Morgan-style by
//! the ranks of their neighbours, and remaining ties are broken by promoting
//! each tied candidate in turn and keeping the promotion whose ranked graph
//! reads smallest.

use crate::{Atom, Bond, MoleculeGraph};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::*;

/// Bond property distinguishing neighbours while ranking.
pub trait BondInvariant {
    fn invariant(&self) -> u8;
}

impl BondInvariant for Bond {
    fn invariant(&self) -> u8 {
        self.order as u8
    }
}

type Trace = Vec<(usize, Vec<(usize, u8)>)>;

/// Dense ranks following the order of `keys`.
fn ranks_from_keys<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|a, b| keys[*a].cmp(&keys[*b]));
    let mut ranks = vec![0; keys.len()];
    let mut rank = 0;
    for window in 0..order.len() {
        if window > 0 && keys[order[window]] != keys[order[window - 1]] {
            rank += 1;
        }
        ranks[order[window]] = rank;
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

fn neighborhood<N, E: BondInvariant>(graph: &UnGraph<N, E>, atom: NodeIndex, ranks: &[usize]) -> Vec<(usize, u8)> {
    let mut neighbors: Vec<(usize, u8)> = graph
        .edges(atom)
        .map(|edge| {
            let other = if edge.source() == atom { edge.target() } else { edge.source() };
            (ranks[other.index()], edge.weight().invariant())
        })
        .collect();
    neighbors.sort_unstable();
    neighbors
}

/// Splits rank classes by neighbour ranks until nothing changes.
fn refine<N, E: BondInvariant>(graph: &UnGraph<N, E>, ranks: &mut Vec<usize>) {
    let mut distinct = count_distinct(ranks);
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = graph
            .node_indices()
            .map(|atom| (ranks[atom.index()], neighborhood(graph, atom, ranks)))
            .collect();
        let refined = ranks_from_keys(&keys);
        let refined_distinct = count_distinct(&refined);
        *ranks = refined;
        if refined_distinct == distinct {
            return;
        }
        distinct = refined_distinct;
    }
}

/// The ranked graph read atom by atom: label rank, then sorted neighbours.
fn read_ranked<N, E: BondInvariant>(graph: &UnGraph<N, E>, labels: &[usize], ranks: &[usize]) -> Trace {
    let mut atoms: Vec<NodeIndex> = graph.node_indices().collect();
    atoms.sort_by_key(|atom| ranks[atom.index()]);
    atoms
        .into_iter()
        .map(|atom| (labels[atom.index()], neighborhood(graph, atom, ranks)))
        .collect()
}

fn break_ties<N, E: BondInvariant>(graph: &UnGraph<N, E>, labels: &[usize], ranks: &mut Vec<usize>) {
    let n = ranks.len();
    while count_distinct(ranks) < n {
        let mut class_sizes = vec![0usize; n];
        for rank in ranks.iter() {
            class_sizes[*rank] += 1;
        }
        let Some(tied) = (0..n).find(|rank| class_sizes[*rank] > 1) else {
            return;
        };

        let mut best: Option<(Trace, Vec<usize>)> = None;
        for candidate in (0..n).filter(|atom| ranks[*atom] == tied) {
            let mut trial: Vec<usize> = ranks
                .iter()
                .enumerate()
                .map(|(atom, rank)| 2 * rank + usize::from(*rank == tied && atom != candidate))
                .collect();
            refine(graph, &mut trial);
            let candidate_trace = read_ranked(graph, labels, &trial);
            if best.as_ref().map_or(true, |(best_trace, _)| candidate_trace < *best_trace) {
                best = Some((candidate_trace, trial));
            }
        }
        if let Some((_, promoted)) = best {
            *ranks = promoted;
        }
    }
}

/// Canonical ranks of all atoms of a labeled graph, indexed by node index.
///
/// Ranks are distinct and depend only on labels, bond invariants and
/// connectivity, never on the input atom order.
pub fn canonical_ranks<N: Ord, E: BondInvariant>(graph: &UnGraph<N, E>) -> Vec<usize> {
    let labels: Vec<&N> = graph.node_weights().collect();
    let labels = ranks_from_keys(&labels);
    let mut ranks = labels.clone();
    refine(graph, &mut ranks);
    if count_distinct(&ranks) < ranks.len() {
        trace!("Breaking ties among {} atoms", ranks.len());
        break_ties(graph, &labels, &mut ranks);
    }
    ranks
}

/// Atom properties that survive a write-and-read cycle without stereo.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct AtomInvariant {
    atomic_number: u8,
    isotope: u16,
    aromatic: bool,
    total_hydrogens: u8,
    charge: i8,
    degree: usize,
}

fn atom_invariant(graph: &MoleculeGraph, idx: NodeIndex, atom: &Atom) -> AtomInvariant {
    AtomInvariant {
        atomic_number: atom.element.atomic_number(),
        isotope: atom.isotope,
        aromatic: atom.aromatic,
        total_hydrogens: atom.total_hydrogens(),
        charge: atom.charge,
        degree: graph.neighbors(idx).count(),
    }
}

/// Canonical ranks of the atoms of a molecule, ignoring stereo and the
/// implicit/explicit split of hydrogen counts.
pub fn rank_atoms(graph: &MoleculeGraph) -> Vec<usize> {
    let invariants = graph.map(|idx, atom| atom_invariant(graph, idx, atom), |_, bond| *bond);
    canonical_ranks(&invariants)
}
