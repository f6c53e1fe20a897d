//! Canonical line-notation writer.
//!
//! [`write_line`] renders any labeled graph given canonical ranks; [`to_smiles`]
//! builds the labels of a plain molecule and hands it over.

use crate::{
    bond_token, bond_valence_sum, implicit_hydrogens_for, kekulize, rank_atoms, Atom, Bond, BondDirection,
    BondInvariant, BondOrder, MoleculeGraph,
};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Rendering flags of the line-notation writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Include isotopes and bond directions.
    pub isomeric_smiles: bool,
    /// Write bond symbols even where a reader would infer them.
    pub all_bonds_explicit: bool,
    /// Write every atom in brackets with its hydrogen count.
    pub all_hs_explicit: bool,
    /// Write aromatic bonds in alternating single/double form.
    pub kekule_smiles: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            isomeric_smiles: true,
            all_bonds_explicit: true,
            all_hs_explicit: false,
            kekule_smiles: false,
        }
    }
}

/// A bond with the text it is written as, read from its source to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledBond {
    pub bond: Bond,
    pub text: &'static str,
}

impl BondInvariant for LabeledBond {
    fn invariant(&self) -> u8 {
        self.bond.invariant()
    }
}

/// A graph whose atoms are already rendered to their final text.
pub type LabeledGraph = UnGraph<String, LabeledBond>;

/// Bond text when read from target to source.
fn reversed_text(text: &'static str) -> &'static str {
    match text {
        "/" => "\\",
        "\\" => "/",
        ":/" => ":\\",
        ":\\" => ":/",
        other => other,
    }
}

fn ring_digit(digit: usize) -> String {
    if digit < 10 {
        digit.to_string()
    } else {
        format!("%{digit:02}")
    }
}

/// Spanning forest and ring closures of a DFS visiting neighbours in rank order.
#[derive(Default)]
struct Traversal {
    visited: Vec<bool>,
    children: HashMap<NodeIndex, Vec<(NodeIndex, EdgeIndex)>>,
    /// Ring bonds opened at an atom, keyed by the opening atom.
    openings: HashMap<NodeIndex, Vec<EdgeIndex>>,
    /// Ring bonds closed at an atom, keyed by the closing atom.
    closings: HashMap<NodeIndex, Vec<EdgeIndex>>,
    tree_edges: HashSet<EdgeIndex>,
    ring_edges: HashSet<EdgeIndex>,
}

impl Traversal {
    fn sorted_neighbors(graph: &LabeledGraph, ranks: &[usize], atom: NodeIndex) -> Vec<(NodeIndex, EdgeIndex)> {
        let mut neighbors: Vec<(NodeIndex, EdgeIndex)> = graph
            .edges(atom)
            .map(|edge| {
                let other = if edge.source() == atom { edge.target() } else { edge.source() };
                (other, edge.id())
            })
            .collect();
        neighbors.sort_by_key(|(other, _)| ranks[other.index()]);
        neighbors
    }

    /// Depth-first walk from `start`; each frame holds an atom, its sorted
    /// neighbours and how many of them were handled.
    fn visit(&mut self, graph: &LabeledGraph, ranks: &[usize], start: NodeIndex) {
        self.visited[start.index()] = true;
        let mut stack = vec![(start, Self::sorted_neighbors(graph, ranks, start), 0)];
        while let Some((atom, neighbors, next)) = stack.last_mut() {
            let atom = *atom;
            let Some(&(other, edge)) = neighbors.get(*next) else {
                stack.pop();
                continue;
            };
            *next += 1;
            if self.tree_edges.contains(&edge) {
                continue;
            }
            if !self.visited[other.index()] {
                self.visited[other.index()] = true;
                self.tree_edges.insert(edge);
                self.children.entry(atom).or_default().push((other, edge));
                stack.push((other, Self::sorted_neighbors(graph, ranks, other), 0));
            } else if self.ring_edges.insert(edge) {
                // Seen first from the descendant: `other` is an ancestor still being written.
                self.openings.entry(other).or_default().push(edge);
                self.closings.entry(atom).or_default().push(edge);
            }
        }
    }
}

/// Pending output of the writer.
enum Step {
    Atom(NodeIndex),
    Text(&'static str),
    Char(char),
}

struct Emitter<'a> {
    graph: &'a LabeledGraph,
    traversal: &'a Traversal,
    ranks: &'a [usize],
    digits: HashMap<EdgeIndex, usize>,
    in_use: BTreeSet<usize>,
    out: String,
}

impl Emitter<'_> {
    /// Text of `edge` when walked away from `from`.
    fn bond_text(&self, edge: EdgeIndex, from: NodeIndex) -> &'static str {
        let Some((source, _)) = self.graph.edge_endpoints(edge) else {
            return "";
        };
        let text = self.graph[edge].text;
        if source == from {
            text
        } else {
            reversed_text(text)
        }
    }

    /// Writes an atom with its ring digits.
    fn emit_atom(&mut self, atom: NodeIndex) {
        self.out.push_str(&self.graph[atom]);

        let mut closing: Vec<EdgeIndex> = self.traversal.closings.get(&atom).cloned().unwrap_or_default();
        closing.sort_by_key(|edge| self.digits.get(edge).copied().unwrap_or(usize::MAX));
        for edge in &closing {
            let text = self.bond_text(*edge, atom);
            self.out.push_str(text);
            if let Some(digit) = self.digits.get(edge) {
                self.out.push_str(&ring_digit(*digit));
            }
        }

        let mut opening: Vec<EdgeIndex> = self.traversal.openings.get(&atom).cloned().unwrap_or_default();
        opening.sort_by_key(|edge| {
            self.graph
                .edge_endpoints(*edge)
                .map(|(a, b)| if a == atom { self.ranks[b.index()] } else { self.ranks[a.index()] })
                .unwrap_or(usize::MAX)
        });
        for edge in opening {
            // A digit closing here cannot be reopened on the same atom.
            let digit = (1..)
                .find(|digit| !self.in_use.contains(digit) && !closing.iter().any(|e| self.digits.get(e) == Some(digit)))
                .unwrap_or(1);
            self.in_use.insert(digit);
            self.digits.insert(edge, digit);
            self.out.push_str(&ring_digit(digit));
        }
        for edge in &closing {
            if let Some(digit) = self.digits.get(edge) {
                self.in_use.remove(digit);
            }
        }
    }

    /// Writes the tree below `start`: every child but the last goes in a
    /// branch, the last one continues the line.
    fn emit(&mut self, start: NodeIndex) {
        let mut pending = vec![Step::Atom(start)];
        while let Some(step) = pending.pop() {
            let atom = match step {
                Step::Atom(atom) => atom,
                Step::Text(text) => {
                    self.out.push_str(text);
                    continue;
                }
                Step::Char(c) => {
                    self.out.push(c);
                    continue;
                }
            };
            self.emit_atom(atom);

            let children = self.traversal.children.get(&atom).map(Vec::as_slice).unwrap_or_default();
            let last = children.len().saturating_sub(1);
            for (i, (child, edge)) in children.iter().enumerate().rev() {
                let text = self.bond_text(*edge, atom);
                if i < last {
                    pending.extend([Step::Char(')'), Step::Atom(*child), Step::Text(text), Step::Char('(')]);
                } else {
                    pending.extend([Step::Atom(*child), Step::Text(text)]);
                }
            }
        }
    }
}

/// Writes a labeled graph in canonical line notation.
///
/// Each component starts at its lowest-ranked atom, except the component of
/// `root`, which starts at `root` and is written first. Neighbours are visited
/// in rank order; components are joined with `.`.
pub fn write_line(graph: &LabeledGraph, ranks: &[usize], root: Option<NodeIndex>) -> String {
    let mut traversal = Traversal {
        visited: vec![false; graph.node_count()],
        ..Default::default()
    };
    let mut starts = Vec::new();
    let mut by_rank: Vec<NodeIndex> = graph.node_indices().collect();
    by_rank.sort_by_key(|atom| ranks[atom.index()]);
    for atom in root.into_iter().chain(by_rank) {
        if atom.index() < graph.node_count() && !traversal.visited[atom.index()] {
            traversal.visit(graph, ranks, atom);
            starts.push(atom);
        }
    }

    let mut emitter = Emitter {
        graph,
        traversal: &traversal,
        ranks,
        digits: HashMap::new(),
        in_use: BTreeSet::new(),
        out: String::new(),
    };
    for (i, start) in starts.into_iter().enumerate() {
        if i > 0 {
            emitter.out.push('.');
        }
        emitter.emit(start);
    }
    emitter.out
}

/// Text of a bond for plain SMILES, read from `source` to `target`.
fn smiles_bond_text(bond: &Bond, source: &Atom, target: &Atom, options: &RenderOptions) -> &'static str {
    let both_aromatic = source.aromatic && target.aromatic;
    let directed = options.isomeric_smiles && bond.direction != BondDirection::None;
    match bond.order {
        BondOrder::Single if directed => bond_token(bond, true),
        BondOrder::Single if both_aromatic || options.all_bonds_explicit => "-",
        BondOrder::Single => "",
        BondOrder::Aromatic if both_aromatic && !options.all_bonds_explicit => "",
        _ => bond_token(bond, options.isomeric_smiles),
    }
}

/// Whether a reader would recover `atom` from its bare symbol.
fn writes_bare(graph: &MoleculeGraph, idx: NodeIndex, options: &RenderOptions) -> bool {
    let atom = &graph[idx];
    if options.all_hs_explicit || atom.charge != 0 || atom.map != 0 || (options.isomeric_smiles && atom.isotope != 0) {
        return false;
    }
    if atom.element.is_dummy() {
        return atom.total_hydrogens() == 0;
    }
    if !atom.element.is_organic_subset() || (atom.aromatic && !atom.element.can_be_aromatic()) {
        return false;
    }
    let valence = bond_valence_sum(graph, idx);
    implicit_hydrogens_for(atom.element, atom.aromatic, valence) == atom.total_hydrogens()
}

fn smiles_atom_text(graph: &MoleculeGraph, idx: NodeIndex, options: &RenderOptions) -> String {
    let atom = &graph[idx];
    let symbol = if atom.element.is_dummy() {
        "*".to_string()
    } else if atom.aromatic {
        atom.element.symbol().to_lowercase()
    } else {
        atom.element.symbol().to_string()
    };
    if writes_bare(graph, idx, options) {
        return symbol;
    }

    let mut text = String::from("[");
    if options.isomeric_smiles && atom.isotope != 0 {
        text.push_str(&atom.isotope.to_string());
    }
    text.push_str(&symbol);
    match atom.total_hydrogens() {
        0 => {}
        1 => text.push('H'),
        n => text.push_str(&format!("H{n}")),
    }
    match atom.charge {
        0 => {}
        1 => text.push('+'),
        -1 => text.push('-'),
        charge if charge > 0 => text.push_str(&format!("+{charge}")),
        charge => text.push_str(&format!("-{}", -(charge as i32))),
    }
    if atom.map != 0 {
        text.push_str(&format!(":{}", atom.map));
    }
    text.push(']');
    text
}

/// A copy of `mol` with aromatic rings in alternating single/double form, or
/// `None` when no such assignment exists.
fn kekule_copy(mol: &MoleculeGraph) -> Option<MoleculeGraph> {
    let orders = kekulize(mol)?;
    let mut copy = mol.clone();
    for (edge, order) in orders {
        copy[edge].order = order;
    }
    for atom in copy.node_weights_mut() {
        atom.aromatic = false;
    }
    Some(copy)
}

/// Writes `mol` as canonical SMILES.
///
/// Tetrahedral chirality is not written.
pub fn to_smiles(mol: &MoleculeGraph, options: &RenderOptions) -> String {
    let kekulized = if options.kekule_smiles { kekule_copy(mol) } else { None };
    let mol = kekulized.as_ref().unwrap_or(mol);

    let labeled: LabeledGraph = mol.map(
        |idx, _| smiles_atom_text(mol, idx, options),
        |edge, bond| {
            let text = match mol.edge_endpoints(edge) {
                Some((source, target)) => smiles_bond_text(bond, &mol[source], &mol[target], options),
                None => "",
            };
            LabeledBond { bond: *bond, text }
        },
    );
    write_line(&labeled, &rank_atoms(mol), None)
}
