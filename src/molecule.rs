use crate::Element;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Chirality {
    #[default]
    None,
    /// `@`
    CounterClockwise,
    /// `@@`
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Dative,
    Unspecified,
}

impl BondOrder {
    /// Contribution to the explicit valence of each end, aromatic bonds counting as one.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic | BondOrder::Unspecified => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
            BondOrder::Dative => 0,
        }
    }

    /// Upper-case bond type name, e.g. `SINGLE`.
    pub fn name(self) -> &'static str {
        match self {
            BondOrder::Single => "SINGLE",
            BondOrder::Double => "DOUBLE",
            BondOrder::Triple => "TRIPLE",
            BondOrder::Quadruple => "QUADRUPLE",
            BondOrder::Aromatic => "AROMATIC",
            BondOrder::Dative => "DATIVE",
            BondOrder::Unspecified => "UNSPECIFIED",
        }
    }
}

impl Display for BondOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

/// Directional marker of a bond, relative to the edge's source -> target orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BondDirection {
    #[default]
    None,
    /// `/`
    Up,
    /// `\`
    Down,
}

impl BondDirection {
    pub fn reversed(self) -> Self {
        match self {
            BondDirection::Up => BondDirection::Down,
            BondDirection::Down => BondDirection::Up,
            BondDirection::None => BondDirection::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bond {
    pub order: BondOrder,
    pub direction: BondDirection,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            direction: BondDirection::None,
        }
    }
}

impl From<BondOrder> for Bond {
    fn from(order: BondOrder) -> Self {
        Bond::new(order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Atom {
    pub element: Element,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: u16,
    /// Hydrogens written inside brackets or merged from explicit `[H]` atoms.
    pub explicit_hydrogens: u8,
    /// Hydrogens derived from the default valence model.
    pub implicit_hydrogens: u8,
    /// Bracket atoms never receive implicit hydrogens.
    pub no_implicit: bool,
    pub chirality: Chirality,
    pub map: u32,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            ..Default::default()
        }
    }

    pub fn aromatic(element: Element) -> Self {
        Self {
            element,
            aromatic: true,
            ..Default::default()
        }
    }

    pub fn total_hydrogens(&self) -> u8 {
        self.explicit_hydrogens + self.implicit_hydrogens
    }
}

pub type MoleculeGraph = UnGraph<Atom, Bond>;

/// Sum of bond valences around an atom, aromatic bonds counting as one.
pub fn bond_valence_sum(graph: &MoleculeGraph, atom: NodeIndex) -> u8 {
    graph.edges(atom).map(|edge| edge.weight().order.valence()).sum()
}

/// Implicit hydrogens an unbracketed atom would carry with the given explicit valence.
pub fn implicit_hydrogens_for(element: Element, aromatic: bool, explicit_valence: u8) -> u8 {
    let Some(target) = element
        .default_valences()
        .iter()
        .copied()
        .find(|valence| *valence >= explicit_valence)
    else {
        return 0;
    };
    target
        .saturating_sub(explicit_valence)
        .saturating_sub(aromatic as u8)
}

/// Recomputes implicit hydrogens for every atom that is allowed to carry them.
pub fn assign_implicit_hydrogens(graph: &mut MoleculeGraph) {
    let updates: Vec<(NodeIndex, u8)> = graph
        .node_indices()
        .filter(|idx| !graph[*idx].no_implicit)
        .map(|idx| {
            let atom = &graph[idx];
            let valence = bond_valence_sum(graph, idx) + atom.explicit_hydrogens;
            (idx, implicit_hydrogens_for(atom.element, atom.aromatic, valence))
        })
        .collect();
    for (idx, count) in updates {
        graph[idx].implicit_hydrogens = count;
    }
}

/// Shortest path between `from` and `to` that does not use `skip`, as a node list.
fn shortest_path_avoiding<N, E>(
    graph: &UnGraph<N, E>,
    from: NodeIndex,
    to: NodeIndex,
    skip: EdgeIndex,
) -> Option<Vec<NodeIndex>> {
    let mut previous = vec![None; graph.node_count()];
    let mut seen = vec![false; graph.node_count()];
    let mut queue = VecDeque::from([from]);
    seen[from.index()] = true;
    while let Some(current) = queue.pop_front() {
        if current == to {
            let mut path = vec![to];
            let mut cursor = to;
            while let Some(prev) = previous[cursor.index()] {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }
        for edge in graph.edges(current) {
            if edge.id() == skip {
                continue;
            }
            let next = edge.target();
            if !seen[next.index()] {
                seen[next.index()] = true;
                previous[next.index()] = Some(current);
                queue.push_back(next);
            }
        }
    }
    None
}

/// Bonds that belong to at least one cycle.
pub fn ring_bonds<N, E>(graph: &UnGraph<N, E>) -> HashSet<EdgeIndex> {
    graph
        .edge_references()
        .filter(|edge| shortest_path_avoiding(graph, edge.source(), edge.target(), edge.id()).is_some())
        .map(|edge| edge.id())
        .collect()
}

/// The smallest ring through every ring bond, deduplicated by atom set.
pub fn smallest_rings<N, E>(graph: &UnGraph<N, E>) -> Vec<Vec<NodeIndex>> {
    let mut seen: HashSet<BTreeSet<NodeIndex>> = HashSet::new();
    let mut rings = Vec::new();
    for edge in graph.edge_references() {
        if let Some(path) = shortest_path_avoiding(graph, edge.source(), edge.target(), edge.id()) {
            let key: BTreeSet<NodeIndex> = path.iter().copied().collect();
            if seen.insert(key) {
                rings.push(path);
            }
        }
    }
    rings.sort_by_key(|ring| ring.len());
    rings
}

/// Pi electrons an atom donates to `ring`, or `None` when it rules the ring out.
fn pi_electrons(graph: &MoleculeGraph, atom: NodeIndex, ring: &HashSet<NodeIndex>) -> Option<u8> {
    let data = &graph[atom];
    if !data.element.can_be_aromatic() {
        return None;
    }
    let mut endocyclic_double = false;
    let mut exocyclic_double = None;
    for edge in graph.edges(atom) {
        match edge.weight().order {
            BondOrder::Double if ring.contains(&edge.target()) => endocyclic_double = true,
            BondOrder::Double => exocyclic_double = Some(graph[edge.target()].element),
            BondOrder::Triple | BondOrder::Quadruple => return None,
            _ => {}
        }
    }
    if endocyclic_double {
        return Some(1);
    }
    // A double bond leaving the ring still puts the atom in the pi system, as
    // across a fused ring bond; only heteroatom partners pull the electrons out.
    if let Some(partner) = exocyclic_double {
        return Some(if matches!(partner, Element::O | Element::N | Element::S) { 0 } else { 1 });
    }
    let connections = graph.edges(atom).count() as u8 + data.total_hydrogens();
    match (data.element, data.charge) {
        (Element::N, 0) | (Element::P, 0) if connections == 3 => Some(2),
        (Element::O, 0) | (Element::S, 0) | (Element::Se, 0) if connections == 2 => Some(2),
        (Element::C, -1) => Some(2),
        (Element::C, 1) | (Element::B, 0) => Some(0),
        _ => None,
    }
}

/// Marks Hückel rings (4n+2 pi electrons) written in Kekulé form as aromatic.
pub fn perceive_aromaticity(graph: &mut MoleculeGraph) {
    let mut aromatic_rings = Vec::new();
    for ring in smallest_rings(graph) {
        let members: HashSet<NodeIndex> = ring.iter().copied().collect();
        if ring.iter().all(|idx| graph[*idx].aromatic) {
            continue;
        }
        let electrons: Option<u32> = ring
            .iter()
            .map(|idx| pi_electrons(graph, *idx, &members).map(u32::from))
            .sum();
        match electrons {
            Some(count) if count % 4 == 2 => aromatic_rings.push(ring),
            _ => trace!("Ring {:?} is not aromatic", ring),
        }
    }

    for ring in aromatic_rings {
        for (i, &atom) in ring.iter().enumerate() {
            let next = ring[(i + 1) % ring.len()];
            graph[atom].aromatic = true;
            if let Some(edge) = graph.find_edge(atom, next) {
                graph[edge].order = BondOrder::Aromatic;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(elements: &[Element], orders: &[BondOrder]) -> MoleculeGraph {
        let mut graph = MoleculeGraph::new_undirected();
        let nodes: Vec<_> = elements.iter().map(|e| graph.add_node(Atom::new(*e))).collect();
        for (i, order) in orders.iter().enumerate() {
            graph.add_edge(nodes[i], nodes[(i + 1) % nodes.len()], Bond::new(*order));
        }
        graph
    }

    #[test]
    fn test_implicit_hydrogens() {
        let mut ethanol = chain(
            &[Element::C, Element::C, Element::O],
            &[BondOrder::Single, BondOrder::Single],
        );
        assign_implicit_hydrogens(&mut ethanol);
        let counts: Vec<u8> = ethanol.node_weights().map(Atom::total_hydrogens).collect();
        assert_eq!(counts, vec![3, 2, 1]);
    }

    #[test]
    fn test_aromatic_implicit_hydrogens() {
        assert_eq!(implicit_hydrogens_for(Element::C, true, 2), 1);
        assert_eq!(implicit_hydrogens_for(Element::C, true, 3), 0);
        assert_eq!(implicit_hydrogens_for(Element::N, true, 2), 0);
        assert_eq!(implicit_hydrogens_for(Element::S, true, 2), 0);
    }

    #[test]
    fn test_ring_bonds() {
        let mut graph = chain(&[Element::C; 4], &[BondOrder::Single; 4]);
        let tail = graph.add_node(Atom::new(Element::O));
        graph.add_edge(NodeIndex::new(0), tail, Bond::default());
        let rings = ring_bonds(&graph);
        assert_eq!(rings.len(), 4);
        assert_eq!(smallest_rings(&graph).len(), 1);
    }

    #[test]
    fn test_kekule_benzene_is_aromatic() {
        use BondOrder::*;
        let mut benzene = chain(&[Element::C; 6], &[Double, Single, Double, Single, Double, Single]);
        assign_implicit_hydrogens(&mut benzene);
        perceive_aromaticity(&mut benzene);
        assert!(benzene.node_weights().all(|atom| atom.aromatic));
        assert!(benzene.edge_weights().all(|bond| bond.order == Aromatic));
        assert!(benzene.node_weights().all(|atom| atom.total_hydrogens() == 1));
    }

    #[test]
    fn test_fused_kekule_rings_are_aromatic() {
        use crate::{parse_smiles, to_smiles, RenderOptions};
        for (kekule, aromatic) in [
            ("C1=CC=C2C=CC=CC2=C1", "c1ccc2ccccc2c1"),
            ("C1=CC2=CC=CC=C2N1", "c1cc2ccccc2[nH]1"),
            ("C1=CC=C2C(=C1)C=CC1=CC=CC=C12", "c1ccc2c(c1)ccc1ccccc12"),
        ] {
            let from_kekule = parse_smiles(kekule).expect("Failed to parse SMILES");
            let from_aromatic = parse_smiles(aromatic).expect("Failed to parse SMILES");
            assert!(from_kekule.node_weights().all(|atom| atom.aromatic), "{kekule}");
            assert!(from_kekule.edge_weights().all(|bond| bond.order == BondOrder::Aromatic), "{kekule}");
            assert_eq!(
                to_smiles(&from_kekule, &RenderOptions::default()),
                to_smiles(&from_aromatic, &RenderOptions::default())
            );
        }
    }

    #[test]
    fn test_pyridone_keeps_its_carbonyl() {
        let pyridone = crate::parse_smiles("O=C1C=CC=CN1").expect("Failed to parse SMILES");
        let oxygen = pyridone
            .node_weights()
            .find(|atom| atom.element == Element::O)
            .expect("carbonyl oxygen");
        assert!(!oxygen.aromatic);
        assert_eq!(pyridone.node_weights().filter(|atom| atom.aromatic).count(), 6);
    }

    #[test]
    fn test_cyclohexene_is_not_aromatic() {
        use BondOrder::*;
        let mut graph = chain(&[Element::C; 6], &[Double, Single, Single, Single, Single, Single]);
        perceive_aromaticity(&mut graph);
        assert!(graph.node_weights().all(|atom| !atom.aromatic));
    }
}
