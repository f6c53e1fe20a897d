//! Radius-limited atom environments and fragmentation of a graph on a set of bonds.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::{Bfs, EdgeRef};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::*;

/// Topological distance from `center` to every atom reachable from it.
pub fn distances<N, E>(graph: &UnGraph<N, E>, center: NodeIndex) -> HashMap<NodeIndex, usize> {
    let mut distances = HashMap::from([(center, 0)]);
    let mut queue = VecDeque::from([center]);
    while let Some(current) = queue.pop_front() {
        let next_distance = distances[&current] + 1;
        for neighbor in graph.neighbors(current) {
            if !distances.contains_key(&neighbor) {
                distances.insert(neighbor, next_distance);
                queue.push_back(neighbor);
            }
        }
    }
    distances
}

/// Layer of every bond around `center`: bonds touching the center are at
/// level 1, bonds whose closest end is `d` bonds away are at level `d + 1`.
fn bond_levels<N, E>(graph: &UnGraph<N, E>, center: NodeIndex) -> Vec<(EdgeIndex, usize)> {
    let distances = distances(graph, center);
    graph
        .edge_references()
        .filter_map(|edge| {
            let source = distances.get(&edge.source())?;
            let target = distances.get(&edge.target())?;
            Some((edge.id(), source.min(target) + 1))
        })
        .collect()
}

/// Bonds of the environment of `center` up to `radius` layers.
pub fn bonds_within_radius<N, E>(graph: &UnGraph<N, E>, center: NodeIndex, radius: usize) -> Vec<EdgeIndex> {
    bond_levels(graph, center)
        .into_iter()
        .filter(|(_, level)| *level <= radius)
        .map(|(edge, _)| edge)
        .collect()
}

/// Bonds leaving the environment of `center` of the given radius, i.e. the
/// bonds of layer `radius + 1`.
pub fn boundary_bonds<N, E>(graph: &UnGraph<N, E>, center: NodeIndex, radius: usize) -> Vec<EdgeIndex> {
    bond_levels(graph, center)
        .into_iter()
        .filter(|(_, level)| *level == radius + 1)
        .map(|(edge, _)| edge)
        .collect()
}

/// Atoms at most `depth` bonds away from `center`, in index order.
pub fn atoms_within<N, E>(graph: &UnGraph<N, E>, center: NodeIndex, depth: usize) -> Vec<NodeIndex> {
    let mut seen = HashSet::from([center]);
    let mut frontier = vec![center];
    for _ in 0..depth {
        let mut next = Vec::new();
        for atom in frontier {
            for neighbor in graph.neighbors(atom) {
                if seen.insert(neighbor) {
                    next.push(neighbor);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    let mut atoms: Vec<NodeIndex> = seen.into_iter().collect();
    atoms.sort();
    atoms
}

/// The subgraph on `atoms` with every bond between two of them, weights
/// rebuilt by `node` and `edge`. Atom order and bond orientation follow `graph`.
pub fn induced_subgraph<N, E, N2, E2>(
    graph: &UnGraph<N, E>,
    atoms: &[NodeIndex],
    mut node: impl FnMut(NodeIndex, &N) -> N2,
    mut edge: impl FnMut(EdgeIndex, &E) -> E2,
) -> Fragment<N2, E2> {
    let position: HashMap<NodeIndex, NodeIndex> = atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| (*atom, NodeIndex::new(i)))
        .collect();
    let mut bonds: Vec<EdgeIndex> = atoms
        .iter()
        .flat_map(|atom| graph.edges(*atom).map(|bond| bond.id()))
        .collect();
    bonds.sort();
    bonds.dedup();

    let mut subgraph = UnGraph::with_capacity(atoms.len(), bonds.len());
    for atom in atoms {
        subgraph.add_node(node(*atom, &graph[*atom]));
    }
    for bond in bonds {
        let Some((source, target)) = graph.edge_endpoints(bond) else {
            continue;
        };
        if let (Some(source), Some(target)) = (position.get(&source), position.get(&target)) {
            subgraph.add_edge(*source, *target, edge(bond, &graph[bond]));
        }
    }
    Fragment {
        graph: subgraph,
        parents: atoms.iter().copied().map(Some).collect(),
    }
}

/// A connected piece of a larger graph.
#[derive(Debug, Clone)]
pub struct Fragment<N, E> {
    pub graph: UnGraph<N, E>,
    /// Atom of the source graph each fragment atom comes from; `None` for dummy atoms.
    pub parents: Vec<Option<NodeIndex>>,
}

impl<N, E> Fragment<N, E> {
    /// The fragment atom standing for `parent`, if this fragment contains it.
    pub fn index_of(&self, parent: NodeIndex) -> Option<NodeIndex> {
        self.parents
            .iter()
            .position(|candidate| *candidate == Some(parent))
            .map(NodeIndex::new)
    }
}

/// Removes `cut` from a copy of `graph`.
///
/// With `dummy`, every removed bond leaves a new atom on each of its ends,
/// built from the kept atom and the removed bond. The returned parents map
/// keeps source indices for all original atoms.
pub fn fragment_on_bonds<N: Clone, E: Clone>(
    graph: &UnGraph<N, E>,
    cut: &[EdgeIndex],
    dummy: Option<&dyn Fn(NodeIndex, &E) -> (N, E)>,
) -> Fragment<N, E> {
    let cut: HashSet<EdgeIndex> = cut.iter().copied().collect();
    let mut fragmented = graph.filter_map(
        |_, node| Some(node.clone()),
        |edge, weight| (!cut.contains(&edge)).then(|| weight.clone()),
    );
    let mut parents: Vec<Option<NodeIndex>> = graph.node_indices().map(Some).collect();

    if let Some(dummy) = dummy {
        for edge in graph.edge_references().filter(|edge| cut.contains(&edge.id())) {
            for end in [edge.source(), edge.target()] {
                let (node, weight) = dummy(end, edge.weight());
                let added = fragmented.add_node(node);
                if end == edge.source() {
                    fragmented.add_edge(end, added, weight);
                } else {
                    fragmented.add_edge(added, end, weight);
                }
                parents.push(None);
            }
        }
    }
    trace!("Cut {} bonds", cut.len());

    Fragment {
        graph: fragmented,
        parents,
    }
}

/// Splits a graph into its connected components, ordered by their lowest atom index.
pub fn fragments<N: Clone, E: Clone>(fragment: &Fragment<N, E>) -> Vec<Fragment<N, E>> {
    let graph = &fragment.graph;
    let mut seen = HashSet::new();
    let mut components = Vec::new();
    for start in graph.node_indices() {
        if seen.contains(&start) {
            continue;
        }
        let mut members = Vec::new();
        let mut bfs = Bfs::new(graph, start);
        while let Some(node) = bfs.next(graph) {
            seen.insert(node);
            members.push(node);
        }
        members.sort();

        let position: HashMap<NodeIndex, NodeIndex> = members
            .iter()
            .enumerate()
            .map(|(i, node)| (*node, NodeIndex::new(i)))
            .collect();
        let mut component = UnGraph::with_capacity(members.len(), 0);
        for node in &members {
            component.add_node(graph[*node].clone());
        }
        for edge in graph.edge_references() {
            if let (Some(source), Some(target)) = (position.get(&edge.source()), position.get(&edge.target())) {
                component.add_edge(*source, *target, edge.weight().clone());
            }
        }
        components.push(Fragment {
            graph: component,
            parents: members.iter().map(|node| fragment.parents[node.index()]).collect(),
        });
    }
    components
}

/// The connected piece of `graph` around `center` once `cut` is removed.
pub fn fragment_containing<N: Clone, E: Clone>(
    graph: &UnGraph<N, E>,
    center: NodeIndex,
    cut: &[EdgeIndex],
    dummy: Option<&dyn Fn(NodeIndex, &E) -> (N, E)>,
) -> Option<Fragment<N, E>> {
    let pieces = fragments(&fragment_on_bonds(graph, cut, dummy));
    pieces.into_iter().find(|piece| piece.index_of(center).is_some())
}
