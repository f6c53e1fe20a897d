use super::{build, tokenize, LineAtom, Res};
use crate::{assign_implicit_hydrogens, perceive_aromaticity, Atom, Chirality, Element, MoleculeGraph};
use anyhow::{Context, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, satisfy},
    combinator::{map, map_opt, map_res, opt, recognize},
    multi::many1,
    sequence::{pair, preceded},
};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use tracing::*;

impl LineAtom for Atom {
    fn is_aromatic(&self) -> bool {
        self.aromatic
    }
}

fn element_symbol(input: &str) -> Res<Element> {
    alt((
        map_opt(
            recognize(pair(
                satisfy(|c| c.is_ascii_uppercase()),
                satisfy(|c| c.is_ascii_lowercase()),
            )),
            Element::from_symbol,
        ),
        map_opt(recognize(satisfy(|c| c.is_ascii_uppercase())), Element::from_symbol),
    ))(input)
}

fn aromatic_symbol(input: &str) -> Res<Element> {
    map_opt(
        alt((
            tag("se"),
            tag("as"),
            tag("te"),
            tag("b"),
            tag("c"),
            tag("n"),
            tag("o"),
            tag("p"),
            tag("s"),
        )),
        Element::from_aromatic_symbol,
    )(input)
}

/// An atom outside brackets: organic subset, aromatic organic subset or `*`.
fn organic_atom(input: &str) -> Res<Atom> {
    alt((
        map(char('*'), |_| Atom::new(Element::DUMMY)),
        map_opt(
            alt((
                tag("Cl"),
                tag("Br"),
                tag("B"),
                tag("C"),
                tag("N"),
                tag("O"),
                tag("P"),
                tag("S"),
                tag("F"),
                tag("I"),
            )),
            |symbol| Element::from_symbol(symbol).map(Atom::new),
        ),
        map_opt(alt((tag("b"), tag("c"), tag("n"), tag("o"), tag("p"), tag("s"))), |symbol| {
            Element::from_aromatic_symbol(symbol).map(Atom::aromatic)
        }),
    ))(input)
}

fn chirality(input: &str) -> Res<Chirality> {
    map(opt(alt((tag("@@"), tag("@")))), |marker: Option<&str>| match marker {
        Some("@@") => Chirality::Clockwise,
        Some(_) => Chirality::CounterClockwise,
        None => Chirality::None,
    })(input)
}

pub(crate) fn charge(input: &str) -> Res<i32> {
    alt((
        map_res(preceded(char('+'), digit1), |digits: &str| digits.parse::<i32>()),
        map_res(preceded(char('-'), digit1), |digits: &str| {
            digits.parse::<i32>().map(|value| -value)
        }),
        map(many1(char('+')), |signs: Vec<char>| signs.len() as i32),
        map(many1(char('-')), |signs: Vec<char>| -(signs.len() as i32)),
    ))(input)
}

fn bracket_atom(input: &str) -> Res<Atom> {
    let (input, _) = char('[')(input)?;
    let (input, isotope) = opt(map_res(digit1, |digits: &str| digits.parse::<u16>()))(input)?;
    let (input, (element, aromatic)) = alt((
        map(char('*'), |_| (Element::DUMMY, false)),
        map(aromatic_symbol, |element| (element, true)),
        map(element_symbol, |element| (element, false)),
    ))(input)?;
    let (input, chirality) = chirality(input)?;
    let (input, hydrogens) = opt(preceded(
        char('H'),
        map(opt(map_res(digit1, |digits: &str| digits.parse::<u8>())), |count: Option<u8>| {
            count.unwrap_or(1)
        }),
    ))(input)?;
    let (input, charge) = opt(charge)(input)?;
    let (input, map_number) = opt(preceded(
        char(':'),
        map_res(digit1, |digits: &str| digits.parse::<u32>()),
    ))(input)?;
    let (input, _) = char(']')(input)?;

    let atom = Atom {
        element,
        aromatic,
        charge: charge.unwrap_or(0) as i8,
        isotope: isotope.unwrap_or(0),
        explicit_hydrogens: hydrogens.unwrap_or(0),
        implicit_hydrogens: 0,
        no_implicit: true,
        chirality,
        map: map_number.unwrap_or(0),
    };
    Ok((input, atom))
}

fn smiles_atom(input: &str) -> Res<Atom> {
    alt((bracket_atom, organic_atom))(input)
}

/// A plain `[H]` attached to a single heavy atom.
fn is_mergeable_hydrogen(graph: &MoleculeGraph, idx: NodeIndex) -> bool {
    let atom = &graph[idx];
    if !atom.element.is_hydrogen() || atom.isotope != 0 || atom.charge != 0 || atom.map != 0 {
        return false;
    }
    let mut neighbors = graph.neighbors(idx);
    match (neighbors.next(), neighbors.next()) {
        (Some(heavy), None) => !graph[heavy].element.is_hydrogen(),
        _ => false,
    }
}

/// Folds explicit hydrogen atoms into their neighbour.
fn merge_explicit_hydrogens(graph: MoleculeGraph) -> MoleculeGraph {
    let removable: HashSet<NodeIndex> = graph
        .node_indices()
        .filter(|idx| is_mergeable_hydrogen(&graph, *idx))
        .collect();
    if removable.is_empty() {
        return graph;
    }

    // Unbracketed neighbours pick the hydrogen back up as an implicit one.
    let mut graph = graph;
    for hydrogen in &removable {
        if let Some(heavy) = graph.neighbors(*hydrogen).next() {
            if graph[heavy].no_implicit {
                graph[heavy].explicit_hydrogens += 1;
            }
        }
    }
    trace!("Merging {} explicit hydrogens", removable.len());
    graph.filter_map(
        |idx, atom| (!removable.contains(&idx)).then(|| atom.clone()),
        |_, bond| Some(*bond),
    )
}

fn parse_smiles_helper(smiles: &str) -> Result<MoleculeGraph> {
    let tokens = tokenize(smiles, smiles_atom)?;
    let graph = build(tokens)?;
    let mut graph = merge_explicit_hydrogens(graph);
    assign_implicit_hydrogens(&mut graph);
    perceive_aromaticity(&mut graph);
    debug!(
        "Parsed {smiles} into {} atoms and {} bonds",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Parses a SMILES string into a MoleculeGraph.
///
/// Explicit `[H]` atoms are folded into their neighbour, implicit hydrogens
/// follow the default valence model, and Kekulé rings satisfying Hückel's rule
/// are marked aromatic.
///
/// # Arguments
///
/// * `smiles` - The SMILES string to parse.
///
/// # Returns
///
/// * `Result<MoleculeGraph>` - The parsed molecular graph. Syntax errors carry a [`crate::SmilesError`].
pub fn parse_smiles(smiles: &str) -> Result<MoleculeGraph> {
    parse_smiles_helper(smiles).context(format!("Failed to parse SMILES string {smiles}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BondDirection, BondOrder, SmilesError};

    #[test]
    fn test_parse_ethanol() {
        let molecule = parse_smiles("CCO").expect("Failed to parse SMILES");
        assert_eq!(molecule.node_count(), 3);
        assert_eq!(molecule.edge_count(), 2);
        assert_eq!(molecule[NodeIndex::new(2)].element, Element::O);
        assert_eq!(molecule[NodeIndex::new(2)].total_hydrogens(), 1);
        assert_eq!(molecule[NodeIndex::new(0)].total_hydrogens(), 3);
    }

    #[test]
    fn test_parse_benzene() {
        let molecule = parse_smiles("c1ccccc1").expect("Failed to parse SMILES");
        assert_eq!(molecule.node_count(), 6);
        assert_eq!(molecule.edge_count(), 6);
        for node in molecule.node_indices() {
            assert!(molecule[node].aromatic);
            assert_eq!(molecule[node].total_hydrogens(), 1);
        }
        assert!(molecule.edge_weights().all(|bond| bond.order == BondOrder::Aromatic));
    }

    #[test]
    fn test_kekule_input_is_aromatized() {
        let molecule = parse_smiles("C1=CC=CC=C1O").expect("Failed to parse SMILES");
        let aromatic = molecule.node_weights().filter(|atom| atom.aromatic).count();
        assert_eq!(aromatic, 6);
    }

    #[test]
    fn test_bracket_atoms() {
        let molecule = parse_smiles("[13CH3][NH3+].[O-2]").expect("Failed to parse SMILES");
        let carbon = &molecule[NodeIndex::new(0)];
        assert_eq!(carbon.isotope, 13);
        assert_eq!(carbon.total_hydrogens(), 3);
        let nitrogen = &molecule[NodeIndex::new(1)];
        assert_eq!(nitrogen.charge, 1);
        assert_eq!(nitrogen.explicit_hydrogens, 3);
        assert_eq!(molecule[NodeIndex::new(2)].charge, -2);
        assert_eq!(molecule.edge_count(), 1);
    }

    #[test]
    fn test_explicit_hydrogens_are_merged() {
        let molecule = parse_smiles("[H]OC([H])([H])[H]").expect("Failed to parse SMILES");
        assert_eq!(molecule.node_count(), 2);
        assert!(molecule.node_weights().all(|atom| !atom.element.is_hydrogen()));
        let carbon = molecule
            .node_weights()
            .find(|atom| atom.element == Element::C)
            .expect("carbon present");
        assert_eq!(carbon.total_hydrogens(), 3);
    }

    #[test]
    fn test_hydrogen_molecule_is_kept() {
        let molecule = parse_smiles("[H][H]").expect("Failed to parse SMILES");
        assert_eq!(molecule.node_count(), 2);
    }

    #[test]
    fn test_directional_bonds() {
        let molecule = parse_smiles("F/C=C/F").expect("Failed to parse SMILES");
        let directions: Vec<BondDirection> = molecule.edge_weights().map(|bond| bond.direction).collect();
        assert_eq!(
            directions,
            vec![BondDirection::Up, BondDirection::None, BondDirection::Up]
        );
    }

    #[test]
    fn test_branches_and_percent_rings() {
        let molecule = parse_smiles("CC(C)(C)C%10CC%10").expect("Failed to parse SMILES");
        assert_eq!(molecule.node_count(), 7);
        assert_eq!(molecule.edge_count(), 7);
    }

    #[test]
    fn test_syntax_errors() {
        let kind = |smiles: &str| {
            parse_smiles(smiles)
                .expect_err("invalid SMILES")
                .downcast_ref::<SmilesError>()
                .cloned()
        };
        assert_eq!(kind("C1CC"), Some(SmilesError::UnclosedRing(1)));
        assert_eq!(kind("C(C"), Some(SmilesError::UnclosedBranch));
        assert_eq!(kind("CC)"), Some(SmilesError::BranchEndNoStart(2)));
        assert_eq!(kind("[CH3"), Some(SmilesError::UnclosedBracket(0)));
        assert_eq!(kind("C[Xx]"), Some(SmilesError::UnknownElement(1, "Xx".to_string())));
        assert_eq!(kind("C?"), Some(SmilesError::UnexpectedCharacter(1, '?')));
        assert_eq!(kind("=C"), Some(SmilesError::BondWithoutAtom(0)));
    }
}
