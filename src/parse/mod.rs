//! Line-notation readers: SMILES for molecules and the bracket-token grammar of signatures.
//!
//! Both share the same skeleton (chains, branches, ring closures, components);
//! only the atom syntax differs.

use crate::{Bond, BondDirection, BondOrder, SmilesError};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, satisfy},
    combinator::{map, map_res, value},
    sequence::preceded,
    IResult,
};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

mod smiles;
pub use smiles::*;

mod pattern;
pub use pattern::*;

pub(crate) type Res<'a, T> = IResult<&'a str, T>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<A> {
    Atom(A),
    Bond(Bond),
    Ring(u8),
    Open,
    Close,
    Dot,
}

/// An atom as written in a line notation.
pub(crate) trait LineAtom {
    fn is_aromatic(&self) -> bool;
}

fn bond(input: &str) -> Res<Bond> {
    use BondOrder::*;
    let directed = |order, direction| Bond { order, direction };
    alt((
        value(directed(Aromatic, BondDirection::Up), tag(":/")),
        value(directed(Aromatic, BondDirection::Down), tag(":\\")),
        value(Bond::new(Single), char('-')),
        value(Bond::new(Double), char('=')),
        value(Bond::new(Triple), char('#')),
        value(Bond::new(Quadruple), char('$')),
        value(Bond::new(Aromatic), char(':')),
        value(directed(Single, BondDirection::Up), char('/')),
        value(directed(Single, BondDirection::Down), char('\\')),
        value(Bond::new(Unspecified), char('~')),
    ))(input)
}

fn ring_label(input: &str) -> Res<u8> {
    alt((
        map_res(
            preceded(char('%'), take_while_m_n(2, 2, |c: char| c.is_ascii_digit())),
            |digits: &str| digits.parse::<u8>(),
        ),
        map(satisfy(|c| c.is_ascii_digit()), |c| c as u8 - b'0'),
    ))(input)
}

/// Splits `input` into positioned tokens, reading atoms with `atom`.
pub(crate) fn tokenize<A>(
    input: &str,
    atom: impl Fn(&str) -> Res<A>,
) -> Result<Vec<(usize, Token<A>)>, SmilesError> {
    let mut tokens = Vec::new();
    let mut rest = input;
    while let Some(first) = rest.chars().next() {
        let position = input.len() - rest.len();
        let (next, token) = match first {
            '(' => (&rest[1..], Token::Open),
            ')' => (&rest[1..], Token::Close),
            '.' => (&rest[1..], Token::Dot),
            _ => {
                if let Ok((next, parsed)) = bond(rest) {
                    (next, Token::Bond(parsed))
                } else if let Ok((next, label)) = ring_label(rest) {
                    (next, Token::Ring(label))
                } else if let Ok((next, parsed)) = atom(rest) {
                    (next, Token::Atom(parsed))
                } else if first == '[' {
                    return Err(match rest.find(']') {
                        Some(end) => SmilesError::UnknownElement(position, rest[1..end].to_string()),
                        None => SmilesError::UnclosedBracket(position),
                    });
                } else {
                    return Err(SmilesError::UnexpectedCharacter(position, first));
                }
            }
        };
        tokens.push((position, token));
        rest = next;
    }
    Ok(tokens)
}

fn default_bond<A: LineAtom>(graph: &UnGraph<A, Bond>, a: NodeIndex, b: NodeIndex) -> Bond {
    if graph[a].is_aromatic() && graph[b].is_aromatic() {
        Bond::new(BondOrder::Aromatic)
    } else {
        Bond::new(BondOrder::Single)
    }
}

/// Assembles a graph from tokens.
///
/// Bond directions are stored relative to the edge orientation: chain bonds
/// point from the earlier atom to the later one, ring-closure bonds from the
/// closing atom back to the opening one.
pub(crate) fn build<A: LineAtom>(tokens: Vec<(usize, Token<A>)>) -> Result<UnGraph<A, Bond>, SmilesError> {
    let mut graph = UnGraph::default();
    let mut previous: Option<NodeIndex> = None;
    let mut pending: Option<(usize, Bond)> = None;
    let mut branches: Vec<NodeIndex> = Vec::new();
    let mut rings: HashMap<u8, (NodeIndex, Option<Bond>)> = HashMap::new();

    for (position, token) in tokens {
        match token {
            Token::Atom(atom) => {
                let current = graph.add_node(atom);
                if let Some(prev) = previous {
                    let bond = match pending.take() {
                        Some((_, bond)) => bond,
                        None => default_bond(&graph, prev, current),
                    };
                    graph.add_edge(prev, current, bond);
                }
                previous = Some(current);
            }
            Token::Bond(bond) => {
                if previous.is_none() || pending.is_some() {
                    return Err(SmilesError::BondWithoutAtom(position));
                }
                pending = Some((position, bond));
            }
            Token::Ring(label) => {
                let current = previous.ok_or(SmilesError::RingClosureNoCurrentAtom(position, label))?;
                let written = pending.take().map(|(_, bond)| bond);
                match rings.remove(&label) {
                    Some((opener, opener_bond)) => {
                        if opener == current {
                            return Err(SmilesError::SelfBond(position));
                        }
                        if graph.find_edge(current, opener).is_some() {
                            return Err(SmilesError::DuplicateBond(position));
                        }
                        let bond = match (written, opener_bond) {
                            (Some(bond), _) => bond,
                            (None, Some(bond)) => Bond {
                                direction: bond.direction.reversed(),
                                ..bond
                            },
                            (None, None) => default_bond(&graph, current, opener),
                        };
                        graph.add_edge(current, opener, bond);
                    }
                    None => {
                        rings.insert(label, (current, written));
                    }
                }
            }
            Token::Open => {
                let current = previous.ok_or(SmilesError::BranchNoCurrentAtom(position))?;
                branches.push(current);
            }
            Token::Close => {
                if let Some((bond_position, _)) = pending {
                    return Err(SmilesError::BondWithoutAtom(bond_position));
                }
                previous = Some(branches.pop().ok_or(SmilesError::BranchEndNoStart(position))?);
            }
            Token::Dot => {
                if let Some((bond_position, _)) = pending {
                    return Err(SmilesError::BondWithoutAtom(bond_position));
                }
                previous = None;
            }
        }
    }

    if let Some((position, _)) = pending {
        return Err(SmilesError::BondWithoutAtom(position));
    }
    if !branches.is_empty() {
        return Err(SmilesError::UnclosedBranch);
    }
    if let Some(label) = rings.keys().min() {
        return Err(SmilesError::UnclosedRing(*label));
    }
    Ok(graph)
}
