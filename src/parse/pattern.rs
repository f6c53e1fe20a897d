//! Reader for the bracket-token notation signatures are written in.

use super::{build, charge, tokenize, LineAtom, Res};
use crate::{Bond, Element, SmilesError};
use anyhow::{Context, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, satisfy},
    combinator::{map, map_opt, map_res, opt, recognize},
    multi::many0,
    sequence::{pair, preceded},
};
use petgraph::graph::{NodeIndex, UnGraph};

/// An atom read back from an atom token such as `[c;H1;h1;D2;X3:1]`.
///
/// The descriptor values are kept verbatim: the pattern only contains part of
/// the molecule the token was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PatternAtom {
    pub element: Element,
    pub aromatic: bool,
    pub total_hydrogens: u32,
    pub implicit_hydrogens: u32,
    pub degree: u32,
    pub connectivity: u32,
    pub charge: i32,
    pub map: u32,
}

pub type PatternGraph = UnGraph<PatternAtom, Bond>;

impl LineAtom for PatternAtom {
    fn is_aromatic(&self) -> bool {
        self.aromatic
    }
}

enum Primitive {
    TotalHydrogens(u32),
    ImplicitHydrogens(u32),
    Degree(u32),
    Connectivity(u32),
    Charge(i32),
}

fn count(input: &str) -> Res<u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>())(input)
}

fn primitive(input: &str) -> Res<Primitive> {
    alt((
        map(preceded(char('H'), count), Primitive::TotalHydrogens),
        map(preceded(char('h'), count), Primitive::ImplicitHydrogens),
        map(preceded(char('D'), count), Primitive::Degree),
        map(preceded(char('X'), count), Primitive::Connectivity),
        map(charge, Primitive::Charge),
    ))(input)
}

fn pattern_symbol(input: &str) -> Res<(Element, bool)> {
    alt((
        map_opt(preceded(char('#'), count), |number| {
            u8::try_from(number)
                .ok()
                .and_then(Element::from_atomic_number)
                .map(|element| (element, false))
        }),
        map_opt(
            alt((tag("se"), tag("as"), tag("te"), tag("b"), tag("c"), tag("n"), tag("o"), tag("p"), tag("s"))),
            |symbol| Element::from_aromatic_symbol(symbol).map(|element| (element, true)),
        ),
        map_opt(
            alt((
                recognize(pair(
                    satisfy(|c| c.is_ascii_uppercase()),
                    satisfy(|c| c.is_ascii_lowercase()),
                )),
                recognize(satisfy(|c| c.is_ascii_uppercase())),
            )),
            |symbol| Element::from_symbol(symbol).map(|element| (element, false)),
        ),
    ))(input)
}

fn bracket_token(input: &str) -> Res<PatternAtom> {
    let (input, _) = char('[')(input)?;
    let (input, (element, aromatic)) = pattern_symbol(input)?;
    let (input, primitives) = many0(preceded(char(';'), primitive))(input)?;
    let (input, map_number) = opt(preceded(char(':'), count))(input)?;
    let (input, _) = char(']')(input)?;

    let mut atom = PatternAtom {
        element,
        aromatic,
        map: map_number.unwrap_or(0),
        ..Default::default()
    };
    for primitive in primitives {
        match primitive {
            Primitive::TotalHydrogens(n) => atom.total_hydrogens = n,
            Primitive::ImplicitHydrogens(n) => atom.implicit_hydrogens = n,
            Primitive::Degree(n) => atom.degree = n,
            Primitive::Connectivity(n) => atom.connectivity = n,
            Primitive::Charge(n) => atom.charge = n,
        }
    }
    Ok((input, atom))
}

fn pattern_atom(input: &str) -> Res<PatternAtom> {
    alt((
        map(char('*'), |_| PatternAtom::default()),
        bracket_token,
    ))(input)
}

/// Reads a rendered signature back into a graph of pattern atoms.
pub fn parse_pattern(pattern: &str) -> Result<PatternGraph> {
    let tokens = tokenize(pattern, pattern_atom)?;
    let graph = build(tokens).context(format!("Failed to parse signature pattern {pattern}"))?;
    Ok(graph)
}

/// The atom carrying atom-map number `map`.
pub fn find_mapped_atom(graph: &PatternGraph, map: u32) -> Result<NodeIndex> {
    graph
        .node_indices()
        .find(|idx| graph[*idx].map == map)
        .ok_or(SmilesError::MissingMapRoot)
        .context(format!("No atom mapped to {map}"))
}
