use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

const SYMBOLS: [&str; 119] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

lazy_static! {
    /// Symbol -> atomic number, for every element plus the `*` wildcard.
    static ref SYMBOL_TABLE: HashMap<&'static str, u8> = SYMBOLS
        .iter()
        .enumerate()
        .map(|(number, symbol)| (*symbol, number as u8))
        .collect();
}

/// A chemical element, identified by its atomic number. Number 0 is the dummy atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Element(u8);

#[allow(non_upper_case_globals)]
impl Element {
    pub const DUMMY: Element = Element(0);
    pub const H: Element = Element(1);
    pub const B: Element = Element(5);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const F: Element = Element(9);
    pub const P: Element = Element(15);
    pub const S: Element = Element(16);
    pub const Cl: Element = Element(17);
    pub const Se: Element = Element(34);
    pub const Br: Element = Element(35);
    pub const I: Element = Element(53);

    pub fn from_atomic_number(number: u8) -> Option<Self> {
        if (number as usize) < SYMBOLS.len() {
            Some(Element(number))
        } else {
            None
        }
    }

    /// Looks up an element by its exact, case-sensitive symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        SYMBOL_TABLE.get(symbol).copied().map(Element)
    }

    /// Looks up an element written in lowercase aromatic form, e.g. `c` or `se`.
    pub fn from_aromatic_symbol(symbol: &str) -> Option<Self> {
        let mut chars = symbol.chars();
        let first = chars.next()?;
        let capitalized: String = first.to_uppercase().chain(chars).collect();
        Self::from_symbol(&capitalized).filter(|element| element.can_be_aromatic())
    }

    pub fn atomic_number(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self.0 as usize]
    }

    pub fn is_dummy(self) -> bool {
        self.0 == 0
    }

    pub fn is_hydrogen(self) -> bool {
        self.0 == 1
    }

    /// Default valences used to derive implicit hydrogens, smallest first.
    pub fn default_valences(self) -> &'static [u8] {
        match self.0 {
            1 => &[1],
            5 => &[3],
            6 => &[4],
            7 => &[3, 5],
            8 => &[2],
            9 | 17 | 35 | 53 => &[1],
            14 => &[4],
            15 => &[3, 5],
            16 => &[2, 4, 6],
            33 => &[3, 5],
            34 => &[2, 4, 6],
            52 => &[2, 4, 6],
            _ => &[],
        }
    }

    /// Elements that may be written without brackets in SMILES.
    pub fn is_organic_subset(self) -> bool {
        matches!(self.0, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }

    pub fn can_be_aromatic(self) -> bool {
        matches!(self.0, 5 | 6 | 7 | 8 | 15 | 16 | 33 | 34 | 52)
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.symbol())
    }
}
