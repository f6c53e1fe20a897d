//! Radius and flags shared by atom and molecule signatures.

use crate::{RenderOptions, SignatureError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use tracing::*;

/// How far an environment reaches from its atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Radius {
    Hops(u32),
    /// The whole connected molecule.
    Unbounded,
}

impl Radius {
    /// Number of bond layers to cover in a graph of `atom_count` atoms.
    pub fn resolve(self, atom_count: usize) -> usize {
        match self {
            Radius::Hops(hops) => hops as usize,
            Radius::Unbounded => atom_count,
        }
    }

    /// One layer less; below zero the radius becomes unbounded.
    pub fn minus_one(self) -> Radius {
        match self {
            Radius::Hops(0) | Radius::Unbounded => Radius::Unbounded,
            Radius::Hops(hops) => Radius::Hops(hops - 1),
        }
    }
}

impl Default for Radius {
    fn default() -> Self {
        Radius::Hops(2)
    }
}

impl From<i64> for Radius {
    /// Negative values mean unbounded.
    fn from(value: i64) -> Self {
        u32::try_from(value).map(Radius::Hops).unwrap_or(Radius::Unbounded)
    }
}

impl FromStr for Radius {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Radius::from)
            .map_err(|_| SignatureError::InvalidInput(format!("radius must be an integer, got '{s}'")))
    }
}

impl Display for Radius {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Radius::Hops(hops) => write!(f, "{hops}"),
            Radius::Unbounded => write!(f, "-1"),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SignatureError::InvalidInput(format!("{key} expects a boolean, got '{value}'")).into()),
    }
}

impl RenderOptions {
    /// Sets a rendering flag by its camelCase name.
    ///
    /// Unknown names are logged and skipped.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "isomericSmiles" => self.isomeric_smiles = parse_flag(key, value)?,
            "allBondsExplicit" => self.all_bonds_explicit = parse_flag(key, value)?,
            "allHsExplicit" => self.all_hs_explicit = parse_flag(key, value)?,
            "kekuleSmiles" => self.kekule_smiles = parse_flag(key, value)?,
            _ => warn!(
                "{} (value: {value}), skipping argument.",
                SignatureError::UnsupportedOption(key.to_string())
            ),
        }
        Ok(())
    }

    /// Default flags updated with `pairs`, in order.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key, value)?;
        }
        Ok(options)
    }
}

/// Parameters of atom and molecule signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureOptions {
    pub radius: Radius,
    /// Size of the Morgan bit space; 0 disables Morgan bits.
    pub nbits: usize,
    /// Let chirality into the Morgan invariants.
    pub use_stereo: bool,
    /// Keep a dummy atom `*` at each bond leaving the environment.
    pub boundary_bonds: bool,
    /// Label the atom a signature is computed for with map number 1.
    pub map_root: bool,
    /// Start the written environment at its own atom.
    pub rooted: bool,
    pub render: RenderOptions,
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self {
            radius: Radius::default(),
            nbits: 2048,
            use_stereo: true,
            boundary_bonds: false,
            map_root: true,
            rooted: false,
            render: RenderOptions::default(),
        }
    }
}

impl SignatureOptions {
    /// Sets an option by name. Rendering flags are forwarded to [`RenderOptions::set`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "radius" => self.radius = value.parse()?,
            "nbits" => self.nbits = parse_count(key, value)?,
            "nBits" => {
                warn!("nBits is deprecated, use nbits instead.");
                self.nbits = parse_count(key, value)?;
            }
            "all_bits" => warn!("all_bits option is deprecated, it will be removed soon."),
            "use_stereo" => self.use_stereo = parse_flag(key, value)?,
            "boundary_bonds" => self.boundary_bonds = parse_flag(key, value)?,
            "map_root" => self.map_root = parse_flag(key, value)?,
            "rooted" => self.rooted = parse_flag(key, value)?,
            _ => self.render.set(key, value)?,
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidInput(format!("{key} expects a non-negative integer, got '{value}'")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius() {
        assert_eq!(Radius::from(-1), Radius::Unbounded);
        assert_eq!("3".parse::<Radius>(), Ok(Radius::Hops(3)));
        assert_eq!(Radius::Hops(0).minus_one(), Radius::Unbounded);
        assert_eq!(Radius::Hops(2).minus_one(), Radius::Hops(1));
        assert_eq!(Radius::Unbounded.resolve(7), 7);
        assert_eq!(Radius::Unbounded.to_string(), "-1");
        assert!("two".parse::<Radius>().is_err());
    }

    #[test]
    fn test_render_options_from_pairs() {
        let options = RenderOptions::from_pairs([("kekuleSmiles", "true"), ("unknownFlag", "1")])
            .expect("unknown options are skipped");
        assert!(options.kekule_smiles);
        assert!(options.all_bonds_explicit);
    }

    #[test]
    fn test_bad_flag_value() {
        let err = RenderOptions::from_pairs([("allHsExplicit", "maybe")]).expect_err("not a boolean");
        assert!(matches!(
            err.downcast_ref::<SignatureError>(),
            Some(SignatureError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deprecated_names() {
        let mut options = SignatureOptions::default();
        options.set("nBits", "1024").expect("deprecated name still applies");
        options.set("all_bits", "true").expect("deprecated name is ignored");
        options.set("radius", "-1").expect("radius parses");
        options.set("allBondsExplicit", "false").expect("render flag forwards");
        assert_eq!(options.nbits, 1024);
        assert_eq!(options.radius, Radius::Unbounded);
        assert!(!options.render.all_bonds_explicit);
    }
}
