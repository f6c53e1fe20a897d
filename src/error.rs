use thiserror::Error;

/// Failures of the signature engines.
///
/// Library functions return `anyhow::Result`; these variants can be recovered
/// with `err.downcast_ref::<SignatureError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No fragment contains atom {0}")]
    EmptyFragment(usize),
    #[error("No atom signature found")]
    EmptySignature,
    #[error("Malformed signature string: {0}")]
    MalformedSignatureString(String),
    #[error("Unsupported option '{0}'")]
    UnsupportedOption(String),
    #[error("Signature has no {0} view")]
    MissingView(&'static str),
    #[error("Empty signature for neighbor atom {0}")]
    EmptyNeighborSignature(usize),
}

/// Failures while reading SMILES or signature patterns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("Unexpected character '{1}' at position {0}")]
    UnexpectedCharacter(usize, char),
    #[error("Unclosed bracket '[' at position {0}")]
    UnclosedBracket(usize),
    #[error("Unknown element '{1}' at position {0}")]
    UnknownElement(usize, String),
    #[error("Bond at position {0} without a preceding atom")]
    BondWithoutAtom(usize),
    #[error("Branch start '(' at position {0} without a current atom")]
    BranchNoCurrentAtom(usize),
    #[error("Branch end ')' at position {0} without a matching '('")]
    BranchEndNoStart(usize),
    #[error("Unclosed branch")]
    UnclosedBranch,
    #[error("Ring closure {1} at position {0} without a current atom")]
    RingClosureNoCurrentAtom(usize, u8),
    #[error("Ring closure {0} is never closed")]
    UnclosedRing(u8),
    #[error("Ring closure at position {0} bonds an atom to itself")]
    SelfBond(usize),
    #[error("Ring closure at position {0} duplicates an existing bond")]
    DuplicateBond(usize),
    #[error("Pattern has no atom mapped to 1")]
    MissingMapRoot,
}
