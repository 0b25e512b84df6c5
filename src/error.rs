//! Errors raised by the augmentation engine and the text loaders.

use thiserror::Error;

use crate::molecule::Element;

/// Contract violations detected by the library.
///
/// Candidates that merely exceed a capacity are filtered silently and never
/// surface as an [`Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("automorphism search needs at least one vertex")]
    EmptyGraph,
    #[error("no capacity is configured for element {0}")]
    UnknownElement(Element),
    #[error("bond order {0} is not a single, double, or triple bond")]
    BondOrder(u32),
    #[error("extension has {found} bond orders but the parent has {expected} atoms")]
    ExtensionLength { expected: usize, found: usize },
    #[error("atom {index} is out of range for a molecule with {count} atoms")]
    AtomIndex { index: usize, count: usize },
    #[error("atoms {0} and {1} are already bonded")]
    DuplicateBond(usize, usize),
    #[error("atom {0} cannot bond to itself")]
    SelfLoop(usize),
    #[error("no element is available for atom {0}")]
    ElementsExhausted(usize),
    #[error("{0:?} is not a permutation")]
    InvalidPermutation(Vec<usize>),
    #[error("permutation of degree {found} used where degree {expected} is required")]
    DegreeMismatch { expected: usize, found: usize },
    #[error("invalid partition: {0}")]
    InvalidPartition(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Malformed molecule strings, formulas, and capacity overrides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown element symbol {0:?}")]
    Element(String),
    #[error("unexpected token {0:?}")]
    Token(String),
    #[error("atom label {found} appears where label {expected} was expected")]
    AtomLabel { expected: usize, found: usize },
    #[error("malformed bond {0:?}")]
    Bond(String),
    #[error("malformed formula {0:?}")]
    Formula(String),
    #[error("malformed capacity override {0:?}, expected e.g. N=3:3")]
    Capacity(String),
}
