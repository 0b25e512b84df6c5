// Molecule definition, growth operations
pub mod molecule;

// Text formats
pub mod loader;

// Per-element bonding limits
pub mod capacity;

// Errors
pub mod error;

// Permutations and groups
pub mod permutation;

// Partitions and equitable refinement
pub mod partition;

// The hard bit: automorphism groups and canonical labelings
pub mod automorphism;

// Candidate extensions, filtered by symmetry
pub mod extension;

// Canonical augmentation checks
pub mod canonical;

// Which molecules to report and extend
pub mod validate;

// Consumers of generated molecules
pub mod handler;

// Certificates for duplicate checks
pub mod canonize;

// The search itself
pub mod enumerate;

// Utility functions
mod utils;

// Python library
#[cfg(feature = "python")]
pub mod python;
