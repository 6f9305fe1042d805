//! Random point mutations on tree sequences and the haplotypes they imply.
//!
//! The crate consumes a read-only [`genealogy::Genealogy`] produced
//! elsewhere, places Poisson-distributed mutations along its branches with
//! [`mutgen::MutationGenerator`], and turns the annotated genealogy into
//! bit-packed per-sample genotypes with [`hapgen::HaplotypeGenerator`].

pub mod arena;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod genealogy;
pub mod hapgen;
pub mod mutgen;
pub mod site_index;
pub mod tables;
