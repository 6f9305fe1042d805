//! Encoding definitions for mutation state symbols.
//!
//! A mutation is a single transition between two one-character states. The
//! [`Alphabet`] selects which transitions the generator may draw from: a
//! binary `0 -> 1` flag or the twelve ordered nucleotide substitutions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
}

impl Nucleotide {
    pub const fn encode(self) -> char {
        match self {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::T => 'T',
        }
    }

    pub fn try_decode(s: u8) -> Option<Self> {
        match s {
            // ACGT | acgt | 0123 -> Nucleotide
            0x41 | 0x61 | 0x30 | 0x00 => Some(Nucleotide::A),
            0x43 | 0x63 | 0x31 | 0x01 => Some(Nucleotide::C),
            0x47 | 0x67 | 0x32 | 0x02 => Some(Nucleotide::G),
            0x54 | 0x74 | 0x33 | 0x03 => Some(Nucleotide::T),
            _ => None,
        }
    }
}

impl std::fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// One ancestral/derived transition, as it appears in the output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatePair {
    pub ancestral: char,
    pub derived: char,
}

const fn substitution(ancestral: Nucleotide, derived: Nucleotide) -> StatePair {
    StatePair {
        ancestral: ancestral.encode(),
        derived: derived.encode(),
    }
}

const BINARY_PAIRS: [StatePair; 1] = [StatePair {
    ancestral: '0',
    derived: '1',
}];

const NUCLEOTIDE_PAIRS: [StatePair; 12] = [
    substitution(Nucleotide::A, Nucleotide::C),
    substitution(Nucleotide::A, Nucleotide::G),
    substitution(Nucleotide::A, Nucleotide::T),
    substitution(Nucleotide::C, Nucleotide::A),
    substitution(Nucleotide::C, Nucleotide::G),
    substitution(Nucleotide::C, Nucleotide::T),
    substitution(Nucleotide::G, Nucleotide::A),
    substitution(Nucleotide::G, Nucleotide::C),
    substitution(Nucleotide::G, Nucleotide::T),
    substitution(Nucleotide::T, Nucleotide::A),
    substitution(Nucleotide::T, Nucleotide::C),
    substitution(Nucleotide::T, Nucleotide::G),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alphabet {
    #[default]
    Binary,
    Nucleotide,
}

impl Alphabet {
    pub fn state_pairs(self) -> &'static [StatePair] {
        match self {
            Alphabet::Binary => &BINARY_PAIRS,
            Alphabet::Nucleotide => &NUCLEOTIDE_PAIRS,
        }
    }
}
