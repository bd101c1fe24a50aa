//! Read-only sequence capability shared by domains and constructs.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Polymer type used to pick the mass formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polymer {
    Rna,
    Dna,
    SsDna,
}

impl FromStr for Polymer {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rna" => Ok(Polymer::Rna),
            "dna" => Ok(Polymer::Dna),
            "ssdna" => Ok(Polymer::SsDna),
            _ => Err(DomainError::UnrecognizedPolymer(s.to_string())),
        }
    }
}

impl fmt::Display for Polymer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Polymer::Rna => "rna",
            Polymer::Dna => "dna",
            Polymer::SsDna => "ssdna",
        };
        write!(f, "{}", tag)
    }
}

/// Replace every `U` with `T`.
pub fn to_dna(seq: &str) -> String {
    seq.replace('U', "T")
}

/// Replace every `T` with `U`.
pub fn to_rna(seq: &str) -> String {
    seq.replace('T', "U")
}

/// Molar mass (g/mol) of an oligo, assuming the terminal phosphates have been
/// replaced with alcohol groups.
///
/// T and U are counted together, so the same formula works for either
/// alphabet.
pub fn mass(seq: &str, polymer: Polymer) -> f64 {
    let (mut a, mut c, mut g, mut t) = (0u32, 0u32, 0u32, 0u32);
    for b in seq.bytes().map(|b| b.to_ascii_uppercase()) {
        match b {
            b'A' => a += 1,
            b'C' => c += 1,
            b'G' => g += 1,
            b'T' | b'U' => t += 1,
            _ => {}
        }
    }
    let (a, c, g, t) = (a as f64, c as f64, g as f64, t as f64);

    match polymer {
        Polymer::Rna => a * 329.2 + t * 306.2 + c * 305.2 + g * 345.2 + 159.0,
        Polymer::Dna => (a + t) * 617.4 + (g + c) * 618.4 - 124.0,
        Polymer::SsDna => a * 313.2 + t * 304.2 + c * 289.2 + g * 329.2 - 62.0,
    }
}

/// Anything that can produce a nucleotide string.
///
/// Only `seq` is required; every other view is derived from it.
pub trait Sequence {
    fn seq(&self) -> String;

    fn len(&self) -> usize {
        self.seq().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dna(&self) -> String {
        to_dna(&self.seq())
    }

    fn rna(&self) -> String {
        to_rna(&self.seq())
    }

    /// Nucleotide at `index`, if in range.
    fn base(&self, index: usize) -> Option<char> {
        self.seq().chars().nth(index)
    }

    fn indices(&self) -> Range<usize> {
        0..self.len()
    }

    fn mass(&self, polymer: Polymer) -> f64 {
        mass(&self.seq(), polymer)
    }
}
