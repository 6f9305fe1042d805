//! Settings for the mutation generator.

use serde::{Deserialize, Serialize};

use crate::encoding::Alphabet;
use crate::errors::{Result, TreemutError};

/// Smallest granted arena block; smaller requests are rounded up.
pub const MIN_BLOCK_SIZE: usize = 16;

/// Default number of site records per arena block.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MutationSettings {
    /// The mutation rate represents the expected number of mutations per
    /// unit of branch length and unit of genomic distance.
    pub mutation_rate: f64,

    /// The state alphabet mutations are drawn from.
    #[serde(default)]
    pub alphabet: Alphabet,

    /// The number of site records allocated per arena block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl MutationSettings {
    pub fn new(mutation_rate: f64, alphabet: Alphabet) -> Self {
        Self {
            mutation_rate,
            alphabet,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mutation_rate.is_finite() || self.mutation_rate < 0. {
            return Err(TreemutError::InvalidConfiguration(format!(
                "mutation rate must be finite and non-negative, got {}",
                self.mutation_rate
            )));
        }
        if self.block_size == 0 {
            return Err(TreemutError::InvalidConfiguration(
                "arena block size must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MutationSettings {
    fn default() -> Self {
        Self::new(0., Alphabet::Binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_defaults() {
        assert!(MutationSettings::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_rate() {
        let settings = MutationSettings::new(-1e-8, Alphabet::Binary);
        assert!(matches!(
            settings.validate(),
            Err(TreemutError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_block_size() {
        let mut settings = MutationSettings::new(1e-8, Alphabet::Nucleotide);
        settings.block_size = 0;
        assert!(matches!(
            settings.validate(),
            Err(TreemutError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn read_settings_from_yaml() {
        let settings: MutationSettings =
            serde_yaml::from_str("mutation_rate: 1e-8\nalphabet: nucleotide\n").unwrap();
        assert_eq!(settings.alphabet, Alphabet::Nucleotide);
        assert_eq!(settings.block_size, DEFAULT_BLOCK_SIZE);
    }
}
