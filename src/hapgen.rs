//! Haplotype generator: dense bit-packed genotypes per sample.
//!
//! Built once from a genealogy that already carries mutations and read-only
//! afterwards. One matrix row per sample, one column per mutation in sorted
//! site order; the bit layout is an implementation detail and only the
//! character decoding in [`HaplotypeGenerator::get_haplotype`] is public.

use crate::errors::{Result, TreemutError};
use crate::genealogy::Genealogy;

const WORD_BITS: usize = 64;

pub struct HaplotypeGenerator {
    sample_count: usize,
    num_mutations: usize,
    words_per_row: usize,
    matrix: Vec<u64>,
}

impl HaplotypeGenerator {
    /// Walks the marginal trees and materializes the sample x mutation bit
    /// matrix. Only single-transition mutation tables are supported: one
    /// mutation per site and no parent chains.
    pub fn new(genealogy: &Genealogy) -> Result<Self> {
        let num_mutations = genealogy.num_mutations();
        for (id, row) in genealogy.mutations().iter().enumerate() {
            if row.parent.is_some() {
                return Err(TreemutError::UnsupportedMutations(format!(
                    "mutation {id} extends a state chain at site {}",
                    row.site
                )));
            }
        }
        // rows are sorted by site (enforced on attach), so any duplicate
        // site is adjacent
        if genealogy
            .mutations()
            .windows(2)
            .any(|rows| rows[0].site == rows[1].site)
        {
            return Err(TreemutError::UnsupportedMutations(
                "more than one mutation per site".to_string(),
            ));
        }

        let sample_count = genealogy.sample_count();
        let words_per_row = num_mutations / WORD_BITS + 1;
        let mut matrix = Vec::new();
        matrix
            .try_reserve_exact(sample_count * words_per_row)
            .map_err(|_| {
                TreemutError::ResourceExhausted(format!(
                    "cannot allocate {sample_count} x {words_per_row} haplotype matrix"
                ))
            })?;
        matrix.resize(sample_count * words_per_row, 0);

        let mut generator = Self {
            sample_count,
            num_mutations,
            words_per_row,
            matrix,
        };
        for tree in genealogy.trees() {
            for mutation in tree.mutations() {
                for sample in tree.samples_below(mutation.node)? {
                    generator.set_bit(sample as usize, mutation.column)?;
                }
            }
        }
        log::debug!(
            "built haplotype matrix for {sample_count} samples and {num_mutations} mutations"
        );
        Ok(generator)
    }

    fn set_bit(&mut self, row: usize, column: usize) -> Result<()> {
        let word = column / WORD_BITS;
        let bit = column % WORD_BITS;
        let index = row * self.words_per_row + word;
        if self.matrix[index] & (1 << bit) != 0 {
            return Err(TreemutError::InconsistentMutation {
                sample: row as u32,
                column,
            });
        }
        self.matrix[index] |= 1 << bit;
        Ok(())
    }

    /// Decodes one matrix row into a `{'0','1'}` string of length
    /// `num_mutations`, low bit first within each word.
    pub fn get_haplotype(&self, sample: usize) -> Result<String> {
        if sample >= self.sample_count {
            return Err(TreemutError::OutOfBounds(format!(
                "sample {sample} outside 0..{}",
                self.sample_count
            )));
        }
        let mut haplotype = String::with_capacity(self.num_mutations);
        'decode: for word_offset in 0..self.words_per_row {
            let word = self.matrix[sample * self.words_per_row + word_offset];
            for bit in 0..WORD_BITS {
                if haplotype.len() == self.num_mutations {
                    break 'decode;
                }
                haplotype.push(if (word >> bit) & 1 == 1 { '1' } else { '0' });
            }
        }
        Ok(haplotype)
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn num_mutations(&self) -> usize {
        self.num_mutations
    }

    pub fn print_state(&self, out: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(out, "haplotype generator state")?;
        writeln!(out, "\tnum_mutations = {}", self.num_mutations)?;
        writeln!(out, "\twords_per_row = {}", self.words_per_row)?;
        for sample in 0..self.sample_count {
            let row = &self.matrix[sample * self.words_per_row..][..self.words_per_row];
            writeln!(out, "\t{sample}\t{row:?}")?;
        }
        Ok(())
    }
}
