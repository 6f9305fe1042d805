//! Mutation generator: Poisson placement of point mutations on the branches
//! of a tree sequence.
//!
//! Each edge carries a Poisson number of mutations with mean
//! `branch_length * distance * mutation_rate`. Positions are drawn uniformly
//! over the edge interval and rejection-sampled against the ordered site
//! index, so one `generate` call never emits two sites at the same position.
//! Records live in the arena for the duration of the call; the sorted site
//! and mutation tables are rebuilt from the index traversal at the end.

use rand::prelude::*;
use rand_distr::Poisson;

use crate::arena::Arena;
use crate::config::MutationSettings;
use crate::encoding::StatePair;
use crate::errors::{Result, TreemutError};
use crate::genealogy::{Genealogy, NodeId};
use crate::site_index::SiteIndex;
use crate::tables::{MutationTable, SiteTable};

/// Draws per mutation before a saturated interval is reported as
/// exhaustion. Collisions on f64 draws over a continuous range are
/// probability-zero in practice, so hitting the cap means the interval has
/// effectively no free positions left.
pub const MAX_POSITION_RETRIES: usize = 64;

#[derive(Debug, Clone, Copy)]
struct PlacedSite {
    position: f64,
    node: NodeId,
    states: StatePair,
}

pub struct MutationGenerator<R: Rng> {
    settings: MutationSettings,
    rng: R,
    arena: Arena<PlacedSite>,
    index: SiteIndex,
    sites: SiteTable,
    mutations: MutationTable,
}

impl<R: Rng> MutationGenerator<R> {
    pub fn new(settings: MutationSettings, rng: R) -> Result<Self> {
        settings.validate()?;
        let arena = Arena::new(settings.block_size)?;
        Ok(Self {
            settings,
            rng,
            arena,
            index: SiteIndex::new(),
            sites: SiteTable::new(),
            mutations: MutationTable::new(),
        })
    }

    pub fn settings(&self) -> &MutationSettings {
        &self.settings
    }

    /// Places mutations on every branch of `genealogy` and rebuilds the
    /// output tables in ascending position order.
    ///
    /// All state from a previous call is discarded first. On error the
    /// tables are left in an unspecified state and must not be consumed.
    pub fn generate(&mut self, genealogy: &Genealogy) -> Result<()> {
        self.index.clear();
        self.arena.reset();
        self.sites.clear();
        self.mutations.clear();

        for edge in genealogy.edges() {
            let branch_length = genealogy.time(edge.parent)? - genealogy.time(edge.child)?;
            let distance = edge.right - edge.left;
            let mu = branch_length * distance * self.settings.mutation_rate;
            if mu <= 0. {
                continue;
            }
            let sampler = Poisson::new(mu).map_err(|err| {
                TreemutError::InvalidConfiguration(format!(
                    "invalid branch mutation mean {mu}: {err}"
                ))
            })?;
            let branch_mutations = sampler.sample(&mut self.rng) as u64;
            for _ in 0..branch_mutations {
                let position = self.draw_position(edge.left, edge.right)?;
                debug_assert!(edge.left <= position && position < edge.right);
                let states = self.choose_states();
                let id = self.arena.alloc(PlacedSite {
                    position,
                    node: edge.child,
                    states,
                })?;
                self.index.insert(position, id);
            }
        }

        let Self {
            arena,
            index,
            sites,
            mutations,
            ..
        } = self;
        for (_, id) in index.iter() {
            let record = arena.get(id).ok_or_else(|| {
                TreemutError::OutOfBounds(format!("stale arena handle {}", id.index()))
            })?;
            let site = sites.add_row(record.position, record.states.ancestral, Vec::new())?;
            mutations.add_row(site, record.node, None, record.states.derived, Vec::new())?;
        }
        log::debug!(
            "placed {} mutations across {} edges",
            self.index.len(),
            genealogy.edges().len()
        );
        Ok(())
    }

    /// Uniform draw in `[left, right)`, re-drawn while the position is
    /// already occupied.
    fn draw_position(&mut self, left: f64, right: f64) -> Result<f64> {
        for _ in 0..MAX_POSITION_RETRIES {
            let position = self.rng.random_range(left..right);
            if !self.index.contains(position) {
                return Ok(position);
            }
        }
        Err(TreemutError::ResourceExhausted(format!(
            "no free position in [{left}, {right}) after {MAX_POSITION_RETRIES} draws"
        )))
    }

    fn choose_states(&mut self) -> StatePair {
        let pairs = self.settings.alphabet.state_pairs();
        pairs[self.rng.random_range(0..pairs.len())]
    }

    pub fn num_mutations(&self) -> usize {
        self.mutations.len()
    }

    pub fn sites(&self) -> &SiteTable {
        &self.sites
    }

    pub fn mutations(&self) -> &MutationTable {
        &self.mutations
    }

    /// Resets the destination tables and copies all generated rows into
    /// them, preserving position order.
    pub fn populate_tables(
        &self,
        sites: &mut SiteTable,
        mutations: &mut MutationTable,
    ) -> Result<()> {
        sites.clear();
        mutations.clear();
        for row in self.sites.iter() {
            sites.add_row(row.position, row.ancestral_state, row.metadata.clone())?;
        }
        for row in self.mutations.iter() {
            mutations.add_row(
                row.site,
                row.node,
                row.parent,
                row.derived_state,
                row.metadata.clone(),
            )?;
        }
        Ok(())
    }

    /// Consumes the generator, handing the output tables to the caller.
    pub fn into_tables(self) -> (SiteTable, MutationTable) {
        (self.sites, self.mutations)
    }

    pub fn print_state(&self, out: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(out, "mutation generator state")?;
        writeln!(out, "\tmutation_rate = {}", self.settings.mutation_rate)?;
        writeln!(out, "\talphabet = {:?}", self.settings.alphabet)?;
        writeln!(out, "\tblock_size = {}", self.settings.block_size)?;
        writeln!(out, "\tnum_mutations = {}", self.num_mutations())?;
        for (site, mutation) in self.sites.iter().zip(self.mutations.iter()) {
            writeln!(
                out,
                "\t{}\t{}\t{}->{}",
                site.position, mutation.node, site.ancestral_state, mutation.derived_state
            )?;
        }
        Ok(())
    }
}
