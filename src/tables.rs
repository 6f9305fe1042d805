//! Append-only output tables for placed sites and mutations.
//!
//! Row shapes follow the downstream table interchange convention: one site
//! row per mutated position in strictly increasing position order, one
//! mutation row per state transition. Serialization of the tables is the
//! concern of collaborating components, not of this crate.

use derive_more::Deref;

use crate::errors::{Result, TreemutError};
use crate::genealogy::NodeId;

pub type SiteId = usize;
pub type MutationId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteRow {
    pub position: f64,
    pub ancestral_state: char,
    pub metadata: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationRow {
    pub site: SiteId,
    pub node: NodeId,
    /// Back-reference to an earlier mutation at the same site. Always `None`
    /// for generated mutations; retained for imported tables.
    pub parent: Option<MutationId>,
    pub derived_state: char,
    pub metadata: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct SiteTable {
    rows: Vec<SiteRow>,
}

impl SiteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(
        &mut self,
        position: f64,
        ancestral_state: char,
        metadata: Vec<u8>,
    ) -> Result<SiteId> {
        self.rows
            .try_reserve(1)
            .map_err(|_| TreemutError::ResourceExhausted("site table cannot grow".to_string()))?;
        self.rows.push(SiteRow {
            position,
            ancestral_state,
            metadata,
        });
        Ok(self.rows.len() - 1)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct MutationTable {
    rows: Vec<MutationRow>,
}

impl MutationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(
        &mut self,
        site: SiteId,
        node: NodeId,
        parent: Option<MutationId>,
        derived_state: char,
        metadata: Vec<u8>,
    ) -> Result<MutationId> {
        self.rows.try_reserve(1).map_err(|_| {
            TreemutError::ResourceExhausted("mutation table cannot grow".to_string())
        })?;
        self.rows.push(MutationRow {
            site,
            node,
            parent,
            derived_state,
            metadata,
        });
        Ok(self.rows.len() - 1)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_row_returns_sequential_ids() {
        let mut sites = SiteTable::new();
        assert_eq!(sites.add_row(0.25, '0', Vec::new()).unwrap(), 0);
        assert_eq!(sites.add_row(0.75, '0', Vec::new()).unwrap(), 1);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[1].position, 0.75);
    }

    #[test]
    fn mutation_rows_link_back_to_sites() {
        let mut sites = SiteTable::new();
        let mut mutations = MutationTable::new();
        let site = sites.add_row(0.5, 'A', Vec::new()).unwrap();
        let id = mutations.add_row(site, 3, None, 'G', Vec::new()).unwrap();
        assert_eq!(id, 0);
        assert_eq!(mutations[0].site, site);
        assert_eq!(mutations[0].parent, None);
    }

    #[test]
    fn clear_discards_all_rows() {
        let mut sites = SiteTable::new();
        sites.add_row(0.5, '0', Vec::new()).unwrap();
        sites.clear();
        assert!(sites.is_empty());
    }
}
