//! Read-only tree sequence view consumed by both generators.
//!
//! A genealogy is the ancestry of `sample_count` sampled genomes across a
//! genome of length `sequence_length`, encoded as a node table with times
//! and an edge table of half-open inheritance intervals. Samples occupy the
//! low node ids `0..sample_count`.
//!
//! The view is produced by a separate simulation/ingestion component; this
//! crate only reads it. Mutation output can be re-attached with
//! [`Genealogy::attach`] so the haplotype generator can consume it.

use itertools::Itertools;
use smallvec::{SmallVec, smallvec};

use crate::errors::{Result, TreemutError};
use crate::tables::{MutationRow, MutationTable, SiteTable};

pub type NodeId = u32;

/// Half-open inheritance interval: `child` inherits from `parent` over
/// `[left, right)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub left: f64,
    pub right: f64,
    pub parent: NodeId,
    pub child: NodeId,
}

#[derive(Debug, Clone)]
pub struct Genealogy {
    sequence_length: f64,
    node_time: Vec<f64>,
    sample_count: usize,
    edges: Vec<Edge>,
    sites: SiteTable,
    mutations: MutationTable,
}

impl Genealogy {
    pub fn new(
        sequence_length: f64,
        node_time: Vec<f64>,
        sample_count: usize,
        edges: Vec<Edge>,
    ) -> Result<Self> {
        if !sequence_length.is_finite() || sequence_length <= 0. {
            return Err(TreemutError::InvalidConfiguration(format!(
                "sequence length must be positive and finite, got {sequence_length}"
            )));
        }
        if sample_count > node_time.len() {
            return Err(TreemutError::InvalidConfiguration(format!(
                "{} samples but only {} nodes",
                sample_count,
                node_time.len()
            )));
        }
        for (index, edge) in edges.iter().enumerate() {
            if (edge.parent as usize) >= node_time.len() || (edge.child as usize) >= node_time.len()
            {
                return Err(TreemutError::OutOfBounds(format!(
                    "edge {index} references a node outside the node table"
                )));
            }
            if !(edge.left < edge.right) || edge.left < 0. || edge.right > sequence_length {
                return Err(TreemutError::InvalidConfiguration(format!(
                    "edge {index} interval [{}, {}) is malformed",
                    edge.left, edge.right
                )));
            }
            if edge.parent == edge.child {
                return Err(TreemutError::InvalidConfiguration(format!(
                    "edge {index} makes node {} its own ancestor",
                    edge.parent
                )));
            }
            if node_time[edge.parent as usize] < node_time[edge.child as usize] {
                return Err(TreemutError::InvalidConfiguration(format!(
                    "edge {index} has parent younger than child"
                )));
            }
        }
        Ok(Self {
            sequence_length,
            node_time,
            sample_count,
            edges,
            sites: SiteTable::new(),
            mutations: MutationTable::new(),
        })
    }

    pub fn sequence_length(&self) -> f64 {
        self.sequence_length
    }

    pub fn node_count(&self) -> usize {
        self.node_time.len()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn time(&self, node: NodeId) -> Result<f64> {
        self.node_time
            .get(node as usize)
            .copied()
            .ok_or_else(|| TreemutError::OutOfBounds(format!("node {node} outside node table")))
    }

    pub fn sites(&self) -> &SiteTable {
        &self.sites
    }

    pub fn mutations(&self) -> &MutationTable {
        &self.mutations
    }

    pub fn num_mutations(&self) -> usize {
        self.mutations.len()
    }

    /// Re-attaches generator output to the genealogy. Sites must be in
    /// strictly increasing position order within `[0, sequence_length)` and
    /// mutation rows must reference valid sites and nodes.
    pub fn attach(&mut self, sites: SiteTable, mutations: MutationTable) -> Result<()> {
        for (id, row) in sites.iter().enumerate() {
            if row.position < 0. || row.position >= self.sequence_length {
                return Err(TreemutError::InvalidConfiguration(format!(
                    "site {id} position {} outside [0, {})",
                    row.position, self.sequence_length
                )));
            }
        }
        if !sites.iter().tuple_windows().all(|(a, b)| a.position < b.position) {
            return Err(TreemutError::InvalidConfiguration(
                "site positions must be strictly increasing".to_string(),
            ));
        }
        for (id, row) in mutations.iter().enumerate() {
            if row.site >= sites.len() {
                return Err(TreemutError::OutOfBounds(format!(
                    "mutation {id} references missing site {}",
                    row.site
                )));
            }
            if (row.node as usize) >= self.node_count() {
                return Err(TreemutError::OutOfBounds(format!(
                    "mutation {id} references node {} outside node table",
                    row.node
                )));
            }
        }
        // tree iteration maps mutation row order onto sorted-site columns
        if !mutations.iter().tuple_windows().all(|(a, b)| a.site <= b.site) {
            return Err(TreemutError::InvalidConfiguration(
                "mutation rows must be sorted by site".to_string(),
            ));
        }
        log::debug!(
            "attached {} sites and {} mutations to genealogy",
            sites.len(),
            mutations.len()
        );
        self.sites = sites;
        self.mutations = mutations;
        Ok(())
    }

    /// Left-to-right iterator over the marginal trees between breakpoints.
    pub fn trees(&self) -> TreeIter<'_> {
        let breakpoints: Vec<f64> = self
            .edges
            .iter()
            .flat_map(|edge| [edge.left, edge.right])
            .chain([0., self.sequence_length])
            .sorted_by(f64::total_cmp)
            .dedup_by(|a, b| a.total_cmp(b).is_eq())
            .collect();
        TreeIter {
            genealogy: self,
            breakpoints,
            next: 0,
            mutation_cursor: 0,
        }
    }
}

/// A mutation as seen from one local tree: its column in the haplotype
/// matrix and the node it is recorded on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeMutation {
    pub column: usize,
    pub node: NodeId,
}

/// The genealogical tree valid over one interval between two breakpoints.
pub struct LocalTree<'a> {
    genealogy: &'a Genealogy,
    left: f64,
    right: f64,
    children: Vec<SmallVec<[NodeId; 2]>>,
    first_column: usize,
    mutations: &'a [MutationRow],
}

impl LocalTree<'_> {
    pub fn interval(&self) -> (f64, f64) {
        (self.left, self.right)
    }

    pub fn num_mutations(&self) -> usize {
        self.mutations.len()
    }

    /// Mutations whose site position falls inside this tree's interval.
    pub fn mutations(&self) -> impl Iterator<Item = TreeMutation> + '_ {
        self.mutations
            .iter()
            .enumerate()
            .map(|(offset, row)| TreeMutation {
                column: self.first_column + offset,
                node: row.node,
            })
    }

    /// Descendant samples of `node` within this local tree.
    pub fn samples_below(&self, node: NodeId) -> Result<Vec<NodeId>> {
        if (node as usize) >= self.children.len() {
            return Err(TreemutError::OutOfBounds(format!(
                "node {node} outside node table"
            )));
        }
        let mut samples = Vec::new();
        let mut stack: SmallVec<[NodeId; 16]> = smallvec![node];
        while let Some(current) = stack.pop() {
            if (current as usize) < self.genealogy.sample_count {
                samples.push(current);
            }
            stack.extend(self.children[current as usize].iter().copied());
        }
        Ok(samples)
    }
}

pub struct TreeIter<'a> {
    genealogy: &'a Genealogy,
    breakpoints: Vec<f64>,
    next: usize,
    mutation_cursor: usize,
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = LocalTree<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next + 1 >= self.breakpoints.len() {
            return None;
        }
        let left = self.breakpoints[self.next];
        let right = self.breakpoints[self.next + 1];
        self.next += 1;

        // edges span whole inter-breakpoint intervals, so covering the left
        // endpoint covers the tree
        let mut children: Vec<SmallVec<[NodeId; 2]>> =
            vec![SmallVec::new(); self.genealogy.node_count()];
        for edge in &self.genealogy.edges {
            if edge.left <= left && right <= edge.right {
                children[edge.parent as usize].push(edge.child);
            }
        }

        let sites = &self.genealogy.sites;
        let mutations = &self.genealogy.mutations;
        let first_column = self.mutation_cursor;
        while self.mutation_cursor < mutations.len()
            && sites[mutations[self.mutation_cursor].site].position < right
        {
            self.mutation_cursor += 1;
        }

        Some(LocalTree {
            genealogy: self.genealogy,
            left,
            right,
            children,
            first_column,
            mutations: &mutations[first_column..self.mutation_cursor],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // four samples under a balanced history: 4 joins (0, 1), 5 joins (4, 2),
    // 6 joins (5, 3)
    fn balanced_genealogy() -> Genealogy {
        let node_time = vec![0., 0., 0., 0., 10., 20., 30.];
        let edges = vec![
            Edge { left: 0., right: 100., parent: 4, child: 0 },
            Edge { left: 0., right: 100., parent: 4, child: 1 },
            Edge { left: 0., right: 100., parent: 5, child: 4 },
            Edge { left: 0., right: 100., parent: 5, child: 2 },
            Edge { left: 0., right: 100., parent: 6, child: 5 },
            Edge { left: 0., right: 100., parent: 6, child: 3 },
        ];
        Genealogy::new(100., node_time, 4, edges).unwrap()
    }

    #[test]
    fn rejects_parent_younger_than_child() {
        let edges = vec![Edge { left: 0., right: 1., parent: 0, child: 1 }];
        let result = Genealogy::new(1., vec![0., 10.], 1, edges);
        assert!(matches!(
            result,
            Err(TreemutError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_self_edge() {
        // a node inheriting from itself would never terminate descendant
        // traversal
        let edges = vec![Edge { left: 0., right: 1., parent: 0, child: 0 }];
        let result = Genealogy::new(1., vec![0.], 1, edges);
        assert!(matches!(
            result,
            Err(TreemutError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_edge_outside_node_table() {
        let edges = vec![Edge { left: 0., right: 1., parent: 7, child: 0 }];
        let result = Genealogy::new(1., vec![0., 1.], 1, edges);
        assert!(matches!(result, Err(TreemutError::OutOfBounds(_))));
    }

    #[test]
    fn single_tree_covers_whole_sequence() {
        let genealogy = balanced_genealogy();
        let trees: Vec<_> = genealogy.trees().collect();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].interval(), (0., 100.));
    }

    #[test]
    fn samples_below_walks_descendants() {
        let genealogy = balanced_genealogy();
        let tree = genealogy.trees().next().unwrap();
        let mut below_root = tree.samples_below(6).unwrap();
        below_root.sort();
        assert_eq!(below_root, vec![0, 1, 2, 3]);
        let mut below_first_join = tree.samples_below(4).unwrap();
        below_first_join.sort();
        assert_eq!(below_first_join, vec![0, 1]);
        assert_eq!(tree.samples_below(3).unwrap(), vec![3]);
        assert!(matches!(
            tree.samples_below(7),
            Err(TreemutError::OutOfBounds(_))
        ));
    }

    #[test]
    fn breakpoints_split_trees_and_partition_mutations() {
        let node_time = vec![0., 0., 5., 5.];
        let edges = vec![
            Edge { left: 0., right: 50., parent: 2, child: 0 },
            Edge { left: 0., right: 50., parent: 2, child: 1 },
            Edge { left: 50., right: 100., parent: 3, child: 0 },
            Edge { left: 50., right: 100., parent: 3, child: 1 },
        ];
        let mut genealogy = Genealogy::new(100., node_time, 2, edges).unwrap();

        let mut sites = SiteTable::new();
        let mut mutations = MutationTable::new();
        for (position, node) in [(10., 0), (60., 1), (80., 0)] {
            let site = sites.add_row(position, '0', Vec::new()).unwrap();
            mutations.add_row(site, node, None, '1', Vec::new()).unwrap();
        }
        genealogy.attach(sites, mutations).unwrap();

        let trees: Vec<_> = genealogy.trees().collect();
        assert_eq!(trees.len(), 2);
        let first: Vec<_> = trees[0].mutations().collect();
        let second: Vec<_> = trees[1].mutations().collect();
        assert_eq!(first, vec![TreeMutation { column: 0, node: 0 }]);
        assert_eq!(
            second,
            vec![
                TreeMutation { column: 1, node: 1 },
                TreeMutation { column: 2, node: 0 },
            ]
        );
    }

    #[test]
    fn attach_rejects_unsorted_sites() {
        let mut genealogy = balanced_genealogy();
        let mut sites = SiteTable::new();
        sites.add_row(50., '0', Vec::new()).unwrap();
        sites.add_row(10., '0', Vec::new()).unwrap();
        let result = genealogy.attach(sites, MutationTable::new());
        assert!(matches!(
            result,
            Err(TreemutError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn attach_rejects_mutations_unsorted_by_site() {
        let mut genealogy = balanced_genealogy();
        let mut sites = SiteTable::new();
        sites.add_row(20., '0', Vec::new()).unwrap();
        sites.add_row(60., '0', Vec::new()).unwrap();
        let mut mutations = MutationTable::new();
        // revisits site 0 after site 1: column order no longer matches
        // sorted-site order
        for site in [0, 1, 0] {
            mutations.add_row(site, 0, None, '1', Vec::new()).unwrap();
        }
        let result = genealogy.attach(sites, mutations);
        assert!(matches!(
            result,
            Err(TreemutError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn attach_rejects_dangling_mutation() {
        let mut genealogy = balanced_genealogy();
        let mut mutations = MutationTable::new();
        mutations.add_row(0, 0, None, '1', Vec::new()).unwrap();
        let result = genealogy.attach(SiteTable::new(), mutations);
        assert!(matches!(result, Err(TreemutError::OutOfBounds(_))));
    }
}
