//! # BOM Index
//!
//! Groups BOM rows by parent SKU, keeping rows in the order they were
//! supplied. Explosion walks rows in this order, so it is also the
//! floating-point summation order of every result.
//!
//! The index does no validation when built. Malformed rows surface when an
//! explosion reaches them, or all at once through [`BomIndex::validate`].

use std::collections::HashMap;

use crate::errors::ForgeError;
use crate::snapshot::{BomItem, Sku};

/// How the explosion engine must treat a SKU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BomNode<'a> {
    /// No rows under it: accumulate directly into the result
    Leaf,
    /// Expand into `rows`. A phantom reached with no rows expands to nothing.
    Assembly { rows: &'a [BomItem], phantom: bool },
}

/// Read-only adjacency list from parent SKU to its component rows.
///
/// Immutable once built and safe to share across threads, so one index can
/// serve many explosions of different roots.
#[derive(Debug, Clone, Default)]
pub struct BomIndex {
    by_parent: HashMap<Sku, Vec<BomItem>>,
    row_count: usize,
}

impl BomIndex {
    /// Build an index from raw BOM rows.
    ///
    /// # Example
    ///
    /// ```rust
    /// use forge_core::bom::{BomIndex, BomNode};
    /// use forge_core::snapshot::BomItem;
    ///
    /// let index = BomIndex::build(&[
    ///     BomItem::new("PANEL", "FRAME", 1.0),
    ///     BomItem::new("PANEL", "BOLT", 4.0),
    /// ]);
    /// assert_eq!(index.rows("PANEL").len(), 2);
    /// assert_eq!(index.node("BOLT"), BomNode::Leaf);
    /// ```
    pub fn build(rows: &[BomItem]) -> Self {
        let mut by_parent: HashMap<Sku, Vec<BomItem>> = HashMap::new();
        for row in rows {
            by_parent
                .entry(row.parent_assembly_sku.clone())
                .or_default()
                .push(row.clone());
        }
        BomIndex {
            by_parent,
            row_count: rows.len(),
        }
    }

    /// Rows under `parent`, in supplied order; empty for a leaf.
    pub fn rows(&self, parent: &str) -> &[BomItem] {
        self.by_parent.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a SKU by structure alone.
    pub fn node(&self, sku: &str) -> BomNode<'_> {
        match self.by_parent.get(sku) {
            Some(rows) => BomNode::Assembly {
                rows,
                phantom: false,
            },
            None => BomNode::Leaf,
        }
    }

    /// Resolve the component a row points at.
    ///
    /// A component is expanded when it has rows of its own or the row marks
    /// it as a phantom.
    pub fn component_node(&self, row: &BomItem) -> BomNode<'_> {
        match self.node(&row.component_sku) {
            BomNode::Assembly { rows, .. } => BomNode::Assembly {
                rows,
                phantom: row.is_phantom,
            },
            BomNode::Leaf if row.is_phantom => BomNode::Assembly {
                rows: &[],
                phantom: true,
            },
            BomNode::Leaf => BomNode::Leaf,
        }
    }

    pub fn is_assembly(&self, sku: &str) -> bool {
        self.by_parent.contains_key(sku)
    }

    /// Parent SKUs present in the index, sorted for stable output.
    pub fn parents(&self) -> Vec<&str> {
        let mut parents: Vec<&str> = self.by_parent.keys().map(String::as_str).collect();
        parents.sort_unstable();
        parents
    }

    /// Number of rows indexed.
    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Every malformed row, grouped by parent in sorted parent order.
    ///
    /// Explosion stops at the first bad row it meets; this reports them all.
    pub fn validate(&self) -> Vec<ForgeError> {
        self.parents()
            .into_iter()
            .flat_map(|parent| self.rows(parent))
            .filter_map(|row| row.validate().err())
            .collect()
    }
}

/// Free-function form of [`BomIndex::build`].
pub fn build_index(rows: &[BomItem]) -> BomIndex {
    BomIndex::build(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_by_parent_in_order() {
        let index = build_index(&[
            BomItem::new("A", "X", 1.0),
            BomItem::new("B", "Y", 1.0),
            BomItem::new("A", "Z", 2.0),
            BomItem::new("A", "W", 3.0),
        ]);

        let components: Vec<&str> = index
            .rows("A")
            .iter()
            .map(|r| r.component_sku.as_str())
            .collect();
        assert_eq!(components, vec!["X", "Z", "W"]);
        assert_eq!(index.rows("B").len(), 1);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_unknown_parent_has_no_rows() {
        let index = build_index(&[BomItem::new("A", "X", 1.0)]);
        assert!(index.rows("NOPE").is_empty());
        assert_eq!(index.node("NOPE"), BomNode::Leaf);
        assert!(!index.is_assembly("X"));
    }

    #[test]
    fn test_component_node_resolution() {
        let index = build_index(&[
            BomItem::new("A", "SUB", 1.0),
            BomItem::new("A", "KIT", 1.0).phantom(),
            BomItem::new("A", "BOLT", 1.0),
            BomItem::new("SUB", "BOLT", 2.0),
        ]);
        let rows = index.rows("A");

        match index.component_node(&rows[0]) {
            BomNode::Assembly { rows, phantom } => {
                assert_eq!(rows.len(), 1);
                assert!(!phantom);
            }
            BomNode::Leaf => panic!("SUB has rows and must expand"),
        }
        assert_eq!(
            index.component_node(&rows[1]),
            BomNode::Assembly {
                rows: &[],
                phantom: true
            }
        );
        assert_eq!(index.component_node(&rows[2]), BomNode::Leaf);
    }

    #[test]
    fn test_build_accepts_malformed_rows() {
        let index = build_index(&[
            BomItem::new("A", "X", 0.0),
            BomItem::new("A", "Y", 1.0),
            BomItem::new("B", "Z", 1.0).with_losses(0.0, 0.0),
        ]);
        assert_eq!(index.len(), 3);

        let problems = index.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().all(|e| e.error_code() == "INVALID_BOM_ROW"));
    }

    #[test]
    fn test_parents_sorted() {
        let index = build_index(&[
            BomItem::new("C", "X", 1.0),
            BomItem::new("A", "X", 1.0),
            BomItem::new("B", "X", 1.0),
        ]);
        assert_eq!(index.parents(), vec!["A", "B", "C"]);
    }
}
