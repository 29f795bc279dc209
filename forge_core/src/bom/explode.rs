//! # BOM Explosion
//!
//! Expands a root assembly into the total quantity of every leaf part needed
//! for one unit of the root.
//!
//! ## Per-row quantity
//!
//! ```text
//! effective = qty_per × (1 + scrap_rate) / max(yield_pct, min_yield)
//! ```
//!
//! The scrap factor is skipped when `include_scrap` is false. The yield
//! floor keeps a zero or near-zero yield from blowing the quantity up.
//!
//! ## Traversal
//!
//! Depth-first from the root with multiplier 1.0, visiting rows in index
//! order. Sub-assemblies and phantoms push a frame with the composed
//! multiplier; leaves add `multiplier × effective` to their running total.
//! The walk uses an explicit frame stack, so nesting depth is bounded by
//! [`ExplodeOptions::max_depth`] rather than the thread's call stack.
//!
//! A SKU is on the path from the moment its frame is pushed until its rows
//! are exhausted. Meeting a SKU that is already on the path is a cycle; a
//! sub-assembly reused by two sibling branches (a diamond) is not.
//!
//! ## Reproducibility
//!
//! Leaves are accumulated in first-visit order and rows are visited in the
//! order they were supplied. Two explosions of the same inputs therefore
//! perform the same additions in the same order and produce bit-identical
//! totals.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::bom::index::{BomIndex, BomNode};
use crate::errors::{ForgeError, ForgeResult};
use crate::settings::{DEFAULT_MAX_DEPTH, DEFAULT_MIN_YIELD};
use crate::snapshot::{BomItem, Sku};

/// Options controlling one explosion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplodeOptions {
    /// Multiply each row by `1 + scrap_rate`
    pub include_scrap: bool,

    /// Floor applied to `yield_pct` before dividing
    pub min_yield: f64,

    /// Maximum number of nested assembly levels, root included
    pub max_depth: usize,
}

impl Default for ExplodeOptions {
    fn default() -> Self {
        ExplodeOptions {
            include_scrap: true,
            min_yield: DEFAULT_MIN_YIELD,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ExplodeOptions {
    /// Quantity of `row.component_sku` per one unit of its parent.
    pub fn effective_qty(&self, row: &BomItem) -> f64 {
        let mut effective = row.qty_per;
        if self.include_scrap {
            effective *= 1.0 + row.scrap_rate;
        }
        effective / row.yield_pct.max(self.min_yield)
    }
}

/// Leaf SKU -> quantity needed per one unit of root.
///
/// Entries keep first-insertion order. Adding to an existing SKU sums into
/// its entry. Serializes as a JSON object in entry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requirements {
    entries: Vec<(Sku, f64)>,
    positions: HashMap<Sku, usize>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `qty` to the running total for `sku`.
    pub fn add(&mut self, sku: &str, qty: f64) {
        match self.positions.get(sku) {
            Some(&pos) => self.entries[pos].1 += qty,
            None => {
                self.positions.insert(sku.to_string(), self.entries.len());
                self.entries.push((sku.to_string(), qty));
            }
        }
    }

    pub fn get(&self, sku: &str) -> Option<f64> {
        self.positions.get(sku).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.positions.contains_key(sku)
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(sku, qty)| (sku.as_str(), *qty))
    }

    pub fn skus(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(sku, _)| sku.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Sku, f64)> for Requirements {
    fn from_iter<I: IntoIterator<Item = (Sku, f64)>>(iter: I) -> Self {
        let mut reqs = Requirements::new();
        for (sku, qty) in iter {
            reqs.add(&sku, qty);
        }
        reqs
    }
}

impl Serialize for Requirements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (sku, qty) in &self.entries {
            map.serialize_entry(sku, qty)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Requirements {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RequirementsVisitor;

        impl<'de> Visitor<'de> for RequirementsVisitor {
            type Value = Requirements;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of SKU to quantity")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Requirements, A::Error> {
                let mut reqs = Requirements::new();
                while let Some((sku, qty)) = access.next_entry::<Sku, f64>()? {
                    reqs.add(&sku, qty);
                }
                Ok(reqs)
            }
        }

        deserializer.deserialize_map(RequirementsVisitor)
    }
}

/// Per-unit requirements of a root assembly.
pub type RequirementsPerUnit = Requirements;

/// One assembly being expanded.
#[derive(Debug)]
struct Frame<'a> {
    multiplier: f64,
    rows: &'a [BomItem],
    next: usize,
}

/// SKUs currently being expanded, root first.
#[derive(Debug, Default)]
struct TraversalPath<'a> {
    order: Vec<&'a str>,
    members: HashSet<&'a str>,
}

impl<'a> TraversalPath<'a> {
    fn enter(&mut self, sku: &'a str) -> ForgeResult<()> {
        if !self.members.insert(sku) {
            let mut path: Vec<Sku> = self.order.iter().map(|s| s.to_string()).collect();
            path.push(sku.to_string());
            return Err(ForgeError::circular_bom(sku, path));
        }
        self.order.push(sku);
        Ok(())
    }

    fn leave(&mut self) {
        if let Some(sku) = self.order.pop() {
            self.members.remove(sku);
        }
    }

    fn depth(&self) -> usize {
        self.order.len()
    }
}

/// Explode `root` into leaf quantities per one unit of root.
///
/// A root with no rows in the index is its own leaf and yields
/// `{root: 1.0}`. That includes SKUs that exist nowhere in the data; use
/// [`crate::snapshot::Catalog::ensure_known`] first when that matters.
///
/// # Errors
///
/// * `CircularBom` - a SKU was reached from itself; carries the path
/// * `InvalidBomRow` - a visited row has `qty_per <= 0`, `yield_pct <= 0`
///   or a negative scrap rate
/// * `DepthExceeded` - nesting is deeper than `options.max_depth`
///
/// # Example
///
/// ```rust
/// use forge_core::bom::{build_index, explode, ExplodeOptions};
/// use forge_core::snapshot::BomItem;
///
/// let index = build_index(&[BomItem::new("R", "L", 2.0).with_losses(0.1, 0.9)]);
/// let reqs = explode("R", &index, &ExplodeOptions::default())?;
/// assert!((reqs.get("L").unwrap() - 2.0 * 1.1 / 0.9).abs() < 1e-9);
/// # Ok::<(), forge_core::errors::ForgeError>(())
/// ```
pub fn explode(root: &str, index: &BomIndex, options: &ExplodeOptions) -> ForgeResult<Requirements> {
    let mut result = Requirements::new();

    let root_rows = match index.node(root) {
        BomNode::Leaf => {
            result.add(root, 1.0);
            return Ok(result);
        }
        BomNode::Assembly { rows, .. } => rows,
    };

    let mut path = TraversalPath::default();
    let mut stack = vec![Frame {
        multiplier: 1.0,
        rows: root_rows,
        next: 0,
    }];
    path.enter(root)?;

    while let Some(frame) = stack.last_mut() {
        let rows = frame.rows;
        let Some(row) = rows.get(frame.next) else {
            stack.pop();
            path.leave();
            continue;
        };
        frame.next += 1;

        row.validate()?;
        let qty = frame.multiplier * options.effective_qty(row);

        match index.component_node(row) {
            BomNode::Leaf => result.add(&row.component_sku, qty),
            BomNode::Assembly { rows, phantom } => {
                path.enter(&row.component_sku)?;
                if path.depth() > options.max_depth {
                    return Err(ForgeError::DepthExceeded {
                        sku: row.component_sku.clone(),
                        max_depth: options.max_depth,
                    });
                }
                if phantom && rows.is_empty() {
                    warn!(
                        parent = %row.parent_assembly_sku,
                        component = %row.component_sku,
                        "phantom component has no BOM rows and contributes nothing"
                    );
                }
                stack.push(Frame {
                    multiplier: qty,
                    rows,
                    next: 0,
                });
            }
        }
    }

    debug!(root, leaves = result.len(), "exploded BOM");
    Ok(result)
}
