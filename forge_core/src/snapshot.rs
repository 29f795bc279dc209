//! # Snapshot Data Structures
//!
//! A [`DataSnapshot`] is the immutable input to every calculation: the
//! assembly and part catalogs, the BOM rows linking them, and a stock count.
//! It is loaded once (see [`crate::file_io`]) and never modified by this crate.
//!
//! ## Structure
//!
//! ```text
//! DataSnapshot
//! ├── assemblies: Vec<Assembly>   (assemblies.csv)
//! ├── parts: Vec<Part>            (parts.csv)
//! ├── bom_items: Vec<BomItem>     (bom_items.csv, one parent -> component edge per row)
//! └── stock: Vec<StockRow>        (stock.csv)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use forge_core::snapshot::{BomItem, DataSnapshot, StockRow};
//!
//! let snapshot = DataSnapshot {
//!     bom_items: vec![BomItem::new("PANEL-A", "BOLT-M6", 8.0)],
//!     stock: vec![StockRow::new("BOLT-M6", 100.0, 20.0)],
//!     ..Default::default()
//! };
//!
//! let json = serde_json::to_string_pretty(&snapshot).unwrap();
//! assert!(json.contains("PANEL-A"));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{ForgeError, ForgeResult};

/// Stock keeping unit identifier for a part or assembly.
pub type Sku = String;

/// A buildable assembly (e.g. a panel type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    pub assembly_sku: Sku,
    pub name: String,
    /// Unit of measure, usually "ea"
    pub uom: String,
}

/// A purchased part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub part_sku: Sku,
    pub name: String,
    /// Unit of measure ("ea", "ft", ...)
    pub uom: String,
}

/// One parent -> component edge of the bill of materials.
///
/// ## JSON Example
///
/// ```json
/// {
///   "parent_assembly_sku": "PANEL-A",
///   "component_sku": "CABLE-14AWG",
///   "qty_per": 2.0,
///   "scrap_rate": 0.1,
///   "yield_pct": 0.9,
///   "is_phantom": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomItem {
    pub parent_assembly_sku: Sku,
    pub component_sku: Sku,

    /// Quantity of component per one unit of parent (must be > 0)
    pub qty_per: f64,

    /// Fractional production waste added on top of `qty_per` (>= 0)
    #[serde(default)]
    pub scrap_rate: f64,

    /// Usable fraction of output, in (0, 1]
    #[serde(default = "default_yield_pct")]
    pub yield_pct: f64,

    /// Never stocked or built on its own; always expanded
    #[serde(default)]
    pub is_phantom: bool,
}

fn default_yield_pct() -> f64 {
    1.0
}

impl BomItem {
    /// Create a row with no scrap, full yield and no phantom flag.
    pub fn new(parent: impl Into<Sku>, component: impl Into<Sku>, qty_per: f64) -> Self {
        BomItem {
            parent_assembly_sku: parent.into(),
            component_sku: component.into(),
            qty_per,
            scrap_rate: 0.0,
            yield_pct: 1.0,
            is_phantom: false,
        }
    }

    /// Set scrap rate and yield.
    pub fn with_losses(mut self, scrap_rate: f64, yield_pct: f64) -> Self {
        self.scrap_rate = scrap_rate;
        self.yield_pct = yield_pct;
        self
    }

    /// Mark the component as a phantom assembly.
    pub fn phantom(mut self) -> Self {
        self.is_phantom = true;
        self
    }

    /// Check the row against its invariants.
    ///
    /// NaN fails every check.
    pub fn validate(&self) -> ForgeResult<()> {
        if !(self.qty_per > 0.0) || self.qty_per.is_infinite() {
            return Err(self.invalid("qty_per", self.qty_per, "Quantity per parent must be a positive number"));
        }
        if !(self.yield_pct > 0.0) || self.yield_pct.is_infinite() {
            return Err(self.invalid("yield_pct", self.yield_pct, "Yield must be positive"));
        }
        if !(self.scrap_rate >= 0.0) || self.scrap_rate.is_infinite() {
            return Err(self.invalid("scrap_rate", self.scrap_rate, "Scrap rate cannot be negative"));
        }
        Ok(())
    }

    fn invalid(&self, field: &str, value: f64, reason: &str) -> ForgeError {
        ForgeError::invalid_bom_row(
            self.parent_assembly_sku.as_str(),
            self.component_sku.as_str(),
            field,
            value.to_string(),
            reason,
        )
    }
}

/// On-hand and reserved quantity of one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub sku: Sku,
    pub on_hand_qty: f64,
    #[serde(default)]
    pub reserved_qty: f64,
}

impl StockRow {
    pub fn new(sku: impl Into<Sku>, on_hand_qty: f64, reserved_qty: f64) -> Self {
        StockRow {
            sku: sku.into(),
            on_hand_qty,
            reserved_qty,
        }
    }

    /// Quantity free for production, never negative.
    pub fn available(&self, respect_reservations: bool) -> f64 {
        let reserved = if respect_reservations { self.reserved_qty } else { 0.0 };
        (self.on_hand_qty - reserved).max(0.0)
    }
}

/// Everything a calculation reads, as loaded from the data folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
    pub assemblies: Vec<Assembly>,
    pub parts: Vec<Part>,
    pub bom_items: Vec<BomItem>,
    pub stock: Vec<StockRow>,
}

impl DataSnapshot {
    /// Borrowed catalog lookups over this snapshot.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }
}

/// What a catalog knows about a SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry<'a> {
    Assembly(&'a Assembly),
    Part(&'a Part),
}

impl<'a> CatalogEntry<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            CatalogEntry::Assembly(a) => &a.name,
            CatalogEntry::Part(p) => &p.name,
        }
    }

    pub fn uom(&self) -> &'a str {
        match *self {
            CatalogEntry::Assembly(a) => &a.uom,
            CatalogEntry::Part(p) => &p.uom,
        }
    }
}

/// Assembly and part lookups keyed by SKU.
///
/// Catalog membership decides display grouping and optional strict root
/// checking only; explosion itself works from BOM rows alone.
#[derive(Debug, Clone)]
pub struct Catalog<'a> {
    assemblies: HashMap<&'a str, &'a Assembly>,
    parts: HashMap<&'a str, &'a Part>,
}

impl<'a> Catalog<'a> {
    pub fn new(snapshot: &'a DataSnapshot) -> Self {
        Catalog {
            assemblies: snapshot
                .assemblies
                .iter()
                .map(|a| (a.assembly_sku.as_str(), a))
                .collect(),
            parts: snapshot.parts.iter().map(|p| (p.part_sku.as_str(), p)).collect(),
        }
    }

    /// Look up a SKU, preferring the assembly catalog.
    pub fn get(&self, sku: &str) -> Option<CatalogEntry<'a>> {
        if let Some(assembly) = self.assemblies.get(sku) {
            return Some(CatalogEntry::Assembly(*assembly));
        }
        self.parts.get(sku).map(|part| CatalogEntry::Part(*part))
    }

    pub fn is_assembly(&self, sku: &str) -> bool {
        self.assemblies.contains_key(sku)
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.get(sku).is_some()
    }

    /// Fail with `UnknownSku` unless the SKU is in either catalog.
    ///
    /// The explosion engine treats any SKU without BOM rows as a leaf, so a
    /// typo in a root SKU would otherwise come back as `{typo: 1}`.
    pub fn ensure_known(&self, sku: &str) -> ForgeResult<()> {
        if self.contains(sku) {
            Ok(())
        } else {
            Err(ForgeError::unknown_sku(sku))
        }
    }
}
