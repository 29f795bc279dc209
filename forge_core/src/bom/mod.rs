//! # Bill of Materials
//!
//! Turning BOM rows into per-unit leaf requirements takes two steps:
//!
//! - [`index`] - group rows by parent and resolve each SKU to a [`BomNode`]
//! - [`mod@explode`] - walk the tree from a root, applying scrap and yield
//!
//! ## Example
//!
//! ```rust
//! use forge_core::bom::{build_index, explode, ExplodeOptions};
//! use forge_core::snapshot::BomItem;
//!
//! let index = build_index(&[
//!     BomItem::new("PANEL", "HARNESS", 1.0).phantom(),
//!     BomItem::new("HARNESS", "CABLE-FT", 6.0),
//!     BomItem::new("PANEL", "BOLT", 4.0),
//! ]);
//!
//! let reqs = explode("PANEL", &index, &ExplodeOptions::default()).unwrap();
//! assert_eq!(reqs.get("CABLE-FT"), Some(6.0));
//! assert_eq!(reqs.get("HARNESS"), None);
//! ```

pub mod explode;
pub mod index;

pub use explode::{explode, ExplodeOptions, Requirements, RequirementsPerUnit};
pub use index::{build_index, BomIndex, BomNode};
