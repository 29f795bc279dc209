//! # forge_core - BOM Explosion and Buildability Engine
//!
//! `forge_core` is the computational heart of Forgeable. It answers two
//! questions about a manufactured assembly:
//!
//! 1. How much of each leaf part does one unit need, through every level of
//!    sub-assembly and after scrap and yield losses?
//! 2. How many units can be built from the stock on hand, and which parts
//!    are the bottleneck?
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions over an immutable snapshot; nothing here
//!   writes to inventory
//! - **JSON-First**: All inputs and results implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types naming the offending SKU or row
//! - **Reproducible**: Same inputs, same summation order, same bits out
//!
//! ## Quick Start
//!
//! ```rust
//! use forge_core::bom::{build_index, explode, ExplodeOptions};
//! use forge_core::buildability::compute_max_buildable;
//! use forge_core::snapshot::{BomItem, StockRow};
//!
//! let index = build_index(&[
//!     BomItem::new("PANEL", "BOLT", 4.0),
//!     BomItem::new("PANEL", "CABLE-FT", 2.0).with_losses(0.1, 0.9),
//! ]);
//! let reqs = explode("PANEL", &index, &ExplodeOptions::default())?;
//!
//! let stock = vec![StockRow::new("BOLT", 100.0, 0.0), StockRow::new("CABLE-FT", 10.0, 0.0)];
//! let result = compute_max_buildable(&reqs, &stock, true);
//! assert_eq!(result.max_buildable, 4);
//! assert!(result.is_limited_by("CABLE-FT"));
//! # Ok::<(), forge_core::errors::ForgeError>(())
//! ```
//!
//! ## Modules
//!
//! - [`bom`] - BOM index and explosion
//! - [`buildability`] - Maximum buildable quantity and limiting components
//! - [`report`] - Cross-assembly report and build planning
//! - [`snapshot`] - Data model and catalog lookups
//! - [`settings`] - Calculation options
//! - [`errors`] - Structured error types
//! - [`file_io`] - Data folder loading, settings, atomic report saves

pub mod bom;
pub mod buildability;
pub mod errors;
pub mod file_io;
pub mod report;
pub mod settings;
pub mod snapshot;

// Re-export commonly used types at crate root for convenience
pub use bom::{build_index, explode, BomIndex, ExplodeOptions, Requirements};
pub use buildability::{compute_max_buildable, Buildability, ComponentCapacity};
pub use errors::{ForgeError, ForgeResult};
pub use file_io::{load_settings, load_snapshot_dir};
pub use report::{assembly_report, check_snapshot, plan_build, BuildPlan, BuildabilityReport};
pub use settings::CalcSettings;
pub use snapshot::{BomItem, DataSnapshot, Sku, StockRow};
