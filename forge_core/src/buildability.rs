//! # Buildability
//!
//! Given per-unit requirements and a stock count, find how many whole units
//! can be built and which components stop the count from going higher.
//!
//! ## Method
//!
//! ```text
//! available        = max(0, on_hand − reserved)     (reserved ignored on request)
//! candidate_builds = floor(available / req_per_unit) (for every req > 0)
//! max_buildable    = min(candidate_builds)           (0 if nothing is required)
//! limiting         = every component with candidate_builds == max_buildable
//! ```
//!
//! A required SKU missing from stock has zero availability and immediately
//! limits the build to zero. Nothing here can fail.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bom::Requirements;
use crate::snapshot::{Sku, StockRow};

/// How many units one component's stock allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCapacity {
    pub sku: Sku,
    pub available: f64,
    pub req_per_unit: f64,
    pub candidate_builds: u64,
}

/// Maximum buildable quantity and the components that bind it.
///
/// ## JSON Example
///
/// ```json
/// {
///   "max_buildable": 3,
///   "limiting_components": [
///     { "sku": "B", "available": 3.0, "req_per_unit": 1.0, "candidate_builds": 3 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buildability {
    pub max_buildable: u64,

    /// Every component tied for the smallest candidate count, in
    /// requirement order
    pub limiting_components: Vec<ComponentCapacity>,
}

impl Buildability {
    pub fn is_limited_by(&self, sku: &str) -> bool {
        self.limiting_components.iter().any(|c| c.sku == sku)
    }
}

/// Available quantity per SKU.
///
/// Built once per stock snapshot. When a SKU has several stock rows the last
/// one wins.
#[derive(Debug, Clone, Default)]
pub struct Availability {
    by_sku: HashMap<Sku, f64>,
}

impl Availability {
    pub fn from_stock(stock: &[StockRow], respect_reservations: bool) -> Self {
        let by_sku = stock
            .iter()
            .map(|row| (row.sku.clone(), row.available(respect_reservations)))
            .collect();
        Availability { by_sku }
    }

    /// Available quantity, 0 when the SKU is not stocked.
    pub fn get(&self, sku: &str) -> f64 {
        self.by_sku.get(sku).copied().unwrap_or(0.0)
    }
}

/// Whole units one component's stock supports.
///
/// Saturates at `u64::MAX` for absurd ratios; the float-to-int cast clamps.
fn candidate_builds(available: f64, req_per_unit: f64) -> u64 {
    (available / req_per_unit).floor() as u64
}

/// Compute the maximum buildable quantity from per-unit requirements.
///
/// SKUs with a requirement of zero or less are skipped and can never be
/// limiting. With no positive requirement at all the result is zero, not
/// unbounded.
///
/// # Example
///
/// ```rust
/// use forge_core::bom::Requirements;
/// use forge_core::buildability::compute_max_buildable;
/// use forge_core::snapshot::StockRow;
///
/// let reqs: Requirements = vec![("A".to_string(), 2.0), ("B".to_string(), 1.0)]
///     .into_iter()
///     .collect();
/// let stock = vec![StockRow::new("A", 10.0, 2.0), StockRow::new("B", 3.0, 0.0)];
///
/// let result = compute_max_buildable(&reqs, &stock, true);
/// assert_eq!(result.max_buildable, 3);
/// assert!(result.is_limited_by("B"));
/// ```
pub fn compute_max_buildable(
    reqs: &Requirements,
    stock: &[StockRow],
    respect_reservations: bool,
) -> Buildability {
    let availability = Availability::from_stock(stock, respect_reservations);
    compute_with_availability(reqs, &availability)
}

/// Same as [`compute_max_buildable`] against a prebuilt [`Availability`],
/// for callers checking many assemblies against one stock snapshot.
pub fn compute_with_availability(reqs: &Requirements, availability: &Availability) -> Buildability {
    let candidates: Vec<ComponentCapacity> = reqs
        .iter()
        .filter(|(_, req)| *req > 0.0)
        .map(|(sku, req)| {
            let available = availability.get(sku);
            ComponentCapacity {
                sku: sku.to_string(),
                available,
                req_per_unit: req,
                candidate_builds: candidate_builds(available, req),
            }
        })
        .collect();

    let Some(max_buildable) = candidates.iter().map(|c| c.candidate_builds).min() else {
        return Buildability::default();
    };

    let limiting_components = candidates
        .into_iter()
        .filter(|c| c.candidate_builds == max_buildable)
        .collect();

    Buildability {
        max_buildable,
        limiting_components,
    }
}
