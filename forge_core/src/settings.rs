//! # Calculation Settings
//!
//! Options shared by every explosion and buildability call. Settings load
//! from an optional JSON file (see [`crate::file_io::load_settings`]); any
//! field left out of the file takes its default.
//!
//! ```json
//! {
//!   "include_scrap": true,
//!   "min_yield": 0.01,
//!   "respect_reservations": true,
//!   "max_depth": 64
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::bom::ExplodeOptions;
use crate::errors::{ForgeError, ForgeResult};

/// Default floor applied to `yield_pct` before dividing by it
pub const DEFAULT_MIN_YIELD: f64 = 0.01;

/// Default bound on BOM nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Global calculation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcSettings {
    /// Apply each row's scrap rate during explosion
    pub include_scrap: bool,

    /// Yield floor; rows with a lower yield are treated as this value
    pub min_yield: f64,

    /// Subtract reserved quantity from on-hand stock
    pub respect_reservations: bool,

    /// Maximum nesting depth before an explosion is abandoned
    pub max_depth: usize,
}

impl Default for CalcSettings {
    fn default() -> Self {
        CalcSettings {
            include_scrap: true,
            min_yield: DEFAULT_MIN_YIELD,
            respect_reservations: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CalcSettings {
    /// Validate setting values.
    pub fn validate(&self) -> ForgeResult<()> {
        if !(self.min_yield > 0.0 && self.min_yield <= 1.0) {
            return Err(ForgeError::invalid_input(
                "min_yield",
                self.min_yield.to_string(),
                "Yield floor must be in (0, 1]",
            ));
        }
        if self.max_depth == 0 {
            return Err(ForgeError::invalid_input(
                "max_depth",
                "0",
                "Depth bound must allow at least one level",
            ));
        }
        Ok(())
    }

    /// Options for [`crate::bom::explode`].
    pub fn explode_options(&self) -> ExplodeOptions {
        ExplodeOptions {
            include_scrap: self.include_scrap,
            min_yield: self.min_yield,
            max_depth: self.max_depth,
        }
    }
}
