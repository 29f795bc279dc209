//! # Reports
//!
//! Read-only views that combine explosion and buildability:
//!
//! - [`assembly_report`] - buildability of every assembly in the catalog
//! - [`plan_build`] - what a run of N units would consume, and what is short
//! - [`check_snapshot`] - every data problem at once, for fixing the files
//!
//! Neither reserves nor decrements stock; recording a build is somebody
//! else's job.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bom::{explode, BomIndex, Requirements};
use crate::buildability::{compute_with_availability, Availability, Buildability};
use crate::errors::{ForgeError, ForgeResult};
use crate::settings::CalcSettings;
use crate::snapshot::{DataSnapshot, Sku, StockRow};

/// Result of one assembly within a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssemblyOutcome {
    Ok {
        requirements: Requirements,
        buildability: Buildability,
    },
    /// Explosion failed; the error is kept verbatim
    Failed { error: ForgeError },
}

/// One row of a [`BuildabilityReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyBuildability {
    pub assembly_sku: Sku,
    pub name: String,
    #[serde(flatten)]
    pub outcome: AssemblyOutcome,
}

impl AssemblyBuildability {
    pub fn max_buildable(&self) -> Option<u64> {
        match &self.outcome {
            AssemblyOutcome::Ok { buildability, .. } => Some(buildability.max_buildable),
            AssemblyOutcome::Failed { .. } => None,
        }
    }
}

/// Buildability across every known assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildabilityReport {
    pub generated_at: DateTime<Utc>,
    pub settings: CalcSettings,
    pub assemblies: Vec<AssemblyBuildability>,
}

impl BuildabilityReport {
    /// Entries whose explosion failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ForgeError)> + '_ {
        self.assemblies.iter().filter_map(|a| match &a.outcome {
            AssemblyOutcome::Failed { error } => Some((a.assembly_sku.as_str(), error)),
            AssemblyOutcome::Ok { .. } => None,
        })
    }

    pub fn get(&self, assembly_sku: &str) -> Option<&AssemblyBuildability> {
        self.assemblies.iter().find(|a| a.assembly_sku == assembly_sku)
    }
}

/// Explode and rate every assembly in the snapshot.
///
/// Assemblies are taken from the assembly catalog in file order. With an
/// empty catalog, every parent SKU in the BOM is reported instead (sorted).
/// One bad assembly does not sink the report: its entry carries the error
/// and the rest are still computed.
///
/// # Errors
///
/// Only invalid settings fail the whole report.
pub fn assembly_report(snapshot: &DataSnapshot, settings: &CalcSettings) -> ForgeResult<BuildabilityReport> {
    settings.validate()?;

    let index = BomIndex::build(&snapshot.bom_items);
    let availability = Availability::from_stock(&snapshot.stock, settings.respect_reservations);
    let options = settings.explode_options();

    let roots: Vec<(&str, &str)> = if snapshot.assemblies.is_empty() {
        index.parents().into_iter().map(|sku| (sku, "")).collect()
    } else {
        snapshot
            .assemblies
            .iter()
            .map(|a| (a.assembly_sku.as_str(), a.name.as_str()))
            .collect()
    };

    let assemblies: Vec<AssemblyBuildability> = roots
        .into_iter()
        .map(|(sku, name)| {
            let outcome = match explode(sku, &index, &options) {
                Ok(requirements) => {
                    let buildability = compute_with_availability(&requirements, &availability);
                    AssemblyOutcome::Ok {
                        requirements,
                        buildability,
                    }
                }
                Err(error) => {
                    warn!(assembly = sku, %error, "explosion failed");
                    AssemblyOutcome::Failed { error }
                }
            };
            AssemblyBuildability {
                assembly_sku: sku.to_string(),
                name: name.to_string(),
                outcome,
            }
        })
        .collect();

    info!(assemblies = assemblies.len(), "buildability report complete");

    Ok(BuildabilityReport {
        generated_at: Utc::now(),
        settings: settings.clone(),
        assemblies,
    })
}

/// Consumption and shortage of one leaf for a planned run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLine {
    pub sku: Sku,
    pub per_unit: f64,
    pub required: f64,
    pub available: f64,
    /// `max(0, required − available)`
    pub shortage: f64,
}

impl PlanLine {
    pub fn is_short(&self) -> bool {
        self.shortage > 0.0
    }
}

/// What building `quantity` units of an assembly would take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub assembly_sku: Sku,
    pub quantity: u64,
    pub lines: Vec<PlanLine>,
    /// True when no line is short
    pub feasible: bool,
    /// Buildability from the same stock, for reference
    pub buildability: Buildability,
}

impl BuildPlan {
    pub fn shortages(&self) -> impl Iterator<Item = &PlanLine> + '_ {
        self.lines.iter().filter(|l| l.is_short())
    }
}

/// Plan a run of `quantity` units of `root` against a stock snapshot.
///
/// # Errors
///
/// Invalid settings, or any explosion error for `root`.
///
/// # Example
///
/// ```rust
/// use forge_core::bom::BomIndex;
/// use forge_core::report::plan_build;
/// use forge_core::settings::CalcSettings;
/// use forge_core::snapshot::{BomItem, StockRow};
///
/// let index = BomIndex::build(&[BomItem::new("PANEL", "BOLT", 4.0)]);
/// let stock = vec![StockRow::new("BOLT", 30.0, 0.0)];
///
/// let plan = plan_build("PANEL", 10, &index, &stock, &CalcSettings::default())?;
/// assert!(!plan.feasible);
/// assert_eq!(plan.lines[0].shortage, 10.0);
/// # Ok::<(), forge_core::errors::ForgeError>(())
/// ```
pub fn plan_build(
    root: &str,
    quantity: u64,
    index: &BomIndex,
    stock: &[StockRow],
    settings: &CalcSettings,
) -> ForgeResult<BuildPlan> {
    settings.validate()?;

    let requirements = explode(root, index, &settings.explode_options())?;
    let availability = Availability::from_stock(stock, settings.respect_reservations);
    let buildability = compute_with_availability(&requirements, &availability);

    let lines: Vec<PlanLine> = requirements
        .iter()
        .map(|(sku, per_unit)| {
            let required = per_unit * quantity as f64;
            let available = availability.get(sku);
            PlanLine {
                sku: sku.to_string(),
                per_unit,
                required,
                available,
                shortage: (required - available).max(0.0),
            }
        })
        .collect();
    let feasible = !lines.iter().any(PlanLine::is_short);

    Ok(BuildPlan {
        assembly_sku: root.to_string(),
        quantity,
        lines,
        feasible,
        buildability,
    })
}

/// The loop part of a cycle path, rotated to start at its smallest SKU so
/// that `B -> C -> B` and `C -> B -> C` compare equal.
fn cycle_key(sku: &str, path: &[Sku]) -> Vec<Sku> {
    let start = path.iter().position(|p| p == sku).unwrap_or(0);
    let mut members = path[start..path.len().saturating_sub(1).max(start)].to_vec();
    if let Some(min) = members.iter().enumerate().min_by(|a, b| a.1.cmp(b.1)).map(|(i, _)| i) {
        members.rotate_left(min);
    }
    members
}

/// Collect every problem in a snapshot's BOM data.
///
/// Reports, in this order: malformed rows, explosion failures (cycles and
/// depth) per assembly, and BOM SKUs missing from a non-empty catalog.
/// Malformed rows are not reported a second time through explosion.
pub fn check_snapshot(snapshot: &DataSnapshot, settings: &CalcSettings) -> ForgeResult<Vec<ForgeError>> {
    settings.validate()?;

    let index = BomIndex::build(&snapshot.bom_items);
    let mut findings = index.validate();

    // One finding per distinct cycle, however many roots reach it.
    let report = assembly_report(snapshot, settings)?;
    let mut cycles = HashSet::new();
    for (_, error) in report.failures() {
        let fresh = match error {
            ForgeError::InvalidBomRow { .. } => false,
            ForgeError::CircularBom { sku, path } => cycles.insert(cycle_key(sku, path)),
            _ => !findings.contains(error),
        };
        if fresh {
            findings.push(error.clone());
        }
    }

    let catalog = snapshot.catalog();
    if !snapshot.assemblies.is_empty() || !snapshot.parts.is_empty() {
        let mut seen = HashSet::new();
        for row in &snapshot.bom_items {
            for sku in [&row.parent_assembly_sku, &row.component_sku] {
                if !catalog.contains(sku) && seen.insert(sku.as_str()) {
                    findings.push(ForgeError::unknown_sku(sku.as_str()));
                }
            }
        }
    }

    info!(findings = findings.len(), "snapshot check complete");
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Assembly, BomItem};

    fn assembly(sku: &str, name: &str) -> Assembly {
        Assembly {
            assembly_sku: sku.to_string(),
            name: name.to_string(),
            uom: "ea".to_string(),
        }
    }

    fn test_snapshot() -> DataSnapshot {
        DataSnapshot {
            assemblies: vec![assembly("PANEL-A", "Panel A"), assembly("PANEL-B", "Panel B")],
            parts: vec![],
            bom_items: vec![
                BomItem::new("PANEL-A", "BOLT", 4.0),
                BomItem::new("PANEL-A", "FRAME", 1.0),
                BomItem::new("PANEL-B", "LOOP", 1.0),
                BomItem::new("LOOP", "PANEL-B", 1.0),
            ],
            stock: vec![
                StockRow::new("BOLT", 40.0, 0.0),
                StockRow::new("FRAME", 7.0, 2.0),
            ],
        }
    }

    #[test]
    fn test_report_isolates_failures() {
        let report = assembly_report(&test_snapshot(), &CalcSettings::default()).unwrap();
        assert_eq!(report.assemblies.len(), 2);

        let a = report.get("PANEL-A").unwrap();
        assert_eq!(a.name, "Panel A");
        // FRAME: 7 - 2 = 5 available
        assert_eq!(a.max_buildable(), Some(5));

        let b = report.get("PANEL-B").unwrap();
        assert_eq!(b.max_buildable(), None);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "PANEL-B");
        assert_eq!(failures[0].1.error_code(), "CIRCULAR_BOM");
    }

    #[test]
    fn test_report_honors_reservation_setting() {
        let settings = CalcSettings {
            respect_reservations: false,
            ..Default::default()
        };
        let report = assembly_report(&test_snapshot(), &settings).unwrap();
        assert_eq!(report.get("PANEL-A").unwrap().max_buildable(), Some(7));
    }

    #[test]
    fn test_report_without_catalog_uses_bom_parents() {
        let snapshot = DataSnapshot {
            bom_items: vec![BomItem::new("Z", "L", 1.0), BomItem::new("A", "L", 1.0)],
            ..Default::default()
        };
        let report = assembly_report(&snapshot, &CalcSettings::default()).unwrap();
        let skus: Vec<&str> = report.assemblies.iter().map(|a| a.assembly_sku.as_str()).collect();
        assert_eq!(skus, vec!["A", "Z"]);
    }

    #[test]
    fn test_report_rejects_bad_settings() {
        let settings = CalcSettings {
            min_yield: -1.0,
            ..Default::default()
        };
        assert!(assembly_report(&test_snapshot(), &settings).is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let report = assembly_report(&test_snapshot(), &CalcSettings::default()).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"generated_at\""));
    }

    #[test]
    fn test_plan_reports_shortages() {
        let snapshot = test_snapshot();
        let index = BomIndex::build(&snapshot.bom_items);
        let plan = plan_build("PANEL-A", 6, &index, &snapshot.stock, &CalcSettings::default()).unwrap();

        assert!(!plan.feasible);
        assert_eq!(plan.buildability.max_buildable, 5);

        let bolt = &plan.lines[0];
        assert_eq!(bolt.sku, "BOLT");
        assert_eq!(bolt.required, 24.0);
        assert_eq!(bolt.shortage, 0.0);

        let short: Vec<&str> = plan.shortages().map(|l| l.sku.as_str()).collect();
        assert_eq!(short, vec!["FRAME"]);
        assert_eq!(plan.lines[1].shortage, 1.0);
    }

    #[test]
    fn test_plan_feasible_at_max_buildable() {
        let snapshot = test_snapshot();
        let index = BomIndex::build(&snapshot.bom_items);
        let plan = plan_build("PANEL-A", 5, &index, &snapshot.stock, &CalcSettings::default()).unwrap();
        assert!(plan.feasible);
        assert_eq!(plan.shortages().count(), 0);
    }

    #[test]
    fn test_check_snapshot_finds_everything() {
        let mut snapshot = test_snapshot();
        snapshot.bom_items.push(BomItem::new("PANEL-A", "WASHER", 0.0));
        snapshot.parts.push(crate::snapshot::Part {
            part_sku: "BOLT".to_string(),
            name: "Bolt".to_string(),
            uom: "ea".to_string(),
        });

        let findings = check_snapshot(&snapshot, &CalcSettings::default()).unwrap();
        let codes: Vec<&str> = findings.iter().map(|e| e.error_code()).collect();

        // WASHER row, PANEL-B cycle, then FRAME/LOOP/WASHER missing from catalog
        assert_eq!(
            codes,
            vec![
                "INVALID_BOM_ROW",
                "CIRCULAR_BOM",
                "UNKNOWN_SKU",
                "UNKNOWN_SKU",
                "UNKNOWN_SKU",
            ]
        );
        assert!(findings.contains(&ForgeError::unknown_sku("LOOP")));
    }

    #[test]
    fn test_check_reports_shared_cycle_once() {
        let snapshot = DataSnapshot {
            assemblies: vec![
                assembly("X", "X"),
                assembly("Y", "Y"),
                assembly("SUB", "Sub"),
                assembly("C", "C"),
            ],
            parts: vec![],
            bom_items: vec![
                BomItem::new("X", "SUB", 1.0),
                BomItem::new("Y", "SUB", 2.0),
                BomItem::new("SUB", "C", 1.0),
                BomItem::new("C", "SUB", 1.0),
            ],
            stock: vec![],
        };

        let findings = check_snapshot(&snapshot, &CalcSettings::default()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0],
            ForgeError::circular_bom("SUB", vec!["X".into(), "SUB".into(), "C".into(), "SUB".into()])
        );
    }

    #[test]
    fn test_cycle_key_ignores_rotation() {
        let a = cycle_key("B", &["R".into(), "B".into(), "C".into(), "B".into()]);
        let b = cycle_key("C", &["C".into(), "B".into(), "C".into()]);
        assert_eq!(a, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_check_clean_snapshot() {
        let snapshot = DataSnapshot {
            bom_items: vec![BomItem::new("A", "L", 1.0)],
            ..Default::default()
        };
        assert!(check_snapshot(&snapshot, &CalcSettings::default()).unwrap().is_empty());
    }

    #[test]
    fn test_plan_propagates_cycle() {
        let snapshot = test_snapshot();
        let index = BomIndex::build(&snapshot.bom_items);
        let err = plan_build("PANEL-B", 1, &index, &snapshot.stock, &CalcSettings::default()).unwrap_err();
        assert!(err.is_data_error());
    }
}
