//! Table and JSON rendering for each command.

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;

use forge_core::bom::Requirements;
use forge_core::buildability::Buildability;
use forge_core::report::{check_snapshot, AssemblyOutcome, BuildPlan, BuildabilityReport};
use forge_core::settings::CalcSettings;
use forge_core::snapshot::{Catalog, DataSnapshot};

use crate::OutputFormat;

const RULE: &str = "═══════════════════════════════════════════════════════════";

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn header(title: &str) {
    println!("{RULE}");
    println!("  {title}");
    println!("{RULE}");
}

fn uom<'a>(catalog: &Catalog<'a>, sku: &str) -> &'a str {
    catalog.get(sku).map(|e| e.uom()).unwrap_or("")
}

fn status_icon(ok: bool) -> &'static str {
    if ok { "[OK]" } else { "[SHORT]" }
}

pub fn requirements(format: OutputFormat, snapshot: &DataSnapshot, root: &str, reqs: &Requirements) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(reqs);
    }

    let catalog = snapshot.catalog();
    header(&format!("REQUIREMENTS PER UNIT: {root}"));
    println!("  {:<24} {:>14}  {}", "Component", "Qty / unit", "UoM");
    for (sku, qty) in reqs.iter() {
        println!("  {:<24} {:>14.4}  {}", sku, qty, uom(&catalog, sku));
    }
    println!("{RULE}");
    Ok(())
}

pub fn buildability(format: OutputFormat, snapshot: &DataSnapshot, root: &str, result: &Buildability) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(result);
    }

    let catalog = snapshot.catalog();
    header(&format!("BUILDABILITY: {root}"));
    println!("  Max buildable: {}", result.max_buildable);
    println!();
    if result.limiting_components.is_empty() {
        println!("  No positive requirements - nothing to build from.");
    } else {
        println!("  Limiting components:");
        println!(
            "  {:<24} {:>12} {:>12} {:>10}  {}",
            "Component", "Available", "Req / unit", "Builds", "UoM"
        );
        for c in &result.limiting_components {
            println!(
                "  {:<24} {:>12.3} {:>12.4} {:>10}  {}",
                c.sku,
                c.available,
                c.req_per_unit,
                c.candidate_builds,
                uom(&catalog, &c.sku)
            );
        }
    }
    println!("{RULE}");
    Ok(())
}

pub fn plan(format: OutputFormat, snapshot: &DataSnapshot, plan: &BuildPlan) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(plan);
    }

    let catalog = snapshot.catalog();
    header(&format!("BUILD PLAN: {} x {}", plan.quantity, plan.assembly_sku));
    println!(
        "  {:<24} {:>12} {:>12} {:>12}  {:<5} {}",
        "Component", "Required", "Available", "Shortage", "UoM", ""
    );
    for line in &plan.lines {
        println!(
            "  {:<24} {:>12.3} {:>12.3} {:>12.3}  {:<5} {}",
            line.sku,
            line.required,
            line.available,
            line.shortage,
            uom(&catalog, &line.sku),
            status_icon(!line.is_short())
        );
    }
    println!();
    println!(
        "  RESULT: {} (max buildable: {})",
        if plan.feasible { "FEASIBLE" } else { "SHORT" },
        plan.buildability.max_buildable
    );
    println!("{RULE}");
    Ok(())
}

pub fn report(format: OutputFormat, report: &BuildabilityReport) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }

    header(&format!(
        "BUILDABILITY REPORT ({})",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    println!("  {:<18} {:<24} {:>8}  {}", "Assembly", "Name", "Max", "Limited by");
    for entry in &report.assemblies {
        match &entry.outcome {
            AssemblyOutcome::Ok { buildability, .. } => {
                let limiting: Vec<&str> = buildability
                    .limiting_components
                    .iter()
                    .map(|c| c.sku.as_str())
                    .collect();
                println!(
                    "  {:<18} {:<24} {:>8}  {}",
                    entry.assembly_sku,
                    entry.name,
                    buildability.max_buildable,
                    limiting.join(", ")
                );
            }
            AssemblyOutcome::Failed { error } => {
                println!("  {:<18} {:<24} {:>8}  {}", entry.assembly_sku, entry.name, "ERROR", error);
            }
        }
    }
    println!("{RULE}");
    Ok(())
}

/// Print every data problem; returns how many were found.
pub fn check(format: OutputFormat, snapshot: &DataSnapshot, settings: &CalcSettings) -> Result<usize> {
    let findings = check_snapshot(snapshot, settings)?;

    if format == OutputFormat::Json {
        print_json(&findings)?;
        return Ok(findings.len());
    }

    header("BOM CHECK");
    println!(
        "  {} assemblies, {} parts, {} BOM rows, {} stock rows",
        snapshot.assemblies.len(),
        snapshot.parts.len(),
        snapshot.bom_items.len(),
        snapshot.stock.len()
    );
    println!();
    if findings.is_empty() {
        println!("  No problems found.");
    } else {
        for finding in &findings {
            println!("  [{}] {}", finding.error_code(), finding);
        }
    }
    println!("{RULE}");
    Ok(findings.len())
}
