//! # File I/O Module
//!
//! Reads the data folder and settings, writes reports:
//! - **Shared locks**: each CSV is read under an OS-level shared lock so a
//!   writer on a network drive can't swap it out halfway through a read
//! - **Atomic saves**: reports are written to a .tmp file, synced, then renamed
//!
//! ## Data Folder Layout
//!
//! ```text
//! data/
//! ├── assemblies.csv   assembly_sku,name,uom
//! ├── parts.csv        part_sku,name,uom
//! ├── bom_items.csv    parent_assembly_sku,component_sku,qty_per,scrap_rate,yield_pct,is_phantom
//! └── stock.csv        sku,on_hand_qty,reserved_qty
//! ```
//!
//! Fields are trimmed. `scrap_rate`, `yield_pct`, `is_phantom` and
//! `reserved_qty` columns may be left out entirely and then default to
//! 0, 1, false and 0.
//!
//! ## Example
//!
//! ```rust,no_run
//! use forge_core::file_io::load_snapshot_dir;
//! use std::path::Path;
//!
//! let snapshot = load_snapshot_dir(Path::new("data"))?;
//! println!("{} BOM rows", snapshot.bom_items.len());
//! # Ok::<(), forge_core::errors::ForgeError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

#[cfg(not(target_arch = "wasm32"))]
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::{ForgeError, ForgeResult};
use crate::settings::CalcSettings;
use crate::snapshot::{Assembly, BomItem, DataSnapshot, Part, StockRow};

pub const ASSEMBLIES_FILE: &str = "assemblies.csv";
pub const PARTS_FILE: &str = "parts.csv";
pub const BOM_ITEMS_FILE: &str = "bom_items.csv";
pub const STOCK_FILE: &str = "stock.csv";

/// Open a file for reading and take a shared lock on it.
///
/// The lock is released when the returned handle is dropped.
fn open_shared(path: &Path) -> ForgeResult<File> {
    let file = File::open(path)
        .map_err(|e| ForgeError::file_error("open", path.display().to_string(), e.to_string()))?;

    #[cfg(not(target_arch = "wasm32"))]
    FileExt::lock_shared(&file)
        .map_err(|e| ForgeError::file_error("lock", path.display().to_string(), e.to_string()))?;

    Ok(file)
}

/// Read every record of a headed CSV file.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> ForgeResult<Vec<T>> {
    let file = open_shared(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(&file);

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| ForgeError::SerializationError {
            reason: format!("{}: {}", path.display(), e),
        })?;

    debug!(path = %path.display(), rows = rows.len(), "read CSV");
    Ok(rows)
}

/// Load the four CSV files of a data folder into a snapshot.
///
/// # Returns
///
/// * `Ok(DataSnapshot)` - All files read
/// * `Err(ForgeError::FileError)` - Folder or a file is missing or unreadable
/// * `Err(ForgeError::SerializationError)` - A row failed to parse
pub fn load_snapshot_dir(dir: &Path) -> ForgeResult<DataSnapshot> {
    if !dir.is_dir() {
        return Err(ForgeError::file_error(
            "open data folder",
            dir.display().to_string(),
            "not a directory",
        ));
    }

    let assemblies: Vec<Assembly> = read_csv(&dir.join(ASSEMBLIES_FILE))?;
    let parts: Vec<Part> = read_csv(&dir.join(PARTS_FILE))?;
    let bom_items: Vec<BomItem> = read_csv(&dir.join(BOM_ITEMS_FILE))?;
    let stock: Vec<StockRow> = read_csv(&dir.join(STOCK_FILE))?;

    info!(
        dir = %dir.display(),
        assemblies = assemblies.len(),
        parts = parts.len(),
        bom_items = bom_items.len(),
        stock = stock.len(),
        "data loaded"
    );

    Ok(DataSnapshot {
        assemblies,
        parts,
        bom_items,
        stock,
    })
}

/// Load and validate calculation settings from a JSON file.
pub fn load_settings(path: &Path) -> ForgeResult<CalcSettings> {
    let mut file = open_shared(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ForgeError::file_error("read", path.display().to_string(), e.to_string()))?;

    let settings: CalcSettings =
        serde_json::from_str(&contents).map_err(|e| ForgeError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;
    settings.validate()?;
    Ok(settings)
}

/// Write any serializable value as pretty JSON with atomic write semantics.
///
/// The save process:
/// 1. Serialize to JSON
/// 2. Write to `<path>.tmp`
/// 3. Sync to disk (fsync)
/// 4. Rename over `path`
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> ForgeResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ForgeError::SerializationError {
        reason: e.to_string(),
    })?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut tmp_file = File::create(tmp_path).map_err(|e| {
        ForgeError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        ForgeError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        ForgeError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        ForgeError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::path::PathBuf;

    fn temp_data_dir(name: &str) -> PathBuf {
        let dir = temp_dir().join(format!("forgeable_test_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_fixture(dir: &Path) {
        fs::write(
            dir.join(ASSEMBLIES_FILE),
            "assembly_sku,name,uom\nPANEL-A, Panel A ,ea\n",
        )
        .unwrap();
        fs::write(
            dir.join(PARTS_FILE),
            "part_sku,name,uom\nBOLT,M6 bolt,ea\nCABLE,14 AWG cable,ft\n",
        )
        .unwrap();
        fs::write(
            dir.join(BOM_ITEMS_FILE),
            "parent_assembly_sku,component_sku,qty_per,scrap_rate,yield_pct,is_phantom\n\
             PANEL-A,BOLT,4,0,1,false\n\
             PANEL-A,CABLE,2,0.1,0.9,false\n",
        )
        .unwrap();
        fs::write(
            dir.join(STOCK_FILE),
            "sku,on_hand_qty,reserved_qty\nBOLT,100,20\nCABLE,50.5,0\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_snapshot_dir() {
        let dir = temp_data_dir("load");
        write_fixture(&dir);

        let snapshot = load_snapshot_dir(&dir).unwrap();
        assert_eq!(snapshot.assemblies.len(), 1);
        assert_eq!(snapshot.assemblies[0].name, "Panel A");
        assert_eq!(snapshot.parts.len(), 2);
        assert_eq!(snapshot.bom_items[1].yield_pct, 0.9);
        assert_eq!(snapshot.stock[1].on_hand_qty, 50.5);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_optional_columns_default() {
        let dir = temp_data_dir("defaults");
        write_fixture(&dir);
        fs::write(
            dir.join(BOM_ITEMS_FILE),
            "parent_assembly_sku,component_sku,qty_per\nPANEL-A,BOLT,4\n",
        )
        .unwrap();
        fs::write(dir.join(STOCK_FILE), "sku,on_hand_qty\nBOLT,10\n").unwrap();

        let snapshot = load_snapshot_dir(&dir).unwrap();
        assert_eq!(snapshot.bom_items[0].scrap_rate, 0.0);
        assert_eq!(snapshot.bom_items[0].yield_pct, 1.0);
        assert!(!snapshot.bom_items[0].is_phantom);
        assert_eq!(snapshot.stock[0].reserved_qty, 0.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let dir = temp_data_dir("missing");
        write_fixture(&dir);
        fs::remove_file(dir.join(STOCK_FILE)).unwrap();

        let err = load_snapshot_dir(&dir).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bad_row_names_file() {
        let dir = temp_data_dir("bad_row");
        write_fixture(&dir);
        fs::write(dir.join(STOCK_FILE), "sku,on_hand_qty,reserved_qty\nBOLT,lots,0\n").unwrap();

        match load_snapshot_dir(&dir) {
            Err(ForgeError::SerializationError { reason }) => assert!(reason.contains(STOCK_FILE)),
            other => panic!("expected SerializationError, got {other:?}"),
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_not_a_directory() {
        let err = load_snapshot_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_settings() {
        let dir = temp_data_dir("settings");
        let path = dir.join("settings.json");
        fs::write(&path, r#"{"include_scrap": false, "min_yield": 0.05}"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert!(!settings.include_scrap);
        assert_eq!(settings.min_yield, 0.05);
        assert!(settings.respect_reservations);

        fs::write(&path, r#"{"min_yield": 0}"#).unwrap();
        assert_eq!(load_settings(&path).unwrap_err().error_code(), "INVALID_INPUT");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_json_is_atomic() {
        let dir = temp_data_dir("save");
        let path = dir.join("report.json");

        save_json(&CalcSettings::default(), &path).unwrap();
        assert!(path.exists());
        assert!(!dir.join("report.json.tmp").exists());

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, CalcSettings::default());

        let _ = fs::remove_dir_all(&dir);
    }
}
