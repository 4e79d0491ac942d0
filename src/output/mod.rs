//! Output module for writing chapter catalogs
//!
//! This module handles:
//! - Serializing a chapter's code trees as a JSON array
//! - Computing and printing harvest statistics

pub mod stats;

pub use stats::{print_statistics, CatalogStats};

use crate::catalog::CodeNode;
use crate::HarvestError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes a chapter catalog as a JSON array
///
/// Missing parent directories are created. With `pretty` the document is
/// indented by two spaces.
///
/// # Arguments
///
/// * `path` - Destination file, overwritten if present
/// * `nodes` - Root trees in the order they should appear
/// * `pretty` - Indent the output
///
/// # Example
///
/// ```no_run
/// use icd_harvest::catalog::CodeNode;
/// use icd_harvest::output::write_catalog;
/// use std::path::Path;
///
/// let nodes = vec![CodeNode::new("Z00")];
/// write_catalog(Path::new("Z_Applicable_Approximate.json"), &nodes, true).unwrap();
/// ```
pub fn write_catalog(path: &Path, nodes: &[CodeNode], pretty: bool) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, nodes)?;
    } else {
        serde_json::to_writer(&mut writer, nodes)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a chapter catalog written by [`write_catalog`]
pub fn read_catalog(path: &Path) -> Result<Vec<CodeNode>, HarvestError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
