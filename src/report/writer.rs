//! Catalog serialization to disk.

use super::document::CatalogDocument;
use crate::error::{Result, VarcatError};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::warn;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the catalog document to `path` as pretty-printed JSON. A `.gz`
/// suffix requests gzip compression; when compression fails the document is
/// written uncompressed next to it and a warning is recorded.
pub fn write_catalog(document: &CatalogDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(document)
        .map_err(|e| VarcatError::Internal(format!("failed to serialize catalog: {e}")))?;
    if path.extension().is_some_and(|e| e == "gz") {
        match write_compressed(&json, path) {
            Ok(()) => return Ok(()),
            Err(error) => {
                warn!("Failed to compress catalog ({error}); writing uncompressed.");
                let fallback = path.with_extension("");
                return write_plain(&json, &fallback);
            }
        }
    }
    write_plain(&json, path)
}

fn write_plain(json: &str, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|e| VarcatError::io(path, e))?;
    file.write_all(json.as_bytes())
        .map_err(|e| VarcatError::io(path, e))
}

fn write_compressed(json: &str, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| VarcatError::io(path, e))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(json.as_bytes())
        .map_err(|e| VarcatError::io(path, e))?;
    encoder
        .finish()
        .map_err(|e| VarcatError::io(path, e))?;
    Ok(())
}

/// Reads a catalog document back, transparently decompressing `.gz` files.
pub fn read_catalog(path: &Path) -> Result<CatalogDocument> {
    let file = File::open(path).map_err(|e| VarcatError::io(path, e))?;
    let document = if path.extension().is_some_and(|e| e == "gz") {
        let decoder = flate2::read::GzDecoder::new(file);
        serde_json::from_reader(decoder)
    } else {
        serde_json::from_reader(file)
    };
    document.map_err(|e| VarcatError::Internal(format!("failed to parse catalog: {e}")))
}
