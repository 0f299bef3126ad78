//! Document files
//!
//! Loading is strict: I/O and parse failures come back as errors. Saving
//! reports failure as `false` and logs the cause.

use std::fs;
use std::path::Path;

use crate::document::{Document, DEFAULT_INDENT};
use crate::error::Result;

/// Read a document file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let document = serde_json::from_slice(&bytes)?;
    log::debug!("loaded document from {}", path.display());
    Ok(document)
}

/// Write a document file with the default indent
pub fn save_to_file(path: impl AsRef<Path>, document: &Document) -> bool {
    save_to_file_with_indent(path, document, DEFAULT_INDENT)
}

/// Write a document file with `indent` spaces per level
pub fn save_to_file_with_indent(path: impl AsRef<Path>, document: &Document, indent: usize) -> bool {
    let path = path.as_ref();
    match write_document(path, document, indent) {
        Ok(()) => {
            log::debug!("saved {} to {}", document.type_name, path.display());
            true
        }
        Err(err) => {
            log::error!("failed to save {} to {}: {}", document.type_name, path.display(), err);
            false
        }
    }
}

fn write_document(path: &Path, document: &Document, indent: usize) -> Result<()> {
    let bytes = document.to_vec_pretty(indent)?;
    fs::write(path, bytes)?;
    Ok(())
}
