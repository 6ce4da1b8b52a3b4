use crate::ScraperError;
use std::fs;
use std::path::Path;

/// Writes the assembled document, replacing any existing file
///
/// Missing parent directories are created.
///
/// # Arguments
///
/// * `path` - Destination file
/// * `document` - The markdown document
///
/// # Returns
///
/// * `Ok(())` - The document was written
/// * `Err(ScraperError::Write)` - A directory or the file could not be written
pub fn write_document(path: &Path, document: &str) -> Result<(), ScraperError> {
    let write_error = |source| ScraperError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    fs::write(path, document).map_err(write_error)?;
    tracing::info!("Wrote {} bytes to {}", document.len(), path.display());

    Ok(())
}
