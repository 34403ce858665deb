use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Base name of a document without its extension: "dir/paper.txt" -> "paper"
pub fn document_stem<P: AsRef<Path>>(document: P) -> Result<String> {
    let document = document.as_ref();
    document
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Document path has no file name: {}", document.display()))
}

/// Output artifact path for a document
/// "dir/paper.txt" + suffix "withIdents" -> "<output_dir>/paper.withIdents"
///
/// Without an output directory the artifact lands in the working directory.
pub fn derive_output_path<P: AsRef<Path>>(
    document: P,
    output_dir: Option<&Path>,
    suffix: &str,
) -> Result<PathBuf> {
    let stem = document_stem(document)?;
    let filename = if suffix.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, suffix)
    };
    Ok(match output_dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(filename),
        _ => PathBuf::from(filename),
    })
}

/// Write `contents` through a uniquely named sibling file and rename it into
/// place, so a reader never observes a partially written artifact.
pub fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Output path has no file name: {}", path.display()))?;
    let temp_name = format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        &Uuid::new_v4().to_string()[..8]
    );
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, contents)
        .with_context(|| format!("Failed to write: {}", temp_path.display()))?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to move output into place: {}", path.display()));
    }

    Ok(())
}
