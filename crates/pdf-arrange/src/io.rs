//! File I/O for source documents and assembled output

use crate::types::*;
use std::path::Path;

/// A file read from disk, ready to be loaded into a slot
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Read a source document and remember its file name
pub async fn read_source(path: impl AsRef<Path>) -> Result<SourceFile> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile { name, bytes })
}

/// Write assembled bytes to disk
pub async fn write_output(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
